//! Debounced search suggestions: provider clients, the local fallback
//! heuristics, and the keyboard-navigable session state.

use crate::history::SearchHistory;
use crate::models::{Suggestion, SuggestionKind};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggestion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("suggestion provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Remote suggestion and search-analytics provider. Both calls are
/// best-effort from the engine's point of view: the session absorbs
/// failures instead of surfacing them.
pub trait SuggestionProvider: Send + Sync + 'static {
    fn suggestions(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Suggestion>, SuggestError>> + Send;

    fn track_search(
        &self,
        query: &str,
        result_count: usize,
    ) -> impl Future<Output = Result<(), SuggestError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
struct TrackRequest<'a> {
    query: &'a str,
    result_count: usize,
}

/// HTTP provider client with a latched local-fallback mode: after the
/// first failure of any call the client stops using the network for the
/// rest of the process lifetime and answers from the static heuristics.
pub struct SuggestClient {
    api_url: Option<String>,
    client: reqwest::Client,
    fallback: AtomicBool,
}

impl SuggestClient {
    pub fn new(api_url: Option<String>) -> Self {
        Self {
            api_url,
            client: reqwest::Client::new(),
            fallback: AtomicBool::new(false),
        }
    }

    pub fn in_fallback(&self) -> bool {
        self.fallback.load(Ordering::Relaxed)
    }

    fn remote_url(&self) -> Option<String> {
        if self.in_fallback() {
            None
        } else {
            self.api_url.clone()
        }
    }

    fn enter_fallback(&self, err: &SuggestError) {
        if !self.fallback.swap(true, Ordering::Relaxed) {
            tracing::warn!(error = %err, "suggestion provider unavailable, switching to local heuristics");
        }
    }

    async fn fetch_remote(&self, base: &str, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        let response = self
            .client
            .get(format!("{base}/suggestions"))
            .query(&[("q", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable body".to_string());
            return Err(SuggestError::Status { status, body });
        }
        let parsed: SuggestResponse = response.json().await?;
        Ok(parsed.suggestions)
    }
}

impl SuggestionProvider for SuggestClient {
    fn suggestions(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Suggestion>, SuggestError>> + Send {
        async move {
            let Some(base) = self.remote_url() else {
                return Ok(local_suggestions(query));
            };
            match self.fetch_remote(&base, query).await {
                Ok(list) => Ok(list),
                Err(err) => {
                    self.enter_fallback(&err);
                    Err(err)
                }
            }
        }
    }

    fn track_search(
        &self,
        query: &str,
        result_count: usize,
    ) -> impl Future<Output = Result<(), SuggestError>> + Send {
        async move {
            let Some(base) = self.remote_url() else {
                return Ok(());
            };
            let outcome = self
                .client
                .post(format!("{base}/track"))
                .json(&TrackRequest {
                    query,
                    result_count,
                })
                .send()
                .await;
            match outcome {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => {
                    let err = SuggestError::Status {
                        status: response.status().as_u16(),
                        body: String::new(),
                    };
                    self.enter_fallback(&err);
                    Err(err)
                }
                Err(err) => {
                    let err = SuggestError::from(err);
                    self.enter_fallback(&err);
                    Err(err)
                }
            }
        }
    }
}

const LOCAL_TOPICS: &[&str] = &[
    "rust programming",
    "async runtimes",
    "distributed systems",
    "feed ranking",
    "open source",
    "unit testing",
];
const LOCAL_HASHTAGS: &[&str] = &["#rustlang", "#opensource", "#buildinpublic", "#ai", "#devlog"];
const LOCAL_USERS: &[&str] = &["ada", "ferris", "mara", "niko"];

/// Static suggestion heuristics used when no provider is configured or
/// after the client has latched into fallback mode.
pub fn local_suggestions(query: &str) -> Vec<Suggestion> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let tables = [
        (LOCAL_TOPICS, SuggestionKind::Topic),
        (LOCAL_HASHTAGS, SuggestionKind::Hashtag),
        (LOCAL_USERS, SuggestionKind::User),
    ];
    let mut matches = Vec::new();
    for (table, kind) in tables {
        for candidate in table {
            let candidate_lc = candidate.to_lowercase();
            let relevance = if candidate_lc.starts_with(&needle) {
                0.9
            } else if candidate_lc.contains(&needle) {
                0.6
            } else {
                continue;
            };
            matches.push(Suggestion {
                query: candidate.to_string(),
                kind,
                relevance,
            });
        }
    }
    matches.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(8);
    matches
}

/// Fires a best-effort analytics call for an executed search. Failures are
/// logged and never reach the caller.
pub fn track_search<P: SuggestionProvider>(provider: &Arc<P>, query: &str, result_count: usize) {
    let provider = Arc::clone(provider);
    let query = query.to_string();
    tokio::spawn(async move {
        if let Err(err) = provider.track_search(&query, result_count).await {
            tracing::debug!(error = %err, query, "search tracking failed");
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

struct SessionInner {
    query: String,
    suggestions: Vec<Suggestion>,
    /// Index into `suggestions`, -1 for "nothing selected".
    selected: isize,
    /// Bumped on every keystroke and on search execution. A pending fetch
    /// whose generation no longer matches is superseded and must not apply
    /// its response, however late it lands.
    generation: u64,
}

/// Debounced query-to-suggestions state machine with keyboard navigation
/// and a bounded, persisted search history.
///
/// `input` must be called from within a tokio runtime: the quiet-period
/// wait runs as a spawned task.
pub struct SuggestionSession<P> {
    provider: Arc<P>,
    debounce: Duration,
    inner: Arc<Mutex<SessionInner>>,
    history: Arc<Mutex<SearchHistory>>,
}

impl<P: SuggestionProvider> SuggestionSession<P> {
    pub fn new(provider: Arc<P>, debounce: Duration, history: SearchHistory) -> Self {
        Self {
            provider,
            debounce,
            inner: Arc::new(Mutex::new(SessionInner {
                query: String::new(),
                suggestions: Vec::new(),
                selected: -1,
                generation: 0,
            })),
            history: Arc::new(Mutex::new(history)),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Records a keystroke. The raw query updates immediately; the fetch is
    /// scheduled after the quiet period and cancelled by any newer
    /// keystroke. An empty query clears suggestions with no network call.
    pub fn input(&self, raw: &str) {
        let generation = {
            let mut inner = lock(&self.inner);
            inner.query = raw.to_string();
            inner.generation += 1;
            if raw.trim().is_empty() {
                inner.suggestions.clear();
                inner.selected = -1;
                return;
            }
            inner.generation
        };

        let query = raw.trim().to_string();
        let provider = Arc::clone(&self.provider);
        let shared = Arc::clone(&self.inner);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if lock(&shared).generation != generation {
                return;
            }
            let outcome = provider.suggestions(&query).await;
            let mut inner = lock(&shared);
            if inner.generation != generation {
                // A newer keystroke won the race; drop the stale response.
                return;
            }
            match outcome {
                Ok(list) => inner.suggestions = list,
                Err(err) => {
                    tracing::warn!(error = %err, query, "suggestion fetch failed");
                    inner.suggestions.clear();
                }
            }
            inner.selected = -1;
        });
    }

    /// Applies one navigation key. Returns the query to execute when the
    /// key was `Enter` and there was something to search.
    pub fn handle_key(&self, key: NavKey) -> Option<String> {
        match key {
            NavKey::ArrowDown => {
                let mut inner = lock(&self.inner);
                let last = inner.suggestions.len() as isize - 1;
                if inner.selected < last {
                    inner.selected += 1;
                }
                None
            }
            NavKey::ArrowUp => {
                let mut inner = lock(&self.inner);
                // From "no selection" ArrowUp stays put, it never wraps.
                if inner.selected > 0 {
                    inner.selected -= 1;
                }
                None
            }
            NavKey::Escape => {
                let mut inner = lock(&self.inner);
                inner.suggestions.clear();
                inner.selected = -1;
                None
            }
            NavKey::Enter => {
                let query = {
                    let inner = lock(&self.inner);
                    if inner.selected >= 0 {
                        inner
                            .suggestions
                            .get(inner.selected as usize)
                            .map(|suggestion| suggestion.query.clone())
                            .unwrap_or_else(|| inner.query.clone())
                    } else {
                        inner.query.clone()
                    }
                };
                if query.trim().is_empty() {
                    return None;
                }
                self.commit_search(&query);
                Some(query)
            }
        }
    }

    /// Commits an executed search: history push (de-dup-and-promote),
    /// suggestion list cleared, selection reset, pending fetches cancelled.
    pub fn commit_search(&self, query: &str) {
        {
            let mut history = self.history.lock().expect("search history lock poisoned");
            history.push(query);
        }
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.query = query.to_string();
        inner.suggestions.clear();
        inner.selected = -1;
    }

    pub fn query(&self) -> String {
        lock(&self.inner).query.clone()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        lock(&self.inner).suggestions.clone()
    }

    pub fn selected(&self) -> isize {
        lock(&self.inner).selected
    }

    pub fn history_entries(&self) -> Vec<String> {
        self.history
            .lock()
            .expect("search history lock poisoned")
            .entries()
            .to_vec()
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().expect("suggestion session lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedProvider {
        calls: Mutex<Vec<String>>,
        delay: Duration,
        fail: bool,
    }

    impl ScriptedProvider {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl SuggestionProvider for ScriptedProvider {
        fn suggestions(
            &self,
            query: &str,
        ) -> impl Future<Output = Result<Vec<Suggestion>, SuggestError>> + Send {
            self.calls.lock().expect("calls lock").push(query.to_string());
            let delay = self.delay;
            let fail = self.fail;
            let query = query.to_string();
            async move {
                tokio::time::sleep(delay).await;
                if fail {
                    return Err(SuggestError::Status {
                        status: 503,
                        body: "unavailable".to_string(),
                    });
                }
                Ok(vec![
                    Suggestion {
                        query: format!("{query} result"),
                        kind: SuggestionKind::Content,
                        relevance: 0.8,
                    },
                    Suggestion {
                        query: format!("{query} topic"),
                        kind: SuggestionKind::Topic,
                        relevance: 0.5,
                    },
                ])
            }
        }

        fn track_search(
            &self,
            _query: &str,
            _result_count: usize,
        ) -> impl Future<Output = Result<(), SuggestError>> + Send {
            async { Ok(()) }
        }
    }

    fn session(provider: ScriptedProvider) -> SuggestionSession<ScriptedProvider> {
        SuggestionSession::new(
            Arc::new(provider),
            Duration::from_millis(300),
            SearchHistory::in_memory(),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_coalesce_into_one_fetch() {
        let session = session(ScriptedProvider::default());
        session.input("a");
        session.input("ab");
        session.input("abc");
        settle().await;

        assert_eq!(session.provider().calls(), ["abc"]);
        assert_eq!(session.suggestions().len(), 2);
        assert_eq!(session.suggestions()[0].query, "abc result");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_clears_without_fetching() {
        let session = session(ScriptedProvider::default());
        session.input("abc");
        settle().await;
        assert_eq!(session.suggestions().len(), 2);

        session.input("   ");
        assert!(session.suggestions().is_empty());
        assert_eq!(session.selected(), -1);
        settle().await;
        assert_eq!(session.provider().calls(), ["abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_a_newer_query() {
        let session = session(ScriptedProvider::with_delay(Duration::from_millis(200)));
        session.input("old");
        // Let the debounce elapse so the slow fetch for "old" is in flight.
        tokio::time::sleep(Duration::from_millis(320)).await;
        session.input("new");
        settle().await;
        settle().await;

        assert_eq!(session.provider().calls(), ["old", "new"]);
        assert_eq!(session.suggestions()[0].query, "new result");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_clears_suggestions_and_absorbs_the_error() {
        let session = session(ScriptedProvider::failing());
        session.input("abc");
        settle().await;
        assert!(session.suggestions().is_empty());
        assert_eq!(session.selected(), -1);
    }

    #[tokio::test(start_paused = true)]
    async fn arrow_keys_clamp_at_both_ends() {
        let session = session(ScriptedProvider::default());
        session.input("abc");
        settle().await;

        assert_eq!(session.selected(), -1);
        session.handle_key(NavKey::ArrowUp);
        assert_eq!(session.selected(), -1);

        session.handle_key(NavKey::ArrowDown);
        session.handle_key(NavKey::ArrowDown);
        session.handle_key(NavKey::ArrowDown);
        assert_eq!(session.selected(), 1);

        session.handle_key(NavKey::ArrowUp);
        session.handle_key(NavKey::ArrowUp);
        session.handle_key(NavKey::ArrowUp);
        assert_eq!(session.selected(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_executes_the_selected_suggestion() {
        let session = session(ScriptedProvider::default());
        session.input("abc");
        settle().await;

        session.handle_key(NavKey::ArrowDown);
        let executed = session.handle_key(NavKey::Enter);
        assert_eq!(executed.as_deref(), Some("abc result"));
        assert!(session.suggestions().is_empty());
        assert_eq!(session.selected(), -1);
        assert_eq!(session.history_entries(), ["abc result"]);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_without_selection_uses_the_raw_query() {
        let session = session(ScriptedProvider::default());
        session.input("abc");
        settle().await;

        let executed = session.handle_key(NavKey::Enter);
        assert_eq!(executed.as_deref(), Some("abc"));
        assert_eq!(session.history_entries(), ["abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn escape_clears_suggestions_and_selection() {
        let session = session(ScriptedProvider::default());
        session.input("abc");
        settle().await;
        session.handle_key(NavKey::ArrowDown);

        assert!(session.handle_key(NavKey::Escape).is_none());
        assert!(session.suggestions().is_empty());
        assert_eq!(session.selected(), -1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_searches_promote_instead_of_duplicating() {
        let session = session(ScriptedProvider::default());
        session.commit_search("react");
        session.commit_search("vue");
        session.commit_search("react");
        assert_eq!(session.history_entries(), ["react", "vue"]);
    }

    #[tokio::test]
    async fn client_without_a_url_answers_from_local_heuristics() {
        let client = SuggestClient::new(None);
        let results = client.suggestions("rust").await.expect("local suggestions");
        assert!(!results.is_empty());
        assert!(!client.in_fallback());
        assert!(client.track_search("rust", 3).await.is_ok());
    }

    #[test]
    fn local_suggestions_prefer_prefix_matches() {
        let results = local_suggestions("rust");
        assert!(!results.is_empty());
        assert_eq!(results[0].query, "rust programming");
        assert!(results[0].relevance > results[results.len() - 1].relevance - f64::EPSILON);
        assert!(local_suggestions("   ").is_empty());
        assert!(local_suggestions("zzz").is_empty());
    }

    #[test]
    fn local_hashtags_and_users_are_typed() {
        let tags = local_suggestions("#rust");
        assert!(tags.iter().any(|s| s.kind == SuggestionKind::Hashtag));
        let users = local_suggestions("ferris");
        assert!(users.iter().any(|s| s.kind == SuggestionKind::User));
    }
}
