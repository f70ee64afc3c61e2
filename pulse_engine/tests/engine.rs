//! End-to-end walk over the engine: ranked search feeding the pager, a
//! discussion thread opened and mutated, and persisted session state.

use pretty_assertions::assert_eq;
use pulse_engine::cli::{sample_posts, sample_replies};
use pulse_engine::history::SearchHistory;
use pulse_engine::pager::FeedPager;
use pulse_engine::search::{rank, SearchFilters, SortBy};
use pulse_engine::suggest::{SuggestClient, SuggestionSession};
use pulse_engine::threading::ThreadService;
use pulse_engine::{Author, ReactionKind};
use std::sync::Arc;
use std::time::Duration;

fn viewer() -> Author {
    Author {
        id: "viewer".to_string(),
        name: "Viewer".to_string(),
        verified: false,
    }
}

#[tokio::test(start_paused = true)]
async fn ranked_feed_pages_through_the_sample_collection() {
    let posts = sample_posts();
    assert_eq!(posts.len(), 12);

    let results = rank(&posts, "", &SearchFilters::default());
    let ranked: Vec<_> = results.into_iter().map(|scored| scored.post).collect();

    let mut pager = FeedPager::new(ranked, 5, Duration::from_millis(500));
    assert_eq!(pager.displayed().len(), 5);
    assert!(pager.state().has_next_page);

    assert!(pager.load_more().await);
    assert!(pager.load_more().await);
    assert_eq!(pager.displayed().len(), 12);
    assert!(!pager.state().has_next_page);
    assert!(!pager.load_more().await);
}

#[test]
fn query_plus_filters_narrow_the_feed() {
    let posts = sample_posts();

    let results = rank(&posts, "rust", &SearchFilters::default());
    assert!(!results.is_empty());
    assert!(results.iter().all(|scored| scored.score > 0));

    let mut filters = SearchFilters::default();
    filters.verified = Some(true);
    filters.sort_by = SortBy::Popular;
    let verified_only = rank(&posts, "rust", &filters);
    assert!(verified_only
        .iter()
        .all(|scored| scored.post.author.verified));
    let engagements: Vec<_> = verified_only
        .iter()
        .map(|scored| scored.post.stats.engagement())
        .collect();
    let mut sorted = engagements.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(engagements, sorted);
}

#[test]
fn thread_lifecycle_over_the_sample_replies() {
    let posts = sample_posts();
    let first = posts[0].clone();
    let mut threads = ThreadService::new(sample_replies(&posts), viewer());

    let data = threads.thread_data(&first);
    let seeded = data.replies.len();
    assert_eq!(seeded, 2);
    assert_eq!(data.stats.participants, 2);
    let total_before = data.stats.total_replies;

    let reply = threads
        .add_reply(&first.id, "late to the party", None)
        .expect("reply added");
    assert!(threads.like_reply(&first.id, &reply.id));
    assert!(threads.toggle_post_reaction(&first.id, ReactionKind::Love));

    let data = threads.get(&first.id).expect("thread cached");
    assert_eq!(data.replies.len(), seeded + 1);
    assert_eq!(data.stats.total_replies, total_before + 1);
    // Participants keep the materialization-time count.
    assert_eq!(data.stats.participants, 2);
    assert_eq!(data.reactions.active(), Some(ReactionKind::Love));

    assert!(threads.delete_reply(&first.id, &reply.id));
    assert_eq!(threads.get(&first.id).expect("thread").replies.len(), seeded);
}

#[tokio::test]
async fn committed_searches_survive_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data").join("history.json");

    let session = SuggestionSession::new(
        Arc::new(SuggestClient::new(None)),
        Duration::from_millis(300),
        SearchHistory::load(&path),
    );
    session.commit_search("react");
    session.commit_search("vue");
    session.commit_search("react");
    assert_eq!(session.history_entries(), ["react", "vue"]);

    let reloaded = SearchHistory::load(&path);
    assert_eq!(reloaded.entries(), ["react", "vue"]);
}
