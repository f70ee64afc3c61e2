//! Session state persisted as JSON: the bounded search history and the
//! local share-analytics summary. Missing or corrupt files are treated as
//! empty state, never as fatal errors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first list of executed searches, de-duplicated by exact
/// string match: re-searching an existing term promotes it to the front.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchHistory {
    entries: Vec<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl SearchHistory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Self {
        let mut history = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<SearchHistory>(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "search history corrupt, starting empty");
                SearchHistory::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => SearchHistory::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "search history unreadable, starting empty");
                SearchHistory::default()
            }
        };
        history.path = Some(path.to_path_buf());
        history.entries.truncate(HISTORY_CAPACITY);
        history
    }

    pub fn push(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(HISTORY_CAPACITY);
        self.save();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(err) = persist_json(path, self) {
            tracing::warn!(path = %path.display(), error = %err, "failed to persist search history");
        }
    }
}

/// Local summary of share actions, keyed by post id.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShareAnalytics {
    total_shares: u64,
    by_post: HashMap<String, u64>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl ShareAnalytics {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Self {
        let mut analytics = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<ShareAnalytics>(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "share analytics corrupt, starting empty");
                ShareAnalytics::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => ShareAnalytics::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "share analytics unreadable, starting empty");
                ShareAnalytics::default()
            }
        };
        analytics.path = Some(path.to_path_buf());
        analytics
    }

    pub fn record_share(&mut self, post_id: &str) {
        self.total_shares += 1;
        *self.by_post.entry(post_id.to_string()).or_insert(0) += 1;
        if let Some(path) = &self.path {
            if let Err(err) = persist_json(path, self) {
                tracing::warn!(path = %path.display(), error = %err, "failed to persist share analytics");
            }
        }
    }

    pub fn shares_for(&self, post_id: &str) -> u64 {
        self.by_post.get(post_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total_shares
    }
}

fn persist_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}
