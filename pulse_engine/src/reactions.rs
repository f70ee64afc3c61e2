//! Mutually-exclusive reaction counters attached to posts and comments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Wow,
    Sad,
    Angry,
    Dislike,
}

impl ReactionKind {
    /// The six-way picker offered on posts.
    pub const POST_PICKER: [ReactionKind; 6] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Laugh,
        ReactionKind::Wow,
        ReactionKind::Sad,
        ReactionKind::Angry,
    ];

    /// The two-way pair offered on comments.
    pub const COMMENT_PAIR: [ReactionKind; 2] = [ReactionKind::Like, ReactionKind::Dislike];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
            ReactionKind::Dislike => "dislike",
        }
    }

    pub fn parse(raw: &str) -> Option<ReactionKind> {
        match raw.to_lowercase().as_str() {
            "like" => Some(ReactionKind::Like),
            "love" => Some(ReactionKind::Love),
            "laugh" => Some(ReactionKind::Laugh),
            "wow" => Some(ReactionKind::Wow),
            "sad" => Some(ReactionKind::Sad),
            "angry" => Some(ReactionKind::Angry),
            "dislike" => Some(ReactionKind::Dislike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEntry {
    pub kind: ReactionKind,
    pub count: u64,
    pub has_reacted: bool,
}

/// Counter set over a fixed, closed set of reaction kinds. At most one kind
/// carries `has_reacted = true` for the acting viewer; the active reaction is
/// derivable by scanning, there is no separate "current reaction" field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSet {
    entries: Vec<ReactionEntry>,
}

impl ReactionSet {
    pub fn with_kinds(kinds: &[ReactionKind]) -> Self {
        Self {
            entries: kinds
                .iter()
                .map(|kind| ReactionEntry {
                    kind: *kind,
                    count: 0,
                    has_reacted: false,
                })
                .collect(),
        }
    }

    pub fn for_post() -> Self {
        Self::with_kinds(&ReactionKind::POST_PICKER)
    }

    pub fn for_comment() -> Self {
        Self::with_kinds(&ReactionKind::COMMENT_PAIR)
    }

    /// Exclusive toggle. Reacting with the kind already held removes it;
    /// reacting with a different kind releases the old one first. Kinds
    /// outside the closed set are ignored.
    pub fn toggle(&mut self, kind: ReactionKind) {
        let Some(index) = self.entries.iter().position(|entry| entry.kind == kind) else {
            return;
        };
        if self.entries[index].has_reacted {
            self.entries[index].count = self.entries[index].count.saturating_sub(1);
            self.entries[index].has_reacted = false;
            return;
        }
        for entry in &mut self.entries {
            if entry.has_reacted {
                entry.count = entry.count.saturating_sub(1);
                entry.has_reacted = false;
            }
        }
        self.entries[index].count += 1;
        self.entries[index].has_reacted = true;
    }

    /// Non-exclusive flip of a single kind, used by the one-button reply
    /// like: other kinds are left untouched.
    pub fn flip(&mut self, kind: ReactionKind) {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.kind == kind) else {
            return;
        };
        if entry.has_reacted {
            entry.count = entry.count.saturating_sub(1);
            entry.has_reacted = false;
        } else {
            entry.count += 1;
            entry.has_reacted = true;
        }
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// The `n` non-zero kinds ordered by count descending. Ties keep the
    /// enumeration order of the kind set (stable sort).
    pub fn top(&self, n: usize) -> Vec<ReactionEntry> {
        let mut ranked: Vec<ReactionEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.count > 0)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }

    pub fn count(&self, kind: ReactionKind) -> u64 {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn has_reacted(&self, kind: ReactionKind) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == kind && entry.has_reacted)
    }

    /// The viewer's current reaction, if any.
    pub fn active(&self) -> Option<ReactionKind> {
        self.entries
            .iter()
            .find(|entry| entry.has_reacted)
            .map(|entry| entry.kind)
    }

    pub fn entries(&self) -> &[ReactionEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_enforces_exclusivity() {
        let mut set = ReactionSet::for_post();
        set.toggle(ReactionKind::Like);
        set.toggle(ReactionKind::Love);
        set.toggle(ReactionKind::Wow);

        let reacted: Vec<_> = set
            .entries()
            .iter()
            .filter(|entry| entry.has_reacted)
            .collect();
        assert_eq!(reacted.len(), 1);
        assert_eq!(reacted[0].kind, ReactionKind::Wow);
        assert_eq!(set.count(ReactionKind::Like), 0);
        assert_eq!(set.count(ReactionKind::Love), 0);
        assert_eq!(set.count(ReactionKind::Wow), 1);
    }

    #[test]
    fn toggle_pair_restores_original_state() {
        let mut set = ReactionSet::for_comment();
        set.toggle(ReactionKind::Dislike);
        let before = set.clone();

        set.toggle(ReactionKind::Like);
        set.toggle(ReactionKind::Like);
        assert_eq!(set, before);
    }

    #[test]
    fn counts_never_go_negative() {
        let mut set = ReactionSet::for_comment();
        for _ in 0..5 {
            set.toggle(ReactionKind::Like);
            set.toggle(ReactionKind::Dislike);
        }
        assert!(set.entries().iter().all(|entry| entry.count <= 1));
        assert!(set.total() <= 1);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let mut set = ReactionSet::for_comment();
        set.toggle(ReactionKind::Love);
        assert_eq!(set.total(), 0);
        assert!(set.active().is_none());
    }

    #[test]
    fn top_orders_by_count_with_stable_ties() {
        let mut set = ReactionSet::for_post();
        // flip seeds counts without the exclusivity rules of toggle
        set.flip(ReactionKind::Laugh);
        set.flip(ReactionKind::Like);
        set.flip(ReactionKind::Love);

        let top = set.top(2);
        assert_eq!(top.len(), 2);
        // All counts are 1, so enumeration order of the picker wins.
        assert_eq!(top[0].kind, ReactionKind::Like);
        assert_eq!(top[1].kind, ReactionKind::Love);
    }

    #[test]
    fn flip_leaves_other_kinds_untouched() {
        let mut set = ReactionSet::for_comment();
        set.toggle(ReactionKind::Dislike);
        set.flip(ReactionKind::Like);
        assert!(set.has_reacted(ReactionKind::Like));
        assert!(set.has_reacted(ReactionKind::Dislike));
        set.flip(ReactionKind::Like);
        assert!(!set.has_reacted(ReactionKind::Like));
        assert!(set.has_reacted(ReactionKind::Dislike));
    }
}
