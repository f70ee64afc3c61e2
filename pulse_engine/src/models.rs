use crate::reactions::ReactionSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostStats {
    pub likes: u64,
    pub replies: u64,
    pub shares: u64,
    pub views: u64,
}

impl PostStats {
    /// Combined engagement used by filters and the popularity sort.
    pub fn engagement(&self) -> u64 {
        self.likes + self.replies + self.shares
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub kind: String,
    pub url: String,
}

/// A feed post as supplied by the post store. The engine never mutates
/// identity fields, it only produces derived views such as scored copies.
///
/// `id` doubles as a recency proxy: higher lexicographic value means more
/// recent. New posts are minted with a millisecond-timestamp prefix so the
/// ordering holds for locally created posts too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub content: String,
    pub author: Author,
    #[serde(default)]
    pub tags: Vec<String>,
    pub stats: PostStats,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub is_pinned: bool,
    pub created_at: String,
}

/// One node of a discussion tree. `replies` is exclusively owned by the
/// parent node, so no comment ever appears in two trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub created_at: String,
    pub parent_id: Option<String>,
    /// Binary in practice: 0 for top-level comments, 1 for replies.
    pub depth: u32,
    pub reactions: ReactionSet,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub is_edited: bool,
    pub edited_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub is_collapsed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    User,
    Topic,
    Hashtag,
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub relevance: f64,
}
