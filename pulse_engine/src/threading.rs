//! Nested discussion trees and the per-post thread cache.

use crate::models::{Attachment, Author, Comment, Post, PostStats};
use crate::reactions::{ReactionKind, ReactionSet};
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Ordered forest of comments. Subtrees are exclusively owned by their
/// parent node, so the no-shared-node invariant holds by construction.
///
/// Every locate-by-id operation that finds no match is a silent no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentTree {
    comments: Vec<Comment>,
}

impl CommentTree {
    pub fn from_comments(comments: Vec<Comment>) -> Self {
        Self { comments }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Total node count, replies included.
    pub fn len(&self) -> usize {
        count_nodes(&self.comments)
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Appends a new comment. With a `parent_id` the parent is resolved by
    /// scanning the top-level sequence only, so threading stays one level
    /// deep through this entry point and `depth` is binary 0/1. Returns the
    /// created comment, or `None` when the named parent was not found.
    pub fn add_comment(
        &mut self,
        author: Author,
        content: &str,
        attachments: Vec<Attachment>,
        parent_id: Option<&str>,
    ) -> Option<Comment> {
        let depth = if parent_id.is_some() { 1 } else { 0 };
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            author,
            created_at: now_utc_iso(),
            parent_id: parent_id.map(|id| id.to_string()),
            depth,
            reactions: ReactionSet::for_comment(),
            attachments,
            is_edited: false,
            edited_at: None,
            replies: Vec::new(),
            is_collapsed: false,
        };
        match parent_id {
            None => {
                self.comments.push(comment.clone());
                Some(comment)
            }
            Some(parent_id) => {
                let parent = self.comments.iter_mut().find(|node| node.id == parent_id)?;
                parent.replies.push(comment.clone());
                Some(comment)
            }
        }
    }

    /// Two-way exclusive like/dislike toggle on the matching node. Unlike
    /// `add_comment`, the lookup descends into replies at any depth.
    pub fn toggle_reaction(&mut self, comment_id: &str, kind: ReactionKind) -> bool {
        match locate_mut(&mut self.comments, comment_id) {
            Some(node) => {
                node.reactions.toggle(kind);
                true
            }
            None => false,
        }
    }

    /// One-button like used on thread replies: flips the like flag only,
    /// leaving a standing dislike untouched.
    pub fn like(&mut self, comment_id: &str) -> bool {
        match locate_mut(&mut self.comments, comment_id) {
            Some(node) => {
                node.reactions.flip(ReactionKind::Like);
                true
            }
            None => false,
        }
    }

    pub fn toggle_collapse(&mut self, comment_id: &str) -> bool {
        match locate_mut(&mut self.comments, comment_id) {
            Some(node) => {
                node.is_collapsed = !node.is_collapsed;
                true
            }
            None => false,
        }
    }

    pub fn update_comment(
        &mut self,
        comment_id: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> bool {
        match locate_mut(&mut self.comments, comment_id) {
            Some(node) => {
                node.content = content.to_string();
                node.attachments = attachments;
                node.is_edited = true;
                node.edited_at = Some(now_utc_iso());
                true
            }
            None => false,
        }
    }

    /// Removes the matching node and, with it, its entire reply subtree.
    pub fn delete_comment(&mut self, comment_id: &str) -> bool {
        remove_node(&mut self.comments, comment_id)
    }

    pub fn find(&self, comment_id: &str) -> Option<&Comment> {
        locate(&self.comments, comment_id)
    }

    /// Count of distinct author ids anywhere in the tree.
    pub fn participants(&self) -> usize {
        let mut authors = HashSet::new();
        collect_authors(&self.comments, &mut authors);
        authors.len()
    }
}

fn count_nodes(comments: &[Comment]) -> usize {
    comments
        .iter()
        .map(|comment| 1 + count_nodes(&comment.replies))
        .sum()
}

fn locate<'a>(comments: &'a [Comment], id: &str) -> Option<&'a Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = locate(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn locate_mut<'a>(comments: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = locate_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn remove_node(comments: &mut Vec<Comment>, id: &str) -> bool {
    if let Some(position) = comments.iter().position(|comment| comment.id == id) {
        comments.remove(position);
        return true;
    }
    for comment in comments.iter_mut() {
        if remove_node(&mut comment.replies, id) {
            return true;
        }
    }
    false
}

fn collect_authors(comments: &[Comment], authors: &mut HashSet<String>) {
    for comment in comments {
        authors.insert(comment.author.id.clone());
        collect_authors(&comment.replies, authors);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadStats {
    /// Seeded from the post's own reply counter and bumped once per
    /// `add_reply` call; intentionally not reconciled with the live tree
    /// size, the displayed counter tracks the post stat.
    pub total_replies: u64,
    /// Distinct reply authors, counted once when the thread is first
    /// materialized. Later replies do not refresh it.
    pub participants: usize,
    pub engagement_rate: u64,
}

/// Cached bundle of one post's discussion: the reply tree, the post-level
/// reaction picker, and derived engagement stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadData {
    pub post: Post,
    pub reactions: ReactionSet,
    pub replies: CommentTree,
    pub stats: ThreadStats,
}

/// Supplies a post's initial replies when its thread is first opened.
pub trait ReplySource {
    fn replies_for(&self, post_id: &str) -> Vec<Comment>;
}

/// Fixed in-memory reply store used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticReplies {
    replies: HashMap<String, Vec<Comment>>,
}

impl StaticReplies {
    pub fn new(replies: HashMap<String, Vec<Comment>>) -> Self {
        Self { replies }
    }

    pub fn insert(&mut self, post_id: &str, comments: Vec<Comment>) {
        self.replies.insert(post_id.to_string(), comments);
    }
}

impl ReplySource for StaticReplies {
    fn replies_for(&self, post_id: &str) -> Vec<Comment> {
        self.replies.get(post_id).cloned().unwrap_or_default()
    }
}

/// Owns every materialized thread for the session, keyed by post id.
/// Threads are built lazily on first access and live until the session
/// ends.
pub struct ThreadService<S> {
    source: S,
    viewer: Author,
    threads: HashMap<String, ThreadData>,
}

impl<S: ReplySource> ThreadService<S> {
    pub fn new(source: S, viewer: Author) -> Self {
        Self {
            source,
            viewer,
            threads: HashMap::new(),
        }
    }

    /// Returns the cached thread for `post`, materializing it on first
    /// access. Repeated calls without intervening mutation return the same
    /// data.
    pub fn thread_data(&mut self, post: &Post) -> &ThreadData {
        match self.threads.entry(post.id.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let replies = CommentTree::from_comments(self.source.replies_for(&post.id));
                let stats = ThreadStats {
                    total_replies: post.stats.replies,
                    participants: replies.participants(),
                    engagement_rate: engagement_rate(&post.stats),
                };
                tracing::debug!(post_id = %post.id, replies = replies.len(), "materialized thread");
                slot.insert(ThreadData {
                    post: post.clone(),
                    reactions: ReactionSet::for_post(),
                    replies,
                    stats,
                })
            }
        }
    }

    /// Adds a reply as the session viewer and bumps the reply counter. The
    /// counter moves even when a named parent is missing and the tree stays
    /// unchanged; see `ThreadStats::total_replies`.
    pub fn add_reply(
        &mut self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Option<Comment> {
        let author = self.viewer.clone();
        let data = self.threads.get_mut(post_id)?;
        let created = data.replies.add_comment(author, content, Vec::new(), parent_id);
        data.stats.total_replies += 1;
        created
    }

    pub fn like_reply(&mut self, post_id: &str, reply_id: &str) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => data.replies.like(reply_id),
            None => false,
        }
    }

    pub fn toggle_reply_reaction(
        &mut self,
        post_id: &str,
        reply_id: &str,
        kind: ReactionKind,
    ) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => data.replies.toggle_reaction(reply_id, kind),
            None => false,
        }
    }

    pub fn toggle_post_reaction(&mut self, post_id: &str, kind: ReactionKind) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => {
                data.reactions.toggle(kind);
                true
            }
            None => false,
        }
    }

    pub fn toggle_collapse(&mut self, post_id: &str, reply_id: &str) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => data.replies.toggle_collapse(reply_id),
            None => false,
        }
    }

    pub fn update_reply(&mut self, post_id: &str, reply_id: &str, content: &str) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => data.replies.update_comment(reply_id, content, Vec::new()),
            None => false,
        }
    }

    pub fn delete_reply(&mut self, post_id: &str, reply_id: &str) -> bool {
        match self.threads.get_mut(post_id) {
            Some(data) => data.replies.delete_comment(reply_id),
            None => false,
        }
    }

    pub fn get(&self, post_id: &str) -> Option<&ThreadData> {
        self.threads.get(post_id)
    }
}

/// Percentage of (likes + replies) over views, rounded. Zero views reads
/// as zero engagement rather than a division blowup.
pub fn engagement_rate(stats: &PostStats) -> u64 {
    if stats.views == 0 {
        return 0;
    }
    (((stats.likes + stats.replies) as f64 / stats.views as f64) * 100.0).round() as u64
}
