//! Incremental "load more" delivery of a ranked post collection.

use crate::models::Post;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: usize,
    pub has_next_page: bool,
    pub is_loading: bool,
    pub page_size: usize,
}

/// Slices a full collection into an incrementally displayed one. The
/// pager is also the write path for the collections it serves: creating,
/// updating, or deleting a post goes through here so the full and
/// displayed views never diverge on identity.
#[derive(Debug)]
pub struct FeedPager {
    all: Vec<Post>,
    displayed: Vec<Post>,
    state: PaginationState,
    latency: Duration,
}

impl FeedPager {
    pub fn new(posts: Vec<Post>, page_size: usize, latency: Duration) -> Self {
        let page_size = page_size.max(1);
        let first_page = posts.len().min(page_size);
        let displayed = posts[..first_page].to_vec();
        let state = PaginationState {
            current_page: 1,
            has_next_page: posts.len() > displayed.len(),
            is_loading: false,
            page_size,
        };
        Self {
            all: posts,
            displayed,
            state,
            latency,
        }
    }

    pub fn displayed(&self) -> &[Post] {
        &self.displayed
    }

    pub fn all_posts(&self) -> &[Post] {
        &self.all
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Appends the next page after the simulated fetch latency. A no-op
    /// while a load is in flight or when the collection is exhausted;
    /// returns whether anything was loaded.
    pub async fn load_more(&mut self) -> bool {
        if self.state.is_loading || !self.state.has_next_page {
            return false;
        }
        self.state.is_loading = true;
        tokio::time::sleep(self.latency).await;

        let next_end = self
            .all
            .len()
            .min(self.displayed.len() + self.state.page_size);
        self.displayed
            .extend_from_slice(&self.all[self.displayed.len()..next_end]);
        self.state.current_page += 1;
        self.state.has_next_page = self.all.len() > self.displayed.len();
        self.state.is_loading = false;
        tracing::debug!(
            page = self.state.current_page,
            displayed = self.displayed.len(),
            "loaded next feed page"
        );
        true
    }

    /// Prepends a new post to both the full and displayed collections.
    pub fn create_post(&mut self, post: Post) {
        self.all.insert(0, post.clone());
        self.displayed.insert(0, post);
        self.state.has_next_page = self.all.len() > self.displayed.len();
    }

    /// Replaces the content of the matching post in both collections.
    pub fn update_post(&mut self, post_id: &str, content: &str) -> bool {
        let mut updated = false;
        for post in self
            .all
            .iter_mut()
            .chain(self.displayed.iter_mut())
            .filter(|post| post.id == post_id)
        {
            post.content = content.to_string();
            updated = true;
        }
        updated
    }

    /// Removes the matching post from both collections.
    pub fn delete_post(&mut self, post_id: &str) -> bool {
        let before = self.all.len();
        self.all.retain(|post| post.id != post_id);
        self.displayed.retain(|post| post.id != post_id);
        self.state.has_next_page = self.all.len() > self.displayed.len();
        self.all.len() != before
    }
}
