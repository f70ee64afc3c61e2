//! Relevance scoring, structured filtering, and ordering of the feed.

use crate::models::Post;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Recent,
    Popular,
    Trending,
}

impl SortBy {
    pub fn parse(raw: &str) -> Option<SortBy> {
        match raw.to_lowercase().as_str() {
            "relevance" => Some(SortBy::Relevance),
            "recent" => Some(SortBy::Recent),
            "popular" => Some(SortBy::Popular),
            "trending" => Some(SortBy::Trending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    All,
    Posts,
    Comments,
    Users,
}

/// Structured search constraints. Unset fields mean "no constraint".
///
/// `date_range`, `content_type`, and `language` are accepted for
/// round-tripping but not enforced by the core predicates; post ids are
/// only a recency proxy, so there is no sound timestamp to range over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub date_range: DateRange,
    pub sort_by: SortBy,
    pub content_type: ContentType,
    pub verified: Option<bool>,
    pub has_media: Option<bool>,
    pub min_engagement: Option<u64>,
    pub tags: HashSet<String>,
    pub authors: HashSet<String>,
    pub language: Option<String>,
}

/// A post plus the transient relevance score computed for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPost {
    pub post: Post,
    pub score: u64,
}

/// Scores and orders `posts` against `query` and `filters`.
///
/// An empty (or whitespace-only) query skips scoring and the zero-score
/// exclusion entirely; structured filters still apply. A non-empty query
/// drops every post whose text score is zero.
pub fn rank(posts: &[Post], query: &str, filters: &SearchFilters) -> Vec<ScoredPost> {
    let query = query.trim();
    let mut results: Vec<ScoredPost> = if query.is_empty() {
        posts
            .iter()
            .map(|post| ScoredPost {
                post: post.clone(),
                score: 0,
            })
            .collect()
    } else {
        posts
            .iter()
            .filter_map(|post| {
                let score = score_post(post, query);
                if score == 0 {
                    None
                } else {
                    Some(ScoredPost {
                        post: post.clone(),
                        score,
                    })
                }
            })
            .collect()
    };

    results.retain(|scored| passes_filters(&scored.post, filters));
    sort_results(&mut results, filters.sort_by);
    tracing::debug!(query, results = results.len(), "ranked search complete");
    results
}

/// Relevance score for one post. The verification and engagement bonuses
/// only apply once some text actually matched, so a query matching nothing
/// yields zero for every post.
pub fn score_post(post: &Post, query: &str) -> u64 {
    let query_lc = query.to_lowercase();
    let content_lc = post.content.to_lowercase();
    let author_lc = post.author.name.to_lowercase();
    let tags_lc = post.tags.join(" ").to_lowercase();

    let mut score = 0;
    if content_lc.contains(&query_lc) {
        score += 10;
    }
    for term in query_lc.split_whitespace() {
        if content_lc.contains(term) {
            score += 3;
        }
        if author_lc.contains(term) {
            score += 2;
        }
        if tags_lc.contains(term) {
            score += 4;
        }
    }
    if score == 0 {
        return 0;
    }

    if post.author.verified {
        score += 1;
    }
    score += (post.stats.engagement() / 100).min(5);
    score
}

/// All predicates must pass; each applies independently only when set.
pub fn passes_filters(post: &Post, filters: &SearchFilters) -> bool {
    if let Some(verified) = filters.verified {
        if post.author.verified != verified {
            return false;
        }
    }
    if let Some(has_media) = filters.has_media {
        if post.attachments.is_empty() == has_media {
            return false;
        }
    }
    if let Some(min_engagement) = filters.min_engagement {
        if post.stats.engagement() < min_engagement {
            return false;
        }
    }
    if !filters.tags.is_empty() && !post.tags.iter().any(|tag| filters.tags.contains(tag)) {
        return false;
    }
    if !filters.authors.is_empty() && !filters.authors.contains(&post.author.id) {
        return false;
    }
    true
}

fn trending_weight(post: &Post) -> u64 {
    post.stats.likes * 2 + post.stats.replies * 3 + post.stats.shares * 5
}

/// Stable sorts, so ties keep their prior relative order.
fn sort_results(results: &mut [ScoredPost], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => results.sort_by(|a, b| b.score.cmp(&a.score)),
        SortBy::Recent => results.sort_by(|a, b| b.post.id.cmp(&a.post.id)),
        SortBy::Popular => {
            results.sort_by(|a, b| b.post.stats.engagement().cmp(&a.post.stats.engagement()))
        }
        SortBy::Trending => {
            results.sort_by(|a, b| trending_weight(&b.post).cmp(&trending_weight(&a.post)))
        }
    }
}
