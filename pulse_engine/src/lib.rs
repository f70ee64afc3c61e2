pub mod cli;
pub mod config;
pub mod history;
pub mod models;
pub mod pager;
pub mod reactions;
pub mod search;
pub mod suggest;
pub mod telemetry;
pub mod threading;
pub mod utils;

pub use models::{Author, Comment, Post, PostStats, Suggestion, SuggestionKind};
pub use reactions::{ReactionKind, ReactionSet};
pub use search::{rank, ScoredPost, SearchFilters, SortBy};
pub use suggest::{NavKey, SuggestClient, SuggestionProvider, SuggestionSession};
pub use threading::{CommentTree, ThreadData, ThreadService};
