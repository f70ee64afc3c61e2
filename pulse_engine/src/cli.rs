//! Interactive REPL driving the engine: search, suggestions, pagination,
//! and thread operations against an in-memory sample feed.

use crate::config::PulseConfig;
use crate::history::{SearchHistory, ShareAnalytics};
use crate::models::{Author, Post, PostStats};
use crate::pager::FeedPager;
use crate::reactions::ReactionKind;
use crate::search::{self, SearchFilters, SortBy};
use crate::suggest::{self, NavKey, SuggestClient, SuggestionSession};
use crate::threading::{CommentTree, StaticReplies, ThreadService};
use crate::utils::{mint_post_id, now_utc_iso};
use anyhow::Result;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_cli(config: PulseConfig) -> Result<()> {
    let viewer = Author {
        id: "local".to_string(),
        name: "you".to_string(),
        verified: false,
    };
    let posts = sample_posts();
    let pager = FeedPager::new(posts.clone(), config.page_size, config.load_more_latency());
    let threads = ThreadService::new(sample_replies(&posts), viewer.clone());
    let history = SearchHistory::load(&config.paths.history_path);
    let analytics = ShareAnalytics::load(&config.paths.analytics_path);
    let session = SuggestionSession::new(
        std::sync::Arc::new(SuggestClient::new(config.suggest_api_url.clone())),
        config.debounce(),
        history,
    );

    let mut cli = CliSession {
        config,
        viewer,
        posts,
        pager,
        threads,
        session,
        analytics,
        filters: SearchFilters::default(),
    };

    println!("Pulse CLI ready. Type 'help' for a list of commands.");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("pulse> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        match cli.handle_command(&tokens).await {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => {
                println!("Error: {err:#}");
            }
        }
    }

    Ok(())
}

struct CliSession {
    config: PulseConfig,
    viewer: Author,
    posts: Vec<Post>,
    pager: FeedPager,
    threads: ThreadService<StaticReplies>,
    session: SuggestionSession<SuggestClient>,
    analytics: ShareAnalytics,
    filters: SearchFilters,
}

enum LoopAction {
    Continue,
    Exit,
}

impl CliSession {
    async fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction> {
        let command = tokens[0].as_str();
        match command {
            "help" => self.print_help(),
            "type" => {
                let text = tokens[1..].join(" ");
                self.session.input(&text);
                println!("query: {text:?} (suggestions arrive after the quiet period)");
            }
            "key" => {
                let Some(key) = tokens.get(1).and_then(|raw| parse_key(raw)) else {
                    println!("Usage: key <down|up|enter|esc>");
                    return Ok(LoopAction::Continue);
                };
                if let Some(query) = self.session.handle_key(key) {
                    self.run_search(&query);
                } else {
                    println!("selected: {}", self.session.selected());
                }
            }
            "suggest" => {
                let suggestions = self.session.suggestions();
                if suggestions.is_empty() {
                    println!("(no suggestions)");
                }
                for (index, suggestion) in suggestions.iter().enumerate() {
                    let marker = if index as isize == self.session.selected() {
                        ">"
                    } else {
                        " "
                    };
                    println!(
                        "{marker} {} ({:?}, {:.2})",
                        suggestion.query, suggestion.kind, suggestion.relevance
                    );
                }
            }
            "search" => {
                if tokens.len() < 2 {
                    println!("Usage: search <terms>");
                    return Ok(LoopAction::Continue);
                }
                let query = tokens[1..].join(" ");
                self.session.commit_search(&query);
                self.run_search(&query);
            }
            "more" => {
                if self.pager.load_more().await {
                    println!(
                        "page {} ({} shown)",
                        self.pager.state().current_page,
                        self.pager.displayed().len()
                    );
                } else {
                    println!("nothing more to load");
                }
            }
            "feed" => self.print_feed(),
            "open" => {
                let Some(post) = tokens.get(1).and_then(|id| self.find_post(id)) else {
                    println!("Usage: open <post_id>");
                    return Ok(LoopAction::Continue);
                };
                let data = self.threads.thread_data(&post);
                println!(
                    "{} — {} replies, {} participants, {}% engagement",
                    data.post.content,
                    data.stats.total_replies,
                    data.stats.participants,
                    data.stats.engagement_rate
                );
                print_tree(data.replies.comments(), 0);
            }
            "reply" => {
                if tokens.len() < 3 {
                    println!("Usage: reply <post_id> <text> [parent_comment_id]");
                    return Ok(LoopAction::Continue);
                }
                self.ensure_thread(&tokens[1]);
                match self
                    .threads
                    .add_reply(&tokens[1], &tokens[2], tokens.get(3).map(String::as_str))
                {
                    Some(comment) => println!("added reply {}", comment.id),
                    None => println!("reply not added (unknown post or parent)"),
                }
            }
            "react" => {
                let Some(kind) = tokens.get(2).and_then(|raw| ReactionKind::parse(raw)) else {
                    println!("Usage: react <post_id> <like|love|laugh|wow|sad|angry>");
                    return Ok(LoopAction::Continue);
                };
                self.ensure_thread(&tokens[1]);
                if self.threads.toggle_post_reaction(&tokens[1], kind) {
                    println!("toggled {}", kind.as_str());
                }
            }
            "creact" => {
                if tokens.len() < 4 {
                    println!("Usage: creact <post_id> <comment_id> <like|dislike>");
                    return Ok(LoopAction::Continue);
                }
                let Some(kind) = ReactionKind::parse(&tokens[3]) else {
                    println!("unknown reaction kind");
                    return Ok(LoopAction::Continue);
                };
                report(self
                    .threads
                    .toggle_reply_reaction(&tokens[1], &tokens[2], kind));
            }
            "like" => {
                if tokens.len() < 3 {
                    println!("Usage: like <post_id> <comment_id>");
                    return Ok(LoopAction::Continue);
                }
                report(self.threads.like_reply(&tokens[1], &tokens[2]));
            }
            "collapse" => {
                if tokens.len() < 3 {
                    println!("Usage: collapse <post_id> <comment_id>");
                    return Ok(LoopAction::Continue);
                }
                report(self.threads.toggle_collapse(&tokens[1], &tokens[2]));
            }
            "edit" => {
                if tokens.len() < 4 {
                    println!("Usage: edit <post_id> <comment_id> <text>");
                    return Ok(LoopAction::Continue);
                }
                report(self.threads.update_reply(&tokens[1], &tokens[2], &tokens[3]));
            }
            "delreply" => {
                if tokens.len() < 3 {
                    println!("Usage: delreply <post_id> <comment_id>");
                    return Ok(LoopAction::Continue);
                }
                report(self.threads.delete_reply(&tokens[1], &tokens[2]));
            }
            "new" => {
                if tokens.len() < 2 {
                    println!("Usage: new <text>");
                    return Ok(LoopAction::Continue);
                }
                let post = self.make_post(&tokens[1..].join(" "));
                self.posts.insert(0, post.clone());
                self.pager.create_post(post.clone());
                println!("created {}", post.id);
            }
            "editpost" => {
                if tokens.len() < 3 {
                    println!("Usage: editpost <post_id> <text>");
                    return Ok(LoopAction::Continue);
                }
                let content = tokens[2..].join(" ");
                if let Some(post) = self.posts.iter_mut().find(|post| post.id == tokens[1]) {
                    post.content = content.clone();
                }
                report(self.pager.update_post(&tokens[1], &content));
            }
            "delpost" => {
                if tokens.len() < 2 {
                    println!("Usage: delpost <post_id>");
                    return Ok(LoopAction::Continue);
                }
                self.posts.retain(|post| post.id != tokens[1]);
                report(self.pager.delete_post(&tokens[1]));
            }
            "share" => {
                if tokens.len() < 2 {
                    println!("Usage: share <post_id>");
                    return Ok(LoopAction::Continue);
                }
                self.analytics.record_share(&tokens[1]);
                println!(
                    "shared ({} for this post, {} total)",
                    self.analytics.shares_for(&tokens[1]),
                    self.analytics.total()
                );
            }
            "history" => {
                for entry in self.session.history_entries() {
                    println!("{entry}");
                }
            }
            "sort" => {
                let Some(sort_by) = tokens.get(1).and_then(|raw| SortBy::parse(raw)) else {
                    println!("Usage: sort <relevance|recent|popular|trending>");
                    return Ok(LoopAction::Continue);
                };
                self.filters.sort_by = sort_by;
                println!("sorting by {sort_by:?}");
            }
            "verified" => {
                self.filters.verified = parse_tristate(tokens.get(1));
                println!("verified filter: {:?}", self.filters.verified);
            }
            "media" => {
                self.filters.has_media = parse_tristate(tokens.get(1));
                println!("media filter: {:?}", self.filters.has_media);
            }
            "engagement" => {
                self.filters.min_engagement =
                    tokens.get(1).and_then(|raw| raw.parse::<u64>().ok());
                println!("min engagement: {:?}", self.filters.min_engagement);
            }
            "tag" => {
                if let Some(tag) = tokens.get(1) {
                    self.filters.tags.insert(tag.clone());
                }
                println!("tags: {:?}", self.filters.tags);
            }
            "author" => {
                if let Some(author) = tokens.get(1) {
                    self.filters.authors.insert(author.clone());
                }
                println!("authors: {:?}", self.filters.authors);
            }
            "clearfilters" => {
                let sort_by = self.filters.sort_by;
                self.filters = SearchFilters::default();
                self.filters.sort_by = sort_by;
                println!("filters cleared");
            }
            "exit" | "quit" => return Ok(LoopAction::Exit),
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
        Ok(LoopAction::Continue)
    }

    fn run_search(&mut self, query: &str) {
        let results = search::rank(&self.posts, query, &self.filters);
        suggest::track_search(self.session.provider(), query, results.len());
        println!("{} result(s) for {query:?}", results.len());
        for scored in results.iter().take(5) {
            println!("  [{}] {} — {}", scored.score, scored.post.id, scored.post.content);
        }
        let ranked: Vec<Post> = results.into_iter().map(|scored| scored.post).collect();
        self.pager = FeedPager::new(
            ranked,
            self.config.page_size,
            self.config.load_more_latency(),
        );
    }

    fn print_feed(&self) {
        for post in self.pager.displayed() {
            println!(
                "{} — {} (by {}, {} likes)",
                post.id, post.content, post.author.name, post.stats.likes
            );
        }
        let state = self.pager.state();
        println!(
            "page {} of size {}, more: {}",
            state.current_page, state.page_size, state.has_next_page
        );
    }

    fn find_post(&self, id: &str) -> Option<Post> {
        self.posts.iter().find(|post| post.id == id).cloned()
    }

    fn ensure_thread(&mut self, post_id: &str) {
        if let Some(post) = self.find_post(post_id) {
            self.threads.thread_data(&post);
        }
    }

    fn make_post(&self, content: &str) -> Post {
        Post {
            id: mint_post_id(),
            content: content.to_string(),
            author: self.viewer.clone(),
            tags: Vec::new(),
            stats: PostStats::default(),
            attachments: Vec::new(),
            is_pinned: false,
            created_at: now_utc_iso(),
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  type <text>            feed keystrokes to the suggestion session");
        println!("  key <down|up|enter|esc> navigate/execute suggestions");
        println!("  suggest                 show the current suggestion list");
        println!("  search <terms>          run a ranked search");
        println!("  sort/verified/media/engagement/tag/author/clearfilters");
        println!("  feed | more             show the page / load the next page");
        println!("  open <post>             open a discussion thread");
        println!("  reply <post> <text> [parent]");
        println!("  react <post> <kind>     toggle a post reaction");
        println!("  creact <post> <comment> <like|dislike>");
        println!("  like/collapse/edit/delreply <post> <comment> ...");
        println!("  new/editpost/delpost    write through the pager");
        println!("  share <post> | history  local analytics / search history");
        println!("  exit");
    }
}

fn report(hit: bool) {
    if hit {
        println!("ok");
    } else {
        println!("no match (nothing changed)");
    }
}

fn parse_key(raw: &str) -> Option<NavKey> {
    match raw.to_lowercase().as_str() {
        "down" => Some(NavKey::ArrowDown),
        "up" => Some(NavKey::ArrowUp),
        "enter" => Some(NavKey::Enter),
        "esc" | "escape" => Some(NavKey::Escape),
        _ => None,
    }
}

fn parse_tristate(raw: Option<&String>) -> Option<bool> {
    match raw.map(String::as_str) {
        Some("on") | Some("true") => Some(true),
        Some("off") | Some("false") => Some(false),
        _ => None,
    }
}

/// Twelve-post sample feed sized so the default pagination walk is
/// observable from the REPL.
pub fn sample_posts() -> Vec<Post> {
    let authors = [
        ("ada", "Ada", true),
        ("ferris", "Ferris", true),
        ("mara", "Mara", false),
        ("niko", "Niko", false),
    ];
    let bodies = [
        ("Shipping the new feed ranking pipeline today", vec!["rust", "search"]),
        ("Async runtimes compared, notes inside", vec!["rust", "async"]),
        ("A garden photo thread", vec!["garden"]),
        ("Neural nets explained with spreadsheets", vec!["ai", "ml"]),
        ("Debounce your inputs, your servers will thank you", vec!["ux"]),
        ("Thread trees without pointer aliasing", vec!["rust"]),
        ("What I learned moderating a forum for a year", vec!["community"]),
        ("Benchmarking JSON parsers again", vec!["rust", "perf"]),
        ("On the ethics of engagement metrics", vec!["ai", "community"]),
        ("Pagination is a distributed systems problem", vec!["search"]),
        ("My favorite keyboard navigation patterns", vec!["ux"]),
        ("Release notes: suggestion provider fallback mode", vec!["search"]),
    ];
    bodies
        .iter()
        .enumerate()
        .map(|(index, (content, tags))| {
            let (author_id, author_name, verified) = authors[index % authors.len()];
            Post {
                id: format!("20260801-{index:04}"),
                content: content.to_string(),
                author: Author {
                    id: author_id.to_string(),
                    name: author_name.to_string(),
                    verified,
                },
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
                stats: PostStats {
                    likes: (index as u64 * 37) % 400,
                    replies: (index as u64 * 11) % 60,
                    shares: (index as u64 * 7) % 90,
                    views: 500 + index as u64 * 120,
                },
                attachments: Vec::new(),
                is_pinned: index == 0,
                created_at: now_utc_iso(),
            }
        })
        .collect()
}

/// Seeds the first sample post with a small nested discussion.
pub fn sample_replies(posts: &[Post]) -> StaticReplies {
    let mut replies = StaticReplies::default();
    let Some(first) = posts.first() else {
        return replies;
    };
    let mut tree = CommentTree::default();
    let mara = Author {
        id: "mara".to_string(),
        name: "Mara".to_string(),
        verified: false,
    };
    let niko = Author {
        id: "niko".to_string(),
        name: "Niko".to_string(),
        verified: false,
    };
    if let Some(top) = tree.add_comment(mara, "Congrats on the launch!", Vec::new(), None) {
        tree.add_comment(niko, "Seconded, the ranking feels snappier", Vec::new(), Some(&top.id));
    }
    replies.insert(&first.id, tree.comments().to_vec());
    replies
}

fn print_tree(comments: &[crate::models::Comment], indent: usize) {
    for comment in comments {
        let pad = "  ".repeat(indent);
        let collapsed = if comment.is_collapsed { " [collapsed]" } else { "" };
        let edited = if comment.is_edited { " (edited)" } else { "" };
        println!(
            "{pad}{} {}: {}{}{}",
            comment.id, comment.author.name, comment.content, edited, collapsed
        );
        if !comment.is_collapsed {
            print_tree(&comment.replies, indent + 1);
        }
    }
}
