//! # Actions
//!
//! Everything that can happen in the post browser becomes an `Action`.
//! User scrolls down? That's `Action::SelectNext`.
//! A page arrives from a worker task? That's `Action::PageLoaded(page)`.
//!
//! The `update()` function applies an action to the state and returns the
//! `Effect` the adapter should carry out. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  Effect
//! ```
//!
//! This is also where the in-memory post list is reconciled with the
//! authoritative copies returned by the server.

use log::debug;

use crate::core::feed::Page;
use crate::core::state::App;
use crate::remote::Post;

#[derive(Debug)]
pub enum Action {
    Quit,
    /// User asked for a fresh feed.
    Refresh,
    SelectNext,
    SelectPrev,
    /// The feed controller was restarted at this generation.
    FeedRestarted(u64),
    PageLoaded(Page),
    /// A load request was collapsed into one already in flight.
    PageSkipped,
    LoadFailed { message: String, reauth: bool },
    Authenticated(String),
    PostCreated(Post),
    PostUpdated(Post),
    PostDeleted(i64),
    MutationFailed { message: String, reauth: bool },
}

/// Side effect requested by `update`, executed by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    RestartFeed,
    LoadNextPage,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Quit => Effect::Quit,
        Action::Refresh => {
            app.status_message = String::from("Refreshing...");
            Effect::RestartFeed
        }
        Action::FeedRestarted(generation) => {
            app.posts.clear();
            app.selected = None;
            app.feed_generation = generation;
            app.has_more = true;
            app.error = None;
            request_page(app)
        }
        Action::SelectNext => {
            if app.posts.is_empty() {
                return Effect::None;
            }
            let last = app.posts.len() - 1;
            app.selected = Some(app.selected.map_or(0, |idx| (idx + 1).min(last)));
            maybe_load_more(app)
        }
        Action::SelectPrev => {
            if let Some(idx) = app.selected {
                app.selected = Some(idx.saturating_sub(1));
            }
            Effect::None
        }
        Action::PageLoaded(page) => {
            if page.generation != app.feed_generation {
                debug!(
                    "Ignoring page from generation {} (showing {})",
                    page.generation, app.feed_generation
                );
                return Effect::None;
            }
            app.is_loading = false;
            app.has_more = page.more;
            app.posts.extend(page.posts);
            if app.selected.is_none() && !app.posts.is_empty() {
                app.selected = Some(0);
            }
            app.status_message = if app.has_more {
                format!("{} posts loaded", app.posts.len())
            } else {
                format!("{} posts (end of feed)", app.posts.len())
            };
            maybe_load_more(app)
        }
        Action::PageSkipped => Effect::None,
        Action::LoadFailed { message, reauth } => {
            app.is_loading = false;
            app.status_message = failure_status(reauth);
            app.error = Some(message);
            Effect::None
        }
        Action::Authenticated(user) => {
            app.status_message = format!("Signed in as {user}");
            app.current_user = Some(user);
            app.error = None;
            Effect::None
        }
        Action::PostCreated(post) => {
            app.status_message = format!("Created post {}", post.id);
            app.posts.insert(0, post);
            app.selected = Some(0);
            app.error = None;
            Effect::None
        }
        Action::PostUpdated(post) => {
            app.status_message = format!("Updated post {}", post.id);
            if let Some(slot) = app.posts.iter_mut().find(|p| p.id == post.id) {
                *slot = post;
            }
            app.error = None;
            Effect::None
        }
        Action::PostDeleted(id) => {
            app.posts.retain(|p| p.id != id);
            app.selected = match app.selected {
                _ if app.posts.is_empty() => None,
                Some(idx) => Some(idx.min(app.posts.len() - 1)),
                None => None,
            };
            app.status_message = format!("Deleted post {id}");
            app.error = None;
            Effect::None
        }
        Action::MutationFailed { message, reauth } => {
            app.status_message = failure_status(reauth);
            app.error = Some(message);
            Effect::None
        }
    }
}

fn request_page(app: &mut App) -> Effect {
    app.is_loading = true;
    Effect::LoadNextPage
}

fn maybe_load_more(app: &mut App) -> Effect {
    if app.near_end() {
        request_page(app)
    } else {
        Effect::None
    }
}

fn failure_status(reauth: bool) -> String {
    if reauth {
        String::from("Not authorized: press l to sign in")
    } else {
        String::from("Request failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_posts, test_app};

    fn page(posts: Vec<Post>, more: bool, generation: u64) -> Page {
        Page {
            posts,
            more,
            generation,
        }
    }

    #[test]
    fn test_refresh_restarts_then_loads() {
        let mut app = test_app();
        app.posts = sample_posts(3);
        assert_eq!(update(&mut app, Action::Refresh), Effect::RestartFeed);

        let effect = update(&mut app, Action::FeedRestarted(4));
        assert_eq!(effect, Effect::LoadNextPage);
        assert!(app.posts.is_empty());
        assert_eq!(app.feed_generation, 4);
        assert!(app.is_loading);
    }

    #[test]
    fn test_page_from_old_generation_is_ignored() {
        let mut app = test_app();
        update(&mut app, Action::FeedRestarted(2));

        let effect = update(&mut app, Action::PageLoaded(page(sample_posts(15), true, 1)));
        assert_eq!(effect, Effect::None);
        assert!(app.posts.is_empty());
        assert!(app.is_loading);
    }

    #[test]
    fn test_pages_append_in_order() {
        let mut app = test_app();
        update(&mut app, Action::FeedRestarted(1));
        let all = sample_posts(20);

        update(&mut app, Action::PageLoaded(page(all[..15].to_vec(), true, 1)));
        assert_eq!(app.selected, Some(0));
        update(&mut app, Action::PageLoaded(page(all[15..].to_vec(), true, 1)));
        let ids: Vec<i64> = app.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_scrolling_near_end_requests_next_page() {
        let mut app = test_app();
        update(&mut app, Action::FeedRestarted(1));
        update(&mut app, Action::PageLoaded(page(sample_posts(15), true, 1)));

        app.selected = Some(10);
        assert_eq!(update(&mut app, Action::SelectNext), Effect::None);
        assert_eq!(update(&mut app, Action::SelectNext), Effect::LoadNextPage);
        // Bursts keep asking; the feed controller collapses them
        assert_eq!(update(&mut app, Action::SelectNext), Effect::LoadNextPage);
        assert_eq!(update(&mut app, Action::PageSkipped), Effect::None);
    }

    #[test]
    fn test_end_of_feed_stops_requests() {
        let mut app = test_app();
        update(&mut app, Action::FeedRestarted(1));
        update(&mut app, Action::PageLoaded(page(sample_posts(3), true, 1)));
        // Short list: still near the end, so the loader asks again
        assert!(app.is_loading);
        let effect = update(&mut app, Action::PageLoaded(page(Vec::new(), false, 1)));
        assert_eq!(effect, Effect::None);
        assert!(!app.has_more);
        assert_eq!(update(&mut app, Action::SelectNext), Effect::None);
        assert!(app.status_message.contains("end of feed"));
    }

    #[test]
    fn test_mutations_reconcile_list() {
        let mut app = test_app();
        app.posts = sample_posts(3);
        app.selected = Some(2);

        let mut edited = app.posts[1].clone();
        edited.title = "Edited".to_string();
        update(&mut app, Action::PostUpdated(edited));
        assert_eq!(app.posts[1].title, "Edited");

        update(&mut app, Action::PostDeleted(3));
        assert_eq!(app.posts.len(), 2);
        assert_eq!(app.selected, Some(1));

        let mut created = sample_posts(1).remove(0);
        created.id = 99;
        update(&mut app, Action::PostCreated(created));
        assert_eq!(app.posts[0].id, 99);
        assert_eq!(app.selected, Some(0));
    }

    #[test]
    fn test_deleting_last_post_clears_selection() {
        let mut app = test_app();
        app.posts = sample_posts(1);
        app.selected = Some(0);
        update(&mut app, Action::PostDeleted(1));
        assert_eq!(app.selected, None);
    }

    #[test]
    fn test_auth_failure_prompts_sign_in() {
        let mut app = test_app();
        update(
            &mut app,
            Action::MutationFailed {
                message: "server error (HTTP 401)".to_string(),
                reauth: true,
            },
        );
        assert!(app.status_message.contains("sign in"));
        assert!(app.error.is_some());

        update(&mut app, Action::Authenticated("bob".to_string()));
        assert_eq!(app.current_user.as_deref(), Some("bob"));
        assert!(app.error.is_none());
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
