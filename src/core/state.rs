//! # Application State
//!
//! What the post browser knows about the world. Domain data only; no
//! terminal types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── posts: Vec<Post>          // pages received so far, server order
//! ├── selected: Option<usize>   // highlighted row
//! ├── feed_generation: u64      // pages from other generations are dropped
//! ├── has_more: bool            // feed not yet exhausted
//! ├── is_loading: bool          // a page load was requested
//! ├── current_user: Option      // who we are signed in as
//! ├── status_message: String    // status bar text
//! └── error: Option<String>     // last failure, cleared on success
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use crate::remote::Post;

/// Request the next page once the selection is this close to the end of the list.
pub const LOAD_THRESHOLD: usize = 3;

pub struct App {
    pub posts: Vec<Post>,
    pub selected: Option<usize>,
    pub feed_generation: u64,
    pub has_more: bool,
    pub is_loading: bool,
    pub current_user: Option<String>,
    pub status_message: String,
    pub error: Option<String>,
}

impl App {
    pub fn new(current_user: Option<String>) -> Self {
        Self {
            posts: Vec::new(),
            selected: None,
            feed_generation: 0,
            has_more: true,
            is_loading: false,
            current_user,
            status_message: String::from("Loading posts..."),
            error: None,
        }
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.selected.and_then(|idx| self.posts.get(idx))
    }

    /// Edit and delete are only offered on the signed-in user's own posts.
    pub fn can_modify_selected(&self) -> bool {
        self.selected_post()
            .is_some_and(|post| post.is_owned_by(self.current_user.as_deref()))
    }

    /// True when the selection sits within `LOAD_THRESHOLD` rows of the end
    /// and the feed still has pages.
    pub fn near_end(&self) -> bool {
        if !self.has_more {
            return false;
        }
        match self.selected {
            Some(idx) => idx + LOAD_THRESHOLD >= self.posts.len(),
            None => self.posts.is_empty(),
        }
    }
}
