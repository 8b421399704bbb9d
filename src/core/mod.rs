//! # Core Application Logic
//!
//! The feed controller plus the browser's state and reducer.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • FeedController       │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    CLI     │      │   remote   │
//!     │  Adapter   │      │ (main.rs)  │      │ PostStore  │
//!     │ (ratatui)  │      │            │      │  (HTTP)    │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`feed`]: `FeedController`, page-at-a-time traversal with a single-flight guard
//! - [`state`]: The `App` struct, everything the browser shows
//! - [`action`]: The `Action` enum and `update()` reducer
//! - [`config`]: Settings file, env and CLI resolution

pub mod action;
pub mod config;
pub mod feed;
pub mod state;

pub use feed::{FeedController, FeedState, PAGE_SIZE, Page};
