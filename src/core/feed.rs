//! # Paginated Feed
//!
//! Turns one `list_posts()` fetch into page-at-a-time batches of
//! [`PAGE_SIZE`] posts.
//!
//! ```text
//!            start_feed()
//!   any ───────────────────▶ Idle ──load_next_page()──▶ Fetching
//!                             ▲                            │
//!                             └──────── batch, more ───────┤
//!                                                          ▼
//!                                     Exhausted ◀── empty, !more
//! ```
//!
//! A second `load_next_page()` while one is in flight returns `Ok(None)`
//! immediately instead of waiting. The flight flag belongs to this
//! controller only, so two feeds never block each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::remote::{ClientError, Post, PostSequence, PostStore};

pub const PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Fetching,
    Exhausted,
}

/// One batch of a feed. `more` is false once the feed has nothing left;
/// that batch is always empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub posts: Vec<Post>,
    pub more: bool,
    /// Feed generation the batch was taken from.
    pub generation: u64,
}

enum Source {
    /// Not fetched yet; the first page load pulls the collection.
    Unfetched,
    Fetched(PostSequence),
}

struct Cursor {
    generation: u64,
    source: Source,
    exhausted: bool,
}

impl Cursor {
    fn fresh(generation: u64) -> Self {
        Self {
            generation,
            source: Source::Unfetched,
            exhausted: false,
        }
    }

    /// Next batch, or `None` while the collection has not been fetched.
    fn take_page(&mut self, page_size: usize) -> Option<Page> {
        if self.exhausted {
            return Some(Page {
                posts: Vec::new(),
                more: false,
                generation: self.generation,
            });
        }
        let Source::Fetched(seq) = &mut self.source else {
            return None;
        };
        let posts: Vec<Post> = seq.by_ref().take(page_size).collect();
        let more = !posts.is_empty();
        if !more {
            self.exhausted = true;
        }
        Some(Page {
            posts,
            more,
            generation: self.generation,
        })
    }
}

/// Releases the flight flag on every exit path, including errors and drops
/// of the enclosing future.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| FlightGuard(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FeedController {
    store: Arc<dyn PostStore>,
    page_size: usize,
    in_flight: AtomicBool,
    cursor: Mutex<Cursor>,
}

impl FeedController {
    /// Creates a controller whose first feed (generation 0) is ready to load.
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self::with_page_size(store, PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn PostStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            in_flight: AtomicBool::new(false),
            cursor: Mutex::new(Cursor::fresh(0)),
        }
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FeedState {
        if self.in_flight.load(Ordering::Acquire) {
            FeedState::Fetching
        } else if self.lock_cursor().exhausted {
            FeedState::Exhausted
        } else {
            FeedState::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.lock_cursor().generation
    }

    /// Abandons the current feed, buffered posts included, and returns the new
    /// generation. A fetch still in flight for the old feed is discarded when it lands.
    ///
    /// No request is made here. The collection is snapshotted by the first
    /// `load_next_page()` of the new generation.
    pub fn start_feed(&self) -> u64 {
        let mut cursor = self.lock_cursor();
        let generation = cursor.generation + 1;
        *cursor = Cursor::fresh(generation);
        info!("Feed restarted (generation {})", generation);
        generation
    }

    /// Loads the next batch.
    ///
    /// Returns `Ok(None)` without touching the network when another load is
    /// in flight. A fetch that lands after `start_feed()` is dropped and the
    /// newer feed is fetched instead. On error the cursor is left as it was,
    /// so retrying is safe.
    pub async fn load_next_page(&self) -> Result<Option<Page>, ClientError> {
        let Some(_flight) = FlightGuard::try_acquire(&self.in_flight) else {
            debug!("Page load already in flight; skipping");
            return Ok(None);
        };

        loop {
            let generation = {
                let mut cursor = self.lock_cursor();
                if let Some(page) = cursor.take_page(self.page_size) {
                    debug!(
                        "Served {} posts from buffer (generation {}, more={})",
                        page.posts.len(),
                        page.generation,
                        page.more
                    );
                    return Ok(Some(page));
                }
                cursor.generation
            };

            let posts = self.store.list_posts().await?;

            let mut cursor = self.lock_cursor();
            if cursor.generation != generation {
                info!(
                    "Dropping fetch for generation {} (feed is now at {})",
                    generation, cursor.generation
                );
                continue;
            }
            cursor.source = Source::Fetched(posts);
            return Ok(cursor.take_page(self.page_size));
        }
    }
}
