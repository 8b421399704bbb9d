//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::core::state::App;
use crate::remote::{ClientError, Post, PostSequence, PostStore};

/// `n` posts with ids `1..=n`, newest first like the server returns them.
pub fn sample_posts(n: usize) -> Vec<Post> {
    (1..=n as i64)
        .map(|id| Post {
            id,
            author: if id % 2 == 0 { "alice" } else { "bob" }.to_string(),
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                - chrono::Duration::minutes(id),
            title: format!("Post {id}"),
            body: format!("Body of post {id}"),
        })
        .collect()
}

/// In-memory `PostStore` with a list-call counter, an optional gate that
/// holds `list_posts` open, and one-shot failure injection.
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    gate: Option<Semaphore>,
    failure: Mutex<Option<ClientError>>,
}

impl MemoryStore {
    pub fn new(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) as usize + 1;
        Self {
            posts: Mutex::new(posts),
            next_id: AtomicUsize::new(next_id),
            list_calls: AtomicUsize::new(0),
            gate: None,
            failure: Mutex::new(None),
        }
    }

    /// Like `new`, but `list_posts` blocks until `open_gate` is called.
    pub fn gated(posts: Vec<Post>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(posts)
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn replace_all(&self, posts: Vec<Post>) {
        *self.posts.lock().unwrap() = posts;
    }

    /// The next store call of any kind fails with `err`.
    pub fn fail_next(&self, err: ClientError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    fn take_failure(&self) -> Result<(), ClientError> {
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<PostSequence, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            // Permit goes straight back so later calls pass too
            let _permit = gate.acquire().await.expect("gate closed");
        }
        self.take_failure()?;
        Ok(PostSequence::new(self.posts.lock().unwrap().clone()))
    }

    async fn create_post(&self, title: &str, body: &str) -> Result<Post, ClientError> {
        self.take_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let post = Post {
            id,
            author: "alice".to_string(),
            created: Utc::now(),
            title: title.to_string(),
            body: body.to_string(),
        };
        self.posts.lock().unwrap().insert(0, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<Post, ClientError> {
        self.take_failure()?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ClientError::NotFound { id })?;
        post.title = title.to_string();
        post.body = body.to_string();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        self.take_failure()?;
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(ClientError::NotFound { id });
        }
        Ok(())
    }
}

/// Creates a test App with `alice` signed in.
pub fn test_app() -> App {
    App::new(Some("alice".to_string()))
}
