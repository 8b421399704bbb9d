use std::fmt;

use async_trait::async_trait;

use super::types::{Post, PostSequence};

/// Errors surfaced by the transport session and the post store.
/// Every variant is distinguishable so callers can react (e.g. re-prompt for credentials).
#[derive(Debug)]
pub enum ClientError {
    /// Client could not be constructed (bad base URL, TLS backend failure).
    Config(String),
    /// No response was received (timeout, DNS, connection refused).
    Network(String),
    /// The server answered with a non-2xx status.
    Transport { status: u16, body: String },
    /// A 404 on an id-addressed operation.
    NotFound { id: i64 },
    /// The response body did not decode into the expected shape.
    Malformed(String),
}

impl ClientError {
    /// True when the server rejected the call for lack of (valid) credentials.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, ClientError::Transport { status: 401 | 403, .. })
    }

    /// Specializes a 404 transport failure into `NotFound` for the given id.
    pub(crate) fn for_id(self, id: i64) -> Self {
        match self {
            ClientError::Transport { status: 404, .. } => ClientError::NotFound { id },
            other => other,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "config error: {msg}"),
            ClientError::Network(msg) => write!(f, "network error: {msg}"),
            ClientError::Transport { status, body } => {
                write!(f, "server error (HTTP {status}): {body}")
            }
            ClientError::NotFound { id } => write!(f, "post {id} not found"),
            ClientError::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Remote CRUD surface for posts.
///
/// Operations are independent of each other; nothing here serializes calls.
/// The server is the sole arbiter of authorization and consistency.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetches the whole collection once and hands it back as a forward-only sequence.
    async fn list_posts(&self) -> Result<PostSequence, ClientError>;

    /// Creates a post and returns the server's authoritative copy.
    async fn create_post(&self, title: &str, body: &str) -> Result<Post, ClientError>;

    /// Replaces title and body of an existing post.
    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<Post, ClientError>;

    async fn delete_post(&self, id: i64) -> Result<(), ClientError>;
}
