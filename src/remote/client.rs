//! HTTP-backed [`PostStore`] for a Flaskr-style blog server.
//!
//! Wire contract:
//! - `GET    /posts`       → JSON array of posts
//! - `POST   /posts`       `{title, body}` → post
//! - `PUT    /posts/{id}`  `{title, body}` → post
//! - `DELETE /posts/{id}`  → empty 2xx

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Method;
use serde_json::{Value, json};

use crate::core::config::ResolvedConfig;
use crate::remote::session::Session;
use crate::remote::{ClientError, Post, PostSequence, PostStore};

#[derive(Debug, Default, Clone)]
struct AuthState {
    authenticated: bool,
    username: Option<String>,
}

pub struct PostClient {
    session: Session,
    auth: RwLock<AuthState>,
}

impl PostClient {
    /// Wraps a session. Starts unauthenticated.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            auth: RwLock::new(AuthState::default()),
        }
    }

    /// Builds a client from resolved config, authenticating when both
    /// username and password are known.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ClientError> {
        let client = Self::new(Session::new(config.base_url.clone(), config.timeout)?);
        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            client.authenticate(user, password);
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        self.session.base_url()
    }

    /// Attaches credentials to every later request. No round-trip happens here:
    /// bad credentials show up as a 401/403 on the first authorized call.
    pub fn authenticate(&self, username: &str, password: &str) {
        self.session.set_credentials(username, password);
        let mut auth = self.auth.write().unwrap_or_else(PoisonError::into_inner);
        auth.authenticated = true;
        auth.username = Some(username.to_string());
        info!("Credentials set for user {}", username);
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
    }

    pub fn current_user(&self) -> Option<String> {
        self.auth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .username
            .clone()
    }
}

fn draft(title: &str, body: &str) -> Value {
    json!({ "title": title, "body": body })
}

#[async_trait]
impl PostStore for PostClient {
    async fn list_posts(&self) -> Result<PostSequence, ClientError> {
        debug!("Fetching posts");
        let payload = self
            .session
            .request(Method::GET, "/posts", None)
            .await?
            .into_json()?;

        let Value::Array(items) = payload else {
            return Err(ClientError::Malformed(format!(
                "expected a JSON array of posts, got {payload}"
            )));
        };
        let posts = items
            .iter()
            .map(Post::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        info!("Got {} posts", posts.len());
        Ok(PostSequence::new(posts))
    }

    async fn create_post(&self, title: &str, body: &str) -> Result<Post, ClientError> {
        debug!("Creating new post");
        let payload = self
            .session
            .request(Method::POST, "/posts", Some(&draft(title, body)))
            .await?
            .into_json()?;
        let post = Post::from_value(&payload)?;
        info!("New post created with ID {}", post.id);
        Ok(post)
    }

    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<Post, ClientError> {
        debug!("Updating post with ID {}", id);
        let payload = self
            .session
            .request(Method::PUT, &format!("/posts/{id}"), Some(&draft(title, body)))
            .await
            .map_err(|e| e.for_id(id))?
            .into_json()?;
        let post = Post::from_value(&payload)?;
        info!("Post with ID {} updated", post.id);
        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        debug!("Deleting post with ID {}", id);
        self.session
            .request(Method::DELETE, &format!("/posts/{id}"), None)
            .await
            .map_err(|e| e.for_id(id))?;
        info!("Post with ID {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resolved(username: Option<&str>, password: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: Some(Duration::from_secs(5)),
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_new_client_is_unauthenticated() {
        let client = PostClient::new(Session::new("http://127.0.0.1:5000", None).unwrap());
        assert!(!client.is_authenticated());
        assert_eq!(client.current_user(), None);
    }

    #[test]
    fn test_authenticate_sets_observable_state() {
        let client = PostClient::new(Session::new("http://127.0.0.1:5000", None).unwrap());
        client.authenticate("alice", "secret");
        assert!(client.is_authenticated());
        assert_eq!(client.current_user().as_deref(), Some("alice"));

        client.authenticate("bob", "hunter2");
        assert_eq!(client.current_user().as_deref(), Some("bob"));
    }

    #[test]
    fn test_from_config_authenticates_only_with_full_credentials() {
        let full = PostClient::from_config(&resolved(Some("alice"), Some("pw"))).unwrap();
        assert!(full.is_authenticated());

        let partial = PostClient::from_config(&resolved(Some("alice"), None)).unwrap();
        assert!(!partial.is_authenticated());
        assert_eq!(partial.base_url(), "http://127.0.0.1:5000");
    }
}
