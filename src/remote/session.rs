//! Long-lived HTTP session with optional basic-auth credentials.
//!
//! Every call comes back as either a decoded payload or a classified
//! [`ClientError`]: no response → `Network`, non-2xx → `Transport`,
//! undecodable 2xx body → `Malformed`.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use log::{debug, warn};
use reqwest::Method;
use serde_json::Value;

use super::store::ClientError;

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    Empty,
}

impl Decoded {
    /// The JSON payload, or `Malformed` if the server sent nothing.
    pub fn into_json(self) -> Result<Value, ClientError> {
        match self {
            Decoded::Json(value) => Ok(value),
            Decoded::Empty => Err(ClientError::Malformed(
                "expected a JSON body, got an empty response".to_string(),
            )),
        }
    }
}

pub struct Session {
    base_url: String,
    client: reqwest::Client,
    credentials: RwLock<Option<Credentials>>,
}

impl Session {
    /// Creates a session rooted at `base_url`. `timeout` bounds each whole request.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            credentials: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores credentials for every later request. Does not contact the server.
    pub fn set_credentials(&self, username: &str, password: &str) {
        let mut slot = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    pub fn username(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.username.clone())
    }

    /// Issues one request. The network round-trip is the only suspension point.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Decoded, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method.clone(), &url);
        // Clone out of the lock so it isn't held across the await
        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(creds) = credentials {
            builder = builder.basic_auth(creds.username, Some(creds.password));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("{} {} failed: {} - {}", method, url, status.as_u16(), body);
            return Err(ClientError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Decoded::Empty);
        }
        serde_json::from_slice(&bytes)
            .map(Decoded::Json)
            .map_err(|e| ClientError::Malformed(e.to_string()))
    }
}
