pub mod client;
pub mod session;
pub mod store;
pub mod types;

pub use client::PostClient;
pub use session::{Decoded, Session};
pub use store::{ClientError, PostStore};
pub use types::{MAX_BODY_LEN, MAX_TITLE_LEN, Post, PostSequence, Timestamp};
