use async_trait::async_trait;

use nf_types::api::{Ack, LoginResponse, RegisterResponse};
use nf_types::{FeedPage, Post};

use crate::error::ClientError;

/// The backend operations the client needs. [`crate::ApiClient`] is the real
/// implementation; tests substitute scripted ones.
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse, ClientError>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError>;

    async fn create_post(&self, token: &str, content: &str) -> Result<Post, ClientError>;

    /// Duplicate follows are the server's concern.
    async fn follow(&self, token: &str, user_id: i64) -> Result<Ack, ClientError>;

    async fn unfollow(&self, token: &str, user_id: i64) -> Result<Ack, ClientError>;

    /// Fetch and normalize one feed page.
    async fn feed(&self, token: &str, page: u32, limit: u32) -> Result<FeedPage, ClientError>;
}
