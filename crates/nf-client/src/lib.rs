pub mod api;
pub mod client;
pub mod error;

pub use api::FeedApi;
pub use client::ApiClient;
pub use error::ClientError;
