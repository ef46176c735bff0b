pub mod api;
pub mod clock;
pub mod models;
pub mod normalize;

pub use clock::{Clock, SystemClock};
pub use models::{FeedPage, Post, PostKey, UserLite};
