//! Test tooling shared by the workspace: an in-process mock of the feed API,
//! a scripted [`nf_client::FeedApi`] and a hand-driven clock.

pub mod backend;
pub mod clock;
pub mod scripted;

pub use backend::{FeedShape, MockBackend};
pub use clock::ManualClock;
pub use scripted::{Call, ScriptedApi, page_of, post};
