//! Incremental feed loading.
//!
//! [`FeedPager`] is the synchronous state machine (paging, dedup, end
//! detection, cool-down). [`ProximityObserver`] stands in for the viewport
//! intersection primitive. [`spawn_pager`] wires both to the API on a tokio
//! task with single-flight cancellation.

mod driver;
mod state;
mod viewport;

pub use driver::{FeedSnapshot, PagerCommand, PagerHandle, spawn_pager};
pub use state::{FeedPager, LoadOutcome, LoadTicket, PagerConfig, PagerState, Phase, Skip};
pub use viewport::{ProximityObserver, ViewportEvent};
