//! Client-side application logic for the NewsFeed client: the auth session,
//! the feed pager, route guarding and the controllers behind each screen.

pub mod compose;
pub mod config;
pub mod error;
pub mod follow;
pub mod forms;
pub mod guard;
pub mod pager;
pub mod session;
pub mod views;

pub use config::Config;
pub use error::{ComposeError, FollowError, ValidationError};
pub use guard::{History, Navigation, Route, guard};
pub use pager::{
    FeedPager, FeedSnapshot, PagerCommand, PagerConfig, PagerHandle, ViewportEvent, spawn_pager,
};
pub use session::{AuthSession, SessionState};
