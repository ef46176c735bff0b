use std::collections::HashSet;
use std::time::Duration;

use nf_client::ClientError;
use nf_types::{FeedPage, Post, PostKey};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_millis(1500);
pub const DEFAULT_PROXIMITY_MARGIN_PX: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    /// `limit` sent with every feed request.
    pub page_size: u32,
    /// Minimum wait after a failed fetch before the next attempt.
    pub retry_cooldown: Duration,
    /// How close the sentinel must get to the visible area to trigger a load.
    pub proximity_margin_px: u32,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
            proximity_margin_px: DEFAULT_PROXIMITY_MARGIN_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Ended,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerState {
    /// Accepted posts in first-seen order. Append-only until reset.
    pub posts: Vec<Post>,
    /// Page most recently requested, whether or not it loaded.
    pub page_cursor: u32,
    pub loading: bool,
    pub at_end: bool,
    pub last_error: Option<String>,
    /// Epoch milliseconds before which no fetch may start.
    pub retry_not_before_ms: i64,
    pub seen: HashSet<PostKey>,
}

impl Default for PagerState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            page_cursor: 1,
            loading: false,
            at_end: false,
            last_error: None,
            retry_not_before_ms: 0,
            seen: HashSet::new(),
        }
    }
}

impl PagerState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.at_end {
            Phase::Ended
        } else if self.last_error.is_some() {
            Phase::Failed
        } else if !self.posts.is_empty() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }
}

/// Issued by [`FeedPager::try_begin`]; hand it back to
/// [`FeedPager::complete`] with the fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub page: u32,
    pub generation: u64,
}

/// Why a load trigger was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    AlreadyLoading,
    Ended,
    CoolingDown { until_ms: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended { fresh: usize },
    /// The page brought nothing new.
    Ended,
    Failed { message: String, retry_at_ms: i64 },
    /// Superseded by this pager; not an error.
    Canceled,
    /// Result belongs to a session that has since been reset; ignored.
    Stale,
}

/// Paging state machine.
///
/// `Idle -> Loading -> {Loaded, Ended, Failed}`; `Loaded` and `Failed` go
/// back to `Loading` on the next accepted trigger. `Ended` holds until
/// [`FeedPager::reset`].
///
/// Dedup is global to the pager's lifetime: a post is kept only at the
/// position where its `(id, created_at)` key was first seen. A page made up
/// entirely of already-seen posts counts as end of feed, the same as an
/// empty page, so heavy reordering upstream can end the feed early.
#[derive(Debug, Clone)]
pub struct FeedPager {
    config: PagerConfig,
    state: PagerState,
    generation: u64,
}

impl FeedPager {
    pub fn new(config: PagerConfig) -> Self {
        Self {
            config,
            state: PagerState::default(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Page a proximity trigger should request: one past the last page
    /// requested. A failed page is not requested again.
    pub fn next_page(&self) -> u32 {
        self.state.page_cursor.saturating_add(1)
    }

    pub fn cooling_down(&self, now_ms: i64) -> bool {
        now_ms < self.state.retry_not_before_ms
    }

    /// Drop everything for a new identity. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.state = PagerState::default();
        self.generation += 1;
    }

    pub fn try_begin(&mut self, page: u32, now_ms: i64) -> Result<LoadTicket, Skip> {
        if self.state.loading {
            return Err(Skip::AlreadyLoading);
        }
        if self.state.at_end {
            return Err(Skip::Ended);
        }
        if self.cooling_down(now_ms) {
            return Err(Skip::CoolingDown {
                until_ms: self.state.retry_not_before_ms,
            });
        }

        self.state.loading = true;
        self.state.last_error = None;
        self.state.page_cursor = page;

        Ok(LoadTicket {
            page,
            generation: self.generation,
        })
    }

    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<FeedPage, ClientError>,
        now_ms: i64,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            return LoadOutcome::Stale;
        }

        self.state.loading = false;

        match result {
            Ok(page) => {
                let state = &mut self.state;
                let before = state.posts.len();
                for post in page.posts {
                    if state.seen.insert(post.key()) {
                        state.posts.push(post);
                    }
                }
                let fresh = state.posts.len() - before;

                if fresh == 0 {
                    state.at_end = true;
                    LoadOutcome::Ended
                } else {
                    LoadOutcome::Appended { fresh }
                }
            }
            Err(ClientError::Canceled) => LoadOutcome::Canceled,
            Err(ClientError::RequestFailed(message)) => {
                let message = if message.is_empty() {
                    "Unexpected error".to_string()
                } else {
                    message
                };
                let cooldown = i64::try_from(self.config.retry_cooldown.as_millis())
                    .unwrap_or(i64::MAX);
                let retry_at_ms = now_ms.saturating_add(cooldown);

                self.state.last_error = Some(message.clone());
                self.state.retry_not_before_ms = retry_at_ms;
                LoadOutcome::Failed {
                    message,
                    retry_at_ms,
                }
            }
        }
    }
}
