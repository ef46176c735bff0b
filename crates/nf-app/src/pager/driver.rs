use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nf_client::{ClientError, FeedApi};
use nf_types::{Clock, FeedPage, Post};

use crate::session::SessionState;

use super::state::{FeedPager, LoadOutcome, LoadTicket, PagerConfig, Phase};
use super::viewport::{ProximityObserver, ViewportEvent};

/// Messages on the pager's single-consumer queue.
#[derive(Debug, Clone)]
pub enum PagerCommand {
    Viewport(ViewportEvent),
    /// Start over from page 1 with the current identity.
    Refresh,
    Shutdown,
}

/// What the feed view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub posts: Vec<Post>,
    pub page: u32,
    pub loading: bool,
    pub at_end: bool,
    pub error: Option<String>,
    pub phase: Phase,
}

impl FeedSnapshot {
    fn of(pager: &FeedPager) -> Self {
        let state = pager.state();
        Self {
            posts: state.posts.clone(),
            page: state.page_cursor,
            loading: state.loading,
            at_end: state.at_end,
            error: state.last_error.clone(),
            phase: state.phase(),
        }
    }

    /// Nothing to show, nothing in flight, nothing wrong.
    pub fn is_empty_feed(&self) -> bool {
        self.posts.is_empty() && !self.loading && self.error.is_none()
    }
}

/// Owner-side handle to a running pager task.
pub struct PagerHandle {
    commands: mpsc::UnboundedSender<PagerCommand>,
    snapshots: watch::Receiver<FeedSnapshot>,
    task: JoinHandle<()>,
}

impl PagerHandle {
    /// Returns `false` once the task has stopped.
    pub fn send(&self, command: PagerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn viewport(&self, event: ViewportEvent) -> bool {
        self.send(PagerCommand::Viewport(event))
    }

    pub fn refresh(&self) -> bool {
        self.send(PagerCommand::Refresh)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `pred`. `None` if the task
    /// stopped first.
    pub async fn wait_for(&mut self, pred: impl FnMut(&FeedSnapshot) -> bool) -> Option<FeedSnapshot> {
        self.snapshots.wait_for(pred).await.ok().map(|s| s.clone())
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(PagerCommand::Shutdown);
        let _ = self.task.await;
    }
}

struct FetchDone {
    ticket: LoadTicket,
    result: Result<FeedPage, ClientError>,
}

struct PagerTask {
    api: Arc<dyn FeedApi>,
    clock: Arc<dyn Clock>,
    pager: FeedPager,
    observer: ProximityObserver,
    token: Option<String>,
    inflight: Option<CancellationToken>,
    done_tx: mpsc::UnboundedSender<FetchDone>,
    snapshots: watch::Sender<FeedSnapshot>,
}

/// Run a feed pager on the current tokio runtime.
///
/// The pager follows `session`: every identity change resets it, cancels the
/// in-flight fetch and, when signed in, loads page 1. Fetches are spawned one
/// at a time; completions from before a reset are discarded.
pub fn spawn_pager(
    api: Arc<dyn FeedApi>,
    clock: Arc<dyn Clock>,
    config: PagerConfig,
    session: watch::Receiver<SessionState>,
) -> PagerHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let (snapshots_tx, snapshots_rx) = watch::channel(FeedSnapshot::default());

    let task = PagerTask {
        api,
        clock,
        observer: ProximityObserver::new(config.proximity_margin_px),
        pager: FeedPager::new(config),
        token: None,
        inflight: None,
        done_tx,
        snapshots: snapshots_tx,
    };

    let task = tokio::spawn(task.run(commands_rx, done_rx, session));

    PagerHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        task,
    }
}

impl PagerTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PagerCommand>,
        mut done: mpsc::UnboundedReceiver<FetchDone>,
        mut session: watch::Receiver<SessionState>,
    ) {
        let token = session.borrow_and_update().token.clone();
        self.identity_changed(token);
        self.publish();

        let mut session_open = true;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(PagerCommand::Viewport(event)) => self.on_viewport(event),
                    Some(PagerCommand::Refresh) => {
                        let token = self.token.clone();
                        self.identity_changed(token);
                    }
                    Some(PagerCommand::Shutdown) | None => break,
                },
                changed = session.changed(), if session_open => {
                    if changed.is_err() {
                        session_open = false;
                        continue;
                    }
                    let token = session.borrow_and_update().token.clone();
                    if token != self.token {
                        self.identity_changed(token);
                    }
                }
                Some(finished) = done.recv() => self.on_fetch_done(finished),
            }
            self.publish();
        }

        if let Some(cancel) = self.inflight.take() {
            cancel.cancel();
        }
        debug!("feed pager stopped");
    }

    fn identity_changed(&mut self, token: Option<String>) {
        if let Some(cancel) = self.inflight.take() {
            cancel.cancel();
        }
        self.pager.reset();
        self.token = token;
        info!(
            signed_in = self.token.is_some(),
            generation = self.pager.generation(),
            "feed pager reset"
        );

        if self.token.is_some() {
            self.start_load(1);
        }
        self.resync();
    }

    fn on_viewport(&mut self, event: ViewportEvent) {
        let cooling = self.pager.cooling_down(self.clock.now_ms());
        if self.observer.handle(event, cooling) {
            self.start_load(self.pager.next_page());
        }
        self.resync();
    }

    fn on_fetch_done(&mut self, finished: FetchDone) {
        let FetchDone { ticket, result } = finished;
        let outcome = self.pager.complete(ticket, result, self.clock.now_ms());

        if outcome != LoadOutcome::Stale {
            self.inflight = None;
        }
        match &outcome {
            LoadOutcome::Appended { fresh } => {
                debug!(page = ticket.page, fresh, "feed page loaded")
            }
            LoadOutcome::Ended => info!(page = ticket.page, "feed reached the end"),
            LoadOutcome::Failed {
                message,
                retry_at_ms,
            } => warn!(page = ticket.page, retry_at_ms, "feed page failed: {}", message),
            LoadOutcome::Canceled => debug!(page = ticket.page, "feed fetch canceled"),
            LoadOutcome::Stale => debug!(page = ticket.page, "discarding stale feed page"),
        }

        self.resync();
    }

    fn resync(&mut self) {
        let state = self.pager.state();
        let cooling = self.pager.cooling_down(self.clock.now_ms());
        if self.observer.sync(state.loading, state.at_end, cooling) {
            self.start_load(self.pager.next_page());
        }
    }

    fn start_load(&mut self, page: u32) {
        let Some(token) = self.token.clone() else {
            return;
        };

        let ticket = match self.pager.try_begin(page, self.clock.now_ms()) {
            Ok(ticket) => ticket,
            Err(skip) => {
                debug!(page, ?skip, "feed load skipped");
                return;
            }
        };

        if let Some(previous) = self.inflight.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        self.inflight = Some(cancel.clone());

        let api = self.api.clone();
        let done_tx = self.done_tx.clone();
        let limit = self.pager.config().page_size;
        debug!(page, limit, "fetching feed page");

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(ClientError::Canceled),
                result = api.feed(&token, ticket.page, limit) => result,
            };
            let _ = done_tx.send(FetchDone { ticket, result });
        });
    }

    fn publish(&self) {
        let next = FeedSnapshot::of(&self.pager);
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
