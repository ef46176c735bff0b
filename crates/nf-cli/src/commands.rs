use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use nf_app::compose::{Composer, counter};
use nf_app::follow::{FollowPanel, NoticeKind};
use nf_app::forms::AuthForm;
use nf_app::views::{footer, navbar, render_post};
use nf_app::{
    AuthSession, ComposeError, Config, FeedSnapshot, Navigation, PagerHandle, Route, ViewportEvent,
    guard, spawn_pager,
};
use nf_client::{ApiClient, FeedApi};
use nf_store::{Database, TokenStore};
use nf_types::{Clock, SystemClock};

const NOT_SIGNED_IN: &str = "Not signed in. Run `nf login <username> <password>` first.";
const NO_API_URL: &str = "No API URL configured. Set NF_API_URL or pass --api-url.";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything one CLI invocation needs, wired once.
pub struct App {
    config: Config,
    api: Arc<ApiClient>,
    clock: Arc<SystemClock>,
    session: AuthSession,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        let db = Database::open(&config.store_path)
            .with_context(|| format!("opening token store at {}", config.store_path.display()))?;
        let api = Arc::new(ApiClient::new(config.api_url.clone()));
        let session = AuthSession::new(api.clone(), TokenStore::new(Arc::new(db)));
        info!(api_url = %config.api_url, "nf ready");
        Ok(Self {
            config,
            api,
            clock: Arc::new(SystemClock),
            session,
        })
    }

    /// The token, if the guard lets `route` render.
    fn require(&self, route: Route) -> Option<String> {
        match guard(&self.session.snapshot(), route) {
            Navigation::Render(_) => self.session.token(),
            Navigation::Redirect { to, .. } => {
                debug!(from = %route, to = %to, "redirected");
                eprintln!("{}", NOT_SIGNED_IN);
                None
            }
        }
    }

    fn api_configured(&self) -> bool {
        if self.config.api_url.is_empty() {
            eprintln!("{}", NO_API_URL);
            return false;
        }
        true
    }

    pub async fn register(&self, username: String, password: String) -> bool {
        if !self.api_configured() {
            return false;
        }
        let mut form = AuthForm::new(username, password);
        match form.submit_register(&self.session).await {
            Some(_) => {
                println!("Welcome, {}! You are signed in.", form.username);
                true
            }
            None => {
                eprintln!("{}", form.error.as_deref().unwrap_or("Username and password are required"));
                false
            }
        }
    }

    pub async fn login(&self, username: String, password: String) -> bool {
        if !self.api_configured() {
            return false;
        }
        let mut form = AuthForm::new(username, password);
        match form.submit_login(&self.session).await {
            Some(_) => {
                println!("Signed in as {}.", form.username);
                true
            }
            None => {
                eprintln!("{}", form.error.as_deref().unwrap_or("Username and password are required"));
                false
            }
        }
    }

    pub fn logout(&self) -> bool {
        self.session.logout();
        println!("Signed out.");
        true
    }

    pub fn whoami(&self) -> bool {
        let state = self.session.snapshot();
        match (&state.token, &state.username) {
            (Some(_), Some(name)) => println!("Signed in as {}.", name),
            // only the token survives between runs
            (Some(_), None) => println!("Signed in."),
            (None, _) => println!("Not signed in."),
        }
        true
    }

    pub async fn post(&self, text: String) -> bool {
        let Some(token) = self.require(Route::Feed) else {
            return false;
        };
        if !self.api_configured() {
            return false;
        }

        let mut composer = Composer::new();
        composer.set_text(text);
        let (left, _) = counter(&composer.text);
        debug!(remaining = left, "composing");

        match composer.submit(self.api.as_ref(), &token).await {
            Ok(Some(post)) => {
                println!("Posted #{}.", post.id);
                true
            }
            Ok(None) => false,
            Err(ComposeError::Invalid(e)) => {
                eprintln!("{}", e);
                false
            }
            Err(ComposeError::Api(_)) => {
                eprintln!("{}", composer.error.as_deref().unwrap_or("Failed to post"));
                false
            }
        }
    }

    pub async fn follow(&self, user_id: String, follow: bool) -> bool {
        let Some(token) = self.require(Route::People) else {
            return false;
        };
        if !self.api_configured() {
            return false;
        }

        let mut panel = FollowPanel::new();
        panel.set_input(user_id);
        let api: &dyn FeedApi = self.api.as_ref();
        let result = if follow {
            panel.follow(api, &token).await
        } else {
            panel.unfollow(api, &token).await
        };

        match (result, panel.notice) {
            (_, Some(notice)) if notice.kind == NoticeKind::Success => {
                println!("{}", notice.text);
                true
            }
            (_, Some(notice)) => {
                eprintln!("{}", notice.text);
                false
            }
            (Err(e), None) => {
                eprintln!("{}", e);
                false
            }
            (Ok(_), None) => true,
        }
    }

    /// Load up to `pages` pages by nudging the end-of-list sentinel into view
    /// once per page.
    pub async fn feed(&self, pages: u32, json: bool) -> Result<bool> {
        if self.require(Route::Feed).is_none() || !self.api_configured() {
            return Ok(false);
        }

        let clock: Arc<dyn Clock> = self.clock.clone();
        let mut pager = spawn_pager(
            self.api.clone(),
            clock,
            self.config.pager.clone(),
            self.session.subscribe(),
        );

        let mut snapshot = wait_page(&mut pager, 0).await?;
        for _ in 1..pages {
            if snapshot.at_end || snapshot.error.is_some() {
                break;
            }
            let before = snapshot.posts.len();
            pager.viewport(ViewportEvent::Sentinel { distance_px: 0 });
            // step back out of range so only one page loads
            pager.viewport(ViewportEvent::Sentinel {
                distance_px: u32::MAX,
            });
            snapshot = wait_page(&mut pager, before).await?;
        }
        pager.shutdown().await;

        if json {
            println!("{}", serde_json::to_string_pretty(&snapshot.posts)?);
        } else {
            println!("{}\n", navbar(&self.session.snapshot(), Route::Feed).render());
            let now = self.clock.now();
            for post in &snapshot.posts {
                println!("{}\n", render_post(post, now));
            }
            if let Some(line) = footer(&snapshot) {
                println!("{}", line);
            }
        }
        Ok(snapshot.error.is_none())
    }
}

/// Wait for a settled snapshot past `before` posts.
async fn wait_page(pager: &mut PagerHandle, before: usize) -> Result<FeedSnapshot> {
    let settled = pager.wait_for(|s| {
        !s.loading && (s.posts.len() > before || s.at_end || s.error.is_some())
    });
    match tokio::time::timeout(PAGE_TIMEOUT, settled).await {
        Ok(Some(snapshot)) => Ok(snapshot),
        Ok(None) => bail!("feed pager stopped unexpectedly"),
        Err(_) => bail!("timed out waiting for the feed"),
    }
}
