use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use nf_client::{ClientError, FeedApi};
use nf_store::TokenStore;

/// Who is signed in. Only the token is persisted; the username is known only
/// after a login or register in this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }
}

/// Process-wide credential holder. Construct once at the application root
/// and pass it (behind an `Arc`) to whatever needs it; observers follow
/// changes through [`AuthSession::subscribe`].
pub struct AuthSession {
    api: Arc<dyn FeedApi>,
    tokens: TokenStore,
    state: watch::Sender<SessionState>,
}

impl AuthSession {
    /// Starts from the persisted token, if any.
    pub fn new(api: Arc<dyn FeedApi>, tokens: TokenStore) -> Self {
        let initial = SessionState {
            token: tokens.get(),
            username: None,
        };
        let (state, _) = watch::channel(initial);
        Self { api, tokens, state }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.state.borrow().username.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// On failure the session is left untouched and the error is returned
    /// as the API produced it.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let res = self.api.login(username, password).await?;
        self.establish(res.token, username);
        Ok(())
    }

    /// Registering does not grant a token, so this logs in right after.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        self.api.register(username, password).await?;
        self.login(username, password).await
    }

    pub fn logout(&self) {
        self.state.send_replace(SessionState::default());
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to erase persisted token: {:#}", e);
        }
        info!("signed out");
    }

    fn establish(&self, token: String, username: &str) {
        // One-way sync: storage is only read once, at construction.
        if let Err(e) = self.tokens.set(&token) {
            warn!("Failed to persist token: {:#}", e);
        }
        self.state.send_replace(SessionState {
            token: Some(token),
            username: Some(username.to_string()),
        });
        info!(username, "signed in");
    }
}
