use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use nf_client::{ClientError, FeedApi};
use nf_types::api::{Ack, LoginResponse, RegisterResponse};
use nf_types::{FeedPage, Post};

/// One recorded call against a [`ScriptedApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Login(String),
    CreatePost(String),
    Follow(i64),
    Unfollow(i64),
    Feed { page: u32, limit: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Register,
    Login,
    CreatePost,
    Follow,
    Unfollow,
}

/// In-memory [`FeedApi`] with scripted answers.
///
/// Feed pages are answered from per-page queues; a page with nothing queued
/// answers with an empty page. Other operations succeed unless a failure was
/// queued for them.
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<Call>>,
    feed: Mutex<HashMap<u32, VecDeque<Result<FeedPage, ClientError>>>>,
    failures: Mutex<HashMap<Op, VecDeque<ClientError>>>,
    tokens: Mutex<HashMap<String, String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    next_post_id: Mutex<i64>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for `page`.
    pub fn push_feed(&self, page: u32, result: Result<FeedPage, ClientError>) {
        self.feed
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(result);
    }

    pub fn push_posts(&self, page: u32, posts: Vec<Post>) {
        self.push_feed(page, Ok(FeedPage { page, posts }));
    }

    /// Token `login` hands out for `username`. Defaults to `token-{username}`.
    pub fn set_token(&self, username: &str, token: &str) {
        self.tokens
            .lock()
            .unwrap()
            .insert(username.to_string(), token.to_string());
    }

    pub fn fail_login(&self, message: &str) {
        self.push_failure(Op::Login, message);
    }

    pub fn fail_register(&self, message: &str) {
        self.push_failure(Op::Register, message);
    }

    pub fn fail_create_post(&self, message: &str) {
        self.push_failure(Op::CreatePost, message);
    }

    pub fn fail_follow(&self, message: &str) {
        self.push_failure(Op::Follow, message);
    }

    pub fn fail_unfollow(&self, message: &str) {
        self.push_failure(Op::Unfollow, message);
    }

    fn push_failure(&self, op: Op, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(ClientError::RequestFailed(message.to_string()));
    }

    fn take_failure(&self, op: Op) -> Option<ClientError> {
        self.failures
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(|q| q.pop_front())
    }

    /// Hold every following feed call until [`ScriptedApi::release_feed`].
    pub fn hold_feed(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    /// Let one held feed call through and stop holding new ones.
    pub fn release_feed(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn feed_pages_requested(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Feed { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FeedApi for ScriptedApi {
    async fn register(&self, username: &str, _password: &str) -> Result<RegisterResponse, ClientError> {
        self.record(Call::Register(username.to_string()));
        if let Some(e) = self.take_failure(Op::Register) {
            return Err(e);
        }
        Ok(RegisterResponse {
            id: 1,
            username: username.to_string(),
        })
    }

    async fn login(&self, username: &str, _password: &str) -> Result<LoginResponse, ClientError> {
        self.record(Call::Login(username.to_string()));
        if let Some(e) = self.take_failure(Op::Login) {
            return Err(e);
        }
        let token = self
            .tokens
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .unwrap_or_else(|| format!("token-{}", username));
        Ok(LoginResponse { token })
    }

    async fn create_post(&self, _token: &str, content: &str) -> Result<Post, ClientError> {
        self.record(Call::CreatePost(content.to_string()));
        if let Some(e) = self.take_failure(Op::CreatePost) {
            return Err(e);
        }
        let id = {
            let mut next = self.next_post_id.lock().unwrap();
            *next += 1;
            *next
        };
        Ok(Post {
            id,
            author_id: 1,
            content: content.to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        })
    }

    async fn follow(&self, _token: &str, user_id: i64) -> Result<Ack, ClientError> {
        self.record(Call::Follow(user_id));
        if let Some(e) = self.take_failure(Op::Follow) {
            return Err(e);
        }
        Ok(Ack {
            message: format!("Followed user {}", user_id),
        })
    }

    async fn unfollow(&self, _token: &str, user_id: i64) -> Result<Ack, ClientError> {
        self.record(Call::Unfollow(user_id));
        if let Some(e) = self.take_failure(Op::Unfollow) {
            return Err(e);
        }
        Ok(Ack {
            message: format!("Unfollowed user {}", user_id),
        })
    }

    async fn feed(&self, _token: &str, page: u32, limit: u32) -> Result<FeedPage, ClientError> {
        self.record(Call::Feed { page, limit });

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self
            .feed
            .lock()
            .unwrap()
            .get_mut(&page)
            .and_then(|q| q.pop_front());
        scripted.unwrap_or_else(|| {
            Ok(FeedPage {
                page,
                posts: Vec::new(),
            })
        })
    }
}

/// A post with a fixed author and content derived from `id`.
pub fn post(id: i64, created_at: &str) -> Post {
    Post {
        id,
        author_id: 100 + id % 3,
        content: format!("post #{}", id),
        created_at: created_at.to_string(),
    }
}

/// Posts `ids`, each stamped with a distinct timestamp derived from its id.
pub fn page_of(ids: impl IntoIterator<Item = i64>) -> Vec<Post> {
    ids.into_iter()
        .map(|id| post(id, &format!("2024-01-01T00:{:02}:{:02}Z", (id / 60) % 60, id % 60)))
        .collect()
}
