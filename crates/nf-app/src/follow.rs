use std::collections::BTreeSet;

use tracing::{info, warn};

use nf_client::{ClientError, FeedApi};
use nf_types::UserLite;

use crate::error::{FollowError, ValidationError};

/// Parse the "User ID" input. Only positive integers pass.
pub fn parse_user_id(input: &str) -> Result<i64, FollowError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FollowError::EmptyInput);
    }
    match input.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidUserId.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn success(text: String) -> Self {
        Self {
            kind: NoticeKind::Success,
            text,
        }
    }

    fn error(text: String) -> Self {
        Self {
            kind: NoticeKind::Error,
            text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Follow,
    Unfollow,
}

impl Action {
    fn success_text(self, id: i64) -> String {
        match self {
            Self::Follow => format!("Successfully followed User #{}", id),
            Self::Unfollow => format!("Successfully unfollowed User #{}", id),
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Self::Follow => "Failed to follow user",
            Self::Unfollow => "Failed to unfollow user",
        }
    }
}

/// The "follow by id" screen. `following` is what this screen has seen
/// succeed; the server never reports the full list.
#[derive(Debug, Clone, Default)]
pub struct FollowPanel {
    pub input: String,
    pub following: BTreeSet<i64>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl FollowPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.input.trim().is_empty()
    }

    pub async fn follow(&mut self, api: &dyn FeedApi, token: &str) -> Result<i64, FollowError> {
        self.run(Action::Follow, api, token).await
    }

    pub async fn unfollow(&mut self, api: &dyn FeedApi, token: &str) -> Result<i64, FollowError> {
        self.run(Action::Unfollow, api, token).await
    }

    async fn run(&mut self, action: Action, api: &dyn FeedApi, token: &str) -> Result<i64, FollowError> {
        let id = match parse_user_id(&self.input) {
            Ok(id) => id,
            Err(FollowError::EmptyInput) => return Err(FollowError::EmptyInput),
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        self.loading = true;
        self.notice = None;
        let result = match action {
            Action::Follow => api.follow(token, id).await,
            Action::Unfollow => api.unfollow(token, id).await,
        };
        self.loading = false;

        match result {
            Ok(_) => {
                match action {
                    Action::Follow => self.following.insert(id),
                    Action::Unfollow => self.following.remove(&id),
                };
                info!(user_id = id, ?action, "follow state changed");
                self.notice = Some(Notice::success(action.success_text(id)));
                self.input.clear();
                Ok(id)
            }
            Err(e) => {
                warn!(user_id = id, ?action, "follow request failed: {}", e);
                self.notice = Some(Notice::error(failure_text(&e, action.fallback())));
                Err(e.into())
            }
        }
    }
}

fn failure_text(e: &ClientError, fallback: &str) -> String {
    let message = e.to_string();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Follow button on a user's card.
#[derive(Debug, Clone)]
pub struct FollowToggle {
    pub user: UserLite,
    pub following: bool,
    pub is_current_user: bool,
    pub loading: bool,
}

impl FollowToggle {
    pub fn new(user: UserLite, following: bool, is_current_user: bool) -> Self {
        Self {
            user,
            following,
            is_current_user,
            loading: false,
        }
    }

    /// The follow state a click would request, or `None` when the click is
    /// ignored (own card, or a toggle already in flight).
    pub fn begin(&mut self) -> Option<bool> {
        if self.loading || self.is_current_user {
            return None;
        }
        self.loading = true;
        Some(!self.following)
    }

    pub fn finish(&mut self, next: bool, result: &Result<(), ClientError>) {
        self.loading = false;
        if result.is_ok() {
            self.following = next;
        }
    }

    /// `Ok(None)` when the click was ignored.
    pub async fn click(&mut self, api: &dyn FeedApi, token: &str) -> Result<Option<bool>, FollowError> {
        if self.is_current_user {
            return Err(FollowError::OwnAccount);
        }
        let Some(next) = self.begin() else {
            return Ok(None);
        };

        let ack = if next {
            api.follow(token, self.user.id).await
        } else {
            api.unfollow(token, self.user.id).await
        };
        let result = ack.map(|_| ());
        self.finish(next, &result);
        result?;
        Ok(Some(next))
    }

    pub fn label(&self) -> &'static str {
        match (self.is_current_user, self.loading, self.following) {
            (true, _, _) => "Your account",
            (false, true, true) => "Unfollowing...",
            (false, true, false) => "Following...",
            (false, false, true) => "Following",
            (false, false, false) => "Follow",
        }
    }
}
