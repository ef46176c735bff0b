use tracing::{debug, warn};

use nf_client::{ClientError, FeedApi};
use nf_types::Post;
use nf_types::models::MAX_POST_CHARS;

use crate::error::{ComposeError, ValidationError};

const NEAR_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterTone {
    Normal,
    NearLimit,
    OverLimit,
}

/// Characters left before the limit. Counted on the text as typed,
/// surrounding whitespace included. Negative when over.
pub fn remaining(text: &str) -> i64 {
    MAX_POST_CHARS as i64 - text.chars().count() as i64
}

pub fn counter(text: &str) -> (i64, CounterTone) {
    let left = remaining(text);
    let tone = if left < 0 {
        CounterTone::OverLimit
    } else if left <= NEAR_LIMIT {
        CounterTone::NearLimit
    } else {
        CounterTone::Normal
    };
    (left, tone)
}

/// Returns the text that would be sent.
pub fn validate_post(text: &str) -> Result<&str, ValidationError> {
    let len = text.chars().count();
    if len > MAX_POST_CHARS {
        return Err(ValidationError::PostTooLong {
            len,
            max: MAX_POST_CHARS,
        });
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyPost);
    }
    Ok(trimmed)
}

/// State behind the "new post" box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub text: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn counter(&self) -> (i64, CounterTone) {
        counter(&self.text)
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && validate_post(&self.text).is_ok()
    }

    /// Validate and mark the submission in flight. `Ok(None)` when one is
    /// already running.
    pub fn begin(&mut self) -> Result<Option<String>, ComposeError> {
        if self.loading {
            return Ok(None);
        }
        let content = validate_post(&self.text)?.to_string();
        self.loading = true;
        self.error = None;
        Ok(Some(content))
    }

    /// Record how the submission went. The text is cleared only on success.
    pub fn finish(&mut self, result: Result<Post, ClientError>) -> Result<Post, ComposeError> {
        self.loading = false;
        match result {
            Ok(post) => {
                self.text.clear();
                Ok(post)
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(if message.is_empty() {
                    "Failed to post".to_string()
                } else {
                    message
                });
                Err(e.into())
            }
        }
    }

    /// `Ok(None)` means the call was ignored because a submission is
    /// already in flight.
    pub async fn submit(
        &mut self,
        api: &dyn FeedApi,
        token: &str,
    ) -> Result<Option<Post>, ComposeError> {
        let Some(content) = self.begin()? else {
            debug!("post already in flight, ignoring submit");
            return Ok(None);
        };

        let result = api.create_post(token, &content).await;
        if let Err(e) = &result {
            warn!("Failed to create post: {}", e);
        }
        self.finish(result).map(Some)
    }
}
