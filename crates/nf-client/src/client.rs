use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use nf_types::api::{Ack, CreatePostRequest, Credentials, LoginResponse, RegisterResponse};
use nf_types::normalize::{normalize_feed, normalize_post};
use nf_types::{Clock, FeedPage, Post, SystemClock};

use crate::api::FeedApi;
use crate::error::ClientError;

/// HTTP client for the feed API. Every network call goes through
/// [`ApiClient::request`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl ApiClient {
    /// `base_url` may be empty, in which case paths are used verbatim.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_clock(base_url, Arc::new(SystemClock))
    }

    pub fn with_clock(base_url: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            clock,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Issue one request.
    ///
    /// Caller headers override the default `Content-Type: application/json`.
    /// `Ok(None)` means the server answered 204. Any other success without a
    /// parseable, non-null JSON body is a failure.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<Option<Value>, ClientError> {
        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in headers.iter() {
            merged.insert(name.clone(), value.clone());
        }

        let mut req = self.http.request(method.clone(), self.url(path)).headers(merged);
        if let Some(body) = body {
            req = req.body(body.to_string());
        }

        debug!(%method, path, "api request");
        let res = req.send().await?;
        let status = res.status();
        debug!(%method, path, status = status.as_u16(), "api response");

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        // An unreadable or non-JSON body is "no data", never a crash.
        let data = match res.text().await {
            Ok(text) if !text.is_empty() => serde_json::from_str::<Value>(&text)
                .ok()
                .filter(|v| !v.is_null()),
            _ => None,
        };

        if !status.is_success() {
            return Err(ClientError::RequestFailed(failure_message(
                status,
                data.as_ref(),
            )));
        }

        match data {
            Some(value) => Ok(Some(value)),
            None => Err(ClientError::RequestFailed("Empty response body".into())),
        }
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<T, ClientError> {
        let value = self
            .request(method, path, body, headers)
            .await?
            .ok_or_else(|| ClientError::RequestFailed("Empty response body".into()))?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::RequestFailed(format!("Unexpected response: {}", e)))
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, ClientError> {
    serde_json::to_value(payload)
        .map_err(|e| ClientError::RequestFailed(format!("Invalid request body: {}", e)))
}

fn bearer(token: &str) -> Result<HeaderMap, ClientError> {
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::RequestFailed("Invalid token".into()))?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Error text for a non-2xx response: the body's `message`, else its
/// `error`, else `"{status} {reason}"`.
pub fn failure_message(status: StatusCode, data: Option<&Value>) -> String {
    let field = |name: &str| -> Option<String> {
        match data?.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    };

    field("message")
        .or_else(|| field("error"))
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        })
}

#[async_trait]
impl FeedApi for ApiClient {
    async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse, ClientError> {
        let body = to_body(&Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        self.request_as(Method::POST, "/register", Some(body), HeaderMap::new())
            .await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = to_body(&Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        self.request_as(Method::POST, "/login", Some(body), HeaderMap::new())
            .await
    }

    async fn create_post(&self, token: &str, content: &str) -> Result<Post, ClientError> {
        let body = to_body(&CreatePostRequest {
            content: content.to_string(),
        })?;
        let raw: Value = self
            .request_as(Method::POST, "/posts", Some(body), bearer(token)?)
            .await?;
        Ok(normalize_post(&raw, &self.clock.now_iso()))
    }

    async fn follow(&self, token: &str, user_id: i64) -> Result<Ack, ClientError> {
        let path = format!("/follow/{}", user_id);
        match self.request(Method::POST, &path, None, bearer(token)?).await? {
            Some(value) => decode(value),
            None => Ok(Ack::default()),
        }
    }

    async fn unfollow(&self, token: &str, user_id: i64) -> Result<Ack, ClientError> {
        let path = format!("/follow/{}", user_id);
        match self.request(Method::DELETE, &path, None, bearer(token)?).await? {
            Some(value) => decode(value),
            None => Ok(Ack::default()),
        }
    }

    async fn feed(&self, token: &str, page: u32, limit: u32) -> Result<FeedPage, ClientError> {
        let path = format!("/feed?page={}&limit={}", page, limit);
        let raw: Value = self
            .request_as(Method::GET, &path, None, bearer(token)?)
            .await?;
        Ok(normalize_feed(&raw, page, &self.clock.now_iso()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_message_priority() {
        let both = json!({"message": "Invalid credentials", "error": "unauthorized"});
        assert_eq!(
            failure_message(StatusCode::UNAUTHORIZED, Some(&both)),
            "Invalid credentials"
        );

        let error_only = json!({"message": "", "error": "Username already exists"});
        assert_eq!(
            failure_message(StatusCode::CONFLICT, Some(&error_only)),
            "Username already exists"
        );

        assert_eq!(
            failure_message(StatusCode::NOT_FOUND, None),
            "404 Not Found"
        );
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, Some(&json!([1, 2]))),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn test_url_join() {
        let client = ApiClient::new("http://api.test/");
        assert_eq!(client.url("/feed"), "http://api.test/feed");
        assert_eq!(client.url("https://other.test/x"), "https://other.test/x");

        let same_origin = ApiClient::new("");
        assert_eq!(same_origin.url("/login"), "/login");
    }
}
