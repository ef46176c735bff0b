use serde::{Deserialize, Serialize};

use crate::normalize::lenient_i64;

// -- Auth --

/// Body of both `POST /register` and `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// -- Posts --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

// -- Follows --

/// Acknowledgement returned by `POST`/`DELETE /follow/:userId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_response_accepts_string_id() {
        let r: RegisterResponse =
            serde_json::from_str(r#"{"id":"12","username":"alice"}"#).unwrap();
        assert_eq!(r.id, 12);
    }

    #[test]
    fn test_ack_message_optional() {
        let ack: Ack = serde_json::from_str("{}").unwrap();
        assert_eq!(ack, Ack::default());
    }
}
