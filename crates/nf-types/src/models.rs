use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum post length, counted in characters of the text as typed.
pub const MAX_POST_CHARS: usize = 200;

/// A feed post in its normalized shape.
///
/// The server has shipped several record layouts over time; everything that
/// reaches the UI has been through [`crate::normalize`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    /// ISO-8601 timestamp, kept as the server sent it.
    pub created_at: String,
}

impl Post {
    pub fn key(&self) -> PostKey {
        PostKey {
            id: self.id,
            created_at: self.created_at.clone(),
        }
    }
}

/// Deduplication identity of a post: `(id, created_at)`, not `id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostKey {
    pub id: i64,
    pub created_at: String,
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.created_at)
    }
}

/// One fetched page of the feed. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub page: u32,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLite {
    pub id: i64,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_id_and_timestamp() {
        let a = Post {
            id: 1,
            author_id: 2,
            content: "a".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        };
        let mut b = a.clone();
        b.created_at = "2024-01-02T00:00:00Z".into();

        assert_ne!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "1:2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let post = Post {
            id: 7,
            author_id: 3,
            content: "hi".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["authorId"], 3);
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
    }
}
