//! Normalization of raw feed payloads.
//!
//! `/feed` has answered with two envelope shapes (a bare array, or
//! `{page, posts}`) and with records whose field names drifted between
//! releases. Everything is folded into [`Post`] / [`FeedPage`] here; nothing
//! in this module fails; unusable values fall back to defaults.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{FeedPage, Post};

/// Author id aliases, checked in this order. The first key whose value is
/// present and non-null wins, even if that value is not numeric.
pub const AUTHOR_ID_KEYS: [&str; 5] = ["userid", "user_id", "userId", "authorId", "author_id"];

/// Timestamp aliases, checked in this order. The first non-empty string wins.
pub const CREATED_AT_KEYS: [&str; 3] = ["createdat", "created_at", "createdAt"];

/// Interpret a JSON value as an integer.
///
/// Numbers are taken as-is when integral; strings are trimmed and parsed.
/// Everything else (missing, fractional, non-numeric text, objects) is `None`.
pub fn to_number(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).ok()
            } else {
                n.as_f64().and_then(integral)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Normalize one raw post record.
///
/// `fallback_ts` is used when none of the timestamp aliases carries a
/// non-empty string. Callers pass the client's current time, so a record
/// without a timestamp gets a different dedup key on every fetch.
pub fn normalize_post(raw: &Value, fallback_ts: &str) -> Post {
    let empty = Map::new();
    let record = raw.as_object().unwrap_or(&empty);

    let id = to_number(record.get("id")).unwrap_or(0);

    let author = AUTHOR_ID_KEYS
        .iter()
        .map(|k| record.get(*k))
        .find(|v| !matches!(v, None | Some(Value::Null)))
        .flatten();
    let author_id = to_number(author).unwrap_or(0);

    let content = match record.get("content") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let created_at = match CREATED_AT_KEYS
        .iter()
        .find_map(|k| non_empty_str(record.get(*k)))
    {
        Some(ts) => ts.to_string(),
        None => {
            debug!(id, "feed record carries no timestamp, using client clock");
            fallback_ts.to_string()
        }
    };

    Post {
        id,
        author_id,
        content,
        created_at,
    }
}

/// Normalize a `/feed` response body requested as `requested_page`.
pub fn normalize_feed(raw: &Value, requested_page: u32, fallback_ts: &str) -> FeedPage {
    let (records, page) = match raw {
        Value::Array(items) => (items.as_slice(), requested_page),
        Value::Object(obj) => {
            let records = match obj.get("posts") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[][..],
            };
            let page = to_number(obj.get("page"))
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(requested_page);
            (records, page)
        }
        _ => (&[][..], requested_page),
    };

    FeedPage {
        page,
        posts: records
            .iter()
            .map(|r| normalize_post(r, fallback_ts))
            .collect(),
    }
}

/// Serde adapter for integer fields that some server builds send as strings.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_number(Some(&value)).unwrap_or(0))
}
