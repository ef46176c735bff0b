//! Text rendering for the feed, its footer and the navigation bar.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use nf_types::Post;

use crate::guard::Route;
use crate::pager::FeedSnapshot;
use crate::session::SessionState;

pub const BRAND: &str = "NewsFeed";
pub const LOADING_TEXT: &str = "Loading…";
pub const END_TEXT: &str = "You've reached the end.";
pub const EMPTY_TEXT: &str = "Your feed is empty — follow some users to start seeing posts.";
pub const INVALID_DATE: &str = "Invalid Date";

const DAYS_PER_MONTH: f64 = 365.25 / 12.0;

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// "a few seconds ago", "5 minutes ago", "in 2 hours", ...
///
/// Bucket edges follow the usual humanized thresholds: up to 44s, 89s,
/// 44min, 89min, 21h, 35h, 25d, 45d, 10 months, 17 months, then years.
/// Timestamps without an offset are read as UTC.
pub fn relative_time(created_at: &str, now: DateTime<Utc>) -> String {
    let Some(at) = parse_timestamp(created_at) else {
        return INVALID_DATE.to_string();
    };
    let delta_ms = (at - now).num_milliseconds();
    let phrase = humanize(delta_ms.unsigned_abs() as f64 / 1000.0);
    if delta_ms > 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

fn humanize(secs: f64) -> String {
    let seconds = secs.round();
    if seconds <= 44.0 {
        return "a few seconds".into();
    }
    if seconds <= 89.0 {
        return "a minute".into();
    }
    let minutes = (secs / 60.0).round();
    if minutes <= 44.0 {
        return format!("{} minutes", minutes);
    }
    if minutes <= 89.0 {
        return "an hour".into();
    }
    let hours = (secs / 3600.0).round();
    if hours <= 21.0 {
        return format!("{} hours", hours);
    }
    if hours <= 35.0 {
        return "a day".into();
    }
    let days_exact = secs / 86_400.0;
    let days = days_exact.round();
    if days <= 25.0 {
        return format!("{} days", days);
    }
    if days <= 45.0 {
        return "a month".into();
    }
    let months = (days_exact / DAYS_PER_MONTH).round();
    if months <= 10.0 {
        return format!("{} months", months);
    }
    if months <= 17.0 {
        return "a year".into();
    }
    let years = (days_exact / (DAYS_PER_MONTH * 12.0)).round();
    format!("{} years", years)
}

/// One feed entry: header line, then the content.
pub fn render_post(post: &Post, now: DateTime<Utc>) -> String {
    format!(
        "User #{} · {}\n{}",
        post.author_id,
        relative_time(&post.created_at, now),
        post.content
    )
}

/// Status line under the list, if any.
pub fn footer(snapshot: &FeedSnapshot) -> Option<String> {
    if snapshot.loading {
        Some(LOADING_TEXT.to_string())
    } else if let Some(error) = &snapshot.error {
        Some(error.clone())
    } else if snapshot.is_empty_feed() {
        Some(EMPTY_TEXT.to_string())
    } else if snapshot.at_end {
        Some(END_TEXT.to_string())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navbar {
    pub brand: &'static str,
    pub brand_target: Route,
    pub links: Vec<NavLink>,
    /// Name and uppercase initial, when known.
    pub user: Option<(String, String)>,
    pub show_logout: bool,
}

pub fn navbar(session: &SessionState, current: Route) -> Navbar {
    let link = |label, route: Route| NavLink {
        label,
        route,
        active: route == current,
    };

    if session.is_signed_in() {
        let user = session.username.as_ref().map(|name| {
            let initial = name
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect::<String>())
                .unwrap_or_default();
            (name.clone(), initial)
        });
        Navbar {
            brand: BRAND,
            brand_target: Route::Feed,
            links: vec![link("Feed", Route::Feed), link("People", Route::People)],
            user,
            show_logout: true,
        }
    } else {
        Navbar {
            brand: BRAND,
            brand_target: Route::Login,
            links: vec![link("Login", Route::Login), link("Sign Up", Route::Register)],
            user: None,
            show_logout: false,
        }
    }
}

impl Navbar {
    pub fn render(&self) -> String {
        let mut parts = vec![self.brand.to_string()];
        for link in &self.links {
            if link.active {
                parts.push(format!("[{}]", link.label));
            } else {
                parts.push(link.label.to_string());
            }
        }
        if let Some((name, initial)) = &self.user {
            parts.push(format!("({}) {}", initial, name));
        }
        if self.show_logout {
            parts.push("Logout".to_string());
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::Phase;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ago(secs: i64) -> String {
        let at = now() - chrono::Duration::seconds(secs);
        relative_time(&at.to_rfc3339(), now())
    }

    #[test]
    fn test_relative_time_buckets() {
        assert_eq!(ago(0), "a few seconds ago");
        assert_eq!(ago(44), "a few seconds ago");
        assert_eq!(ago(45), "a minute ago");
        assert_eq!(ago(90), "2 minutes ago");
        assert_eq!(ago(5 * 60), "5 minutes ago");
        assert_eq!(ago(45 * 60), "an hour ago");
        assert_eq!(ago(3 * 3600), "3 hours ago");
        assert_eq!(ago(22 * 3600), "a day ago");
        assert_eq!(ago(3 * 86_400), "3 days ago");
        assert_eq!(ago(30 * 86_400), "a month ago");
        assert_eq!(ago(90 * 86_400), "3 months ago");
        assert_eq!(ago(400 * 86_400), "a year ago");
        assert_eq!(ago(3 * 365 * 86_400), "3 years ago");
    }

    #[test]
    fn test_relative_time_future() {
        assert_eq!(ago(-2 * 3600), "in 2 hours");
    }

    #[test]
    fn test_relative_time_formats() {
        assert_eq!(relative_time("2024-06-15 11:55:00", now()), "5 minutes ago");
        assert_eq!(relative_time("2024-06-15T11:00:00.000Z", now()), "an hour ago");
        assert_eq!(relative_time("2024-06-12", now()), "4 days ago");
        assert_eq!(relative_time("yesterday", now()), "Invalid Date");
        assert_eq!(relative_time("", now()), "Invalid Date");
    }

    #[test]
    fn test_render_post() {
        let post = Post {
            id: 1,
            author_id: 7,
            content: "hello".into(),
            created_at: "2024-06-15T11:59:30Z".into(),
        };
        assert_eq!(render_post(&post, now()), "User #7 · a few seconds ago\nhello");
    }

    #[test]
    fn test_footer() {
        let mut snap = FeedSnapshot::default();
        assert_eq!(footer(&snap).as_deref(), Some(EMPTY_TEXT));

        snap.loading = true;
        assert_eq!(footer(&snap).as_deref(), Some("Loading…"));

        snap.loading = false;
        snap.error = Some("boom".into());
        snap.phase = Phase::Failed;
        assert_eq!(footer(&snap).as_deref(), Some("boom"));

        snap.error = None;
        snap.posts.push(Post {
            id: 1,
            author_id: 1,
            content: "x".into(),
            created_at: "2024-06-15T11:59:30Z".into(),
        });
        assert_eq!(footer(&snap), None);
        snap.at_end = true;
        assert_eq!(footer(&snap).as_deref(), Some(END_TEXT));
    }

    #[test]
    fn test_navbar_signed_in() {
        let session = SessionState {
            token: Some("T".into()),
            username: Some("alice".into()),
        };
        let bar = navbar(&session, Route::People);
        assert_eq!(bar.brand_target, Route::Feed);
        assert_eq!(bar.user, Some(("alice".to_string(), "A".to_string())));
        assert_eq!(bar.render(), "NewsFeed | Feed | [People] | (A) alice | Logout");
    }

    #[test]
    fn test_navbar_signed_out() {
        let bar = navbar(&SessionState::default(), Route::Login);
        assert_eq!(bar.brand_target, Route::Login);
        assert!(!bar.show_logout);
        assert_eq!(bar.render(), "NewsFeed | [Login] | Sign Up");
    }
}
