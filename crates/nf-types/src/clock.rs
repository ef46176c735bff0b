use chrono::{DateTime, SecondsFormat, Utc};

/// Wall-clock source. The pager's cool-down and the timestamp fallback in
/// feed normalization both read time through this so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Current time in the `YYYY-MM-DDTHH:MM:SS.sssZ` form the server uses.
    fn now_iso(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
