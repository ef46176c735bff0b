use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::pager::PagerConfig;

pub const DEFAULT_STORE_PATH: &str = "nf.db";
pub const DEFAULT_LOG_FILTER: &str = "nf=info";

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix for every endpoint. Empty means paths are sent relative.
    pub api_url: String,
    pub store_path: PathBuf,
    pub pager: PagerConfig,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            pager: PagerConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to their
    /// defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("NF_API_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.api_url);
        let store_path = lookup("NF_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);
        let log_filter = lookup("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let page_size = parse_or(&lookup, "NF_PAGE_SIZE", defaults.pager.page_size)
            .max(1);
        let cooldown_ms = parse_or(
            &lookup,
            "NF_RETRY_COOLDOWN_MS",
            defaults.pager.retry_cooldown.as_millis() as u64,
        );
        let proximity_margin_px = parse_or(
            &lookup,
            "NF_PROXIMITY_MARGIN_PX",
            defaults.pager.proximity_margin_px,
        );

        Self {
            api_url,
            store_path,
            pager: PagerConfig {
                page_size,
                retry_cooldown: Duration::from_millis(cooldown_ms),
                proximity_margin_px,
            },
            log_filter,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}
