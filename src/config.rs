use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_DOUBLE_TAP_MS: u64 = 300;
const DEFAULT_LOG: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_path: PathBuf,
    pub search_debounce: Duration,
    pub double_tap_window: Duration,
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url: String = try_load(&lookup, "FEEDSYNC_API_URL", DEFAULT_API_URL);

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            session_path: lookup("FEEDSYNC_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_path),
            search_debounce: Duration::from_millis(try_load(
                &lookup,
                "FEEDSYNC_SEARCH_DEBOUNCE_MS",
                &DEFAULT_DEBOUNCE_MS.to_string(),
            )),
            double_tap_window: Duration::from_millis(try_load(
                &lookup,
                "FEEDSYNC_DOUBLE_TAP_MS",
                &DEFAULT_DOUBLE_TAP_MS.to_string(),
            )),
            request_timeout: lookup("FEEDSYNC_REQUEST_TIMEOUT_SECS")
                .and_then(|raw| parse_or_warn::<u64>("FEEDSYNC_REQUEST_TIMEOUT_SECS", &raw))
                .map(Duration::from_secs),
        }
    }
}

/// Filter for the log subscriber. Read on its own, before [`Config::load`],
/// so the subscriber is up when config fallbacks are logged.
pub fn log_filter<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("RUST_LOG")
        .or_else(|| lookup("FEEDSYNC_LOG"))
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_or_warn(key, &raw)
        .or_else(|| default.parse().ok())
        .expect("Built-in default misconfigured!")
}

fn parse_or_warn<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}");
        })
        .ok()
}

fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join("feedsync")
        .join("session.json")
}
