//! Worker configuration, loaded from the environment (via `dotenvy`) rather
//! than a config-file loader: every knob here is a single env var with a
//! static default, read once at startup.

use std::env;

use crate::error::{WorkerError, WorkerResult};

/// Top-level worker identity and queue connection settings (§4.1, §4.8).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub convex_url: String,
    pub worker_id: String,
    pub worker_token: String,
    pub poll_interval_seconds: u64,
    pub heartbeat_interval_seconds: u64,
    pub web_allow_hostname_fallback: bool,
    pub ttf_path: Option<String>,
    pub ocr_lang: String,
}

impl WorkerConfig {
    /// Fails fast when the two required variables are unset, matching the
    /// worker's fatal-startup behavior.
    pub fn from_env() -> WorkerResult<Self> {
        let convex_url = env::var("ZENPDF_CONVEX_URL")
            .map_err(|_| WorkerError::user("ZENPDF_CONVEX_URL is required"))?;
        let worker_token = env::var("ZENPDF_WORKER_TOKEN")
            .map_err(|_| WorkerError::user("ZENPDF_WORKER_TOKEN is required"))?;

        Ok(Self {
            convex_url,
            worker_id: env_string("ZENPDF_WORKER_ID", "worker-local"),
            worker_token,
            poll_interval_seconds: env_u64("ZENPDF_POLL_INTERVAL", 5),
            heartbeat_interval_seconds: env_u64("ZENPDF_WORKER_HEARTBEAT_SECONDS", 25),
            web_allow_hostname_fallback: env_bool("ZENPDF_WEB_ALLOW_HOSTNAME_FALLBACK", false),
            ttf_path: {
                let v = env_string("ZENPDF_TTF_PATH", "");
                if v.is_empty() { None } else { Some(v) }
            },
            ocr_lang: env_string("ZENPDF_OCR_LANG", "eng"),
        })
    }
}

pub fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim(), "1" | "true" | "TRUE" | "True"),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_accepts_common_truthy_spellings() {
        std::env::set_var("ZENPDF_TEST_BOOL", "true");
        assert!(env_bool("ZENPDF_TEST_BOOL", false));
        std::env::set_var("ZENPDF_TEST_BOOL", "0");
        assert!(!env_bool("ZENPDF_TEST_BOOL", true));
        std::env::remove_var("ZENPDF_TEST_BOOL");
        assert!(env_bool("ZENPDF_TEST_BOOL", true));
    }

    #[test]
    fn env_u64_falls_back_on_unparseable_value() {
        std::env::set_var("ZENPDF_TEST_U64", "not-a-number");
        assert_eq!(env_u64("ZENPDF_TEST_U64", 7), 7);
        std::env::remove_var("ZENPDF_TEST_U64");
    }
}
