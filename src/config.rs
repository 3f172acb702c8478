use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL the client talks to, e.g. `http://127.0.0.1:8080/api`.
    pub api_url: String,
    pub bind: String,
    pub database_url: Option<String>,
    pub upload_dir: PathBuf,
    pub public_url: String,
    /// Whether the server creates the Project itself on a write to Confirmed.
    pub auto_create_project: bool,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "http://127.0.0.1:8080/api".to_string(),
            bind: "127.0.0.1:8080".to_string(),
            database_url: None,
            upload_dir: PathBuf::from("data/uploads"),
            public_url: "/uploads".to_string(),
            auto_create_project: true,
            retry_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Read from the process environment. Loading `.env` is left to the binary.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let string = |key: &str, default: String| -> String {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default)
        };

        Config {
            api_url: string("HOMEDESK_API_URL", defaults.api_url),
            bind: string("HOMEDESK_BIND", defaults.bind),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            upload_dir: PathBuf::from(string(
                "HOMEDESK_UPLOAD_DIR",
                defaults.upload_dir.to_string_lossy().into_owned(),
            )),
            public_url: string("HOMEDESK_PUBLIC_URL", defaults.public_url),
            auto_create_project: parse_flag(
                "HOMEDESK_AUTO_CREATE_PROJECT",
                lookup("HOMEDESK_AUTO_CREATE_PROJECT"),
                defaults.auto_create_project,
            ),
            retry_delay: Duration::from_millis(parse_or(
                "HOMEDESK_RETRY_DELAY_MS",
                lookup("HOMEDESK_RETRY_DELAY_MS"),
                defaults.retry_delay.as_millis() as u64,
            )),
            request_timeout: Duration::from_secs(parse_or(
                "HOMEDESK_REQUEST_TIMEOUT_SECS",
                lookup("HOMEDESK_REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

fn parse_or<T: FromStr + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("{key}={raw:?} is not valid, using {default}");
                default
            }
        },
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            log::warn!("{key}={v:?} is not a boolean, using {default}");
            default
        }
    }
}
