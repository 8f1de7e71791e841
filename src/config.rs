use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const EMAIL_VAR: &str = "PINTEREST_EMAIL";
pub const PASSWORD_VAR: &str = "PINTEREST_PASSWORD";
const HEADLESS_VAR: &str = "PINSCRAPE_HEADLESS";
const DATA_DIR_VAR: &str = "PINSCRAPE_DATA_DIR";
const CONCURRENCY_VAR: &str = "PINSCRAPE_DOWNLOAD_CONCURRENCY";
const SCREENSHOT_VAR: &str = "PINSCRAPE_LOGIN_SCREENSHOT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Account used for the login flow.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Headed by default so a human can clear a login challenge.
    pub headless: bool,
    pub window_size: (u32, u32),
    /// Bound on each login selector wait.
    pub login_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Written when the post-login marker never shows up.
    pub login_screenshot: PathBuf,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: (1920, 1080),
            login_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(60),
            login_screenshot: PathBuf::from("login_error.png"),
        }
    }
}

/// Timing and termination rules for the scroll-and-collect loop.
#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    pub settle_delay: Duration,
    pub scroll_delay: Duration,
    /// The loop stalls once this many consecutive scrolls are exceeded without new pins.
    pub max_stale_scrolls: usize,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
            scroll_delay: Duration::from_secs(2),
            max_stale_scrolls: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            concurrency: 16,
            request_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub browser: BrowserSettings,
    pub scroll: ScrollPolicy,
    pub download: DownloadSettings,
    /// Root under which one directory per job is created.
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let credentials = Credentials {
            email: required(EMAIL_VAR)?,
            password: required(PASSWORD_VAR)?,
        };

        let mut browser = BrowserSettings::default();
        if let Some(raw) = lookup(HEADLESS_VAR) {
            browser.headless = parse_bool(HEADLESS_VAR, &raw)?;
        }
        if let Some(path) = lookup(SCREENSHOT_VAR) {
            browser.login_screenshot = PathBuf::from(path);
        }

        let mut download = DownloadSettings::default();
        if let Some(raw) = lookup(CONCURRENCY_VAR) {
            download.concurrency = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: CONCURRENCY_VAR,
                        value: raw,
                    });
                }
            };
        }

        let data_dir = lookup(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Ok(Self {
            credentials,
            browser,
            scroll: ScrollPolicy::default(),
            download,
            data_dir,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
        }),
    }
}
