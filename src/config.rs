use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub scrape: ScrapeConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Opaque session credential, injected as a cookie. Never logged.
    pub cookie: String,
    /// Profile handle to scrape, e.g. "jane-doe".
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub output_root: PathBuf,
    pub max_posts: usize,
    pub max_scroll_attempts: u32,
    pub poll_interval_ms: u64,
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                cookie: String::new(),
                target: String::new(),
            },
            scrape: ScrapeConfig {
                output_root: PathBuf::from("./profiles"),
                max_posts: 10,
                max_scroll_attempts: 8,
                poll_interval_ms: 1500,
                download_timeout_secs: 20,
            },
            browser: BrowserConfig {
                headless: true,
                window_width: 1280,
                window_height: 1024,
            },
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to defaults.
    /// The session cookie and target handle have no defaults; `validate` rejects
    /// a config missing either.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            session: SessionConfig {
                cookie: std::env::var("SESSION_COOKIE").unwrap_or_default(),
                target: std::env::var("TARGET_PROFILE").unwrap_or_default(),
            },
            scrape: ScrapeConfig {
                output_root: std::env::var("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.scrape.output_root),
                max_posts: env_parse("MAX_POSTS", defaults.scrape.max_posts),
                max_scroll_attempts: env_parse(
                    "MAX_SCROLL_ATTEMPTS",
                    defaults.scrape.max_scroll_attempts,
                ),
                poll_interval_ms: env_parse(
                    "SCROLL_POLL_INTERVAL_MS",
                    defaults.scrape.poll_interval_ms,
                ),
                download_timeout_secs: env_parse(
                    "DOWNLOAD_TIMEOUT_SECS",
                    defaults.scrape.download_timeout_secs,
                ),
            },
            browser: BrowserConfig {
                headless: env_parse("HEADLESS", defaults.browser.headless),
                window_width: defaults.browser.window_width,
                window_height: defaults.browser.window_height,
            },
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.session.cookie.trim().is_empty() {
            errors.push("SESSION_COOKIE must be set".to_string());
        }

        if self.session.target.trim().is_empty() {
            errors.push("TARGET_PROFILE must be set".to_string());
        }

        if self.scrape.max_posts == 0 {
            errors.push("Post ceiling must be greater than 0".to_string());
        }

        if self.scrape.max_scroll_attempts == 0 {
            errors.push("Scroll attempt cap must be greater than 0".to_string());
        }

        if self.scrape.poll_interval_ms == 0 {
            errors.push("Poll interval must be greater than 0".to_string());
        }

        if self.scrape.download_timeout_secs == 0 {
            errors.push("Download timeout must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scrape.poll_interval_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape.download_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scrape.max_posts, 10);
        assert_eq!(config.scrape.max_scroll_attempts, 8);
        assert_eq!(config.scrape.poll_interval_ms, 1500);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.session.cookie = "AQEDASomeCookie".to_string();
        config.session.target = "jane-doe".to_string();
        assert!(config.validate().is_ok());

        config.session.cookie = String::new();
        assert!(config.validate().is_err());

        config.session.cookie = "AQEDASomeCookie".to_string();
        config.scrape.max_posts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_credential_reported_once_per_field() {
        let config = Config::default();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("SESSION_COOKIE")));
        assert!(errors.iter().any(|e| e.contains("TARGET_PROFILE")));
    }
}
