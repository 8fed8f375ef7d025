use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub thumbor: ThumborConfig,
    pub local: LocalConfig,
}

#[derive(Debug, Clone)]
pub struct ThumborConfig {
    /// Public read-only host that serves signed URLs
    pub server: String,
    /// Private host accepting uploads and deletes
    pub rw_server: String,
    /// Secret shared with Thumbor for URL signing
    pub security_key: String,
    /// Per-request timeout; the HTTP client's default when unset
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Root directory of files stored before the move to Thumbor
    pub location: String,
    pub base_url: String,
}

impl Default for ThumborConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8888".to_string(),
            rw_server: "http://localhost:8888".to_string(),
            security_key: String::new(),
            timeout_seconds: None,
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            location: "./media".to_string(),
            base_url: "/media/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let server = lookup("THUMBOR_SERVER").unwrap_or(defaults.thumbor.server);
        let rw_server = lookup("THUMBOR_RW_SERVER").unwrap_or(defaults.thumbor.rw_server);
        let security_key = lookup("THUMBOR_SECURITY_KEY").unwrap_or_default();

        let timeout_seconds = match lookup("THUMBOR_TIMEOUT") {
            Some(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "THUMBOR_TIMEOUT must be a number of seconds, got '{s}'"
                ))
            })?),
            None => None,
        };

        let location = lookup("MEDIA_ROOT").unwrap_or(defaults.local.location);
        let base_url = lookup("MEDIA_URL").unwrap_or(defaults.local.base_url);

        let config = Config {
            thumbor: ThumborConfig {
                server: server.trim_end_matches('/').to_string(),
                rw_server: rw_server.trim_end_matches('/').to_string(),
                security_key,
                timeout_seconds,
            },
            local: LocalConfig { location, base_url },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbor.security_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "THUMBOR_SECURITY_KEY cannot be empty".to_string(),
            ));
        }

        for (var, url) in [
            ("THUMBOR_SERVER", &self.thumbor.server),
            ("THUMBOR_RW_SERVER", &self.thumbor.rw_server),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{var} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.thumbor.timeout_seconds == Some(0) {
            warn!("THUMBOR_TIMEOUT is 0; every Thumbor request will time out");
        }

        Ok(())
    }
}
