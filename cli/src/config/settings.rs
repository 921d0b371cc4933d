//! Application configuration settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::identity::{
    default_device_name, ApplicationIdentity, DEFAULT_APP_ID, DEFAULT_APP_NAME, DEFAULT_APP_VERSION,
};
use crate::auth::PollOptions;

/// Default API location. The device serves newer API versions too, but v4
/// is the documented one.
pub const DEFAULT_API_BASE_URL: &str = "http://mafreebox.freebox.fr/api/v4";

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeboxConfig {
    /// API client settings.
    pub api: ApiConfig,
    /// Application identity and token.
    pub app: AppConfig,
    /// Registration polling settings.
    pub authorization: AuthorizationConfig,
    /// Session settings.
    pub session: SessionConfig,
}

/// API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Versioned API base URL.
    #[serde(with = "url_serde")]
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("valid default URL"),
            timeout_secs: 30,
        }
    }
}

/// Application identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    /// Device name shown in FreeboxOS; the host name when unset.
    pub device_name: Option<String>,
    /// Application token. Prefer the keyring or `FREEBOX_APP_TOKEN`.
    pub app_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            device_name: None,
            app_token: None,
        }
    }
}

impl AppConfig {
    /// Identity to register the application with.
    #[must_use]
    pub fn identity(&self) -> ApplicationIdentity {
        ApplicationIdentity {
            app_id: self.app_id.clone(),
            app_name: self.app_name.clone(),
            app_version: self.app_version.clone(),
            device_name: self
                .device_name
                .clone()
                .unwrap_or_else(default_device_name),
        }
    }
}

/// Registration polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Delay between two status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up waiting for approval after this many seconds; `0` waits forever.
    pub max_wait_secs: u64,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_wait_secs: 300,
        }
    }
}

impl AuthorizationConfig {
    /// Polling options for the authorizer.
    #[must_use]
    pub const fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: if self.max_wait_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(self.max_wait_secs))
            },
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Log in again once when the device rejects the session token.
    pub refresh_on_rejection: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_on_rejection: true,
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const API_URL: &str = "FREEBOX_API_URL";
    pub const APP_ID: &str = "FREEBOX_APP_ID";
    pub const APP_TOKEN: &str = "FREEBOX_APP_TOKEN";
    pub const LOG_LEVEL: &str = "FREEBOX_LOG";
}

impl FreeboxConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up through `lookup`.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(env::API_URL) {
            match Url::parse(&url) {
                Ok(parsed) => self.api.base_url = parsed,
                Err(e) => tracing::warn!(%url, error = %e, "ignoring invalid {}", env::API_URL),
            }
        }

        if let Some(app_id) = lookup(env::APP_ID).filter(|v| !v.is_empty()) {
            self.app.app_id = app_id;
        }

        if let Some(token) = lookup(env::APP_TOKEN).filter(|v| !v.is_empty()) {
            self.app.app_token = Some(token);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_freebox_os() {
        let config = FreeboxConfig::default();
        assert_eq!(config.api.base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(config.app.app_id, "terraform");
        assert!(config.session.refresh_on_rejection);

        let options = config.authorization.poll_options();
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.max_wait, Some(Duration::from_secs(300)));
    }

    #[test]
    fn zero_max_wait_means_unbounded() {
        let config = AuthorizationConfig {
            poll_interval_ms: 250,
            max_wait_secs: 0,
        };
        assert_eq!(config.poll_options().max_wait, None);
    }

    #[test]
    fn overrides_replace_values() {
        let vars = HashMap::from([
            (env::API_URL, "http://192.168.0.254/api/v8"),
            (env::APP_ID, "homelab"),
            (env::APP_TOKEN, "secret"),
        ]);

        let config = FreeboxConfig::default()
            .with_overrides_from(|name| vars.get(name).map(ToString::to_string));

        assert_eq!(config.api.base_url.as_str(), "http://192.168.0.254/api/v8");
        assert_eq!(config.app.app_id, "homelab");
        assert_eq!(config.app.app_token.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_url_override_is_ignored() {
        let config = FreeboxConfig::default().with_overrides_from(|name| {
            (name == env::API_URL).then(|| "not a url".to_string())
        });
        assert_eq!(config.api.base_url.as_str(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn identity_defaults_device_name_to_hostname() {
        let mut app = AppConfig::default();
        assert!(!app.identity().device_name.is_empty());

        app.device_name = Some("nas".to_string());
        assert_eq!(app.identity().device_name, "nas");
    }
}
