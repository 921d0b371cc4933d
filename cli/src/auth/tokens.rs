//! Secret values exchanged during authentication.
//!
//! None of these types print their content through `Debug`, so they can sit
//! in structs that are logged or included in error reports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable secret proving the application was approved once on the device.
///
/// Only ever used as the HMAC key of the login handshake; never sent on
/// the wire after registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationToken(String);

impl ApplicationToken {
    /// Wraps a token obtained from registration or from storage.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the secret, for display to the operator or for storage.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ApplicationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApplicationToken(***)")
    }
}

/// Server-issued nonce for one login attempt.
///
/// Consumed by value when the password is derived, so a challenge can feed
/// at most one derivation.
#[derive(PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Challenge(String);

impl Challenge {
    #[must_use]
    pub fn new(challenge: impl Into<String>) -> Self {
        Self(challenge.into())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Challenge(***)")
    }
}

/// Short-lived session credential, owned by exactly one session client.
#[derive(PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Application token persisted by the token utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Application the token was issued to.
    pub app_id: String,
    /// The durable secret.
    pub app_token: ApplicationToken,
    /// API the token was registered against.
    pub api_base_url: String,
    /// When the token was granted.
    pub created_at: DateTime<Utc>,
}

impl StoredToken {
    #[must_use]
    pub fn new(app_id: &str, app_token: ApplicationToken, api_base_url: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_token,
            api_base_url: api_base_url.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let token = ApplicationToken::new("dyNYgfK0Ya6FWGqq83sBHa7TwzWo+pg4fDFUJHShcjVYzTfaRrZzm93p7OTAfH/0");
        assert_eq!(format!("{token:?}"), "ApplicationToken(***)");

        let stored = StoredToken::new("terraform", token, "http://mafreebox.freebox.fr/api/v4");
        assert!(!format!("{stored:?}").contains("dyNYgfK0"));
    }

    #[test]
    fn stored_token_serializes_secret_as_plain_string() {
        let stored = StoredToken::new(
            "terraform",
            ApplicationToken::new("secret"),
            "http://mafreebox.freebox.fr/api/v4",
        );
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["app_token"], "secret");

        let restored: StoredToken = serde_json::from_value(json).unwrap();
        assert_eq!(restored.app_token, ApplicationToken::new("secret"));
    }
}
