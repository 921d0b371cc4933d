//! Error types and result aliases for the Freebox client.
//!
//! This module provides a single error type covering:
//! - Transport failures (the HTTP exchange itself failed)
//! - Protocol failures (the device answered, but not with what the handshake expects)
//! - Authorization outcomes (refused, timed out, cancelled)
//! - Session misuse (operations on a client that is not authenticated)
//! - Ambient failures (configuration, credential storage, IO)

use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthorizationStatus;
use crate::client::Envelope;

/// Device error codes meaning the session token was rejected.
const SESSION_REJECTED_CODES: &[&str] = &["auth_required", "invalid_session"];

/// Device error codes meaning the application token itself is unusable.
const APP_TOKEN_REJECTED_CODES: &[&str] = &["invalid_token", "pending_token"];

/// Main error type for Freebox operations.
///
/// Each variant includes a user-friendly message with actionable recovery steps.
/// Use [`is_session_rejected`](Self::is_session_rejected) and
/// [`requires_new_token`](Self::requires_new_token) to pick a recovery strategy.
#[derive(Error, Debug)]
pub enum FreeboxError {
    /// The HTTP call itself failed (connection, timeout, unreadable body).
    #[error("Transport error: {0}. Check that the Freebox is reachable from this host.")]
    Transport(String),

    /// The device answered, but the envelope reported failure or lacked an expected field.
    #[error("Protocol error: {message}")]
    Protocol {
        /// What was expected and not found.
        message: String,
        /// The raw envelope, when one was received.
        envelope: Option<Box<Envelope>>,
    },

    /// The device refused the application registration request.
    #[error("Application registration failed: {}", .envelope.describe())]
    Registration {
        /// The raw envelope returned by the device.
        envelope: Box<Envelope>,
    },

    /// The authorization request ended in a status other than `granted`.
    #[error("Access was refused or not granted in time ({status}). Run 'create-token' again and confirm on the Freebox display.")]
    ApprovalRefused {
        /// The terminal status reported by the device.
        status: AuthorizationStatus,
    },

    /// Nobody approved the authorization request within the configured deadline.
    #[error("No approval received within {}s. Run 'create-token' again and confirm on the Freebox display.", .waited.as_secs())]
    ApprovalTimeout {
        /// The deadline that elapsed.
        waited: Duration,
    },

    /// The wait for approval was cancelled by the caller.
    #[error("Authorization cancelled.")]
    Cancelled,

    /// An operation was attempted on a session that is not authenticated.
    #[error("Session is {state}; open a new session to talk to the Freebox.")]
    InvalidState {
        /// Name of the state the session was in.
        state: &'static str,
    },

    /// An authenticated API call returned `success=false`.
    #[error("Freebox API call failed: {}", .envelope.describe())]
    Api {
        /// The full envelope, for diagnostics.
        envelope: Box<Envelope>,
    },

    /// No application token is configured or stored for this application.
    #[error("No application token for '{app_id}'. Run 'create-token' first, or set FREEBOX_APP_TOKEN.")]
    NoAppToken {
        /// The application the token was looked up for.
        app_id: String,
    },

    /// Failed to access the OS keyring.
    #[error("Failed to access credential storage: {0}. Ensure your system keyring is unlocked.")]
    CredentialStorage(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Data serialization error: {0}")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FreeboxError {
    /// Builds a protocol error that carries the offending envelope.
    pub fn protocol(message: impl Into<String>, envelope: Envelope) -> Self {
        Self::Protocol {
            message: message.into(),
            envelope: Some(Box::new(envelope)),
        }
    }

    /// Returns the device error code, when the error carries an envelope.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { envelope } | Self::Registration { envelope } => {
                envelope.error_code.as_deref()
            }
            Self::Protocol {
                envelope: Some(envelope),
                ..
            } => envelope.error_code.as_deref(),
            _ => None,
        }
    }

    /// Checks if the device rejected the session token.
    ///
    /// A fresh login may succeed where the call failed; this drives the
    /// session client's single refresh attempt.
    #[must_use]
    pub fn is_session_rejected(&self) -> bool {
        matches!(self, Self::Api { .. })
            && self
                .error_code()
                .is_some_and(|code| SESSION_REJECTED_CODES.contains(&code))
    }

    /// Checks if this error can only be resolved by creating a new application token.
    #[must_use]
    pub fn requires_new_token(&self) -> bool {
        match self {
            Self::ApprovalRefused { .. } | Self::ApprovalTimeout { .. } | Self::NoAppToken { .. } => {
                true
            }
            _ => self
                .error_code()
                .is_some_and(|code| APP_TOKEN_REJECTED_CODES.contains(&code)),
        }
    }
}

/// Result type alias using [`FreeboxError`].
pub type Result<T> = std::result::Result<T, FreeboxError>;

impl From<serde_json::Error> for FreeboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for FreeboxError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<keyring::Error> for FreeboxError {
    fn from(err: keyring::Error) -> Self {
        Self::CredentialStorage(err.to_string())
    }
}

impl From<reqwest::Error> for FreeboxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else if err.is_connect() {
            Self::Transport(format!("cannot connect: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for FreeboxError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => Self::Transport(err.to_string()),
        }
    }
}
