//! Application identity and authorization status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default application identifier.
pub const DEFAULT_APP_ID: &str = "terraform";
/// Default application name, displayed in FreeboxOS.
pub const DEFAULT_APP_NAME: &str = "Terraform";
/// Default application version.
pub const DEFAULT_APP_VERSION: &str = "1.0";

/// Static description of the calling application.
///
/// The device lists the application under "Gestion des accès" with these
/// values once the registration is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationIdentity {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub device_name: String,
}

impl Default for ApplicationIdentity {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            device_name: default_device_name(),
        }
    }
}

/// Name of this machine, used as the default device name.
#[must_use]
pub fn default_device_name() -> String {
    hostname::get().map_or_else(|_| "unknown".into(), |h| h.to_string_lossy().to_string())
}

/// Status of a pending application authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    /// Waiting for someone to answer on the device display.
    Pending,
    /// Nobody answered before the device gave up.
    Timeout,
    /// The application token is now valid.
    Granted,
    /// Someone refused the request on the device.
    Denied,
    /// The track id is unknown to the device.
    #[serde(other)]
    Unknown,
}

impl AuthorizationStatus {
    /// Whether polling must stop.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Pending => write!(f, "pending"),
            Self::Timeout => write!(f, "timeout"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}
