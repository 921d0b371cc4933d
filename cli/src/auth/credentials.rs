//! Application token storage using the operating system keyring.
//!
//! This module provides platform-specific secure storage for application tokens:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - Windows: Credential Manager
//!
//! Tokens are stored as JSON, one keyring entry per application id.

use keyring::Entry;

use crate::auth::tokens::{ApplicationToken, StoredToken};
use crate::config::FreeboxConfig;
use crate::error::{FreeboxError, Result};

const SERVICE_NAME: &str = "fr.freebox.terraform-provider";

/// Trait for application token storage (enables mocking).
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore {
    /// Saves a token, replacing any token stored for the same application.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the storage is inaccessible.
    fn save(&self, token: &StoredToken) -> Result<()>;

    /// Loads the token stored for `app_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::CredentialStorage`] if the stored data cannot be
    /// parsed or the storage is inaccessible.
    fn load(&self, app_id: &str) -> Result<Option<StoredToken>>;

    /// Deletes the token stored for `app_id`.
    ///
    /// Returns `true` if a token was deleted, `false` if none was stored.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::CredentialStorage`] if the storage is inaccessible.
    fn delete(&self, app_id: &str) -> Result<bool>;
}

/// Token storage backed by the OS keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry(app_id: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, app_id).map_err(|e| FreeboxError::CredentialStorage(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, token: &StoredToken) -> Result<()> {
        let json = serde_json::to_string(token)?;
        Self::entry(&token.app_id)?.set_password(&json)?;
        Ok(())
    }

    fn load(&self, app_id: &str) -> Result<Option<StoredToken>> {
        match Self::entry(app_id)?.get_password() {
            Ok(json) => {
                let token: StoredToken = serde_json::from_str(&json).map_err(|_| {
                    FreeboxError::CredentialStorage(format!(
                        "stored token for '{app_id}' is corrupted; run 'forget-token' then 'create-token'"
                    ))
                })?;
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, app_id: &str) -> Result<bool> {
        match Self::entry(app_id)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Finds the application token to log in with.
///
/// A token set in the configuration file or `FREEBOX_APP_TOKEN` wins over a
/// token stored by `create-token --store`.
///
/// # Errors
///
/// Returns [`FreeboxError::NoAppToken`] if neither source has a token.
pub fn resolve_app_token(
    config: &FreeboxConfig,
    store: &dyn TokenStore,
) -> Result<ApplicationToken> {
    if let Some(token) = config.app.app_token.as_deref() {
        return Ok(ApplicationToken::new(token));
    }

    match store.load(&config.app.app_id)? {
        Some(stored) => {
            tracing::debug!(app_id = %stored.app_id, created_at = %stored.created_at, "using stored application token");
            Ok(stored.app_token)
        }
        None => Err(FreeboxError::NoAppToken {
            app_id: config.app.app_id.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_token_wins_without_touching_store() {
        let mut config = FreeboxConfig::default();
        config.app.app_token = Some("from-config".to_string());

        let mut store = MockTokenStore::new();
        store.expect_load().never();

        let token = resolve_app_token(&config, &store).unwrap();
        assert_eq!(token.expose(), "from-config");
    }

    #[test]
    fn falls_back_to_stored_token() {
        let config = FreeboxConfig::default();

        let mut store = MockTokenStore::new();
        store
            .expect_load()
            .withf(|app_id| app_id == "terraform")
            .times(1)
            .returning(|app_id| {
                Ok(Some(StoredToken::new(
                    app_id,
                    ApplicationToken::new("from-keyring"),
                    "http://mafreebox.freebox.fr/api/v4",
                )))
            });

        let token = resolve_app_token(&config, &store).unwrap();
        assert_eq!(token.expose(), "from-keyring");
    }

    #[test]
    fn missing_token_names_the_application() {
        let mut config = FreeboxConfig::default();
        config.app.app_id = "homelab".to_string();

        let mut store = MockTokenStore::new();
        store.expect_load().returning(|_| Ok(None));

        let err = resolve_app_token(&config, &store).unwrap_err();
        assert!(matches!(err, FreeboxError::NoAppToken { ref app_id } if app_id == "homelab"));
    }

    #[test]
    fn storage_failure_is_propagated() {
        let config = FreeboxConfig::default();

        let mut store = MockTokenStore::new();
        store
            .expect_load()
            .returning(|_| Err(FreeboxError::CredentialStorage("locked".to_string())));

        let err = resolve_app_token(&config, &store).unwrap_err();
        assert!(matches!(err, FreeboxError::CredentialStorage(_)));
    }
}
