//! Authentication module.
//!
//! This module provides the one-time application registration flow, the
//! challenge/response password derivation used by session logins, and
//! secure storage for the resulting application token.

pub mod authorize;
pub mod credentials;
pub mod identity;
pub mod password;
pub mod tokens;

pub use authorize::{Authorizer, PendingAuthorization, PollOptions};
pub use credentials::{resolve_app_token, KeyringTokenStore, TokenStore};
pub use identity::{ApplicationIdentity, AuthorizationStatus};
pub use password::derive_password;
pub use tokens::{ApplicationToken, Challenge, SessionToken, StoredToken};
