//! Freebox OS API client.
//!
//! Registers an application on a Freebox (one-time approval on the device's
//! display), logs in with the resulting application token through a
//! challenge/response handshake, and performs authenticated API calls.
//!
//! ```ignore
//! let transport = Arc::new(HttpTransport::new(&config.api)?);
//! let status = SessionClient::connect(transport, base_url, "terraform", app_token)
//!     .await?
//!     .run(|s| Box::pin(async move { s.get("connection/").await }))
//!     .await?;
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;

pub use auth::{ApplicationIdentity, ApplicationToken, Authorizer, PollOptions};
pub use client::{HttpTransport, SessionClient, Transport};
pub use error::{FreeboxError, Result};
