//! Freebox API client.
//!
//! - [`Transport`] / [`HttpTransport`] - one HTTP exchange, one envelope
//! - [`SessionClient`] - login handshake, authenticated calls, logout

pub mod envelope;
pub mod middleware;
pub mod session;
pub mod transport;

pub use envelope::{endpoint, ApiRequest, Envelope};
pub use session::{SessionClient, SessionFuture, SessionState};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{HttpTransport, Transport, TransportExt, SESSION_HEADER};

#[cfg(test)]
pub(crate) use transport::fake;
