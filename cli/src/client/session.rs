//! Authenticated session against the Freebox API.
//!
//! A [`SessionClient`] goes through three states:
//!
//! ```text
//! Unauthenticated --login--> Authenticated --close--> Closed
//! ```
//!
//! Logging in fetches a fresh challenge, answers it with
//! `HMAC-SHA1(app_token, challenge)` and keeps the returned session token,
//! which is then sent as `X-Fbx-App-Auth` on every call. Closing sends a
//! logout. A client is never reused after it is closed.

use std::collections::BTreeMap;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::auth::{derive_password, ApplicationToken, Challenge, SessionToken};
use crate::client::envelope::{endpoint, ApiRequest, Envelope};
use crate::client::transport::Transport;
use crate::error::{FreeboxError, Result};

/// Future returned by the closure given to [`SessionClient::run`].
pub type SessionFuture<'a, R> = Pin<Box<dyn Future<Output = Result<R>> + Send + 'a>>;

/// Lifecycle state of a [`SessionClient`].
#[derive(Debug)]
pub enum SessionState {
    /// No session token yet.
    Unauthenticated,
    /// Logged in; holds the session token.
    Authenticated(SessionToken),
    /// Logged out; the client cannot be used anymore.
    Closed,
}

impl SessionState {
    /// Name of the state, for error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "not logged in",
            Self::Authenticated(_) => "authenticated",
            Self::Closed => "closed",
        }
    }
}

#[derive(Deserialize)]
struct LoginChallenge {
    challenge: Challenge,
}

#[derive(Deserialize)]
struct OpenedSession {
    session_token: SessionToken,
    #[serde(default)]
    permissions: BTreeMap<String, bool>,
}

/// Client holding one authenticated session.
pub struct SessionClient<T: Transport + ?Sized + 'static> {
    transport: Arc<T>,
    base_url: Url,
    app_id: String,
    app_token: ApplicationToken,
    state: SessionState,
    permissions: BTreeMap<String, bool>,
    refresh_on_rejection: bool,
}

impl<T: Transport + ?Sized + 'static> SessionClient<T> {
    /// Creates a client that has not logged in yet.
    pub fn new(
        transport: Arc<T>,
        base_url: Url,
        app_id: impl Into<String>,
        app_token: ApplicationToken,
    ) -> Self {
        Self {
            transport,
            base_url,
            app_id: app_id.into(),
            app_token,
            state: SessionState::Unauthenticated,
            permissions: BTreeMap::new(),
            refresh_on_rejection: true,
        }
    }

    /// Creates a client and logs in.
    ///
    /// # Errors
    ///
    /// Returns any error from [`login`](Self::login).
    pub async fn connect(
        transport: Arc<T>,
        base_url: Url,
        app_id: impl Into<String>,
        app_token: ApplicationToken,
    ) -> Result<Self> {
        let mut client = Self::new(transport, base_url, app_id, app_token);
        client.login().await?;
        Ok(client)
    }

    /// Enables or disables the single re-login when the device rejects the
    /// session token mid-session. Enabled by default.
    #[must_use]
    pub fn with_refresh_on_rejection(mut self, enabled: bool) -> Self {
        self.refresh_on_rejection = enabled;
        self
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the client holds a session token.
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Permissions granted to the application for the current session.
    pub const fn permissions(&self) -> &BTreeMap<String, bool> {
        &self.permissions
    }

    /// Performs the challenge/response login.
    ///
    /// On failure the client is left without a session token.
    ///
    /// # Errors
    ///
    /// - [`FreeboxError::InvalidState`] if the client is already logged in
    ///   or closed
    /// - [`FreeboxError::Protocol`] if either step reports failure or lacks
    ///   the challenge or session token
    /// - [`FreeboxError::Transport`] if a request cannot be performed
    pub async fn login(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Unauthenticated) {
            return Err(FreeboxError::InvalidState {
                state: self.state.name(),
            });
        }
        self.open_session().await
    }

    /// Runs the handshake and stores the new session token.
    ///
    /// Any token held before is dropped without a logout, so this is only
    /// called from a fresh client or after the device rejected the token.
    async fn open_session(&mut self) -> Result<()> {
        self.state = SessionState::Unauthenticated;

        let url = endpoint(&self.base_url, "login/")?;
        let LoginChallenge { challenge } = self
            .transport
            .execute(ApiRequest::new(Method::GET, url))
            .await?
            .extract("login challenge")?;

        let password = derive_password(&self.app_token, challenge);

        let url = endpoint(&self.base_url, "login/session/")?;
        let body = json!({ "app_id": self.app_id, "password": password });
        let opened: OpenedSession = self
            .transport
            .execute(ApiRequest::new(Method::POST, url).with_body(body))
            .await?
            .extract("session opening")?;

        tracing::info!(app_id = %self.app_id, "freebox session opened");
        self.permissions = opened.permissions;
        self.state = SessionState::Authenticated(opened.session_token);
        Ok(())
    }

    /// Performs an authenticated call and returns its `result` payload.
    ///
    /// `body` is sent as JSON when present. An absent payload is returned as
    /// [`Value::Null`]. When the device rejects the session token and refresh
    /// is enabled, logs in again and replays the call once.
    ///
    /// # Errors
    ///
    /// - [`FreeboxError::InvalidState`] if the client is not authenticated
    /// - [`FreeboxError::Api`] if the device reports `success=false`
    /// - [`FreeboxError::Transport`] if the request cannot be performed
    pub async fn request(&mut self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let first = self.send(method.clone(), path, body.clone()).await;
        match first {
            Err(err) if self.refresh_on_rejection && err.is_session_rejected() => {
                tracing::warn!(%method, path, error = %err, "session token rejected, logging in again");
                self.open_session().await?;
                self.send(method, path, body).await
            }
            outcome => outcome,
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let SessionState::Authenticated(token) = &self.state else {
            return Err(FreeboxError::InvalidState {
                state: self.state.name(),
            });
        };

        let mut request =
            ApiRequest::new(method, endpoint(&self.base_url, path)?).with_session_token(token.expose());
        request.body = body;

        let result = self.transport.execute(request).await?.into_result()?;
        Ok(result.unwrap_or(Value::Null))
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    /// `GET path`, deserializing the payload into `D`.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::Protocol`] if the payload does not match `D`,
    /// on top of the errors of [`request`](Self::request).
    pub async fn get_as<D: DeserializeOwned>(&mut self, path: &str) -> Result<D> {
        let result = self.get(path).await?;
        serde_json::from_value(result.clone()).map_err(|e| {
            FreeboxError::protocol(
                format!("unexpected payload from {path}: {e}"),
                Envelope::ok(result),
            )
        })
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&mut self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&mut self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `DELETE path`.
    pub async fn delete(&mut self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }

    /// Logs out and discards the session token.
    ///
    /// The client is closed whatever the outcome of the logout call. Closing
    /// a client that is already closed, or that never logged in, does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::Api`] if the device reports the logout failed,
    /// or [`FreeboxError::Transport`] if it could not be sent.
    pub async fn close(&mut self) -> Result<()> {
        let SessionState::Authenticated(token) = mem::replace(&mut self.state, SessionState::Closed)
        else {
            return Ok(());
        };

        self.transport
            .execute(logout_request(&self.base_url, &token)?)
            .await?
            .into_result()?;

        tracing::info!(app_id = %self.app_id, "freebox session closed");
        Ok(())
    }

    /// Runs `operation` on this session, then closes it.
    ///
    /// The logout is attempted whether `operation` succeeds or fails. An
    /// operation error takes precedence over a logout error.
    ///
    /// ```ignore
    /// let status = session
    ///     .run(|s| Box::pin(async move { s.get("connection/").await }))
    ///     .await?;
    /// ```
    pub async fn run<R, F>(mut self, operation: F) -> Result<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> SessionFuture<'a, R>,
    {
        let outcome = operation(&mut self).await;
        let closed = self.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "logout after failed operation also failed");
                Err(err)
            }
        }
    }
}

fn logout_request(base_url: &Url, token: &SessionToken) -> Result<ApiRequest> {
    Ok(ApiRequest::new(Method::POST, endpoint(base_url, "login/logout/")?)
        .with_session_token(token.expose()))
}

impl<T: Transport + ?Sized + 'static> Drop for SessionClient<T> {
    /// Logs out in the background when a client is dropped while still
    /// authenticated (cancelled task, early return, panic).
    fn drop(&mut self) {
        let SessionState::Authenticated(token) = mem::replace(&mut self.state, SessionState::Closed)
        else {
            return;
        };

        let request = match logout_request(&self.base_url, &token) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build logout request, session left open");
                return;
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.transport);
                handle.spawn(async move {
                    match transport.execute(request).await {
                        Ok(envelope) if envelope.success => {
                            tracing::debug!("freebox session closed on drop");
                        }
                        Ok(envelope) => {
                            tracing::warn!(error = %envelope.describe(), "logout on drop refused");
                        }
                        Err(e) => tracing::warn!(error = %e, "logout on drop failed"),
                    }
                });
            }
            Err(_) => tracing::warn!("session dropped outside a runtime, session left open on the device"),
        }
    }
}
