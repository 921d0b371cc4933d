//! Application registration flow.
//!
//! The device only hands out an application token once someone presses a
//! button on its front display. [`Authorizer::register`] files the request,
//! [`Authorizer::wait_for_approval`] polls its status until the device
//! settles it.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::identity::{ApplicationIdentity, AuthorizationStatus};
use crate::auth::tokens::ApplicationToken;
use crate::client::{endpoint, Transport, TransportExt};
use crate::error::{FreeboxError, Result};

/// Polling cadence and deadline for [`Authorizer::wait_for_approval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay before each status poll.
    pub interval: Duration,
    /// Upper bound on the whole wait; `None` waits until the device settles.
    pub max_wait: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_wait: Some(Duration::from_secs(300)),
        }
    }
}

/// Registration accepted by the device, awaiting approval.
#[derive(Debug, Deserialize)]
pub struct PendingAuthorization {
    /// Token that becomes valid once the request is granted.
    pub app_token: ApplicationToken,
    /// Identifier to poll the request status with.
    pub track_id: u64,
}

#[derive(Deserialize)]
struct TrackedStatus {
    status: AuthorizationStatus,
}

/// Drives the one-time registration of an application.
pub struct Authorizer<T: Transport + ?Sized> {
    transport: Arc<T>,
    base_url: Url,
    options: PollOptions,
}

impl<T: Transport + ?Sized> Authorizer<T> {
    /// Creates an authorizer talking to the API at `base_url`.
    pub const fn new(transport: Arc<T>, base_url: Url, options: PollOptions) -> Self {
        Self {
            transport,
            base_url,
            options,
        }
    }

    /// Files an authorization request for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::Registration`] if the device refuses the
    /// request, or a protocol error if the answer lacks the token or track id.
    pub async fn register(&self, identity: &ApplicationIdentity) -> Result<PendingAuthorization> {
        let url = endpoint(&self.base_url, "login/authorize/")?;
        let body = json!({
            "app_id": identity.app_id,
            "app_name": identity.app_name,
            "app_version": identity.app_version,
            "device_name": identity.device_name,
        });

        let envelope = self.transport.post(url, body).await?;
        if !envelope.success {
            return Err(FreeboxError::Registration {
                envelope: Box::new(envelope),
            });
        }

        let pending: PendingAuthorization = envelope.extract("authorization request")?;
        tracing::info!(
            app_id = %identity.app_id,
            track_id = pending.track_id,
            "authorization request filed, waiting for approval on the device"
        );
        Ok(pending)
    }

    /// Fetches the current status of an authorization request.
    pub async fn status(&self, track_id: u64) -> Result<AuthorizationStatus> {
        let url = endpoint(&self.base_url, &format!("login/authorize/{track_id}"))?;
        let tracked: TrackedStatus = self
            .transport
            .get(url)
            .await?
            .extract("authorization status")?;
        Ok(tracked.status)
    }

    /// Polls until the request is granted, refused, timed out or cancelled.
    ///
    /// # Errors
    ///
    /// - [`FreeboxError::ApprovalRefused`] on any terminal status but `granted`
    /// - [`FreeboxError::ApprovalTimeout`] when `max_wait` elapses first
    /// - [`FreeboxError::Cancelled`] when `cancel` fires first
    /// - transport and protocol errors from any poll, without retry
    pub async fn wait_for_approval(
        &self,
        pending: PendingAuthorization,
        cancel: &CancellationToken,
    ) -> Result<ApplicationToken> {
        let track_id = pending.track_id;
        let polling = self.poll_until_settled(track_id);

        let bounded = async {
            match self.options.max_wait {
                Some(limit) => tokio::time::timeout(limit, polling)
                    .await
                    .unwrap_or(Err(FreeboxError::ApprovalTimeout { waited: limit })),
                None => polling.await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FreeboxError::Cancelled),
            outcome = bounded => outcome,
        }?;

        tracing::info!(track_id, "application authorization granted");
        Ok(pending.app_token)
    }

    async fn poll_until_settled(&self, track_id: u64) -> Result<()> {
        let mut polls = 0_u32;
        loop {
            tokio::time::sleep(self.options.interval).await;
            let status = self.status(track_id).await?;
            polls += 1;
            tracing::debug!(track_id, polls, %status, "authorization status");

            match status {
                AuthorizationStatus::Pending => {}
                AuthorizationStatus::Granted => return Ok(()),
                status => return Err(FreeboxError::ApprovalRefused { status }),
            }
        }
    }

    /// Registers `identity` and waits for the device owner to approve it.
    pub async fn register_and_wait(
        &self,
        identity: &ApplicationIdentity,
        cancel: &CancellationToken,
    ) -> Result<ApplicationToken> {
        let pending = self.register(identity).await?;
        self.wait_for_approval(pending, cancel).await
    }
}
