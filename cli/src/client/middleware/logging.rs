//! Request logging middleware.

use std::time::Instant;

use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};

/// Middleware that traces every exchange with the device.
///
/// Only the method, URL, status and latency are logged; headers are not,
/// so the session token never reaches the logs.
pub struct RequestLogMiddleware;

#[async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let started = Instant::now();

        let outcome = next.run(req, extensions).await;

        match &outcome {
            Ok(response) => tracing::debug!(
                %method,
                %url,
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
                "freebox request"
            ),
            Err(e) => tracing::debug!(%method, %url, error = %e, "freebox request failed"),
        }

        outcome
    }
}
