//! Transport abstraction over the Freebox HTTP API.
//!
//! - [`Transport`] - Trait performing one exchange and returning the envelope
//! - [`TransportExt`] - Unauthenticated `get`/`post`/`put`/`delete` shorthands
//! - [`HttpTransport`] - Implementation on a `reqwest` middleware stack

use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use url::Url;

use crate::client::envelope::{ApiRequest, Envelope};
use crate::client::middleware::RequestLogMiddleware;
use crate::config::ApiConfig;
use crate::error::{FreeboxError, Result};

/// Header carrying the session token on authenticated calls.
pub const SESSION_HEADER: &str = "X-Fbx-App-Auth";

/// Trait for API transports (enables substituting a fake in tests).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one HTTP exchange and parses the response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`FreeboxError::Transport`] if the request cannot be sent or
    /// the response body is not a JSON envelope. A parsed envelope is
    /// returned as is, even when `success` is false.
    async fn execute(&self, request: ApiRequest) -> Result<Envelope>;
}

/// Unauthenticated shorthands available on every [`Transport`].
#[async_trait]
pub trait TransportExt: Transport {
    /// `GET url`.
    async fn get(&self, url: Url) -> Result<Envelope> {
        self.execute(ApiRequest::new(Method::GET, url)).await
    }

    /// `POST url` with a JSON body.
    async fn post(&self, url: Url, body: Value) -> Result<Envelope> {
        self.execute(ApiRequest::new(Method::POST, url).with_body(body))
            .await
    }

    /// `PUT url` with a JSON body.
    async fn put(&self, url: Url, body: Value) -> Result<Envelope> {
        self.execute(ApiRequest::new(Method::PUT, url).with_body(body))
            .await
    }

    /// `DELETE url`.
    async fn delete(&self, url: Url) -> Result<Envelope> {
        self.execute(ApiRequest::new(Method::DELETE, url)).await
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

/// Transport talking to a real device over HTTP.
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let inner_client = Client::builder()
            .user_agent(format!(
                "terraform-provider-freebox/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let client = ClientBuilder::new(inner_client)
            .with(RequestLogMiddleware)
            .build();

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Envelope> {
        let mut builder = self.client.request(request.method, request.url);

        if let Some(token) = &request.session_token {
            builder = builder.header(SESSION_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // The device answers errors (403, 404, ...) with an envelope too.
        serde_json::from_slice(&bytes).map_err(|e| {
            FreeboxError::Transport(format!("malformed response body (HTTP {status}): {e}"))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> (HttpTransport, Url) {
        let config = ApiConfig {
            base_url: Url::parse(&format!("{}/api/v4/", server.uri())).unwrap(),
            timeout_secs: 5,
        };
        let transport = HttpTransport::new(&config).unwrap();
        (transport, config.base_url)
    }

    #[tokio::test]
    async fn get_parses_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": { "logged_in": false, "challenge": "abc" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (transport, base) = transport_for(&server);
        let envelope = transport.get(base.join("login/").unwrap()).await.unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.result.unwrap()["challenge"], "abc");
    }

    #[tokio::test]
    async fn session_token_and_body_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v4/wifi/config/"))
            .and(header(SESSION_HEADER, "tok1"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "enabled": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let (transport, base) = transport_for(&server);
        let request = ApiRequest::new(Method::PUT, base.join("wifi/config/").unwrap())
            .with_session_token("tok1")
            .with_body(json!({ "enabled": false }));

        let envelope = transport.execute(request).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.result, None);
    }

    #[tokio::test]
    async fn error_status_still_yields_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/connection/"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "error_code": "auth_required",
                "msg": "Invalid session token, or not session token sent",
            })))
            .mount(&server)
            .await;

        let (transport, base) = transport_for(&server);
        let envelope = transport.get(base.join("connection/").unwrap()).await.unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.error_code.as_deref(), Some("auth_required"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
            .mount(&server)
            .await;

        let (transport, base) = transport_for(&server);
        let err = transport.get(base.join("login/").unwrap()).await.unwrap_err();

        assert!(matches!(err, FreeboxError::Transport(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_device_is_a_transport_error() {
        let server = MockServer::start().await;
        let (transport, base) = transport_for(&server);
        drop(server);

        let err = transport.get(base.join("login/").unwrap()).await.unwrap_err();
        assert!(matches!(err, FreeboxError::Transport(_)));
    }
}
