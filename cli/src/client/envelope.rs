//! Wire types shared by every Freebox API exchange.

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{FreeboxError, Result};

/// Uniform response wrapper returned by the device for every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the call succeeded.
    pub success: bool,
    /// Call payload, absent for calls that return nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Machine-readable error code (`auth_required`, `invalid_token`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Any other field the device sent along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Builds a successful envelope around `result`.
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error_code: None,
            msg: None,
            extra: Map::new(),
        }
    }

    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.msg, &self.error_code) {
            (Some(msg), Some(code)) => format!("{msg} ({code})"),
            (Some(msg), None) => msg.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "no error details".to_string(),
        }
    }

    /// Validates the success flag of an authenticated call and returns the
    /// payload.
    ///
    /// A failed envelope becomes [`FreeboxError::Api`], carrying the device's
    /// error code.
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.success {
            Ok(self.result)
        } else {
            Err(FreeboxError::Api {
                envelope: Box::new(self),
            })
        }
    }

    /// Validates the success flag and deserializes the payload.
    ///
    /// Fails with a protocol error when the payload is absent or does not
    /// carry the expected fields.
    pub fn extract<D: DeserializeOwned>(self, what: &str) -> Result<D> {
        if !self.success {
            return Err(FreeboxError::protocol(
                format!("{what} failed: {}", self.describe()),
                self,
            ));
        }
        let Some(result) = self.result.clone() else {
            return Err(FreeboxError::protocol(
                format!("{what} returned no result"),
                self,
            ));
        };
        serde_json::from_value(result).map_err(|e| {
            FreeboxError::protocol(format!("{what} returned an unexpected result: {e}"), self)
        })
    }
}

/// One HTTP exchange as handed to a [`Transport`](super::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Session token for the `X-Fbx-App-Auth` header, if any.
    pub session_token: Option<String>,
    /// JSON body, omitted for bodyless calls.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates an unauthenticated request without a body.
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            session_token: None,
            body: None,
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

/// Joins an API path onto the versioned base URL.
///
/// `http://mafreebox.freebox.fr/api/v4` and `.../api/v4/` are equivalent
/// bases, and `connection/` and `/connection/` equivalent paths.
pub fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_keeps_unknown_fields() {
        let envelope: Envelope = serde_json::from_value(json!({
            "success": false,
            "error_code": "insufficient_rights",
            "msg": "Cette application n'est pas autorisée",
            "missing_right": "settings",
        }))
        .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.extra.get("missing_right"), Some(&json!("settings")));
        assert_eq!(
            envelope.describe(),
            "Cette application n'est pas autorisée (insufficient_rights)"
        );
    }

    #[test]
    fn into_result_returns_absent_payload_as_none() {
        let envelope: Envelope = serde_json::from_value(json!({ "success": true })).unwrap();
        assert_eq!(envelope.into_result().unwrap(), None);
    }

    #[test]
    fn into_result_rejects_failed_envelope() {
        let envelope: Envelope =
            serde_json::from_value(json!({ "success": false, "error_code": "denied" })).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, FreeboxError::Api { .. }));
        assert_eq!(err.error_code(), Some("denied"));
    }

    #[test]
    fn extract_reports_missing_field() {
        #[derive(Debug, Deserialize)]
        struct Challenge {
            #[allow(dead_code)]
            challenge: String,
        }

        let envelope = Envelope::ok(json!({ "logged_in": false }));
        let err = envelope.extract::<Challenge>("login").unwrap_err();
        assert!(err.to_string().contains("unexpected result"));

        let envelope: Envelope = serde_json::from_value(json!({ "success": true })).unwrap();
        let err = envelope.extract::<Challenge>("login").unwrap_err();
        assert!(err.to_string().contains("no result"));
    }

    #[test]
    fn endpoint_tolerates_slashes() {
        let with = Url::parse("http://mafreebox.freebox.fr/api/v4/").unwrap();
        let without = Url::parse("http://mafreebox.freebox.fr/api/v4").unwrap();

        let expected = "http://mafreebox.freebox.fr/api/v4/login/session/";
        assert_eq!(endpoint(&with, "login/session/").unwrap().as_str(), expected);
        assert_eq!(endpoint(&without, "/login/session/").unwrap().as_str(), expected);
        assert_eq!(
            endpoint(&without, "login/authorize/42").unwrap().as_str(),
            "http://mafreebox.freebox.fr/api/v4/login/authorize/42"
        );
    }
}
