//! Connection status read operation.
//!
//! Reads `GET connection/` and flattens it into the attribute mapping the
//! provider host consumes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::ApplicationToken;
use crate::client::{SessionClient, Transport};
use crate::error::Result;

const CONNECTION_PATH: &str = "connection/";

/// Status of the WAN connection, as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// `going_up`, `up`, `going_down` or `down`.
    pub state: String,
    /// `ethernet`, `rfc2684`, `pppoatm`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// `ftth`, `xdsl`, `backup_4g`, ...
    pub media: String,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    /// Upload rate in bytes/s.
    pub rate_up: u64,
    /// Download rate in bytes/s.
    pub rate_down: u64,
    /// Available upload bandwidth in bit/s.
    pub bandwidth_up: u64,
    /// Available download bandwidth in bit/s.
    pub bandwidth_down: u64,
    pub bytes_up: u64,
    pub bytes_down: u64,
    /// First and last port usable on a shared IPv4 address.
    #[serde(default)]
    pub ipv4_port_range: Vec<u64>,
}

/// Primitive attribute value handed to the provider host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Number(u64),
    NumberList(Vec<u64>),
    Null,
}

impl From<Option<String>> for AttributeValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::String)
    }
}

impl ConnectionStatus {
    /// Flattens the status into named attributes.
    #[must_use]
    pub fn to_attributes(&self) -> BTreeMap<&'static str, AttributeValue> {
        BTreeMap::from([
            ("state", AttributeValue::String(self.state.clone())),
            ("type", AttributeValue::String(self.kind.clone())),
            ("media", AttributeValue::String(self.media.clone())),
            ("ipv4", self.ipv4.clone().into()),
            ("ipv6", self.ipv6.clone().into()),
            ("rate_up", AttributeValue::Number(self.rate_up)),
            ("rate_down", AttributeValue::Number(self.rate_down)),
            ("bandwidth_up", AttributeValue::Number(self.bandwidth_up)),
            ("bandwidth_down", AttributeValue::Number(self.bandwidth_down)),
            ("bytes_up", AttributeValue::Number(self.bytes_up)),
            ("bytes_down", AttributeValue::Number(self.bytes_down)),
            (
                "ipv4_port_range",
                AttributeValue::NumberList(self.ipv4_port_range.clone()),
            ),
        ])
    }
}

/// Reads the connection status on an open session.
pub async fn read_connection_status<T: Transport + ?Sized + 'static>(
    session: &mut SessionClient<T>,
) -> Result<ConnectionStatus> {
    session.get_as(CONNECTION_PATH).await
}

/// Opens a session, reads the connection status and logs out.
pub async fn fetch_connection_status<T: Transport + ?Sized + 'static>(
    transport: Arc<T>,
    base_url: Url,
    app_id: &str,
    app_token: ApplicationToken,
    refresh_on_rejection: bool,
) -> Result<ConnectionStatus> {
    SessionClient::connect(transport, base_url, app_id, app_token)
        .await?
        .with_refresh_on_rejection(refresh_on_rejection)
        .run(|session| Box::pin(read_connection_status(session)))
        .await
}
