//! Pub/sub wire types: CloudEvent envelopes delivered by the sidecar and the
//! programmatic subscription declarations an app returns from
//! `GET /dapr/subscribe`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// CloudEvents 1.0 envelope as delivered by the sidecar to a subscriber route.
///
/// Only the fields the services read are modelled; unknown attributes are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub specversion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsubname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceparent: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl CloudEvent {
    /// Decode the event payload.
    ///
    /// Publishers that serialize their payload before publishing produce a
    /// JSON string holding JSON; that form is unwrapped before decoding.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            serde_json::Value::String(inner) => serde_json::from_str(inner),
            other => serde_json::from_value(other.clone()),
        }
    }
}

/// A programmatic topic subscription returned from `GET /dapr/subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSubscription {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

/// Delivery outcome a subscriber reports back to the sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Processed; do not redeliver.
    Success,
    /// Undeliverable; log and discard.
    Drop,
}

/// JSON body of a subscriber reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionReply {
    pub status: SubscriptionStatus,
}

impl From<SubscriptionStatus> for SubscriptionReply {
    fn from(status: SubscriptionStatus) -> Self {
        Self { status }
    }
}
