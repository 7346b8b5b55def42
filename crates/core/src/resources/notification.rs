use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Payload sent with each notification: full object metadata as JSON.
pub const JSON_API_V1_PAYLOAD: &str = "JSON_API_V1";

/// A Pub/Sub notification configuration attached to a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub topic: String,
    pub payload_format: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl NotificationMetadata {
    pub fn new(topic: impl Into<String>, payload_format: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload_format: payload_format.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types.push(event_type.into());
        self
    }

    #[must_use]
    pub fn with_object_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_name_prefix = Some(prefix.into());
        self
    }
}
