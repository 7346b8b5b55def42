//! Storage resources as exchanged with the JSON API
//!
//! Only the fields the client reads or commonly sets are modelled. Unknown
//! fields in responses are ignored.

mod acl;
mod bucket;
mod notification;
mod object;

pub use acl::{BucketAccessControl, ObjectAccessControl};
pub use bucket::{BucketMetadata, BucketVersioning, IamBinding, IamPolicy};
pub use notification::{JSON_API_V1_PAYLOAD, NotificationMetadata};
pub use object::{ComposeSourceObject, ObjectMetadata};

use serde::{Deserialize, Serialize};

/// Response of operations that return no body (deletes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

/// One page of buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<BucketMetadata>,
}

/// One page of objects, plus the common prefixes when a delimiter was used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<ObjectMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBucketAclResponse {
    #[serde(default)]
    pub items: Vec<BucketAccessControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListObjectAclResponse {
    #[serde(default)]
    pub items: Vec<ObjectAccessControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDefaultObjectAclResponse {
    #[serde(default)]
    pub items: Vec<ObjectAccessControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotificationsResponse {
    #[serde(default)]
    pub items: Vec<NotificationMetadata>,
}

/// The subset of the requested permissions the caller holds on a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestBucketIamPermissionsResponse {
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Progress of a (possibly multi-call) object rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteObjectResponse {
    #[serde(default, with = "int64_string")]
    pub total_bytes_rewritten: Option<i64>,
    #[serde(default, with = "int64_string")]
    pub object_size: Option<i64>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ObjectMetadata>,
}

/// The project's Cloud Storage service account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// The JSON API encodes 64-bit integers as strings; accept either form.
pub(crate) mod int64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(n)),
            Some(Repr::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
