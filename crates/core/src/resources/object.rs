use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::ObjectAccessControl;
use super::int64_string;

/// Metadata describing an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub metageneration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc32c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acl: Vec<ObjectAccessControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_link: Option<String>,
}

impl ObjectMetadata {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Object size in bytes, zero when the service did not report one.
    pub fn size_bytes(&self) -> u64 {
        self.size.and_then(|s| u64::try_from(s).ok()).unwrap_or(0)
    }
}

/// One source of a compose operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeSourceObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub generation: Option<i64>,
}

impl ComposeSourceObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_metadata() {
        let object: ObjectMetadata = serde_json::from_str(
            r#"{
                "kind": "storage#object",
                "bucket": "my-bucket",
                "name": "logs/2018-06-01.txt",
                "generation": "1527867283476711",
                "metageneration": "1",
                "size": "1024",
                "contentType": "text/plain",
                "md5Hash": "XrY7u+Ae7tCTyyK7j1rNww==",
                "metadata": {"owner": "ops"},
                "updated": "2018-06-01T15:34:43.476Z"
            }"#,
        )
        .unwrap();

        assert_eq!(object.bucket, "my-bucket");
        assert_eq!(object.generation, Some(1_527_867_283_476_711));
        assert_eq!(object.size_bytes(), 1024);
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(object.metadata.get("owner").map(String::as_str), Some("ops"));
        assert!(object.updated.is_some());
    }

    #[test]
    fn test_size_defaults_to_zero() {
        assert_eq!(ObjectMetadata::new("b", "o").size_bytes(), 0);
    }

    #[test]
    fn test_compose_source_serialization() {
        let mut source = ComposeSourceObject::new("part-1");
        source.generation = Some(42);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json, serde_json::json!({"name": "part-1", "generation": "42"}));
    }
}
