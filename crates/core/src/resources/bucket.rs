use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::int64_string;
use super::{BucketAccessControl, ObjectAccessControl};

/// Metadata describing a bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub project_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub metageneration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<BucketVersioning>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acl: Vec<BucketAccessControl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_object_acl: Vec<ObjectAccessControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl BucketMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn versioning_enabled(&self) -> bool {
        self.versioning.as_ref().is_some_and(|v| v.enabled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketVersioning {
    pub enabled: bool,
}

/// A bucket IAM policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub bindings: Vec<IamBinding>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
}

impl IamPolicy {
    /// Grant `role` to `member`, creating the binding if needed.
    pub fn add_member(&mut self, role: &str, member: impl Into<String>) {
        let member = member.into();
        match self.bindings.iter_mut().find(|b| b.role == role) {
            Some(binding) => {
                if !binding.members.contains(&member) {
                    binding.members.push(member);
                }
            }
            None => self.bindings.push(IamBinding {
                role: role.to_string(),
                members: vec![member],
            }),
        }
    }

    /// Members granted `role`, empty when the role is not bound.
    pub fn members(&self, role: &str) -> &[String] {
        self.bindings
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.members.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}
