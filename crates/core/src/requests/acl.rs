//! Access control requests for buckets, objects and default object ACLs

use crate::RequestOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct ListBucketAclRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl ListBucketAclRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBucketAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl CreateBucketAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBucketAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl DeleteBucketAclRequest {
    pub fn new(bucket_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetBucketAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl GetBucketAclRequest {
    pub fn new(bucket_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBucketAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl UpdateBucketAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchBucketAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub patch: serde_json::Value,
    pub options: RequestOptions,
}

impl PatchBucketAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        patch: serde_json::Value,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            patch,
            options: RequestOptions::default(),
        }
    }
}

// ========== Object ACL ==========

#[derive(Debug, Clone, PartialEq)]
pub struct ListObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub options: RequestOptions,
}

impl ListObjectAclRequest {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl CreateObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl DeleteObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl GetObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl UpdateObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchObjectAclRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub entity: String,
    pub patch: serde_json::Value,
    pub options: RequestOptions,
}

impl PatchObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        entity: impl Into<String>,
        patch: serde_json::Value,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            entity: entity.into(),
            patch,
            options: RequestOptions::default(),
        }
    }
}

// ========== Default object ACL ==========

#[derive(Debug, Clone, PartialEq)]
pub struct ListDefaultObjectAclRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl ListDefaultObjectAclRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDefaultObjectAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl CreateDefaultObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDefaultObjectAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl DeleteDefaultObjectAclRequest {
    pub fn new(bucket_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDefaultObjectAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub options: RequestOptions,
}

impl GetDefaultObjectAclRequest {
    pub fn new(bucket_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDefaultObjectAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub role: String,
    pub options: RequestOptions,
}

impl UpdateDefaultObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            role: role.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchDefaultObjectAclRequest {
    pub bucket_name: String,
    pub entity: String,
    pub patch: serde_json::Value,
    pub options: RequestOptions,
}

impl PatchDefaultObjectAclRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        entity: impl Into<String>,
        patch: serde_json::Value,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            entity: entity.into(),
            patch,
            options: RequestOptions::default(),
        }
    }
}

request_options!(
    ListBucketAclRequest,
    CreateBucketAclRequest,
    DeleteBucketAclRequest,
    GetBucketAclRequest,
    UpdateBucketAclRequest,
    PatchBucketAclRequest,
    ListObjectAclRequest,
    CreateObjectAclRequest,
    DeleteObjectAclRequest,
    GetObjectAclRequest,
    UpdateObjectAclRequest,
    PatchObjectAclRequest,
    ListDefaultObjectAclRequest,
    CreateDefaultObjectAclRequest,
    DeleteDefaultObjectAclRequest,
    GetDefaultObjectAclRequest,
    UpdateDefaultObjectAclRequest,
    PatchDefaultObjectAclRequest,
);
