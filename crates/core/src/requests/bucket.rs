use crate::RequestOptions;
use crate::resources::{BucketMetadata, IamPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct ListBucketsRequest {
    pub project_id: String,
    pub page_token: Option<String>,
    pub options: RequestOptions,
}

impl ListBucketsRequest {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            page_token: None,
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBucketRequest {
    pub project_id: String,
    pub metadata: BucketMetadata,
    pub options: RequestOptions,
}

impl CreateBucketRequest {
    pub fn new(project_id: impl Into<String>, metadata: BucketMetadata) -> Self {
        Self {
            project_id: project_id.into(),
            metadata,
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetBucketMetadataRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl GetBucketMetadataRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBucketRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl DeleteBucketRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

/// Replace all writable bucket metadata. The bucket is `metadata.name`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBucketRequest {
    pub metadata: BucketMetadata,
    pub options: RequestOptions,
}

impl UpdateBucketRequest {
    pub fn new(metadata: BucketMetadata) -> Self {
        Self {
            metadata,
            options: RequestOptions::default(),
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.metadata.name
    }
}

/// Apply a JSON merge patch to bucket metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchBucketRequest {
    pub bucket_name: String,
    pub patch: serde_json::Value,
    pub options: RequestOptions,
}

impl PatchBucketRequest {
    pub fn new(bucket_name: impl Into<String>, patch: serde_json::Value) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            patch,
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetBucketIamPolicyRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl GetBucketIamPolicyRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetBucketIamPolicyRequest {
    pub bucket_name: String,
    pub policy: IamPolicy,
    pub options: RequestOptions,
}

impl SetBucketIamPolicyRequest {
    pub fn new(bucket_name: impl Into<String>, policy: IamPolicy) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            policy,
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestBucketIamPermissionsRequest {
    pub bucket_name: String,
    pub permissions: Vec<String>,
    pub options: RequestOptions,
}

impl TestBucketIamPermissionsRequest {
    pub fn new(bucket_name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            permissions,
            options: RequestOptions::default(),
        }
    }
}

request_options!(
    ListBucketsRequest,
    CreateBucketRequest,
    GetBucketMetadataRequest,
    DeleteBucketRequest,
    UpdateBucketRequest,
    PatchBucketRequest,
    GetBucketIamPolicyRequest,
    SetBucketIamPolicyRequest,
    TestBucketIamPermissionsRequest,
);
