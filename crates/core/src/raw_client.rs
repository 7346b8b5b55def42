//! The raw client: one RPC per storage API verb
//!
//! This trait is the seam between the request pipeline and the network.
//! Terminal implementations (the REST transport in `gcs-http`) perform a
//! single attempt per call. Decorators such as [`RetryClient`] and
//! [`LoggingClient`] implement the same trait by wrapping an inner client,
//! so they can be stacked in any order.
//!
//! [`RetryClient`]: crate::RetryClient
//! [`LoggingClient`]: crate::LoggingClient

use async_trait::async_trait;
use bytes::Bytes;

use crate::client_options::ClientOptions;
use crate::requests::*;
use crate::resources::{
    BucketAccessControl, BucketMetadata, EmptyResponse, IamPolicy, ListBucketAclResponse,
    ListBucketsResponse, ListDefaultObjectAclResponse, ListNotificationsResponse,
    ListObjectAclResponse, ListObjectsResponse, NotificationMetadata, ObjectAccessControl,
    ObjectMetadata, RewriteObjectResponse, ServiceAccount, TestBucketIamPermissionsResponse,
};
use crate::status::StatusOr;

/// Source of an object download, consumed chunk by chunk.
#[async_trait]
pub trait ObjectReadSource: Send {
    /// The next chunk, or `None` once the object has been fully read.
    async fn read(&mut self) -> StatusOr<Option<Bytes>>;
}

/// Sink of a streaming upload. The object exists once `close` succeeds.
#[async_trait]
pub trait ObjectWriteSink: Send {
    async fn write(&mut self, chunk: Bytes) -> StatusOr<()>;

    /// Finish the upload and return the metadata of the new object.
    async fn close(&mut self) -> StatusOr<ObjectMetadata>;
}

/// Typed access to every storage API operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RawClient: Send + Sync {
    /// Options the client was created with.
    fn client_options(&self) -> &ClientOptions;

    // ========== Buckets ==========

    async fn list_buckets(&self, request: &ListBucketsRequest) -> StatusOr<ListBucketsResponse>;

    async fn create_bucket(&self, request: &CreateBucketRequest) -> StatusOr<BucketMetadata>;

    async fn get_bucket_metadata(
        &self,
        request: &GetBucketMetadataRequest,
    ) -> StatusOr<BucketMetadata>;

    async fn delete_bucket(&self, request: &DeleteBucketRequest) -> StatusOr<EmptyResponse>;

    async fn update_bucket(&self, request: &UpdateBucketRequest) -> StatusOr<BucketMetadata>;

    async fn patch_bucket(&self, request: &PatchBucketRequest) -> StatusOr<BucketMetadata>;

    async fn get_bucket_iam_policy(
        &self,
        request: &GetBucketIamPolicyRequest,
    ) -> StatusOr<IamPolicy>;

    async fn set_bucket_iam_policy(
        &self,
        request: &SetBucketIamPolicyRequest,
    ) -> StatusOr<IamPolicy>;

    async fn test_bucket_iam_permissions(
        &self,
        request: &TestBucketIamPermissionsRequest,
    ) -> StatusOr<TestBucketIamPermissionsResponse>;

    // ========== Objects ==========

    async fn insert_object_media(
        &self,
        request: &InsertObjectMediaRequest,
    ) -> StatusOr<ObjectMetadata>;

    async fn copy_object(&self, request: &CopyObjectRequest) -> StatusOr<ObjectMetadata>;

    async fn get_object_metadata(
        &self,
        request: &GetObjectMetadataRequest,
    ) -> StatusOr<ObjectMetadata>;

    async fn read_object(
        &self,
        request: &ReadObjectRangeRequest,
    ) -> StatusOr<Box<dyn ObjectReadSource>>;

    async fn write_object(
        &self,
        request: &InsertObjectStreamingRequest,
    ) -> StatusOr<Box<dyn ObjectWriteSink>>;

    async fn list_objects(&self, request: &ListObjectsRequest) -> StatusOr<ListObjectsResponse>;

    async fn delete_object(&self, request: &DeleteObjectRequest) -> StatusOr<EmptyResponse>;

    async fn update_object(&self, request: &UpdateObjectRequest) -> StatusOr<ObjectMetadata>;

    async fn patch_object(&self, request: &PatchObjectRequest) -> StatusOr<ObjectMetadata>;

    async fn compose_object(&self, request: &ComposeObjectRequest) -> StatusOr<ObjectMetadata>;

    async fn rewrite_object(
        &self,
        request: &RewriteObjectRequest,
    ) -> StatusOr<RewriteObjectResponse>;

    // ========== Bucket ACL ==========

    async fn list_bucket_acl(
        &self,
        request: &ListBucketAclRequest,
    ) -> StatusOr<ListBucketAclResponse>;

    async fn create_bucket_acl(
        &self,
        request: &CreateBucketAclRequest,
    ) -> StatusOr<BucketAccessControl>;

    async fn delete_bucket_acl(&self, request: &DeleteBucketAclRequest) -> StatusOr<EmptyResponse>;

    async fn get_bucket_acl(&self, request: &GetBucketAclRequest) -> StatusOr<BucketAccessControl>;

    async fn update_bucket_acl(
        &self,
        request: &UpdateBucketAclRequest,
    ) -> StatusOr<BucketAccessControl>;

    async fn patch_bucket_acl(
        &self,
        request: &PatchBucketAclRequest,
    ) -> StatusOr<BucketAccessControl>;

    // ========== Object ACL ==========

    async fn list_object_acl(
        &self,
        request: &ListObjectAclRequest,
    ) -> StatusOr<ListObjectAclResponse>;

    async fn create_object_acl(
        &self,
        request: &CreateObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    async fn delete_object_acl(&self, request: &DeleteObjectAclRequest) -> StatusOr<EmptyResponse>;

    async fn get_object_acl(&self, request: &GetObjectAclRequest) -> StatusOr<ObjectAccessControl>;

    async fn update_object_acl(
        &self,
        request: &UpdateObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    async fn patch_object_acl(
        &self,
        request: &PatchObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    // ========== Default object ACL ==========

    async fn list_default_object_acl(
        &self,
        request: &ListDefaultObjectAclRequest,
    ) -> StatusOr<ListDefaultObjectAclResponse>;

    async fn create_default_object_acl(
        &self,
        request: &CreateDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    async fn delete_default_object_acl(
        &self,
        request: &DeleteDefaultObjectAclRequest,
    ) -> StatusOr<EmptyResponse>;

    async fn get_default_object_acl(
        &self,
        request: &GetDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    async fn update_default_object_acl(
        &self,
        request: &UpdateDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    async fn patch_default_object_acl(
        &self,
        request: &PatchDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl>;

    // ========== Service account ==========

    async fn get_service_account(
        &self,
        request: &GetProjectServiceAccountRequest,
    ) -> StatusOr<ServiceAccount>;

    // ========== Notifications ==========

    async fn list_notifications(
        &self,
        request: &ListNotificationsRequest,
    ) -> StatusOr<ListNotificationsResponse>;

    async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
    ) -> StatusOr<NotificationMetadata>;

    async fn get_notification(
        &self,
        request: &GetNotificationRequest,
    ) -> StatusOr<NotificationMetadata>;

    async fn delete_notification(
        &self,
        request: &DeleteNotificationRequest,
    ) -> StatusOr<EmptyResponse>;
}

/// Invoke `$callback!` with every unary operation of [`RawClient`] as
/// `method(Request) -> Response, "ApiName";`. Streaming reads and writes are
/// left out: each decorator handles them by hand.
macro_rules! with_raw_operations {
    ($callback:ident) => {
        $callback! {
            list_buckets($crate::requests::ListBucketsRequest)
                -> $crate::resources::ListBucketsResponse, "ListBuckets";
            create_bucket($crate::requests::CreateBucketRequest)
                -> $crate::resources::BucketMetadata, "CreateBucket";
            get_bucket_metadata($crate::requests::GetBucketMetadataRequest)
                -> $crate::resources::BucketMetadata, "GetBucketMetadata";
            delete_bucket($crate::requests::DeleteBucketRequest)
                -> $crate::resources::EmptyResponse, "DeleteBucket";
            update_bucket($crate::requests::UpdateBucketRequest)
                -> $crate::resources::BucketMetadata, "UpdateBucket";
            patch_bucket($crate::requests::PatchBucketRequest)
                -> $crate::resources::BucketMetadata, "PatchBucket";
            get_bucket_iam_policy($crate::requests::GetBucketIamPolicyRequest)
                -> $crate::resources::IamPolicy, "GetBucketIamPolicy";
            set_bucket_iam_policy($crate::requests::SetBucketIamPolicyRequest)
                -> $crate::resources::IamPolicy, "SetBucketIamPolicy";
            test_bucket_iam_permissions($crate::requests::TestBucketIamPermissionsRequest)
                -> $crate::resources::TestBucketIamPermissionsResponse, "TestBucketIamPermissions";
            insert_object_media($crate::requests::InsertObjectMediaRequest)
                -> $crate::resources::ObjectMetadata, "InsertObjectMedia";
            copy_object($crate::requests::CopyObjectRequest)
                -> $crate::resources::ObjectMetadata, "CopyObject";
            get_object_metadata($crate::requests::GetObjectMetadataRequest)
                -> $crate::resources::ObjectMetadata, "GetObjectMetadata";
            list_objects($crate::requests::ListObjectsRequest)
                -> $crate::resources::ListObjectsResponse, "ListObjects";
            delete_object($crate::requests::DeleteObjectRequest)
                -> $crate::resources::EmptyResponse, "DeleteObject";
            update_object($crate::requests::UpdateObjectRequest)
                -> $crate::resources::ObjectMetadata, "UpdateObject";
            patch_object($crate::requests::PatchObjectRequest)
                -> $crate::resources::ObjectMetadata, "PatchObject";
            compose_object($crate::requests::ComposeObjectRequest)
                -> $crate::resources::ObjectMetadata, "ComposeObject";
            rewrite_object($crate::requests::RewriteObjectRequest)
                -> $crate::resources::RewriteObjectResponse, "RewriteObject";
            list_bucket_acl($crate::requests::ListBucketAclRequest)
                -> $crate::resources::ListBucketAclResponse, "ListBucketAcl";
            create_bucket_acl($crate::requests::CreateBucketAclRequest)
                -> $crate::resources::BucketAccessControl, "CreateBucketAcl";
            delete_bucket_acl($crate::requests::DeleteBucketAclRequest)
                -> $crate::resources::EmptyResponse, "DeleteBucketAcl";
            get_bucket_acl($crate::requests::GetBucketAclRequest)
                -> $crate::resources::BucketAccessControl, "GetBucketAcl";
            update_bucket_acl($crate::requests::UpdateBucketAclRequest)
                -> $crate::resources::BucketAccessControl, "UpdateBucketAcl";
            patch_bucket_acl($crate::requests::PatchBucketAclRequest)
                -> $crate::resources::BucketAccessControl, "PatchBucketAcl";
            list_object_acl($crate::requests::ListObjectAclRequest)
                -> $crate::resources::ListObjectAclResponse, "ListObjectAcl";
            create_object_acl($crate::requests::CreateObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "CreateObjectAcl";
            delete_object_acl($crate::requests::DeleteObjectAclRequest)
                -> $crate::resources::EmptyResponse, "DeleteObjectAcl";
            get_object_acl($crate::requests::GetObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "GetObjectAcl";
            update_object_acl($crate::requests::UpdateObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "UpdateObjectAcl";
            patch_object_acl($crate::requests::PatchObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "PatchObjectAcl";
            list_default_object_acl($crate::requests::ListDefaultObjectAclRequest)
                -> $crate::resources::ListDefaultObjectAclResponse, "ListDefaultObjectAcl";
            create_default_object_acl($crate::requests::CreateDefaultObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "CreateDefaultObjectAcl";
            delete_default_object_acl($crate::requests::DeleteDefaultObjectAclRequest)
                -> $crate::resources::EmptyResponse, "DeleteDefaultObjectAcl";
            get_default_object_acl($crate::requests::GetDefaultObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "GetDefaultObjectAcl";
            update_default_object_acl($crate::requests::UpdateDefaultObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "UpdateDefaultObjectAcl";
            patch_default_object_acl($crate::requests::PatchDefaultObjectAclRequest)
                -> $crate::resources::ObjectAccessControl, "PatchDefaultObjectAcl";
            get_service_account($crate::requests::GetProjectServiceAccountRequest)
                -> $crate::resources::ServiceAccount, "GetServiceAccount";
            list_notifications($crate::requests::ListNotificationsRequest)
                -> $crate::resources::ListNotificationsResponse, "ListNotifications";
            create_notification($crate::requests::CreateNotificationRequest)
                -> $crate::resources::NotificationMetadata, "CreateNotification";
            get_notification($crate::requests::GetNotificationRequest)
                -> $crate::resources::NotificationMetadata, "GetNotification";
            delete_notification($crate::requests::DeleteNotificationRequest)
                -> $crate::resources::EmptyResponse, "DeleteNotification";
        }
    };
}

pub(crate) use with_raw_operations;

/// An in-memory download, used by tests and by callers that already hold
/// the bytes.
pub struct BufferedReadSource {
    chunks: std::collections::VecDeque<Bytes>,
}

impl BufferedReadSource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ObjectReadSource for BufferedReadSource {
    async fn read(&mut self) -> StatusOr<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}
