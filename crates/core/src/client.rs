//! The public storage client
//!
//! [`Client`] turns the request-per-operation [`RawClient`] interface into
//! plain method calls. It owns the decorated pipeline (logging over retry
//! over the transport), follows page tokens for listings and exposes
//! downloads and uploads as chunked streams. Failures are reported as
//! [`Error`]; the final [`Status`](crate::Status) of a failed call is kept in
//! [`Error::Status`].

use std::future::Future;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};

use crate::client_options::ClientOptions;
use crate::decorate::decorate;
use crate::error::{Error, Result};
use crate::raw_client::{BufferedReadSource, ObjectReadSource, ObjectWriteSink, RawClient};
use crate::request_options::RequestOptions;
use crate::requests::*;
use crate::resources::{
    BucketAccessControl, BucketMetadata, ComposeSourceObject, IamPolicy, ListBucketsResponse,
    ListObjectsResponse, NotificationMetadata, ObjectAccessControl, ObjectMetadata,
    RewriteObjectResponse, ServiceAccount,
};
use crate::retry::{BackoffPolicy, RetryConfig, RetryPolicy};
use crate::status::StatusOr;

/// Cloud Storage client. Cloning is cheap and clones share the pipeline.
#[derive(Clone)]
pub struct Client {
    raw: Arc<dyn RawClient>,
}

impl Client {
    /// Decorate `raw` with the default retry and backoff policies.
    pub fn new(raw: Arc<dyn RawClient>) -> Self {
        Self::builder(raw).build()
    }

    pub fn builder(raw: Arc<dyn RawClient>) -> ClientBuilder {
        ClientBuilder::new(raw)
    }

    /// Use `raw` as is: no retries and no request logging.
    pub fn without_decorations(raw: Arc<dyn RawClient>) -> Self {
        Self { raw }
    }

    pub fn raw_client(&self) -> &Arc<dyn RawClient> {
        &self.raw
    }

    pub fn client_options(&self) -> &ClientOptions {
        self.raw.client_options()
    }

    fn default_project(&self) -> Result<String> {
        self.client_options()
            .project_id()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Config(
                    "No default project configured; set GOOGLE_CLOUD_PROJECT or pass a project id"
                        .to_string(),
                )
            })
    }

    // ========== Buckets ==========

    /// All buckets of the default project.
    pub fn list_buckets(
        &self,
        options: RequestOptions,
    ) -> Result<impl Stream<Item = Result<BucketMetadata>> + Send + use<>> {
        let project_id = self.default_project()?;
        Ok(self.list_buckets_for_project(&project_id, options))
    }

    pub fn list_buckets_for_project(
        &self,
        project_id: &str,
        options: RequestOptions,
    ) -> impl Stream<Item = Result<BucketMetadata>> + Send + use<> {
        let raw = self.raw.clone();
        paginate(
            ListBucketsRequest::new(project_id).with_options(options),
            move |request: ListBucketsRequest| {
                let raw = raw.clone();
                async move { raw.list_buckets(&request).await }
            },
            |page: ListBucketsResponse| (page.items, page.next_page_token),
            |request: ListBucketsRequest, token: String| request.with_page_token(token),
        )
    }

    /// Create a bucket in the default project.
    pub async fn create_bucket(
        &self,
        metadata: BucketMetadata,
        options: RequestOptions,
    ) -> Result<BucketMetadata> {
        let project_id = self.default_project()?;
        self.create_bucket_for_project(&project_id, metadata, options)
            .await
    }

    pub async fn create_bucket_for_project(
        &self,
        project_id: &str,
        metadata: BucketMetadata,
        options: RequestOptions,
    ) -> Result<BucketMetadata> {
        let request = CreateBucketRequest::new(project_id, metadata).with_options(options);
        Ok(self.raw.create_bucket(&request).await?)
    }

    pub async fn get_bucket_metadata(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> Result<BucketMetadata> {
        let request = GetBucketMetadataRequest::new(bucket_name).with_options(options);
        Ok(self.raw.get_bucket_metadata(&request).await?)
    }

    pub async fn delete_bucket(&self, bucket_name: &str, options: RequestOptions) -> Result<()> {
        let request = DeleteBucketRequest::new(bucket_name).with_options(options);
        self.raw.delete_bucket(&request).await?;
        Ok(())
    }

    /// Replace the metadata of the bucket named by `metadata.name`.
    pub async fn update_bucket(
        &self,
        metadata: BucketMetadata,
        options: RequestOptions,
    ) -> Result<BucketMetadata> {
        if metadata.name.is_empty() {
            return Err(Error::InvalidArgument(
                "Bucket metadata must carry the bucket name".to_string(),
            ));
        }
        let request = UpdateBucketRequest::new(metadata).with_options(options);
        Ok(self.raw.update_bucket(&request).await?)
    }

    pub async fn patch_bucket(
        &self,
        bucket_name: &str,
        patch: serde_json::Value,
        options: RequestOptions,
    ) -> Result<BucketMetadata> {
        let request = PatchBucketRequest::new(bucket_name, patch).with_options(options);
        Ok(self.raw.patch_bucket(&request).await?)
    }

    pub async fn get_bucket_iam_policy(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> Result<IamPolicy> {
        let request = GetBucketIamPolicyRequest::new(bucket_name).with_options(options);
        Ok(self.raw.get_bucket_iam_policy(&request).await?)
    }

    pub async fn set_bucket_iam_policy(
        &self,
        bucket_name: &str,
        policy: IamPolicy,
        options: RequestOptions,
    ) -> Result<IamPolicy> {
        let request = SetBucketIamPolicyRequest::new(bucket_name, policy).with_options(options);
        Ok(self.raw.set_bucket_iam_policy(&request).await?)
    }

    /// The subset of `permissions` the caller holds on the bucket.
    pub async fn test_bucket_iam_permissions(
        &self,
        bucket_name: &str,
        permissions: Vec<String>,
        options: RequestOptions,
    ) -> Result<Vec<String>> {
        let request =
            TestBucketIamPermissionsRequest::new(bucket_name, permissions).with_options(options);
        Ok(self.raw.test_bucket_iam_permissions(&request).await?.permissions)
    }

    // ========== Objects ==========

    /// Upload `contents` in a single request.
    pub async fn insert_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        contents: impl Into<Bytes>,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let request =
            InsertObjectMediaRequest::new(bucket_name, object_name, contents).with_options(options);
        Ok(self.raw.insert_object_media(&request).await?)
    }

    pub async fn copy_object(
        &self,
        source_bucket: &str,
        source_object: &str,
        destination_bucket: &str,
        destination_object: &str,
        metadata: Option<ObjectMetadata>,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let mut request = CopyObjectRequest::new(
            source_bucket,
            source_object,
            destination_bucket,
            destination_object,
        )
        .with_options(options);
        request.metadata = metadata;
        Ok(self.raw.copy_object(&request).await?)
    }

    pub async fn get_object_metadata(
        &self,
        bucket_name: &str,
        object_name: &str,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let request = GetObjectMetadataRequest::new(bucket_name, object_name).with_options(options);
        Ok(self.raw.get_object_metadata(&request).await?)
    }

    /// Download a whole object.
    pub async fn read_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        options: RequestOptions,
    ) -> Result<ObjectReadStream> {
        let request = ReadObjectRangeRequest::new(bucket_name, object_name).with_options(options);
        let source = self.raw.read_object(&request).await?;
        Ok(ObjectReadStream::new(source))
    }

    /// Download the bytes `[begin, end)` of an object.
    ///
    /// `begin == end` yields an empty stream without contacting the service;
    /// `begin > end` is rejected.
    pub async fn read_object_range(
        &self,
        bucket_name: &str,
        object_name: &str,
        begin: u64,
        end: u64,
        options: RequestOptions,
    ) -> Result<ObjectReadStream> {
        if begin > end {
            return Err(Error::InvalidArgument(format!(
                "Invalid range [{begin}, {end}) for {object_name}: begin is past end"
            )));
        }
        if begin == end {
            return Ok(ObjectReadStream::new(Box::new(BufferedReadSource::new(
                std::iter::empty::<Bytes>(),
            ))));
        }
        let request = ReadObjectRangeRequest::new(bucket_name, object_name)
            .with_range(begin, end)
            .with_options(options);
        let source = self.raw.read_object(&request).await?;
        Ok(ObjectReadStream::new(source))
    }

    /// Start a streaming upload. The object is created when the returned
    /// stream is closed.
    pub async fn write_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        options: RequestOptions,
    ) -> Result<ObjectWriteStream> {
        let request =
            InsertObjectStreamingRequest::new(bucket_name, object_name).with_options(options);
        let sink = self.raw.write_object(&request).await?;
        Ok(ObjectWriteStream::new(sink))
    }

    /// All objects of a bucket, following page tokens.
    pub fn list_objects(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> impl Stream<Item = Result<ObjectMetadata>> + Send + use<> {
        let raw = self.raw.clone();
        paginate(
            ListObjectsRequest::new(bucket_name).with_options(options),
            move |request: ListObjectsRequest| {
                let raw = raw.clone();
                async move { raw.list_objects(&request).await }
            },
            |page: ListObjectsResponse| (page.items, page.next_page_token),
            |request: ListObjectsRequest, token: String| request.with_page_token(token),
        )
    }

    /// A single page of objects, including the common prefixes produced by
    /// a delimiter.
    pub async fn list_objects_page(
        &self,
        bucket_name: &str,
        page_token: Option<&str>,
        options: RequestOptions,
    ) -> Result<ListObjectsResponse> {
        let mut request = ListObjectsRequest::new(bucket_name).with_options(options);
        if let Some(token) = page_token {
            request = request.with_page_token(token);
        }
        Ok(self.raw.list_objects(&request).await?)
    }

    pub async fn delete_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        options: RequestOptions,
    ) -> Result<()> {
        let request = DeleteObjectRequest::new(bucket_name, object_name).with_options(options);
        self.raw.delete_object(&request).await?;
        Ok(())
    }

    pub async fn update_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        metadata: ObjectMetadata,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let request =
            UpdateObjectRequest::new(bucket_name, object_name, metadata).with_options(options);
        Ok(self.raw.update_object(&request).await?)
    }

    pub async fn patch_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        patch: serde_json::Value,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let request =
            PatchObjectRequest::new(bucket_name, object_name, patch).with_options(options);
        Ok(self.raw.patch_object(&request).await?)
    }

    /// Concatenate `source_objects` of one bucket into a new object.
    pub async fn compose_object(
        &self,
        bucket_name: &str,
        source_objects: Vec<ComposeSourceObject>,
        destination_object_name: &str,
        destination_metadata: Option<ObjectMetadata>,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        if source_objects.is_empty() {
            return Err(Error::InvalidArgument(
                "Compose requires at least one source object".to_string(),
            ));
        }
        let mut request =
            ComposeObjectRequest::new(bucket_name, source_objects, destination_object_name)
                .with_options(options);
        request.destination_metadata = destination_metadata;
        Ok(self.raw.compose_object(&request).await?)
    }

    /// Run one step of a rewrite. Pass the returned `rewrite_token` back in
    /// `request` until `done` is set.
    pub async fn rewrite_object(
        &self,
        request: &RewriteObjectRequest,
    ) -> Result<RewriteObjectResponse> {
        Ok(self.raw.rewrite_object(request).await?)
    }

    /// Rewrite an object, issuing as many steps as the service asks for.
    pub async fn rewrite_object_blocking(
        &self,
        source_bucket: &str,
        source_object: &str,
        destination_bucket: &str,
        destination_object: &str,
        options: RequestOptions,
    ) -> Result<ObjectMetadata> {
        let mut request = RewriteObjectRequest::new(
            source_bucket,
            source_object,
            destination_bucket,
            destination_object,
        )
        .with_options(options.clone());

        loop {
            let response = self.raw.rewrite_object(&request).await?;
            if response.done {
                return match response.resource {
                    Some(resource) => Ok(resource),
                    None => {
                        self.get_object_metadata(destination_bucket, destination_object, options)
                            .await
                    }
                };
            }
            let Some(token) = response.rewrite_token.filter(|t| !t.is_empty()) else {
                return Err(Error::UnexpectedResponse(format!(
                    "Rewrite of {}/{} is not done but returned no rewrite token",
                    source_bucket, source_object
                )));
            };
            tracing::debug!(
                rewritten = ?response.total_bytes_rewritten,
                size = ?response.object_size,
                "Rewrite in progress"
            );
            request = request.with_rewrite_token(token);
        }
    }

    // ========== Bucket ACL ==========

    pub async fn list_bucket_acl(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> Result<Vec<BucketAccessControl>> {
        let request = ListBucketAclRequest::new(bucket_name).with_options(options);
        Ok(self.raw.list_bucket_acl(&request).await?.items)
    }

    pub async fn create_bucket_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<BucketAccessControl> {
        let request = CreateBucketAclRequest::new(bucket_name, entity, role).with_options(options);
        Ok(self.raw.create_bucket_acl(&request).await?)
    }

    pub async fn delete_bucket_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<()> {
        let request = DeleteBucketAclRequest::new(bucket_name, entity).with_options(options);
        self.raw.delete_bucket_acl(&request).await?;
        Ok(())
    }

    pub async fn get_bucket_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<BucketAccessControl> {
        let request = GetBucketAclRequest::new(bucket_name, entity).with_options(options);
        Ok(self.raw.get_bucket_acl(&request).await?)
    }

    pub async fn update_bucket_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<BucketAccessControl> {
        let request = UpdateBucketAclRequest::new(bucket_name, entity, role).with_options(options);
        Ok(self.raw.update_bucket_acl(&request).await?)
    }

    pub async fn patch_bucket_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        patch: serde_json::Value,
        options: RequestOptions,
    ) -> Result<BucketAccessControl> {
        let request = PatchBucketAclRequest::new(bucket_name, entity, patch).with_options(options);
        Ok(self.raw.patch_bucket_acl(&request).await?)
    }

    // ========== Object ACL ==========

    pub async fn list_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        options: RequestOptions,
    ) -> Result<Vec<ObjectAccessControl>> {
        let request = ListObjectAclRequest::new(bucket_name, object_name).with_options(options);
        Ok(self.raw.list_object_acl(&request).await?.items)
    }

    pub async fn create_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request = CreateObjectAclRequest::new(bucket_name, object_name, entity, role)
            .with_options(options);
        Ok(self.raw.create_object_acl(&request).await?)
    }

    pub async fn delete_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<()> {
        let request =
            DeleteObjectAclRequest::new(bucket_name, object_name, entity).with_options(options);
        self.raw.delete_object_acl(&request).await?;
        Ok(())
    }

    pub async fn get_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request =
            GetObjectAclRequest::new(bucket_name, object_name, entity).with_options(options);
        Ok(self.raw.get_object_acl(&request).await?)
    }

    pub async fn update_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request = UpdateObjectAclRequest::new(bucket_name, object_name, entity, role)
            .with_options(options);
        Ok(self.raw.update_object_acl(&request).await?)
    }

    pub async fn patch_object_acl(
        &self,
        bucket_name: &str,
        object_name: &str,
        entity: &str,
        patch: serde_json::Value,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request = PatchObjectAclRequest::new(bucket_name, object_name, entity, patch)
            .with_options(options);
        Ok(self.raw.patch_object_acl(&request).await?)
    }

    // ========== Default object ACL ==========

    pub async fn list_default_object_acl(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> Result<Vec<ObjectAccessControl>> {
        let request = ListDefaultObjectAclRequest::new(bucket_name).with_options(options);
        Ok(self.raw.list_default_object_acl(&request).await?.items)
    }

    pub async fn create_default_object_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request =
            CreateDefaultObjectAclRequest::new(bucket_name, entity, role).with_options(options);
        Ok(self.raw.create_default_object_acl(&request).await?)
    }

    pub async fn delete_default_object_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<()> {
        let request = DeleteDefaultObjectAclRequest::new(bucket_name, entity).with_options(options);
        self.raw.delete_default_object_acl(&request).await?;
        Ok(())
    }

    pub async fn get_default_object_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request = GetDefaultObjectAclRequest::new(bucket_name, entity).with_options(options);
        Ok(self.raw.get_default_object_acl(&request).await?)
    }

    pub async fn update_default_object_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        role: &str,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request =
            UpdateDefaultObjectAclRequest::new(bucket_name, entity, role).with_options(options);
        Ok(self.raw.update_default_object_acl(&request).await?)
    }

    pub async fn patch_default_object_acl(
        &self,
        bucket_name: &str,
        entity: &str,
        patch: serde_json::Value,
        options: RequestOptions,
    ) -> Result<ObjectAccessControl> {
        let request =
            PatchDefaultObjectAclRequest::new(bucket_name, entity, patch).with_options(options);
        Ok(self.raw.patch_default_object_acl(&request).await?)
    }

    // ========== Service account ==========

    /// Service account of the default project.
    pub async fn get_service_account(&self, options: RequestOptions) -> Result<ServiceAccount> {
        let project_id = self.default_project()?;
        self.get_service_account_for_project(&project_id, options)
            .await
    }

    pub async fn get_service_account_for_project(
        &self,
        project_id: &str,
        options: RequestOptions,
    ) -> Result<ServiceAccount> {
        let request = GetProjectServiceAccountRequest::new(project_id).with_options(options);
        Ok(self.raw.get_service_account(&request).await?)
    }

    // ========== Notifications ==========

    pub async fn list_notifications(
        &self,
        bucket_name: &str,
        options: RequestOptions,
    ) -> Result<Vec<NotificationMetadata>> {
        let request = ListNotificationsRequest::new(bucket_name).with_options(options);
        Ok(self.raw.list_notifications(&request).await?.items)
    }

    pub async fn create_notification(
        &self,
        bucket_name: &str,
        metadata: NotificationMetadata,
        options: RequestOptions,
    ) -> Result<NotificationMetadata> {
        let request = CreateNotificationRequest::new(bucket_name, metadata).with_options(options);
        Ok(self.raw.create_notification(&request).await?)
    }

    pub async fn get_notification(
        &self,
        bucket_name: &str,
        notification_id: &str,
        options: RequestOptions,
    ) -> Result<NotificationMetadata> {
        let request =
            GetNotificationRequest::new(bucket_name, notification_id).with_options(options);
        Ok(self.raw.get_notification(&request).await?)
    }

    pub async fn delete_notification(
        &self,
        bucket_name: &str,
        notification_id: &str,
        options: RequestOptions,
    ) -> Result<()> {
        let request =
            DeleteNotificationRequest::new(bucket_name, notification_id).with_options(options);
        self.raw.delete_notification(&request).await?;
        Ok(())
    }
}

/// Builds a [`Client`] with custom retry and backoff policies.
pub struct ClientBuilder {
    raw: Arc<dyn RawClient>,
    retry_policy: Option<Box<dyn RetryPolicy>>,
    backoff_policy: Option<Box<dyn BackoffPolicy>>,
}

impl ClientBuilder {
    pub fn new(raw: Arc<dyn RawClient>) -> Self {
        Self {
            raw,
            retry_policy: None,
            backoff_policy: None,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Some(Box::new(policy));
        self
    }

    #[must_use]
    pub fn with_backoff_policy(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff_policy = Some(Box::new(policy));
        self
    }

    /// Take both policies from a configuration file section.
    #[must_use]
    pub fn with_retry_config(mut self, config: &RetryConfig) -> Self {
        self.retry_policy = Some(config.retry_policy());
        self.backoff_policy = Some(config.backoff_policy());
        self
    }

    pub fn build(self) -> Client {
        Client {
            raw: decorate(self.raw, self.retry_policy, self.backoff_policy),
        }
    }
}

/// Chunked download of an object.
pub struct ObjectReadStream {
    source: Box<dyn ObjectReadSource>,
    finished: bool,
}

impl ObjectReadStream {
    pub fn new(source: Box<dyn ObjectReadSource>) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    /// The next chunk, or `None` at the end of the object.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }
        let chunk = self.source.read().await?;
        if chunk.is_none() {
            self.finished = true;
        }
        Ok(chunk)
    }

    /// Read the remainder of the object into memory.
    pub async fn read_all(mut self) -> Result<Bytes> {
        let mut contents = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            contents.extend_from_slice(&chunk);
        }
        Ok(contents.freeze())
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send {
        futures::stream::try_unfold(self, |mut stream| async move {
            Ok(stream.next_chunk().await?.map(|chunk| (chunk, stream)))
        })
    }
}

/// Chunked upload of an object.
pub struct ObjectWriteStream {
    sink: Box<dyn ObjectWriteSink>,
    bytes_written: u64,
}

impl ObjectWriteStream {
    pub fn new(sink: Box<dyn ObjectWriteSink>) -> Self {
        Self {
            sink,
            bytes_written: 0,
        }
    }

    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> Result<()> {
        let chunk = chunk.into();
        let len = chunk.len() as u64;
        self.sink.write(chunk).await?;
        self.bytes_written += len;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Finish the upload; returns the metadata of the created object.
    pub async fn close(mut self) -> Result<ObjectMetadata> {
        Ok(self.sink.close().await?)
    }
}

/// Flatten a paged listing into a stream of items.
fn paginate<Req, Page, Item, F, Fut>(
    first: Req,
    fetch: F,
    split: fn(Page) -> (Vec<Item>, Option<String>),
    with_token: fn(Req, String) -> Req,
) -> impl Stream<Item = Result<Item>> + Send
where
    Req: Clone + Send + 'static,
    Page: Send + 'static,
    Item: Send + 'static,
    F: Fn(Req) -> Fut + Send + 'static,
    Fut: Future<Output = StatusOr<Page>> + Send + 'static,
{
    futures::stream::try_unfold(Some(first), move |state: Option<Req>| {
        let pending = state.map(|request| (request.clone(), fetch(request)));
        async move {
            let Some((request, page)) = pending else {
                return Ok::<_, Error>(None);
            };
            let (items, token) = split(page.await?);
            let next = token
                .filter(|t| !t.is_empty())
                .map(|t| with_token(request, t));
            Ok(Some((futures::stream::iter(items.into_iter().map(Ok)), next)))
        }
    })
    .try_flatten()
}
