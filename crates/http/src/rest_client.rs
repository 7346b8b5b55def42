//! REST transport: one HTTP exchange per raw-client call
//!
//! Metadata operations use the JSON API under `{endpoint}/storage/{version}`.
//! Uploads go to `{endpoint}/upload/storage/{version}` with
//! `uploadType=media`, downloads use `alt=media`. Responses with a status of
//! 300 or above become a [`Status`] carrying the HTTP code, the service's
//! error message and the raw body.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use futures::channel::mpsc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RANGE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::task::JoinHandle;

use gcs_core::raw_client::{BufferedReadSource, ObjectReadSource, ObjectWriteSink, RawClient};
use gcs_core::requests::*;
use gcs_core::resources::{
    BucketAccessControl, BucketMetadata, EmptyResponse, IamPolicy, ListBucketAclResponse,
    ListBucketsResponse, ListDefaultObjectAclResponse, ListNotificationsResponse,
    ListObjectAclResponse, ListObjectsResponse, NotificationMetadata, ObjectAccessControl,
    ObjectMetadata, RewriteObjectResponse, ServiceAccount, TestBucketIamPermissionsResponse,
};
use gcs_core::{ClientOptions, Error, RequestOptions, Result, Status, StatusOr};

use crate::transport_status;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const UPLOAD_CHANNEL_CAPACITY: usize = 8;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw client speaking the Cloud Storage JSON API over reqwest.
pub struct RestClient {
    http: reqwest::Client,
    options: ClientOptions,
    storage_endpoint: String,
    upload_endpoint: String,
}

impl RestClient {
    /// Build a client with its own connection pool sized from `options`.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let endpoint = url::Url::parse(options.endpoint())
            .map_err(|e| Error::Config(format!("Invalid endpoint '{}': {e}", options.endpoint())))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported endpoint scheme '{}'",
                endpoint.scheme()
            )));
        }
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(options.connection_pool_size())
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("gcs-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(options, http))
    }

    /// Build a client on top of an existing reqwest client.
    pub fn with_http_client(options: ClientOptions, http: reqwest::Client) -> Self {
        let endpoint = options.endpoint().trim_end_matches('/');
        let storage_endpoint = format!("{}/storage/{}", endpoint, options.version());
        let upload_endpoint = format!("{}/upload/storage/{}", endpoint, options.version());
        Self {
            http,
            options,
            storage_endpoint,
            upload_endpoint,
        }
    }

    fn bucket_url(&self, bucket_name: &str) -> String {
        format!("{}/b/{}", self.storage_endpoint, encode(bucket_name))
    }

    fn object_url(&self, bucket_name: &str, object_name: &str) -> String {
        format!("{}/o/{}", self.bucket_url(bucket_name), encode(object_name))
    }

    fn upload_url(&self, bucket_name: &str) -> String {
        format!("{}/b/{}/o", self.upload_endpoint, encode(bucket_name))
    }

    /// Apply the request options and the authorization header.
    async fn prepare(
        &self,
        method: Method,
        url: String,
        options: &RequestOptions,
    ) -> StatusOr<RequestBuilder> {
        let mut builder = self.http.request(method, url);
        if !options.query_parameters().is_empty() {
            builder = builder.query(options.query_parameters());
        }
        for (name, value) in options.headers() {
            builder = builder.header(name, value);
        }
        let authorization = self.options.credentials().authorization_header().await?;
        if !authorization.is_empty() {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> StatusOr<Response> {
        let request = builder
            .build()
            .map_err(|e| Status::new(400, format!("Invalid request: {e}")))?;
        if self.options.enable_http_tracing() {
            tracing::debug!(method = %request.method(), url = %request.url(), "HTTP request");
        }
        let response = self.http.execute(request).await.map_err(transport_status)?;
        if self.options.enable_http_tracing() {
            tracing::debug!(status = %response.status(), url = %response.url(), "HTTP response");
        }
        check_status(response).await
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> StatusOr<T> {
        let response = self.send(builder).await?;
        parse_json(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: String, options: &RequestOptions) -> StatusOr<T> {
        let builder = self.prepare(Method::GET, url, options).await?;
        self.call(builder).await
    }

    async fn delete(&self, url: String, options: &RequestOptions) -> StatusOr<EmptyResponse> {
        let builder = self.prepare(Method::DELETE, url, options).await?;
        self.call(builder).await
    }

    async fn with_body<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: &serde_json::Value,
        options: &RequestOptions,
    ) -> StatusOr<T> {
        let builder = self.prepare(method, url, options).await?.json(body);
        self.call(builder).await
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn to_json<T: serde::Serialize>(value: &T) -> StatusOr<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Status::new(400, format!("Cannot encode request: {e}")))
}

fn acl_body(entity: &str, role: &str) -> serde_json::Value {
    json!({ "entity": entity, "role": role })
}

/// Turn a non-success HTTP response into a [`Status`].
async fn check_status(response: Response) -> StatusOr<Response> {
    let status = response.status();
    if status.as_u16() < 300 {
        return Ok(response);
    }
    let payload = response.text().await.unwrap_or_default();
    let message = error_message(&payload)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(Status::new(i64::from(status.as_u16()), message).with_payload(payload))
}

/// The `error.message` field of a JSON API error body, or the body itself
/// when it is short plain text.
fn error_message(payload: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
        return value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
    }
    let trimmed = payload.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> StatusOr<T> {
    let payload = response.text().await.map_err(transport_status)?;
    let body = if payload.trim().is_empty() {
        "{}"
    } else {
        payload.as_str()
    };
    serde_json::from_str(body).map_err(|e| {
        Status::transport_failure(format!("Cannot parse response body: {e}")).with_payload(payload.clone())
    })
}

#[async_trait]
impl RawClient for RestClient {
    fn client_options(&self) -> &ClientOptions {
        &self.options
    }

    // ========== Buckets ==========

    async fn list_buckets(&self, request: &ListBucketsRequest) -> StatusOr<ListBucketsResponse> {
        let mut builder = self
            .prepare(
                Method::GET,
                format!("{}/b", self.storage_endpoint),
                &request.options,
            )
            .await?
            .query(&[("project", request.project_id.as_str())]);
        if let Some(token) = &request.page_token {
            builder = builder.query(&[("pageToken", token.as_str())]);
        }
        self.call(builder).await
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> StatusOr<BucketMetadata> {
        let builder = self
            .prepare(
                Method::POST,
                format!("{}/b", self.storage_endpoint),
                &request.options,
            )
            .await?
            .query(&[("project", request.project_id.as_str())])
            .json(&to_json(&request.metadata)?);
        self.call(builder).await
    }

    async fn get_bucket_metadata(
        &self,
        request: &GetBucketMetadataRequest,
    ) -> StatusOr<BucketMetadata> {
        self.get(self.bucket_url(&request.bucket_name), &request.options)
            .await
    }

    async fn delete_bucket(&self, request: &DeleteBucketRequest) -> StatusOr<EmptyResponse> {
        self.delete(self.bucket_url(&request.bucket_name), &request.options)
            .await
    }

    async fn update_bucket(&self, request: &UpdateBucketRequest) -> StatusOr<BucketMetadata> {
        self.with_body(
            Method::PUT,
            self.bucket_url(request.bucket_name()),
            &to_json(&request.metadata)?,
            &request.options,
        )
        .await
    }

    async fn patch_bucket(&self, request: &PatchBucketRequest) -> StatusOr<BucketMetadata> {
        self.with_body(
            Method::PATCH,
            self.bucket_url(&request.bucket_name),
            &request.patch,
            &request.options,
        )
        .await
    }

    async fn get_bucket_iam_policy(
        &self,
        request: &GetBucketIamPolicyRequest,
    ) -> StatusOr<IamPolicy> {
        let url = format!("{}/iam", self.bucket_url(&request.bucket_name));
        self.get(url, &request.options).await
    }

    async fn set_bucket_iam_policy(
        &self,
        request: &SetBucketIamPolicyRequest,
    ) -> StatusOr<IamPolicy> {
        let url = format!("{}/iam", self.bucket_url(&request.bucket_name));
        self.with_body(Method::PUT, url, &to_json(&request.policy)?, &request.options)
            .await
    }

    async fn test_bucket_iam_permissions(
        &self,
        request: &TestBucketIamPermissionsRequest,
    ) -> StatusOr<TestBucketIamPermissionsResponse> {
        let url = format!("{}/iam/testPermissions", self.bucket_url(&request.bucket_name));
        let permissions: Vec<(&str, &str)> = request
            .permissions
            .iter()
            .map(|p| ("permissions", p.as_str()))
            .collect();
        let builder = self
            .prepare(Method::GET, url, &request.options)
            .await?
            .query(&permissions);
        self.call(builder).await
    }

    // ========== Objects ==========

    async fn insert_object_media(
        &self,
        request: &InsertObjectMediaRequest,
    ) -> StatusOr<ObjectMetadata> {
        let mut builder = self
            .prepare(
                Method::POST,
                self.upload_url(&request.bucket_name),
                &request.options,
            )
            .await?
            .query(&[
                ("uploadType", "media"),
                ("name", request.object_name.as_str()),
            ]);
        if !has_header(&request.options, CONTENT_TYPE.as_str()) {
            builder = builder.header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        }
        self.call(builder.body(request.contents.clone())).await
    }

    async fn copy_object(&self, request: &CopyObjectRequest) -> StatusOr<ObjectMetadata> {
        let url = format!(
            "{}/copyTo/b/{}/o/{}",
            self.object_url(&request.source_bucket, &request.source_object),
            encode(&request.destination_bucket),
            encode(&request.destination_object)
        );
        let body = match &request.metadata {
            Some(metadata) => to_json(metadata)?,
            None => json!({}),
        };
        self.with_body(Method::POST, url, &body, &request.options)
            .await
    }

    async fn get_object_metadata(
        &self,
        request: &GetObjectMetadataRequest,
    ) -> StatusOr<ObjectMetadata> {
        self.get(
            self.object_url(&request.bucket_name, &request.object_name),
            &request.options,
        )
        .await
    }

    async fn read_object(
        &self,
        request: &ReadObjectRangeRequest,
    ) -> StatusOr<Box<dyn ObjectReadSource>> {
        if request.is_empty_range() {
            return Ok(Box::new(BufferedReadSource::new(std::iter::empty::<Bytes>())));
        }
        let mut builder = self
            .prepare(
                Method::GET,
                self.object_url(&request.bucket_name, &request.object_name),
                &request.options,
            )
            .await?
            .query(&[("alt", "media")]);
        if let Some(range) = request.range_header() {
            builder = builder.header(RANGE, range);
        }
        let response = self.send(builder).await?;
        Ok(Box::new(RestReadSource { response }))
    }

    async fn write_object(
        &self,
        request: &InsertObjectStreamingRequest,
    ) -> StatusOr<Box<dyn ObjectWriteSink>> {
        let mut builder = self
            .prepare(
                Method::POST,
                self.upload_url(&request.bucket_name),
                &request.options,
            )
            .await?
            .query(&[
                ("uploadType", "media"),
                ("name", request.object_name.as_str()),
            ]);
        if !has_header(&request.options, CONTENT_TYPE.as_str()) {
            builder = builder.header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        }

        let (sender, receiver) = mpsc::channel::<std::io::Result<Bytes>>(UPLOAD_CHANNEL_CAPACITY);
        let request = builder
            .body(reqwest::Body::wrap_stream(receiver))
            .build()
            .map_err(|e| Status::new(400, format!("Invalid request: {e}")))?;
        let http = self.http.clone();
        let upload = tokio::spawn(async move {
            let response = http.execute(request).await.map_err(transport_status)?;
            let response = check_status(response).await?;
            parse_json::<ObjectMetadata>(response).await
        });

        Ok(Box::new(RestWriteSink {
            sender: Some(sender),
            upload: Some(upload),
        }))
    }

    async fn list_objects(&self, request: &ListObjectsRequest) -> StatusOr<ListObjectsResponse> {
        let mut builder = self
            .prepare(
                Method::GET,
                format!("{}/o", self.bucket_url(&request.bucket_name)),
                &request.options,
            )
            .await?;
        if let Some(token) = &request.page_token {
            builder = builder.query(&[("pageToken", token.as_str())]);
        }
        self.call(builder).await
    }

    async fn delete_object(&self, request: &DeleteObjectRequest) -> StatusOr<EmptyResponse> {
        self.delete(
            self.object_url(&request.bucket_name, &request.object_name),
            &request.options,
        )
        .await
    }

    async fn update_object(&self, request: &UpdateObjectRequest) -> StatusOr<ObjectMetadata> {
        self.with_body(
            Method::PUT,
            self.object_url(&request.bucket_name, &request.object_name),
            &to_json(&request.metadata)?,
            &request.options,
        )
        .await
    }

    async fn patch_object(&self, request: &PatchObjectRequest) -> StatusOr<ObjectMetadata> {
        self.with_body(
            Method::PATCH,
            self.object_url(&request.bucket_name, &request.object_name),
            &request.patch,
            &request.options,
        )
        .await
    }

    async fn compose_object(&self, request: &ComposeObjectRequest) -> StatusOr<ObjectMetadata> {
        let url = format!(
            "{}/compose",
            self.object_url(&request.bucket_name, &request.destination_object_name)
        );
        self.with_body(Method::POST, url, &request.body(), &request.options)
            .await
    }

    async fn rewrite_object(
        &self,
        request: &RewriteObjectRequest,
    ) -> StatusOr<RewriteObjectResponse> {
        let url = format!(
            "{}/rewriteTo/b/{}/o/{}",
            self.object_url(&request.source_bucket, &request.source_object),
            encode(&request.destination_bucket),
            encode(&request.destination_object)
        );
        let body = match &request.metadata {
            Some(metadata) => to_json(metadata)?,
            None => json!({}),
        };
        let mut builder = self
            .prepare(Method::POST, url, &request.options)
            .await?
            .json(&body);
        if let Some(token) = &request.rewrite_token {
            builder = builder.query(&[("rewriteToken", token.as_str())]);
        }
        self.call(builder).await
    }

    // ========== Bucket ACL ==========

    async fn list_bucket_acl(
        &self,
        request: &ListBucketAclRequest,
    ) -> StatusOr<ListBucketAclResponse> {
        let url = format!("{}/acl", self.bucket_url(&request.bucket_name));
        self.get(url, &request.options).await
    }

    async fn create_bucket_acl(
        &self,
        request: &CreateBucketAclRequest,
    ) -> StatusOr<BucketAccessControl> {
        let url = format!("{}/acl", self.bucket_url(&request.bucket_name));
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::POST, url, &body, &request.options)
            .await
    }

    async fn delete_bucket_acl(&self, request: &DeleteBucketAclRequest) -> StatusOr<EmptyResponse> {
        let url = format!(
            "{}/acl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.delete(url, &request.options).await
    }

    async fn get_bucket_acl(&self, request: &GetBucketAclRequest) -> StatusOr<BucketAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.get(url, &request.options).await
    }

    async fn update_bucket_acl(
        &self,
        request: &UpdateBucketAclRequest,
    ) -> StatusOr<BucketAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::PUT, url, &body, &request.options)
            .await
    }

    async fn patch_bucket_acl(
        &self,
        request: &PatchBucketAclRequest,
    ) -> StatusOr<BucketAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.with_body(Method::PATCH, url, &request.patch, &request.options)
            .await
    }

    // ========== Object ACL ==========

    async fn list_object_acl(
        &self,
        request: &ListObjectAclRequest,
    ) -> StatusOr<ListObjectAclResponse> {
        let url = format!(
            "{}/acl",
            self.object_url(&request.bucket_name, &request.object_name)
        );
        self.get(url, &request.options).await
    }

    async fn create_object_acl(
        &self,
        request: &CreateObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/acl",
            self.object_url(&request.bucket_name, &request.object_name)
        );
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::POST, url, &body, &request.options)
            .await
    }

    async fn delete_object_acl(&self, request: &DeleteObjectAclRequest) -> StatusOr<EmptyResponse> {
        let url = format!(
            "{}/acl/{}",
            self.object_url(&request.bucket_name, &request.object_name),
            encode(&request.entity)
        );
        self.delete(url, &request.options).await
    }

    async fn get_object_acl(&self, request: &GetObjectAclRequest) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.object_url(&request.bucket_name, &request.object_name),
            encode(&request.entity)
        );
        self.get(url, &request.options).await
    }

    async fn update_object_acl(
        &self,
        request: &UpdateObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.object_url(&request.bucket_name, &request.object_name),
            encode(&request.entity)
        );
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::PUT, url, &body, &request.options)
            .await
    }

    async fn patch_object_acl(
        &self,
        request: &PatchObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/acl/{}",
            self.object_url(&request.bucket_name, &request.object_name),
            encode(&request.entity)
        );
        self.with_body(Method::PATCH, url, &request.patch, &request.options)
            .await
    }

    // ========== Default object ACL ==========

    async fn list_default_object_acl(
        &self,
        request: &ListDefaultObjectAclRequest,
    ) -> StatusOr<ListDefaultObjectAclResponse> {
        let url = format!("{}/defaultObjectAcl", self.bucket_url(&request.bucket_name));
        self.get(url, &request.options).await
    }

    async fn create_default_object_acl(
        &self,
        request: &CreateDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!("{}/defaultObjectAcl", self.bucket_url(&request.bucket_name));
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::POST, url, &body, &request.options)
            .await
    }

    async fn delete_default_object_acl(
        &self,
        request: &DeleteDefaultObjectAclRequest,
    ) -> StatusOr<EmptyResponse> {
        let url = format!(
            "{}/defaultObjectAcl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.delete(url, &request.options).await
    }

    async fn get_default_object_acl(
        &self,
        request: &GetDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/defaultObjectAcl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.get(url, &request.options).await
    }

    async fn update_default_object_acl(
        &self,
        request: &UpdateDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/defaultObjectAcl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        let body = acl_body(&request.entity, &request.role);
        self.with_body(Method::PUT, url, &body, &request.options)
            .await
    }

    async fn patch_default_object_acl(
        &self,
        request: &PatchDefaultObjectAclRequest,
    ) -> StatusOr<ObjectAccessControl> {
        let url = format!(
            "{}/defaultObjectAcl/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.entity)
        );
        self.with_body(Method::PATCH, url, &request.patch, &request.options)
            .await
    }

    // ========== Service account ==========

    async fn get_service_account(
        &self,
        request: &GetProjectServiceAccountRequest,
    ) -> StatusOr<ServiceAccount> {
        let url = format!(
            "{}/projects/{}/serviceAccount",
            self.storage_endpoint,
            encode(&request.project_id)
        );
        self.get(url, &request.options).await
    }

    // ========== Notifications ==========

    async fn list_notifications(
        &self,
        request: &ListNotificationsRequest,
    ) -> StatusOr<ListNotificationsResponse> {
        let url = format!("{}/notificationConfigs", self.bucket_url(&request.bucket_name));
        self.get(url, &request.options).await
    }

    async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
    ) -> StatusOr<NotificationMetadata> {
        let url = format!("{}/notificationConfigs", self.bucket_url(&request.bucket_name));
        self.with_body(Method::POST, url, &to_json(&request.metadata)?, &request.options)
            .await
    }

    async fn get_notification(
        &self,
        request: &GetNotificationRequest,
    ) -> StatusOr<NotificationMetadata> {
        let url = format!(
            "{}/notificationConfigs/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.notification_id)
        );
        self.get(url, &request.options).await
    }

    async fn delete_notification(
        &self,
        request: &DeleteNotificationRequest,
    ) -> StatusOr<EmptyResponse> {
        let url = format!(
            "{}/notificationConfigs/{}",
            self.bucket_url(&request.bucket_name),
            encode(&request.notification_id)
        );
        self.delete(url, &request.options).await
    }
}

fn has_header(options: &RequestOptions, name: &str) -> bool {
    options
        .headers()
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Body of an `alt=media` download, read chunk by chunk.
struct RestReadSource {
    response: Response,
}

#[async_trait]
impl ObjectReadSource for RestReadSource {
    async fn read(&mut self) -> StatusOr<Option<Bytes>> {
        self.response.chunk().await.map_err(transport_status)
    }
}

/// Feeds a streaming upload whose HTTP request runs on a background task.
struct RestWriteSink {
    sender: Option<mpsc::Sender<std::io::Result<Bytes>>>,
    upload: Option<JoinHandle<StatusOr<ObjectMetadata>>>,
}

impl RestWriteSink {
    async fn finish(&mut self) -> StatusOr<ObjectMetadata> {
        self.sender.take();
        let Some(upload) = self.upload.take() else {
            return Err(Status::new(400, "Upload stream already closed"));
        };
        upload
            .await
            .map_err(|e| Status::transport_failure(format!("Upload task failed: {e}")))?
    }
}

#[async_trait]
impl ObjectWriteSink for RestWriteSink {
    async fn write(&mut self, chunk: Bytes) -> StatusOr<()> {
        let Some(sender) = self.sender.as_mut() else {
            return Err(Status::new(400, "Upload stream already closed"));
        };
        if sender.send(Ok(chunk)).await.is_ok() {
            return Ok(());
        }
        // The request ended early; report why.
        match self.finish().await {
            Err(status) => Err(status),
            Ok(_) => Err(Status::transport_failure(
                "Upload finished before all data was sent",
            )),
        }
    }

    async fn close(&mut self) -> StatusOr<ObjectMetadata> {
        self.finish().await
    }
}

impl Drop for RestWriteSink {
    fn drop(&mut self) {
        if let Some(upload) = self.upload.take() {
            upload.abort();
        }
    }
}
