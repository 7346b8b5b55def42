//! End-to-end tests of the decorated client over the REST transport.

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use gcs_core::credentials::create_anonymous_credentials;
use gcs_core::{
    Client, ClientOptions, ExponentialBackoffPolicy, LimitedErrorCountRetryPolicy, RequestOptions,
};
use gcs_http::RestClient;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, maximum_failures: u32) -> Client {
    let options = ClientOptions::new(create_anonymous_credentials())
        .with_endpoint(server.uri())
        .with_project_id("test-project");
    let raw = Arc::new(RestClient::new(options).unwrap());
    Client::builder(raw)
        .with_retry_policy(LimitedErrorCountRetryPolicy::new(maximum_failures))
        .with_backoff_policy(ExponentialBackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
        ))
        .build()
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/bkt"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/bkt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "bkt" })))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = client(&server, 3)
        .get_bucket_metadata("bkt", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(bucket.name, "bkt");
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/bkt/o/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Access denied" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .get_object_metadata("bkt", "secret", RequestOptions::new())
        .await
        .unwrap_err();
    let status = err.status().unwrap();
    assert_eq!(status.code(), 403);
    assert!(status.message().contains("Access denied"));
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 2)
        .get_bucket_metadata("bkt", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.code()), Some(500));
}

#[tokio::test]
async fn test_list_buckets_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", "test-project"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "c" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", "test-project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "a" }, { "name": "b" }],
            "nextPageToken": "p2"
        })))
        .mount(&server)
        .await;

    let buckets: Vec<_> = client(&server, 3)
        .list_buckets(RequestOptions::new())
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let names: Vec<_> = buckets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_upload_then_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/bkt/o"))
        .and(query_param("name", "notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bucket": "bkt", "name": "notes.txt", "size": "5"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/bkt/o/notes.txt"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let object = client
        .insert_object("bkt", "notes.txt", "hello", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(object.size_bytes(), 5);

    let contents = client
        .read_object("bkt", "notes.txt", RequestOptions::new())
        .await
        .unwrap()
        .read_all()
        .await
        .unwrap();
    assert_eq!(&contents[..], b"hello");
}
