use std::fmt;

use bytes::Bytes;

use crate::RequestOptions;
use crate::resources::{ComposeSourceObject, ObjectMetadata};

/// Upload an object in a single request.
#[derive(Clone, PartialEq)]
pub struct InsertObjectMediaRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub contents: Bytes,
    pub options: RequestOptions,
}

impl InsertObjectMediaRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            contents: contents.into(),
            options: RequestOptions::default(),
        }
    }
}

// Payloads can be large; log only their size.
impl fmt::Debug for InsertObjectMediaRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertObjectMediaRequest")
            .field("bucket_name", &self.bucket_name)
            .field("object_name", &self.object_name)
            .field("contents", &format_args!("<{} bytes>", self.contents.len()))
            .field("options", &self.options)
            .finish()
    }
}

/// Server-side copy of one object onto another name.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyObjectRequest {
    pub source_bucket: String,
    pub source_object: String,
    pub destination_bucket: String,
    pub destination_object: String,
    /// Metadata for the destination; when absent the source metadata is kept.
    pub metadata: Option<ObjectMetadata>,
    pub options: RequestOptions,
}

impl CopyObjectRequest {
    pub fn new(
        source_bucket: impl Into<String>,
        source_object: impl Into<String>,
        destination_bucket: impl Into<String>,
        destination_object: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            source_object: source_object.into(),
            destination_bucket: destination_bucket.into(),
            destination_object: destination_object.into(),
            metadata: None,
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetObjectMetadataRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub options: RequestOptions,
}

impl GetObjectMetadataRequest {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            options: RequestOptions::default(),
        }
    }
}

/// Download an object, optionally restricted to the byte range `[begin, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadObjectRangeRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub begin: Option<u64>,
    pub end: Option<u64>,
    pub options: RequestOptions,
}

impl ReadObjectRangeRequest {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            begin: None,
            end: None,
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_range(mut self, begin: u64, end: u64) -> Self {
        self.begin = Some(begin);
        self.end = Some(end);
        self
    }

    /// Whether the requested range selects no bytes at all.
    pub fn is_empty_range(&self) -> bool {
        match (self.begin, self.end) {
            (Some(begin), Some(end)) => end <= begin,
            (None, Some(end)) => end == 0,
            _ => false,
        }
    }

    /// Value of the HTTP `Range` header, if any range was requested.
    ///
    /// Empty ranges have no header; check [`Self::is_empty_range`] first.
    pub fn range_header(&self) -> Option<String> {
        match (self.begin, self.end) {
            (Some(begin), Some(end)) if end > begin => Some(format!("bytes={}-{}", begin, end - 1)),
            (Some(begin), None) => Some(format!("bytes={}-", begin)),
            (None, Some(end)) if end > 0 => Some(format!("bytes=0-{}", end - 1)),
            _ => None,
        }
    }
}

/// Start a streaming upload.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertObjectStreamingRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub options: RequestOptions,
}

impl InsertObjectStreamingRequest {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListObjectsRequest {
    pub bucket_name: String,
    pub page_token: Option<String>,
    pub options: RequestOptions,
}

impl ListObjectsRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
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
pub struct DeleteObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub options: RequestOptions,
}

impl DeleteObjectRequest {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            options: RequestOptions::default(),
        }
    }
}

/// Replace all writable object metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub metadata: ObjectMetadata,
    pub options: RequestOptions,
}

impl UpdateObjectRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        metadata: ObjectMetadata,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            metadata,
            options: RequestOptions::default(),
        }
    }
}

/// Apply a JSON merge patch to object metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub patch: serde_json::Value,
    pub options: RequestOptions,
}

impl PatchObjectRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        object_name: impl Into<String>,
        patch: serde_json::Value,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_name: object_name.into(),
            patch,
            options: RequestOptions::default(),
        }
    }
}

/// Concatenate objects of one bucket into a new object.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeObjectRequest {
    pub bucket_name: String,
    pub source_objects: Vec<ComposeSourceObject>,
    pub destination_object_name: String,
    pub destination_metadata: Option<ObjectMetadata>,
    pub options: RequestOptions,
}

impl ComposeObjectRequest {
    pub fn new(
        bucket_name: impl Into<String>,
        source_objects: Vec<ComposeSourceObject>,
        destination_object_name: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            source_objects,
            destination_object_name: destination_object_name.into(),
            destination_metadata: None,
            options: RequestOptions::default(),
        }
    }

    /// JSON body of the compose call.
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({ "sourceObjects": self.source_objects });
        if let Some(metadata) = &self.destination_metadata
            && let Ok(value) = serde_json::to_value(metadata)
        {
            body["destination"] = value;
        }
        body
    }
}

/// One step of a rewrite; repeat with the returned token until done.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteObjectRequest {
    pub source_bucket: String,
    pub source_object: String,
    pub destination_bucket: String,
    pub destination_object: String,
    pub rewrite_token: Option<String>,
    pub metadata: Option<ObjectMetadata>,
    pub options: RequestOptions,
}

impl RewriteObjectRequest {
    pub fn new(
        source_bucket: impl Into<String>,
        source_object: impl Into<String>,
        destination_bucket: impl Into<String>,
        destination_object: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            source_object: source_object.into(),
            destination_bucket: destination_bucket.into(),
            destination_object: destination_object.into(),
            rewrite_token: None,
            metadata: None,
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_rewrite_token(mut self, token: impl Into<String>) -> Self {
        self.rewrite_token = Some(token.into());
        self
    }
}

request_options!(
    InsertObjectMediaRequest,
    CopyObjectRequest,
    GetObjectMetadataRequest,
    ReadObjectRangeRequest,
    InsertObjectStreamingRequest,
    ListObjectsRequest,
    DeleteObjectRequest,
    UpdateObjectRequest,
    PatchObjectRequest,
    ComposeObjectRequest,
    RewriteObjectRequest,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_debug_hides_contents() {
        let request = InsertObjectMediaRequest::new("b", "o", vec![b'x'; 4096]);
        let debug = format!("{:?}", request);
        assert!(debug.contains("<4096 bytes>"));
        assert!(!debug.contains("xxxx"));
    }

    #[test]
    fn test_range_header() {
        let request = ReadObjectRangeRequest::new("b", "o");
        assert_eq!(request.range_header(), None);

        let request = request.with_range(100, 200);
        assert_eq!(request.range_header().as_deref(), Some("bytes=100-199"));

        let mut open = ReadObjectRangeRequest::new("b", "o");
        open.begin = Some(10);
        assert_eq!(open.range_header().as_deref(), Some("bytes=10-"));

        assert!(!open.is_empty_range());
        assert!(!request.is_empty_range());
    }

    #[test]
    fn test_empty_range() {
        let empty = ReadObjectRangeRequest::new("b", "o").with_range(5, 5);
        assert!(empty.is_empty_range());
        assert_eq!(empty.range_header(), None);

        let inverted = ReadObjectRangeRequest::new("b", "o").with_range(9, 3);
        assert!(inverted.is_empty_range());

        let mut up_to_zero = ReadObjectRangeRequest::new("b", "o");
        up_to_zero.end = Some(0);
        assert!(up_to_zero.is_empty_range());

        assert!(!ReadObjectRangeRequest::new("b", "o").is_empty_range());
    }

    #[test]
    fn test_compose_body() {
        let request = ComposeObjectRequest::new(
            "b",
            vec![ComposeSourceObject::new("a"), ComposeSourceObject::new("c")],
            "joined",
        );
        assert_eq!(
            request.body(),
            serde_json::json!({"sourceObjects": [{"name": "a"}, {"name": "c"}]})
        );
    }

    #[test]
    fn test_with_options_keeps_identity() {
        let request = GetObjectMetadataRequest::new("b", "o")
            .with_options(RequestOptions::new().generation(3));
        assert_eq!(request.bucket_name, "b");
        assert_eq!(request.options.query_parameter("generation"), Some("3"));
    }
}
