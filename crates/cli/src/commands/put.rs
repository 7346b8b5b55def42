//! put command - Upload a local file
//!
//! Small files go up in one retryable request. Larger files are streamed in
//! chunks so memory use stays bounded.

use std::path::{Path, PathBuf};

use bytes::BytesMut;
use clap::Args;
use gcs_core::resources::ObjectMetadata;
use gcs_core::{Client, RequestOptions};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, format_size};

/// Files up to this size are uploaded with a single request.
const SINGLE_REQUEST_LIMIT: u64 = 8 * 1024 * 1024;
const CHUNK_SIZE: usize = 1024 * 1024;

/// Upload a local file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination (gs://bucket/object, or gs://bucket/prefix/ to keep the file name)
    pub destination: String,

    /// Content type; guessed from the file extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Only create the object if it does not exist yet
    #[arg(long)]
    pub no_clobber: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct TransferOutput {
    pub source: String,
    pub destination: String,
    pub size_bytes: u64,
    pub size_human: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let destination = match GsPath::parse(&args.destination) {
        Ok(path) => path,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };
    let object_name = match destination_object_name(&destination, &args.source) {
        Ok(name) => name,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let mut options = RequestOptions::new();
    if args.no_clobber {
        options = options.if_generation_match(0);
    }
    let content_type = args
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(&args.source));

    match upload_file(
        &client,
        &args.source,
        &destination.bucket,
        &object_name,
        &content_type,
        options,
    )
    .await
    {
        Ok(object) => {
            report_transfer(
                &formatter,
                &args.source.display().to_string(),
                &format!("{}{}/{}", GsPath::SCHEME, object.bucket, object.name),
                object.size_bytes(),
            );
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!(
                "Failed to upload '{}': {e}",
                args.source.display()
            ));
            ExitCode::from_error(&e)
        }
    }
}

/// Object name for an upload: the destination as given, or the local file
/// name appended when the destination is a bucket or ends with `/`.
pub(super) fn destination_object_name(destination: &GsPath, source: &Path) -> Result<String, String> {
    let prefix = match destination.object.as_deref() {
        Some(object) if !object.ends_with('/') => return Ok(object.to_string()),
        Some(prefix) => prefix,
        None => "",
    };
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Cannot derive an object name from '{}'", source.display()))?;
    Ok(format!("{prefix}{file_name}"))
}

pub(super) fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub(super) async fn upload_file(
    client: &Client,
    source: &Path,
    bucket: &str,
    object: &str,
    content_type: &str,
    options: RequestOptions,
) -> gcs_core::Result<ObjectMetadata> {
    let mut file = tokio::fs::File::open(source).await?;
    let size = file.metadata().await?.len();
    let options = options.content_type(content_type);
    tracing::debug!(bucket, object, size, content_type, "Uploading file");

    if size <= SINGLE_REQUEST_LIMIT {
        let mut contents = Vec::with_capacity(size as usize);
        file.read_to_end(&mut contents).await?;
        return client.insert_object(bucket, object, contents, options).await;
    }

    let mut stream = client.write_object(bucket, object, options).await?;
    let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);
    loop {
        buffer.reserve(CHUNK_SIZE);
        let read = file.read_buf(&mut buffer).await?;
        if read == 0 {
            break;
        }
        if buffer.len() >= CHUNK_SIZE {
            stream.write(buffer.split().freeze()).await?;
        }
    }
    if !buffer.is_empty() {
        stream.write(buffer.freeze()).await?;
    }
    stream.close().await
}

pub(super) fn report_transfer(formatter: &Formatter, source: &str, destination: &str, size: u64) {
    if formatter.is_json() {
        formatter.json(&TransferOutput {
            source: source.to_string(),
            destination: destination.to_string(),
            size_bytes: size,
            size_human: format_size(size),
        });
    } else {
        formatter.success(&format!(
            "{source} -> {} ({})",
            formatter.style_url(destination),
            formatter.style_size(&format_size(size))
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_object_name() {
        let source = Path::new("/tmp/report.csv");
        let named = GsPath::parse("gs://bkt/data/final.csv").unwrap();
        assert_eq!(destination_object_name(&named, source).unwrap(), "data/final.csv");

        let prefix = GsPath::parse("gs://bkt/data/").unwrap();
        assert_eq!(destination_object_name(&prefix, source).unwrap(), "data/report.csv");

        let bucket = GsPath::parse("gs://bkt").unwrap();
        assert_eq!(destination_object_name(&bucket, source).unwrap(), "report.csv");
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("index.html")), "text/html");
        assert_eq!(guess_content_type(Path::new("photo.png")), "image/png");
        assert_eq!(
            guess_content_type(Path::new("blob.unknownext")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_execute_invalid_destination_returns_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, "hello").unwrap();

        let args = PutArgs {
            source,
            destination: "bkt/a.txt".to_string(),
            content_type: None,
            no_clobber: false,
        };
        assert_eq!(
            execute(args, GlobalOptions::default()).await,
            ExitCode::UsageError
        );
    }
}
