//! cp command - Copy files and objects
//!
//! Local to remote uploads, remote to local downloads, and remote to remote
//! copies run server side through the rewrite API so large objects and
//! cross-location copies work.

use std::path::{Path, PathBuf};

use clap::Args;
use gcs_core::{Client, RequestOptions};
use tokio::io::AsyncWriteExt;

use super::put::{destination_object_name, guess_content_type, report_transfer, upload_file};
use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Copy files and objects
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source: a local file or gs://bucket/object
    pub source: String,

    /// Destination: a local path or gs://bucket[/object]
    pub destination: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Transfer {
    Upload { source: PathBuf, destination: GsPath },
    Download { source: (String, String), destination: PathBuf },
    Copy { source: (String, String), destination: GsPath },
}

fn plan(source: &str, destination: &str) -> Result<Transfer, String> {
    match (GsPath::is_remote(source), GsPath::is_remote(destination)) {
        (false, false) => Err("At least one of source and destination must be a gs:// path".into()),
        (false, true) => Ok(Transfer::Upload {
            source: PathBuf::from(source),
            destination: GsPath::parse(destination)?,
        }),
        (true, false) => Ok(Transfer::Download {
            source: GsPath::parse_object(source)?,
            destination: PathBuf::from(destination),
        }),
        (true, true) => Ok(Transfer::Copy {
            source: GsPath::parse_object(source)?,
            destination: GsPath::parse(destination)?,
        }),
    }
}

/// Execute the cp command
pub async fn execute(args: CpArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let transfer = match plan(&args.source, &args.destination) {
        Ok(transfer) => transfer,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = match &transfer {
        Transfer::Upload {
            source,
            destination,
        } => upload(&client, source, destination).await,
        Transfer::Download {
            source: (bucket, object),
            destination,
        } => download(&client, bucket, object, destination).await,
        Transfer::Copy {
            source: (bucket, object),
            destination,
        } => copy(&client, bucket, object, destination).await,
    };

    match result {
        Ok((destination, size)) => {
            report_transfer(&formatter, &args.source, &destination, size);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!(
                "Failed to copy '{}' to '{}': {e}",
                args.source, args.destination
            ));
            ExitCode::from_error(&e)
        }
    }
}

async fn upload(
    client: &Client,
    source: &Path,
    destination: &GsPath,
) -> gcs_core::Result<(String, u64)> {
    let object_name =
        destination_object_name(destination, source).map_err(gcs_core::Error::InvalidArgument)?;
    let object = upload_file(
        client,
        source,
        &destination.bucket,
        &object_name,
        &guess_content_type(source),
        RequestOptions::new(),
    )
    .await?;
    Ok((
        format!("{}{}/{}", GsPath::SCHEME, object.bucket, object.name),
        object.size_bytes(),
    ))
}

async fn download(
    client: &Client,
    bucket: &str,
    object: &str,
    destination: &Path,
) -> gcs_core::Result<(String, u64)> {
    let target = if destination.is_dir() {
        let file_name = object.rsplit('/').next().unwrap_or(object);
        destination.join(file_name)
    } else {
        destination.to_path_buf()
    };

    let mut stream = client
        .read_object(bucket, object, RequestOptions::new())
        .await?;
    let mut file = tokio::fs::File::create(&target).await?;
    let mut size = 0u64;
    while let Some(chunk) = stream.next_chunk().await? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    tracing::debug!(bucket, object, path = %target.display(), size, "Downloaded object");
    Ok((target.display().to_string(), size))
}

async fn copy(
    client: &Client,
    source_bucket: &str,
    source_object: &str,
    destination: &GsPath,
) -> gcs_core::Result<(String, u64)> {
    let destination_object = match destination.object.as_deref() {
        Some(object) if !object.ends_with('/') => object.to_string(),
        prefix => {
            let file_name = source_object.rsplit('/').next().unwrap_or(source_object);
            format!("{}{file_name}", prefix.unwrap_or(""))
        }
    };
    let object = client
        .rewrite_object_blocking(
            source_bucket,
            source_object,
            &destination.bucket,
            &destination_object,
            RequestOptions::new(),
        )
        .await?;
    Ok((
        format!("{}{}/{}", GsPath::SCHEME, object.bucket, object.name),
        object.size_bytes(),
    ))
}
