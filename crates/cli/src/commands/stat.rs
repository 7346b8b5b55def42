//! stat command - Show bucket or object metadata

use clap::Args;
use gcs_core::RequestOptions;
use gcs_core::resources::{BucketMetadata, ObjectMetadata};

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, format_size, format_timestamp};

const KEY_WIDTH: usize = 16;

/// Show bucket or object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// gs://bucket or gs://bucket/object
    pub path: String,

    /// Inspect a specific object generation
    #[arg(long)]
    pub generation: Option<i64>,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let path = match GsPath::parse(&args.path) {
        Ok(path) => path,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match &path.object {
        None => match client
            .get_bucket_metadata(&path.bucket, RequestOptions::new())
            .await
        {
            Ok(bucket) => {
                if formatter.is_json() {
                    formatter.json(&bucket);
                } else {
                    print_bucket(&bucket, &formatter);
                }
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to stat {path}: {e}"));
                ExitCode::from_error(&e)
            }
        },
        Some(object) => {
            let mut options = RequestOptions::new();
            if let Some(generation) = args.generation {
                options = options.generation(generation);
            }
            match client
                .get_object_metadata(&path.bucket, object, options)
                .await
            {
                Ok(object) => {
                    if formatter.is_json() {
                        formatter.json(&object);
                    } else {
                        print_object(&object, &formatter);
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to stat {path}: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
    }
}

fn print_bucket(bucket: &BucketMetadata, formatter: &Formatter) {
    let property = |key: &str, value: &str| formatter.property(key, value, KEY_WIDTH);

    property("Name:", &formatter.style_name(&bucket.name));
    if let Some(location) = &bucket.location {
        property("Location:", location);
    }
    if let Some(storage_class) = &bucket.storage_class {
        property("Storage class:", storage_class);
    }
    if let Some(created) = &bucket.time_created {
        property("Created:", &formatter.style_date(&format_timestamp(created)));
    }
    if let Some(updated) = &bucket.updated {
        property("Updated:", &formatter.style_date(&format_timestamp(updated)));
    }
    if let Some(metageneration) = bucket.metageneration {
        property("Metageneration:", &metageneration.to_string());
    }
    property(
        "Versioning:",
        if bucket.versioning_enabled() {
            "enabled"
        } else {
            "disabled"
        },
    );
    for (key, value) in &bucket.labels {
        property("Label:", &format!("{key}={value}"));
    }
}

fn print_object(object: &ObjectMetadata, formatter: &Formatter) {
    let property = |key: &str, value: &str| formatter.property(key, value, KEY_WIDTH);

    let url = format!("{}{}/{}", GsPath::SCHEME, object.bucket, object.name);
    property("Name:", &formatter.style_url(&url));
    let size = object.size_bytes();
    property(
        "Size:",
        &formatter.style_size(&format!("{} ({size} bytes)", format_size(size))),
    );
    if let Some(content_type) = &object.content_type {
        property("Content-Type:", content_type);
    }
    if let Some(storage_class) = &object.storage_class {
        property("Storage class:", storage_class);
    }
    if let Some(generation) = object.generation {
        property("Generation:", &generation.to_string());
    }
    if let Some(metageneration) = object.metageneration {
        property("Metageneration:", &metageneration.to_string());
    }
    if let Some(updated) = &object.updated {
        property("Updated:", &formatter.style_date(&format_timestamp(updated)));
    }
    if let Some(etag) = &object.etag {
        property("ETag:", etag);
    }
    for (key, value) in &object.metadata {
        property("Metadata:", &format!("{key}={value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_invalid_path_returns_usage_error() {
        let args = StatArgs {
            path: "s3://bucket/key".to_string(),
            generation: None,
        };
        assert_eq!(
            execute(args, GlobalOptions::default()).await,
            ExitCode::UsageError
        );
    }
}
