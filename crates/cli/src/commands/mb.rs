//! mb command - Make a bucket

use clap::Args;
use gcs_core::RequestOptions;
use gcs_core::resources::BucketMetadata;
use serde::Serialize;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Make a bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Bucket to create (gs://bucket)
    pub path: String,

    /// Bucket location, e.g. US or EUROPE-WEST1
    #[arg(short, long)]
    pub location: Option<String>,

    /// Default storage class for new objects
    #[arg(short = 'c', long)]
    pub storage_class: Option<String>,

    /// Labels to attach (key=value, repeatable)
    #[arg(long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_class: Option<String>,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let bucket = match GsPath::parse_bucket(&args.path) {
        Ok(bucket) => bucket,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let metadata = match build_metadata(&bucket, &args) {
        Ok(metadata) => metadata,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match client.create_bucket(metadata, RequestOptions::new()).await {
        Ok(created) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    bucket: created.name,
                    location: created.location,
                    storage_class: created.storage_class,
                });
            } else {
                formatter.success(&format!("Bucket '{}' created", created.name));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to create bucket '{bucket}': {e}"));
            ExitCode::from_error(&e)
        }
    }
}

fn build_metadata(bucket: &str, args: &MbArgs) -> Result<BucketMetadata, String> {
    let mut metadata = BucketMetadata::new(bucket);
    if let Some(location) = &args.location {
        metadata = metadata.with_location(location.clone());
    }
    if let Some(storage_class) = &args.storage_class {
        metadata = metadata.with_storage_class(storage_class.clone());
    }
    for label in &args.labels {
        match label.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                metadata = metadata.with_label(key, value);
            }
            _ => return Err(format!("Invalid label: '{label}' (expected key=value)")),
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(labels: &[&str]) -> MbArgs {
        MbArgs {
            path: "gs://new-bucket".to_string(),
            location: Some("EU".to_string()),
            storage_class: None,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_metadata() {
        let metadata = build_metadata("new-bucket", &args(&["team=storage", "env="])).unwrap();
        assert_eq!(metadata.name, "new-bucket");
        assert_eq!(metadata.location.as_deref(), Some("EU"));
        assert_eq!(metadata.labels.get("team").map(String::as_str), Some("storage"));
        assert_eq!(metadata.labels.get("env").map(String::as_str), Some(""));
    }

    #[test]
    fn test_build_metadata_invalid_label() {
        assert!(build_metadata("b", &args(&["novalue"])).is_err());
        assert!(build_metadata("b", &args(&["=x"])).is_err());
    }

    #[tokio::test]
    async fn test_execute_object_path_returns_usage_error() {
        let mut args = args(&[]);
        args.path = "gs://bucket/object".to_string();
        assert_eq!(
            execute(args, GlobalOptions::default()).await,
            ExitCode::UsageError
        );
    }
}
