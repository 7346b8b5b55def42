//! rb command - Remove a bucket
//!
//! The service refuses to delete buckets that still hold objects; `--force`
//! deletes every object first.

use clap::Args;
use futures::TryStreamExt;
use gcs_core::{Client, RequestOptions};

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Remove a bucket
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Bucket to remove (gs://bucket)
    pub path: String,

    /// Delete all objects in the bucket first
    #[arg(long)]
    pub force: bool,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let bucket = match GsPath::parse_bucket(&args.path) {
        Ok(bucket) => bucket,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    if args.force
        && let Err(e) = empty_bucket(&client, &bucket, &formatter).await
    {
        formatter.error(&format!("Failed to empty bucket '{bucket}': {e}"));
        return ExitCode::from_error(&e);
    }

    match client.delete_bucket(&bucket, RequestOptions::new()).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({ "bucket": bucket, "removed": true }));
            } else {
                formatter.success(&format!("Bucket '{bucket}' removed"));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to remove bucket '{bucket}': {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn empty_bucket(client: &Client, bucket: &str, formatter: &Formatter) -> gcs_core::Result<()> {
    let objects: Vec<_> = client
        .list_objects(bucket, RequestOptions::new())
        .try_collect()
        .await?;
    for object in &objects {
        tracing::debug!(bucket, object = %object.name, "Deleting object before bucket removal");
        match client
            .delete_object(bucket, &object.name, RequestOptions::new())
            .await
        {
            Ok(()) => {}
            // Deleted concurrently.
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    if !objects.is_empty() && !formatter.is_json() {
        formatter.println(&format!("Deleted {} object(s)", objects.len()));
    }
    Ok(())
}
