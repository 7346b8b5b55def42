//! rm command - Remove objects

use clap::Args;
use futures::TryStreamExt;
use gcs_core::{Client, RequestOptions};
use serde::Serialize;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Objects to remove (gs://bucket/object)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove every object under each path, treated as a prefix
    #[arg(short, long)]
    pub recursive: bool,

    /// Remove a specific generation (single object only)
    #[arg(long, conflicts_with = "recursive")]
    pub generation: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    removed: Vec<String>,
    failed: Vec<String>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let mut targets = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        match GsPath::parse_object(path) {
            Ok(target) => targets.push(target),
            Err(e) => {
                formatter.error(&e);
                return ExitCode::UsageError;
            }
        }
    }
    if args.generation.is_some() && targets.len() > 1 {
        formatter.error("--generation applies to a single object");
        return ExitCode::UsageError;
    }

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let mut output = RmOutput {
        removed: Vec::new(),
        failed: Vec::new(),
    };
    let mut exit_code = ExitCode::Success;

    for (bucket, object) in targets {
        let names = if args.recursive {
            match expand_prefix(&client, &bucket, &object).await {
                Ok(names) => names,
                Err(e) => {
                    formatter.error(&format!("Failed to list gs://{bucket}/{object}: {e}"));
                    exit_code = ExitCode::from_error(&e);
                    continue;
                }
            }
        } else {
            vec![object]
        };
        if names.is_empty() {
            formatter.warning(&format!("No objects matched in gs://{bucket}"));
        }

        for name in names {
            let url = format!("{}{bucket}/{name}", GsPath::SCHEME);
            let mut options = RequestOptions::new();
            if let Some(generation) = args.generation {
                options = options.generation(generation);
            }
            match client.delete_object(&bucket, &name, options).await {
                Ok(()) => {
                    if !formatter.is_json() {
                        formatter.success(&format!("Removed {}", formatter.style_url(&url)));
                    }
                    output.removed.push(url);
                }
                Err(e) => {
                    formatter.error(&format!("Failed to remove {url}: {e}"));
                    exit_code = ExitCode::from_error(&e);
                    output.failed.push(url);
                }
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&output);
    }
    exit_code
}

async fn expand_prefix(client: &Client, bucket: &str, prefix: &str) -> gcs_core::Result<Vec<String>> {
    client
        .list_objects(bucket, RequestOptions::new().prefix(prefix))
        .map_ok(|object| object.name)
        .try_collect()
        .await
}
