//! ls command - List buckets or objects
//!
//! Without a path, lists the buckets of the project. With `gs://bucket[/prefix]`
//! lists one level of objects and common prefixes, or everything below the
//! prefix with `--recursive`.

use clap::Args;
use futures::TryStreamExt;
use gcs_core::RequestOptions;
use gcs_core::resources::{BucketMetadata, ObjectMetadata};
use serde::Serialize;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, format_size, format_timestamp};

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// gs://bucket[/prefix]; lists buckets when omitted
    pub path: Option<String>,

    /// List all objects below the prefix instead of one level
    #[arg(short, long)]
    pub recursive: bool,

    /// Show size and modification time
    #[arg(short, long)]
    pub long: bool,
}

#[derive(Debug, Serialize)]
struct BucketEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
}

impl From<BucketMetadata> for BucketEntry {
    fn from(bucket: BucketMetadata) -> Self {
        Self {
            name: bucket.name,
            location: bucket.location,
            storage_class: bucket.storage_class,
            created: bucket.time_created.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ObjectEntry {
    name: String,
    is_prefix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<i64>,
}

impl ObjectEntry {
    fn prefix(name: String) -> Self {
        Self {
            name,
            is_prefix: true,
            size_bytes: None,
            size_human: None,
            updated: None,
            generation: None,
        }
    }

    fn object(object: &ObjectMetadata) -> Self {
        let size = object.size_bytes();
        Self {
            name: object.name.clone(),
            is_prefix: false,
            size_bytes: Some(size),
            size_human: Some(format_size(size)),
            updated: object.updated.as_ref().map(format_timestamp),
            generation: object.generation,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput {
    path: String,
    entries: Vec<ObjectEntry>,
    total_objects: usize,
    total_size_bytes: u64,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let path = match args.path.as_deref().map(GsPath::parse).transpose() {
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

    match path {
        None => list_buckets(&client, &formatter).await,
        Some(path) => list_objects(&client, &path, &args, &formatter).await,
    }
}

async fn list_buckets(client: &gcs_core::Client, formatter: &Formatter) -> ExitCode {
    let stream = match client.list_buckets(RequestOptions::new()) {
        Ok(stream) => stream,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    let buckets: Vec<BucketMetadata> = match stream.try_collect().await {
        Ok(buckets) => buckets,
        Err(e) => {
            formatter.error(&format!("Failed to list buckets: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        let entries: Vec<BucketEntry> = buckets.into_iter().map(BucketEntry::from).collect();
        formatter.json(&entries);
    } else if buckets.is_empty() {
        formatter.println("No buckets found.");
    } else {
        for bucket in &buckets {
            let url = format!("{}{}", GsPath::SCHEME, bucket.name);
            formatter.println(&formatter.style_url(&url));
        }
    }
    ExitCode::Success
}

async fn list_objects(
    client: &gcs_core::Client,
    path: &GsPath,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let prefix = path.object.clone().unwrap_or_default();
    let mut options = RequestOptions::new();
    if !prefix.is_empty() {
        options = options.prefix(prefix.clone());
    }
    if !args.recursive {
        options = options.delimiter("/");
    }

    let mut entries = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let page = match client
            .list_objects_page(&path.bucket, page_token.as_deref(), options.clone())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                formatter.error(&format!("Failed to list {path}: {e}"));
                return ExitCode::from_error(&e);
            }
        };
        entries.extend(page.prefixes.into_iter().map(ObjectEntry::prefix));
        entries.extend(page.items.iter().map(ObjectEntry::object));
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let total_objects = entries.iter().filter(|e| !e.is_prefix).count();
    let total_size_bytes = entries.iter().filter_map(|e| e.size_bytes).sum();

    if formatter.is_json() {
        formatter.json(&ListOutput {
            path: path.to_string(),
            entries,
            total_objects,
            total_size_bytes,
        });
        return ExitCode::Success;
    }

    for entry in &entries {
        let name = entry.name.strip_prefix(&prefix).unwrap_or(&entry.name);
        let name = if name.is_empty() { &entry.name } else { name };
        let styled = if entry.is_prefix {
            formatter.style_prefix(name)
        } else {
            formatter.style_object(name)
        };
        if !args.long {
            formatter.println(&styled);
            continue;
        }
        let size = entry.size_human.as_deref().unwrap_or("PRE");
        let updated = entry.updated.as_deref().unwrap_or("");
        formatter.println(&format!(
            "{:<19} {:>10} {styled}",
            formatter.style_date(updated),
            formatter.style_size(size)
        ));
    }
    if args.long && !formatter.is_quiet() {
        formatter.println(&format!(
            "Total: {} object(s), {}",
            total_objects,
            format_size(total_size_bytes)
        ));
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputConfig;

    #[tokio::test]
    async fn test_execute_invalid_path_returns_usage_error() {
        let args = LsArgs {
            path: Some("not-a-gs-path".to_string()),
            recursive: false,
            long: false,
        };
        let global = GlobalOptions {
            output: OutputConfig::default(),
            ..Default::default()
        };
        assert_eq!(execute(args, global).await, ExitCode::UsageError);
    }

    #[test]
    fn test_object_entry() {
        let mut object = ObjectMetadata::new("bkt", "logs/a.txt");
        object.size = Some(2048);
        object.generation = Some(7);
        let entry = ObjectEntry::object(&object);
        assert!(!entry.is_prefix);
        assert_eq!(entry.size_bytes, Some(2048));
        assert_eq!(entry.size_human.as_deref(), Some("2 KiB"));
        assert_eq!(entry.generation, Some(7));

        let prefix = ObjectEntry::prefix("logs/2024/".to_string());
        assert!(prefix.is_prefix);
        assert!(prefix.size_bytes.is_none());
    }
}
