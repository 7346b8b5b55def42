//! notification command - Manage Pub/Sub notifications of a bucket

use clap::{Args, Subcommand};
use gcs_core::RequestOptions;
use gcs_core::resources::{JSON_API_V1_PAYLOAD, NotificationMetadata};

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Manage bucket notifications
#[derive(Args, Debug)]
pub struct NotificationArgs {
    #[command(subcommand)]
    pub command: NotificationCommands,
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notification configurations
    Ls(BucketArg),

    /// Publish object changes to a Pub/Sub topic
    Create(CreateArgs),

    /// Delete a notification configuration
    Rm(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct BucketArg {
    /// Bucket (gs://bucket)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Bucket (gs://bucket)
    pub path: String,

    /// Topic, as projects/<project>/topics/<topic>
    #[arg(short, long)]
    pub topic: String,

    /// Event types to publish (repeatable); all events when omitted
    #[arg(short, long = "event")]
    pub events: Vec<String>,

    /// Only publish events for objects with this name prefix
    #[arg(short, long)]
    pub prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Bucket (gs://bucket)
    pub path: String,

    /// Notification id
    pub id: String,
}

/// Execute the notification command
pub async fn execute(args: NotificationArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let path = match &args.command {
        NotificationCommands::Ls(a) => &a.path,
        NotificationCommands::Create(a) => &a.path,
        NotificationCommands::Rm(a) => &a.path,
    };
    let bucket = match GsPath::parse_bucket(path) {
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

    match args.command {
        NotificationCommands::Ls(_) => {
            match client
                .list_notifications(&bucket, RequestOptions::new())
                .await
            {
                Ok(notifications) => {
                    if formatter.is_json() {
                        formatter.json(&notifications);
                    } else if notifications.is_empty() {
                        formatter.println("No notifications configured.");
                    } else {
                        for notification in &notifications {
                            formatter.println(&describe(notification, &formatter));
                        }
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to list notifications: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
        NotificationCommands::Create(create) => {
            let metadata = build_notification(&create);
            match client
                .create_notification(&bucket, metadata, RequestOptions::new())
                .await
            {
                Ok(created) => {
                    if formatter.is_json() {
                        formatter.json(&created);
                    } else {
                        formatter.success(&format!(
                            "Created notification {} on {}",
                            created.id, create.path
                        ));
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to create notification: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
        NotificationCommands::Rm(remove) => {
            match client
                .delete_notification(&bucket, &remove.id, RequestOptions::new())
                .await
            {
                Ok(()) => {
                    if formatter.is_json() {
                        formatter.json(&serde_json::json!({ "id": remove.id, "removed": true }));
                    } else {
                        formatter.success(&format!("Removed notification {}", remove.id));
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to remove notification: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
    }
}

fn build_notification(args: &CreateArgs) -> NotificationMetadata {
    let mut metadata = NotificationMetadata::new(args.topic.clone(), JSON_API_V1_PAYLOAD);
    for event in &args.events {
        metadata = metadata.with_event_type(event.clone());
    }
    if let Some(prefix) = &args.prefix {
        metadata = metadata.with_object_name_prefix(prefix.clone());
    }
    metadata
}

fn describe(notification: &NotificationMetadata, formatter: &Formatter) -> String {
    let mut line = format!(
        "{}  {}",
        formatter.style_name(&notification.id),
        notification.topic
    );
    if !notification.event_types.is_empty() {
        line.push_str(&format!("  events={}", notification.event_types.join(",")));
    }
    if let Some(prefix) = &notification.object_name_prefix {
        line.push_str(&format!("  prefix={prefix}"));
    }
    line
}
