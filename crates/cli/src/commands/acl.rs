//! acl command - Manage access control lists
//!
//! Works on bucket ACLs (`gs://bucket`), object ACLs (`gs://bucket/object`)
//! and, with `--default`, the default object ACL of a bucket.

use clap::{Args, Subcommand};
use gcs_core::resources::{BucketAccessControl, ObjectAccessControl};
use gcs_core::{Client, RequestOptions};
use serde::Serialize;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Manage access control lists
#[derive(Args, Debug)]
pub struct AclArgs {
    #[command(subcommand)]
    pub command: AclCommands,
}

#[derive(Subcommand, Debug)]
pub enum AclCommands {
    /// List ACL entries
    Ls(AclTargetArgs),

    /// Grant a role to an entity, replacing any existing grant
    Set(AclSetArgs),

    /// Remove the entry of an entity
    Rm(AclRemoveArgs),
}

#[derive(Args, Debug)]
pub struct AclTargetArgs {
    /// gs://bucket or gs://bucket/object
    pub path: String,

    /// Use the bucket's default object ACL
    #[arg(short, long)]
    pub default: bool,
}

#[derive(Args, Debug)]
pub struct AclSetArgs {
    #[command(flatten)]
    pub target: AclTargetArgs,

    /// Entity, e.g. allUsers, user-jane@example.com, project-owners-123
    pub entity: String,

    /// Role: READER, WRITER or OWNER
    pub role: String,
}

#[derive(Args, Debug)]
pub struct AclRemoveArgs {
    #[command(flatten)]
    pub target: AclTargetArgs,

    pub entity: String,
}

/// ACL entry as printed, for all three kinds of lists
#[derive(Debug, Serialize, PartialEq, Eq)]
struct AclEntry {
    entity: String,
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl From<BucketAccessControl> for AclEntry {
    fn from(acl: BucketAccessControl) -> Self {
        Self {
            entity: acl.entity,
            role: acl.role,
            email: acl.email,
        }
    }
}

impl From<ObjectAccessControl> for AclEntry {
    fn from(acl: ObjectAccessControl) -> Self {
        Self {
            entity: acl.entity,
            role: acl.role,
            email: acl.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Bucket(String),
    DefaultObject(String),
    Object(String, String),
}

impl Target {
    fn parse(args: &AclTargetArgs) -> Result<Self, String> {
        let path = GsPath::parse(&args.path)?;
        match (path.object, args.default) {
            (None, false) => Ok(Self::Bucket(path.bucket)),
            (None, true) => Ok(Self::DefaultObject(path.bucket)),
            (Some(object), false) => Ok(Self::Object(path.bucket, object)),
            (Some(_), true) => Err("--default applies to buckets, not objects".to_string()),
        }
    }
}

fn validate_role(role: &str) -> Result<String, String> {
    let role = role.to_uppercase();
    match role.as_str() {
        "READER" | "WRITER" | "OWNER" => Ok(role),
        _ => Err(format!(
            "Invalid role: '{role}' (expected READER, WRITER or OWNER)"
        )),
    }
}

/// Execute the acl command
pub async fn execute(args: AclArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let (target_args, action) = match &args.command {
        AclCommands::Ls(target) => (target, Action::List),
        AclCommands::Set(set) => match validate_role(&set.role) {
            Ok(role) => (&set.target, Action::Set(set.entity.clone(), role)),
            Err(e) => {
                formatter.error(&e);
                return ExitCode::UsageError;
            }
        },
        AclCommands::Rm(remove) => (&remove.target, Action::Remove(remove.entity.clone())),
    };
    let target = match Target::parse(target_args) {
        Ok(target) => target,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match action {
        Action::List => match list(&client, &target).await {
            Ok(entries) => {
                if formatter.is_json() {
                    formatter.json(&entries);
                } else if entries.is_empty() {
                    formatter.println("No ACL entries.");
                } else {
                    let width = entries.iter().map(|e| e.role.len()).max().unwrap_or(0);
                    for entry in &entries {
                        formatter.println(&format!(
                            "{:<width$}  {}",
                            entry.role,
                            formatter.style_name(&entry.entity)
                        ));
                    }
                }
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to list ACL of {}: {e}", target_args.path));
                ExitCode::from_error(&e)
            }
        },
        Action::Set(entity, role) => match set(&client, &target, &entity, &role).await {
            Ok(entry) => {
                if formatter.is_json() {
                    formatter.json(&entry);
                } else {
                    formatter.success(&format!(
                        "Granted {} to {} on {}",
                        entry.role, entry.entity, target_args.path
                    ));
                }
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to update ACL of {}: {e}", target_args.path));
                ExitCode::from_error(&e)
            }
        },
        Action::Remove(entity) => match remove(&client, &target, &entity).await {
            Ok(()) => {
                if formatter.is_json() {
                    formatter.json(&serde_json::json!({ "entity": entity, "removed": true }));
                } else {
                    formatter.success(&format!("Removed {entity} from {}", target_args.path));
                }
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to update ACL of {}: {e}", target_args.path));
                ExitCode::from_error(&e)
            }
        },
    }
}

enum Action {
    List,
    Set(String, String),
    Remove(String),
}

async fn list(client: &Client, target: &Target) -> gcs_core::Result<Vec<AclEntry>> {
    let options = RequestOptions::new();
    Ok(match target {
        Target::Bucket(bucket) => into_entries(client.list_bucket_acl(bucket, options).await?),
        Target::DefaultObject(bucket) => {
            into_entries(client.list_default_object_acl(bucket, options).await?)
        }
        Target::Object(bucket, object) => {
            into_entries(client.list_object_acl(bucket, object, options).await?)
        }
    })
}

/// Create the entry, or update it when the entity already has one.
async fn set(client: &Client, target: &Target, entity: &str, role: &str) -> gcs_core::Result<AclEntry> {
    let options = RequestOptions::new();
    let created = match target {
        Target::Bucket(bucket) => client
            .create_bucket_acl(bucket, entity, role, options.clone())
            .await
            .map(AclEntry::from),
        Target::DefaultObject(bucket) => client
            .create_default_object_acl(bucket, entity, role, options.clone())
            .await
            .map(AclEntry::from),
        Target::Object(bucket, object) => client
            .create_object_acl(bucket, object, entity, role, options.clone())
            .await
            .map(AclEntry::from),
    };
    match created {
        Err(e) if e.status().is_some_and(|s| s.code() == 409) => {}
        other => return other,
    }

    tracing::debug!(entity, "ACL entry exists, updating it");
    Ok(match target {
        Target::Bucket(bucket) => client
            .update_bucket_acl(bucket, entity, role, options)
            .await?
            .into(),
        Target::DefaultObject(bucket) => client
            .update_default_object_acl(bucket, entity, role, options)
            .await?
            .into(),
        Target::Object(bucket, object) => client
            .update_object_acl(bucket, object, entity, role, options)
            .await?
            .into(),
    })
}

async fn remove(client: &Client, target: &Target, entity: &str) -> gcs_core::Result<()> {
    let options = RequestOptions::new();
    match target {
        Target::Bucket(bucket) => client.delete_bucket_acl(bucket, entity, options).await,
        Target::DefaultObject(bucket) => {
            client
                .delete_default_object_acl(bucket, entity, options)
                .await
        }
        Target::Object(bucket, object) => {
            client
                .delete_object_acl(bucket, object, entity, options)
                .await
        }
    }
}

fn into_entries<T: Into<AclEntry>>(items: Vec<T>) -> Vec<AclEntry> {
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str, default: bool) -> AclTargetArgs {
        AclTargetArgs {
            path: path.to_string(),
            default,
        }
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            Target::parse(&target("gs://bkt", false)).unwrap(),
            Target::Bucket("bkt".into())
        );
        assert_eq!(
            Target::parse(&target("gs://bkt", true)).unwrap(),
            Target::DefaultObject("bkt".into())
        );
        assert_eq!(
            Target::parse(&target("gs://bkt/a/b", false)).unwrap(),
            Target::Object("bkt".into(), "a/b".into())
        );
        assert!(Target::parse(&target("gs://bkt/a", true)).is_err());
    }

    #[test]
    fn test_validate_role() {
        assert_eq!(validate_role("reader").unwrap(), "READER");
        assert_eq!(validate_role("OWNER").unwrap(), "OWNER");
        assert!(validate_role("admin").is_err());
    }

    #[test]
    fn test_entries_from_resources() {
        let mut bucket_acl = BucketAccessControl::new("user-a@example.com", "OWNER");
        bucket_acl.email = Some("a@example.com".into());
        let entries = into_entries(vec![bucket_acl]);
        assert_eq!(
            entries,
            vec![AclEntry {
                entity: "user-a@example.com".into(),
                role: "OWNER".into(),
                email: Some("a@example.com".into()),
            }]
        );

        let entries = into_entries(vec![ObjectAccessControl::new("allUsers", "READER")]);
        assert_eq!(entries[0].entity, "allUsers");
        assert_eq!(entries[0].email, None);
    }

    #[tokio::test]
    async fn test_execute_invalid_role_returns_usage_error() {
        let args = AclArgs {
            command: AclCommands::Set(AclSetArgs {
                target: target("gs://bkt", false),
                entity: "allUsers".into(),
                role: "superuser".into(),
            }),
        };
        assert_eq!(
            execute(args, GlobalOptions::default()).await,
            ExitCode::UsageError
        );
    }
}
