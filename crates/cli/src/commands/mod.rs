//! Command implementations
//!
//! Each command parses its arguments, builds a client through
//! [`setup_client`] and reports failures as an [`ExitCode`].

use clap::Subcommand;
use gcs_core::{Client, ConfigManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod acl;
pub mod cat;
pub mod cp;
pub mod ls;
pub mod mb;
pub mod notification;
pub mod put;
pub mod rb;
pub mod rm;
pub mod service_account;
pub mod stat;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets, or objects under a gs:// path
    Ls(ls::LsArgs),

    /// Make a bucket
    Mb(mb::MbArgs),

    /// Remove an empty bucket
    Rb(rb::RbArgs),

    /// Show bucket or object metadata
    Stat(stat::StatArgs),

    /// Write object contents to stdout
    Cat(cat::CatArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Copy between local files and objects, or between objects
    Cp(cp::CpArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Inspect access control lists
    Acl(acl::AclArgs),

    /// Show the project's Cloud Storage service account
    ServiceAccount(service_account::ServiceAccountArgs),

    /// Inspect bucket notifications
    Notification(notification::NotificationArgs),
}

/// Options that apply to every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub output: OutputConfig,
    pub project: Option<String>,
    pub endpoint: Option<String>,
}

pub async fn execute(command: Commands, global: GlobalOptions) -> ExitCode {
    match command {
        Commands::Ls(args) => ls::execute(args, global).await,
        Commands::Mb(args) => mb::execute(args, global).await,
        Commands::Rb(args) => rb::execute(args, global).await,
        Commands::Stat(args) => stat::execute(args, global).await,
        Commands::Cat(args) => cat::execute(args, global).await,
        Commands::Put(args) => put::execute(args, global).await,
        Commands::Cp(args) => cp::execute(args, global).await,
        Commands::Rm(args) => rm::execute(args, global).await,
        Commands::Acl(args) => acl::execute(args, global).await,
        Commands::ServiceAccount(args) => service_account::execute(args, global).await,
        Commands::Notification(args) => notification::execute(args, global).await,
    }
}

/// Build a client from the config file, the environment and the command
/// line, in increasing order of precedence.
pub fn setup_client(global: &GlobalOptions, formatter: &Formatter) -> Result<Client, ExitCode> {
    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load config: {e}"));
            return Err(ExitCode::UsageError);
        }
    };

    let mut options = match gcs_http::default_client_options() {
        Ok(options) => options,
        Err(e) => {
            formatter.error(&format!("Failed to load credentials: {e}"));
            return Err(ExitCode::AuthError);
        }
    };
    if let Some(project) = global.project.as_ref().or(config.project.as_ref()) {
        options = options.with_project_id(project.clone());
    }
    if let Some(endpoint) = global.endpoint.as_ref().or(config.endpoint.as_ref()) {
        options = options.with_endpoint(endpoint.clone());
    }

    gcs_http::create_client_with_retry_config(options, &config.retry).map_err(|e| {
        formatter.error(&format!("Failed to create client: {e}"));
        ExitCode::from_error(&e)
    })
}

/// A `gs://bucket[/object]` location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsPath {
    pub bucket: String,
    /// Object name or prefix; `None` for the bucket itself
    pub object: Option<String>,
}

impl GsPath {
    pub const SCHEME: &'static str = "gs://";

    pub fn is_remote(path: &str) -> bool {
        path.starts_with(Self::SCHEME)
    }

    pub fn parse(path: &str) -> Result<Self, String> {
        let rest = path
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| format!("Expected a gs://bucket[/object] path, got '{path}'"))?;
        let (bucket, object) = match rest.split_once('/') {
            Some((bucket, object)) => (bucket, (!object.is_empty()).then(|| object.to_string())),
            None => (rest, None),
        };
        if bucket.is_empty() {
            return Err(format!("Bucket name is empty in '{path}'"));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            object,
        })
    }

    /// Parse a path that must name an object.
    pub fn parse_object(path: &str) -> Result<(String, String), String> {
        let parsed = Self::parse(path)?;
        match parsed.object {
            Some(object) => Ok((parsed.bucket, object)),
            None => Err(format!("'{path}' names a bucket, expected gs://bucket/object")),
        }
    }

    /// Parse a path that must name a bucket only.
    pub fn parse_bucket(path: &str) -> Result<String, String> {
        let parsed = Self::parse(path)?;
        match parsed.object {
            None => Ok(parsed.bucket),
            Some(_) => Err(format!("'{path}' names an object, expected gs://bucket")),
        }
    }
}

impl std::fmt::Display for GsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.object {
            Some(object) => write!(f, "{}{}/{}", Self::SCHEME, self.bucket, object),
            None => write!(f, "{}{}", Self::SCHEME, self.bucket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_and_object() {
        let path = GsPath::parse("gs://my-bucket/dir/file.txt").unwrap();
        assert_eq!(path.bucket, "my-bucket");
        assert_eq!(path.object.as_deref(), Some("dir/file.txt"));
        assert_eq!(path.to_string(), "gs://my-bucket/dir/file.txt");
    }

    #[test]
    fn test_parse_bucket_only() {
        for input in ["gs://my-bucket", "gs://my-bucket/"] {
            let path = GsPath::parse(input).unwrap();
            assert_eq!(path.bucket, "my-bucket");
            assert_eq!(path.object, None);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(GsPath::parse("my-bucket/file").is_err());
        assert!(GsPath::parse("gs://").is_err());
        assert!(GsPath::parse("gs:///object").is_err());
        assert!(GsPath::parse_object("gs://bkt").is_err());
        assert!(GsPath::parse_bucket("gs://bkt/obj").is_err());
    }

    #[test]
    fn test_is_remote() {
        assert!(GsPath::is_remote("gs://bkt"));
        assert!(!GsPath::is_remote("./local.txt"));
    }
}
