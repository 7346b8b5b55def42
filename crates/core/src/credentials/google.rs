//! Application Default Credentials and the credential factories
//!
//! Lookup order for [`google_default_credentials`]:
//! 1. the file named by `GOOGLE_APPLICATION_CREDENTIALS`;
//! 2. the gcloud well-known file under `HOME` (`APPDATA` on Windows);
//! 3. the Compute Engine metadata server, when the well-known file is absent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::anonymous::AnonymousCredentials;
use super::authorized_user::{AuthorizedUserCredentials, parse_authorized_user_credentials};
use super::compute_engine::{ComputeEngineCredentials, DEFAULT_METADATA_HOST, GCE_METADATA_HOST_VAR};
use super::http::HttpRequester;
use super::service_account::{ServiceAccountCredentials, parse_service_account_credentials};
use super::Credentials;
use crate::error::{Error, Result};

/// Environment variable naming an explicit credentials file.
pub const GOOGLE_APPLICATION_CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[cfg(windows)]
const ADC_HOME_VAR: &str = "APPDATA";
#[cfg(windows)]
const ADC_WELL_KNOWN_PATH_SUFFIX: &str = "/gcloud/application_default_credentials.json";

#[cfg(not(windows))]
const ADC_HOME_VAR: &str = "HOME";
#[cfg(not(windows))]
const ADC_WELL_KNOWN_PATH_SUFFIX: &str = "/.config/gcloud/application_default_credentials.json";

/// Reads one environment variable. Tests substitute a map lookup.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Path of the Application Default Credentials file, and whether it was
/// named explicitly through `GOOGLE_APPLICATION_CREDENTIALS`.
pub fn google_adc_file_path(env: EnvLookup<'_>) -> Result<(PathBuf, bool)> {
    if let Some(path) = env(GOOGLE_APPLICATION_CREDENTIALS_VAR) {
        return Ok((PathBuf::from(path), true));
    }
    let Some(root) = env(ADC_HOME_VAR) else {
        return Err(Error::Config(format!(
            "The {} environment variable is not set. \
             Cannot determine the default path for service account credentials.",
            ADC_HOME_VAR
        )));
    };
    Ok((PathBuf::from(root + ADC_WELL_KNOWN_PATH_SUFFIX), false))
}

/// Credentials found through the Application Default Credentials lookup.
pub fn google_default_credentials(http: Arc<dyn HttpRequester>) -> Result<Arc<dyn Credentials>> {
    google_default_credentials_with_env(http, &process_env)
}

/// [`google_default_credentials`] with an explicit environment.
pub fn google_default_credentials_with_env(
    http: Arc<dyn HttpRequester>,
    env: EnvLookup<'_>,
) -> Result<Arc<dyn Credentials>> {
    let (path, explicit) = google_adc_file_path(env)?;

    if !explicit && !path.exists() {
        let metadata_host =
            env(GCE_METADATA_HOST_VAR).unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        tracing::debug!(
            path = %path.display(),
            metadata_host = %metadata_host,
            "No application default credentials file, using the metadata server"
        );
        return Ok(Arc::new(
            ComputeEngineCredentials::new(http).with_metadata_host(metadata_host),
        ));
    }

    tracing::debug!(path = %path.display(), "Loading application default credentials");
    let contents = read_credentials_file(&path)?;
    credentials_from_json(&contents, &path.display().to_string(), http)
}

fn read_credentials_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Credentials(format!(
            "Cannot read credentials file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Dispatch on the key file's `type` discriminator.
fn credentials_from_json(
    contents: &str,
    source: &str,
    http: Arc<dyn HttpRequester>,
) -> Result<Arc<dyn Credentials>> {
    let value: serde_json::Value = serde_json::from_str(contents).map_err(|e| {
        Error::Credentials(format!("Invalid credentials file {}: {}", source, e))
    })?;
    let kind = value.get("type").and_then(|v| v.as_str()).unwrap_or("");

    match kind {
        "authorized_user" => {
            let info = parse_authorized_user_credentials(contents, source)?;
            Ok(Arc::new(AuthorizedUserCredentials::new(info, http)))
        }
        "service_account" => {
            let info = parse_service_account_credentials(contents, source)?;
            Ok(Arc::new(ServiceAccountCredentials::new(info, http)?))
        }
        other => Err(Error::Credentials(format!(
            "Unsupported credential type ({}) in {}",
            other, source
        ))),
    }
}

pub fn create_anonymous_credentials() -> Arc<AnonymousCredentials> {
    Arc::new(AnonymousCredentials::new())
}

pub fn create_authorized_user_credentials_from_json_contents(
    contents: &str,
    http: Arc<dyn HttpRequester>,
) -> Result<Arc<AuthorizedUserCredentials>> {
    let info = parse_authorized_user_credentials(contents, "memory")?;
    Ok(Arc::new(AuthorizedUserCredentials::new(info, http)))
}

pub fn create_authorized_user_credentials_from_json_file_path(
    path: impl AsRef<Path>,
    http: Arc<dyn HttpRequester>,
) -> Result<Arc<AuthorizedUserCredentials>> {
    let path = path.as_ref();
    let contents = read_credentials_file(path)?;
    let info = parse_authorized_user_credentials(&contents, &path.display().to_string())?;
    Ok(Arc::new(AuthorizedUserCredentials::new(info, http)))
}

pub fn create_service_account_credentials_from_json_contents(
    contents: &str,
    http: Arc<dyn HttpRequester>,
) -> Result<Arc<ServiceAccountCredentials>> {
    let info = parse_service_account_credentials(contents, "memory")?;
    Ok(Arc::new(ServiceAccountCredentials::new(info, http)?))
}

pub fn create_service_account_credentials_from_json_file_path(
    path: impl AsRef<Path>,
    http: Arc<dyn HttpRequester>,
) -> Result<Arc<ServiceAccountCredentials>> {
    let path = path.as_ref();
    let contents = read_credentials_file(path)?;
    let info = parse_service_account_credentials(&contents, &path.display().to_string())?;
    Ok(Arc::new(ServiceAccountCredentials::new(info, http)?))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;
    use crate::credentials::http::{HttpResponse, MockHttpRequester};

    const AUTHORIZED_USER: &str = r#"{
        "client_id": "test-invalid-test-invalid.apps.googleusercontent.com",
        "client_secret": "invalid-invalid-invalid",
        "refresh_token": "1/test-test-test",
        "type": "authorized_user"
    }"#;

    fn env_from(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn token_http() -> Arc<MockHttpRequester> {
        let mut http = MockHttpRequester::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"access_token":"at","expires_in":3600,"id_token":"it","token_type":"Bearer"}"#,
            ))
        });
        Arc::new(http)
    }

    #[test]
    fn test_override_variable_wins() {
        let env = env_from(&[
            (GOOGLE_APPLICATION_CREDENTIALS_VAR, "/tmp/explicit.json".to_string()),
            (ADC_HOME_VAR, "/home/someone".to_string()),
        ]);
        let (path, explicit) = google_adc_file_path(&env).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.json"));
        assert!(explicit);
    }

    #[test]
    fn test_well_known_path() {
        let env = env_from(&[(ADC_HOME_VAR, "/home/someone".to_string())]);
        let (path, explicit) = google_adc_file_path(&env).unwrap();
        assert_eq!(
            path,
            PathBuf::from(format!("/home/someone{}", ADC_WELL_KNOWN_PATH_SUFFIX))
        );
        assert!(!explicit);
    }

    #[test]
    fn test_missing_home_is_config_error() {
        let env = env_from(&[]);
        let err = google_adc_file_path(&env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ADC_HOME_VAR));
    }

    #[tokio::test]
    async fn test_loads_authorized_user_from_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, AUTHORIZED_USER).unwrap();

        let env = env_from(&[(
            GOOGLE_APPLICATION_CREDENTIALS_VAR,
            path.display().to_string(),
        )]);
        let credentials = google_default_credentials_with_env(token_http(), &env).unwrap();
        assert_eq!(credentials.authorization_header().await.unwrap(), "Bearer at");
    }

    #[test]
    fn test_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, r#"{"type": "external_account"}"#).unwrap();

        let env = env_from(&[(
            GOOGLE_APPLICATION_CREDENTIALS_VAR,
            path.display().to_string(),
        )]);
        let err = google_default_credentials_with_env(token_http(), &env)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unsupported credential type (external_account)"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let env = env_from(&[(
            GOOGLE_APPLICATION_CREDENTIALS_VAR,
            "/definitely/not/here.json".to_string(),
        )]);
        let err = google_default_credentials_with_env(token_http(), &env)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_metadata_server() {
        let home = TempDir::new().unwrap();
        let mut http = MockHttpRequester::new();
        http.expect_execute()
            .withf(|request| request.url.starts_with("http://metadata.test/"))
            .returning(|request| {
                let body = if request.url.ends_with("/token") {
                    r#"{"access_token":"gce","expires_in":3600,"token_type":"Bearer"}"#
                } else {
                    r#"{"email":"sa@project.iam.gserviceaccount.com","scopes":["s"]}"#
                };
                Ok(HttpResponse::new(200, body))
            });

        let env = env_from(&[
            (ADC_HOME_VAR, home.path().display().to_string()),
            (GCE_METADATA_HOST_VAR, "metadata.test".to_string()),
        ]);
        let credentials = google_default_credentials_with_env(Arc::new(http), &env).unwrap();
        assert_eq!(credentials.authorization_header().await.unwrap(), "Bearer gce");
    }

    #[test]
    fn test_factories_from_contents() {
        let credentials =
            create_authorized_user_credentials_from_json_contents(AUTHORIZED_USER, token_http())
                .unwrap();
        assert_eq!(
            credentials.token_uri(),
            crate::credentials::GOOGLE_OAUTH_REFRESH_ENDPOINT
        );

        let err = create_service_account_credentials_from_json_contents("{}", token_http())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Credentials(_)));
    }
}
