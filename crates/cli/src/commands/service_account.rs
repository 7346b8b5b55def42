//! service-account command - Show the project's Cloud Storage service account

use clap::Args;
use gcs_core::RequestOptions;

use super::{GlobalOptions, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Show the project's Cloud Storage service account
#[derive(Args, Debug)]
pub struct ServiceAccountArgs {
    /// Project to query; defaults to --project or the configured project
    pub project: Option<String>,
}

/// Execute the service-account command
pub async fn execute(args: ServiceAccountArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = match &args.project {
        Some(project) => {
            client
                .get_service_account_for_project(project, RequestOptions::new())
                .await
        }
        None => client.get_service_account(RequestOptions::new()).await,
    };

    match result {
        Ok(account) => {
            if formatter.is_json() {
                formatter.json(&account);
            } else {
                formatter.println(&formatter.style_name(&account.email_address));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to get service account: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
