//! cat command - Write object contents to stdout

use clap::Args;
use gcs_core::RequestOptions;
use tokio::io::AsyncWriteExt;

use super::{GlobalOptions, GsPath, setup_client};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Write object contents to stdout
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object to print (gs://bucket/object)
    pub path: String,

    /// Only print bytes BEGIN-END (end exclusive), e.g. 0-1024 or 512-
    #[arg(short, long, value_name = "BEGIN-END")]
    pub range: Option<String>,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, global: GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(global.output.clone());

    let (bucket, object) = match GsPath::parse_object(&args.path) {
        Ok(parts) => parts,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let range = match args.range.as_deref().map(parse_range).transpose() {
        Ok(range) => range,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match setup_client(&global, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = match range {
        Some((begin, end)) => {
            client
                .read_object_range(&bucket, &object, begin, end, RequestOptions::new())
                .await
        }
        None => {
            client
                .read_object(&bucket, &object, RequestOptions::new())
                .await
        }
    };
    let mut stream = match result {
        Ok(stream) => stream,
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", args.path));
            return ExitCode::from_error(&e);
        }
    };

    let mut stdout = tokio::io::stdout();
    loop {
        match stream.next_chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = stdout.write_all(&chunk).await {
                    formatter.error(&format!("Failed to write output: {e}"));
                    return ExitCode::GeneralError;
                }
            }
            Ok(None) => break,
            Err(e) => {
                formatter.error(&format!("Failed to read {}: {e}", args.path));
                return ExitCode::from_error(&e);
            }
        }
    }
    if let Err(e) = stdout.flush().await {
        formatter.error(&format!("Failed to write output: {e}"));
        return ExitCode::GeneralError;
    }
    ExitCode::Success
}

/// Parse `BEGIN-END` or `BEGIN-` into a half-open byte range.
fn parse_range(value: &str) -> Result<(u64, u64), String> {
    let (begin, end) = value
        .split_once('-')
        .ok_or_else(|| format!("Invalid range: '{value}' (expected BEGIN-END)"))?;
    let begin: u64 = begin
        .trim()
        .parse()
        .map_err(|_| format!("Invalid range start: '{begin}'"))?;
    let end = match end.trim() {
        "" => u64::MAX,
        end => end
            .parse()
            .map_err(|_| format!("Invalid range end: '{end}'"))?,
    };
    if end <= begin {
        return Err(format!("Empty range: '{value}'"));
    }
    Ok((begin, end))
}
