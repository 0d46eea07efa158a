//! Run command handler.

use super::OutputFormat;
use comicsmith::{FailedPanelPolicy, RunOptions, SynthesisConfig, run_comic};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for a run that finished with failed panels.
const PARTIAL_FAILURE: u8 = 2;

/// Handles the run command.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(script = %script.display()))]
pub async fn handle_run_command(
    script: PathBuf,
    out: PathBuf,
    sequence: Option<u64>,
    dry_run: bool,
    placeholder_failed: bool,
    registry: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let config = if dry_run {
        None
    } else {
        Some(SynthesisConfig::from_env()?)
    };

    let policy = if placeholder_failed {
        FailedPanelPolicy::Placeholder
    } else {
        FailedPanelPolicy::Omit
    };
    let options = RunOptions::builder()
        .script(script)
        .out(out)
        .sequence(sequence)
        .dry_run(dry_run)
        .failed_panels(policy)
        .registry_dir(registry)
        .build()?;

    let outcome = run_comic(&options, config).await?;

    match format {
        OutputFormat::Human => {
            print!("{}", outcome.report());
            println!("Comic written to {}", outcome.document().display());
        }
        OutputFormat::Json => println!("{}", outcome.report().to_json()?),
    }

    if outcome.report().is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(PARTIAL_FAILURE))
    }
}
