//! The `comicsmith` binary.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run {
            script,
            out,
            sequence,
            dry_run,
            placeholder_failed,
            registry,
            format,
        } => {
            cli::handle_run_command(
                script,
                out,
                sequence,
                dry_run,
                placeholder_failed,
                registry,
                format,
            )
            .await
        }
        Commands::Render {
            manifest,
            title,
            out,
            placeholder_failed,
        } => {
            cli::handle_render_command(&manifest, &title, &out, placeholder_failed)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { script, format } => cli::handle_validate_command(&script, format),
    }
}
