//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generate comic panels with an image model and assemble them into an HTML
/// gallery.
#[derive(Parser, Debug)]
#[command(name = "comicsmith")]
#[command(version, about)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Human,
    /// JSON document
    Json,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize every panel of a comic script and write the document
    Run {
        /// Comic script (TOML)
        script: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Run sequence for artifact names (defaults to the current Unix time)
        #[arg(long)]
        sequence: Option<u64>,

        /// Use placeholder images instead of calling the model
        #[arg(long)]
        dry_run: bool,

        /// Show failed panels with a placeholder image instead of omitting them
        #[arg(long)]
        placeholder_failed: bool,

        /// Durable registry directory (defaults to <out>/registry)
        #[arg(long, env = "COMICSMITH_REGISTRY_DIR")]
        registry: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },

    /// Render a document from a manifest of {description, image} entries
    Render {
        /// Manifest (JSON array)
        manifest: PathBuf,

        /// Document title
        #[arg(short, long, default_value = "Comic")]
        title: String,

        /// Output directory; image paths resolve against it
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Show panels with missing images as placeholders instead of failing
        #[arg(long)]
        placeholder_failed: bool,
    },

    /// Check a comic script without synthesizing anything
    Validate {
        /// Comic script (TOML)
        script: PathBuf,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
}
