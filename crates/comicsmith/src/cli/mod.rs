//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the
//! comicsmith binary.

mod commands;
mod render;
mod run;
mod validate;

pub use commands::{Cli, Commands, OutputFormat};
pub use render::handle_render_command;
pub use run::handle_run_command;
pub use validate::handle_validate_command;
