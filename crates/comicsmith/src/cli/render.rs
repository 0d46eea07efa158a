//! Render command handler.

use comicsmith::{FailedPanelPolicy, render_manifest};
use std::path::Path;

/// Handles the render command.
pub fn handle_render_command(
    manifest: &Path,
    title: &str,
    out: &Path,
    placeholder_failed: bool,
) -> anyhow::Result<()> {
    let policy = if placeholder_failed {
        FailedPanelPolicy::Placeholder
    } else {
        FailedPanelPolicy::Omit
    };
    let path = render_manifest(manifest, title, out, policy)?;
    println!("Comic written to {}", path.display());
    Ok(())
}
