//! Validate command handler.

use super::OutputFormat;
use comicsmith::ComicScript;
use std::path::Path;
use std::process::ExitCode;

/// Handles the validate command.
///
/// Prints the outcome and returns exit code 1 for an invalid script.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn handle_validate_command(path: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let result = ComicScript::from_file(path);

    match (&result, format) {
        (Ok(script), OutputFormat::Human) => {
            let chained = script
                .panels()
                .iter()
                .filter(|p| p.edit_from().is_some() || p.base_image().is_some())
                .count();
            println!(
                "✓ {} is valid: \"{}\", {} panels ({} edits)",
                path.display(),
                script.title(),
                script.panels().len(),
                chained
            );
        }
        (Err(e), OutputFormat::Human) => eprintln!("✗ {}: {}", path.display(), e.kind),
        (Ok(script), OutputFormat::Json) => println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "valid": true,
                "title": script.title(),
                "panels": script.panels().len(),
            })
        ),
        (Err(e), OutputFormat::Json) => println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "valid": false,
                "error": e.kind.to_string(),
            })
        ),
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
