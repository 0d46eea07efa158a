//! Single-page HTML gallery rendering.

use crate::escape::{encode_path, escape_html};
use comicsmith_core::{Comic, PLACEHOLDER_PNG, PanelRecord};
use comicsmith_error::RenderError;
use comicsmith_storage::{OutputLayout, write_atomic_blocking};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

const STYLE: &str = concat!(
    "        body { font-family: sans-serif; background-color: #1a1a1a; color: #f0f0f0; margin: 0; }\n",
    "        .container { max-width: 800px; margin: 20px auto; padding: 0 15px; }\n",
    "        h1 { text-align: center; color: #ffc107; }\n",
    "        .panel { margin-bottom: 30px; border: 2px solid #333; border-radius: 8px; overflow: hidden; background-color: #2b2b2b; }\n",
    "        .panel img { display: block; width: 100%; height: auto; }\n",
    "        .panel .description { padding: 15px; font-size: 1.1em; line-height: 1.5; }\n",
    "        .panel.failed img { opacity: 0.4; }\n",
    "        .panel.failed .description { color: #ff8a80; }\n",
);

/// What to do with panels that failed.
///
/// Either way the surviving panels keep the position their descriptions
/// give them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailedPanelPolicy {
    /// Leave failed panels out of the document
    #[default]
    Omit,
    /// Show failed panels with a placeholder image
    Placeholder,
}

/// Renders a comic as one self-contained HTML document.
///
/// Rendering is pure and deterministic: the same panels always produce the
/// same bytes, in ordinal order regardless of input order.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    policy: FailedPanelPolicy,
}

impl DocumentAssembler {
    /// Creates an assembler with the given failed-panel policy.
    pub fn new(policy: FailedPanelPolicy) -> Self {
        Self { policy }
    }

    /// The failed-panel policy.
    pub fn policy(&self) -> FailedPanelPolicy {
        self.policy
    }

    /// Build the comic from successful panels and the captions of failed ones.
    ///
    /// Under [`FailedPanelPolicy::Placeholder`] each failed caption becomes a
    /// panel pointing at `placeholder_path`.
    pub fn assemble(
        &self,
        title: &str,
        mut panels: Vec<PanelRecord>,
        failed: &[String],
        placeholder_path: &str,
    ) -> Comic {
        if self.policy == FailedPanelPolicy::Placeholder {
            panels.extend(
                failed
                    .iter()
                    .map(|description| PanelRecord::placeholder(description.clone(), placeholder_path)),
            );
        }
        Comic::new(title, panels)
    }

    /// Split records into those whose image exists under `layout` and the
    /// captions of those that must be shown as failed.
    ///
    /// Records already marked as placeholders are treated as failed. A record
    /// with an empty image path or a missing file is an error under
    /// [`FailedPanelPolicy::Omit`], and a failed caption under
    /// [`FailedPanelPolicy::Placeholder`].
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unusable image under `Omit`.
    #[instrument(skip(self, layout, records), fields(root = %layout.root().display(), records = records.len()))]
    pub fn check_images(
        &self,
        layout: &OutputLayout,
        records: Vec<PanelRecord>,
    ) -> Result<(Vec<PanelRecord>, Vec<String>), RenderError> {
        let mut present = Vec::with_capacity(records.len());
        let mut failed = Vec::new();

        for record in records {
            if record.is_placeholder() {
                failed.push(record.description().clone());
                continue;
            }

            let path = record.image_ref().relative_path();
            let problem = if path.trim().is_empty() {
                Some("has no image".to_string())
            } else if !layout.resolve(path).is_file() {
                Some(format!(
                    "references missing image {}",
                    layout.resolve(path).display()
                ))
            } else {
                None
            };

            match (problem, self.policy) {
                (None, _) => present.push(record),
                (Some(problem), FailedPanelPolicy::Omit) => {
                    return Err(RenderError::new(format!(
                        "Panel '{}' {}",
                        record.description(),
                        problem
                    )));
                }
                (Some(problem), FailedPanelPolicy::Placeholder) => {
                    warn!(description = %record.description(), problem = %problem, "Showing placeholder");
                    failed.push(record.description().clone());
                }
            }
        }
        Ok((present, failed))
    }

    /// Render panels in display order.
    ///
    /// # Examples
    ///
    /// ```
    /// use comicsmith_core::PanelRecord;
    /// use comicsmith_render::DocumentAssembler;
    ///
    /// let html = DocumentAssembler::default().render(
    ///     "Tiny",
    ///     vec![
    ///         PanelRecord::new("Panel 2: second", "images/b.png"),
    ///         PanelRecord::new("Panel 1: first", "images/a.png"),
    ///     ],
    /// );
    /// assert!(html.find("images/a.png").unwrap() < html.find("images/b.png").unwrap());
    /// ```
    pub fn render(&self, title: &str, panels: Vec<PanelRecord>) -> String {
        self.render_comic(&Comic::new(title, panels))
    }

    /// Render an already ordered comic.
    pub fn render_comic(&self, comic: &Comic) -> String {
        let title = escape_html(comic.title());
        let mut html = String::new();

        // Writing to a String cannot fail.
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
             <title>{title}</title>\n    <style>\n{STYLE}    </style>\n</head>\n<body>\n    \
             <div class=\"container\">\n        <h1>{title}</h1>\n"
        );

        for panel in comic.panels() {
            let description = escape_html(panel.description());
            let src = escape_html(&encode_path(panel.image_ref().relative_path()));
            let class = if panel.is_placeholder() {
                "panel failed"
            } else {
                "panel"
            };
            let _ = write!(
                html,
                "        <div class=\"{class}\">\n            \
                 <img src=\"{src}\" alt=\"{description}\">\n            \
                 <div class=\"description\">{description}</div>\n        </div>\n"
            );
        }

        html.push_str("    </div>\n</body>\n</html>\n");
        debug!(panels = comic.panels().len(), bytes = html.len(), "Rendered document");
        html
    }

    /// Render and write the document to `layout`'s document path.
    ///
    /// Writes the placeholder image first when the policy needs it. The
    /// document replaces any previous one atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    #[instrument(skip(self, layout, comic), fields(title = %comic.title(), panels = comic.panels().len()))]
    pub fn write(&self, layout: &OutputLayout, comic: &Comic) -> Result<PathBuf, RenderError> {
        if self.policy == FailedPanelPolicy::Placeholder {
            let placeholder = layout.resolve(layout.placeholder_relative_path());
            write_atomic_blocking(&placeholder, PLACEHOLDER_PNG).map_err(|e| {
                RenderError::new(format!(
                    "Failed to write placeholder {}: {}",
                    placeholder.display(),
                    e
                ))
            })?;
        }

        let path = layout.document_path();
        let html = self.render_comic(comic);
        write_atomic_blocking(&path, html.as_bytes())
            .map_err(|e| RenderError::new(format!("Failed to write {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Wrote comic document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        let assembler = DocumentAssembler::default();
        let panels = vec![
            PanelRecord::new("Panel 1: a", "images/a.png"),
            PanelRecord::new("Panel 2: b", "images/b.png"),
        ];
        assert_eq!(
            assembler.render("T", panels.clone()),
            assembler.render("T", panels)
        );
    }

    #[test]
    fn test_placeholder_policy_keeps_failed_slot() {
        let assembler = DocumentAssembler::new(FailedPanelPolicy::Placeholder);
        let comic = assembler.assemble(
            "T",
            vec![
                PanelRecord::new("Panel 3: c", "images/c.png"),
                PanelRecord::new("Panel 1: a", "images/a.png"),
            ],
            &["Panel 2: b".to_string()],
            "images/placeholder.png",
        );
        let paths: Vec<&str> = comic
            .panels()
            .iter()
            .map(|p| p.image_ref().relative_path())
            .collect();
        assert_eq!(
            paths,
            vec!["images/a.png", "images/placeholder.png", "images/c.png"]
        );
        assert!(assembler.render_comic(&comic).contains("class=\"panel failed\""));
    }

    #[test]
    fn test_only_flagged_records_are_styled_as_failed() {
        let assembler = DocumentAssembler::default();
        let html = assembler.render(
            "T",
            vec![PanelRecord::new("Panel 1: a", "art/placeholder.png")],
        );
        assert!(html.contains("class=\"panel\""));
        assert!(!html.contains("panel failed"));
    }

    #[test]
    fn test_omit_policy_drops_failed() {
        let comic = DocumentAssembler::new(FailedPanelPolicy::Omit).assemble(
            "T",
            vec![PanelRecord::new("Panel 1: a", "images/a.png")],
            &["Panel 2: b".to_string()],
            "images/placeholder.png",
        );
        assert_eq!(comic.panels().len(), 1);
    }

    #[test]
    fn test_policy_parses_from_name() {
        assert_eq!(
            "placeholder".parse::<FailedPanelPolicy>().unwrap(),
            FailedPanelPolicy::Placeholder
        );
    }
}
