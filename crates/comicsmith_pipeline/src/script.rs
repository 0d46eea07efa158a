//! Comic scripts: the TOML input describing a comic's panels.

use comicsmith_core::{PanelRequest, PriorImage};
use comicsmith_error::{ScriptError, ScriptErrorKind};
use comicsmith_storage::collision_key;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Document-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ComicMeta {
    /// Document title
    title: String,
}

/// One `[[panels]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PanelSpec {
    /// Panel name, unique within the script
    name: String,
    /// Caption; its leading number decides display order
    #[serde(default)]
    description: Option<String>,
    /// Prompt sent to the synthesizer
    prompt: String,
    /// Panel in this script whose output this panel edits
    #[serde(default)]
    edit_from: Option<String>,
    /// Existing image file this panel edits
    #[serde(default)]
    base_image: Option<PathBuf>,
}

/// A parsed comic script.
///
/// ```toml
/// [comic]
/// title = "The Heist"
///
/// [[panels]]
/// name = "panel_1"
/// description = "Panel 1: The crew meets"
/// prompt = "Four thieves around a table, noir style"
///
/// [[panels]]
/// name = "panel_2"
/// description = "Panel 2: They sneak in"
/// prompt = "Same crew, now climbing a fence at night"
/// edit_from = "panel_1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ComicScript {
    /// Document settings
    comic: ComicMeta,
    /// Panels in script order
    #[serde(default)]
    panels: Vec<PanelSpec>,
}

impl ComicScript {
    /// Load and validate a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ScriptError::new(ScriptErrorKind::FileRead(e.to_string())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a script from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the script is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        let script: ComicScript = toml::from_str(content)
            .map_err(|e| ScriptError::new(ScriptErrorKind::TomlParse(e.to_string())))?;
        script.validate()?;
        debug!(
            title = %script.comic.title,
            panels = script.panels.len(),
            "Loaded comic script"
        );
        Ok(script)
    }

    /// Document title.
    pub fn title(&self) -> &str {
        &self.comic.title
    }

    /// Check the script before any synthesis happens.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: no panels, an empty or duplicate
    /// name, an empty prompt, conflicting edit sources, an unknown
    /// `edit_from` target, or a cycle of edits.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.panels.is_empty() {
            return Err(ScriptError::new(ScriptErrorKind::NoPanels));
        }

        let mut seen = HashSet::new();
        let mut artifact_keys: HashMap<String, &str> = HashMap::new();
        for panel in &self.panels {
            if panel.name.trim().is_empty() {
                return Err(ScriptError::new(ScriptErrorKind::EmptyName));
            }
            if !seen.insert(panel.name.as_str()) {
                return Err(ScriptError::new(ScriptErrorKind::DuplicatePanel(
                    panel.name.clone(),
                )));
            }
            if panel.prompt.trim().is_empty() {
                return Err(ScriptError::new(ScriptErrorKind::EmptyPrompt(
                    panel.name.clone(),
                )));
            }
            if panel.edit_from.is_some() && panel.base_image.is_some() {
                return Err(ScriptError::new(ScriptErrorKind::ConflictingSource(
                    panel.name.clone(),
                )));
            }
            if let Some(key) = collision_key(&panel.name)
                && let Some(first) = artifact_keys.insert(key, panel.name.as_str())
            {
                return Err(ScriptError::new(ScriptErrorKind::ArtifactNameCollision {
                    first: first.to_string(),
                    second: panel.name.clone(),
                }));
            }
        }

        for panel in &self.panels {
            if let Some(ancestor) = &panel.edit_from
                && !seen.contains(ancestor.as_str())
            {
                return Err(ScriptError::new(ScriptErrorKind::UnknownAncestor {
                    panel: panel.name.clone(),
                    ancestor: ancestor.clone(),
                }));
            }
        }

        self.check_edit_cycles()
    }

    fn check_edit_cycles(&self) -> Result<(), ScriptError> {
        let mut graph = DiGraph::<String, ()>::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .panels
            .iter()
            .map(|panel| (panel.name.as_str(), graph.add_node(panel.name.clone())))
            .collect();

        for panel in &self.panels {
            if let Some(ancestor) = &panel.edit_from
                && let (Some(&from), Some(&to)) =
                    (nodes.get(ancestor.as_str()), nodes.get(panel.name.as_str()))
            {
                graph.add_edge(from, to, ());
            }
        }

        for scc in kosaraju_scc(&graph) {
            let self_loop = scc.len() == 1 && graph.neighbors(scc[0]).any(|n| n == scc[0]);
            if scc.len() > 1 || self_loop {
                let mut names: Vec<String> = scc.iter().map(|&idx| graph[idx].clone()).collect();
                names.sort();
                return Err(ScriptError::new(ScriptErrorKind::CircularChain(names)));
            }
        }
        Ok(())
    }

    /// Convert the panels into pipeline requests, in script order.
    ///
    /// # Errors
    ///
    /// Returns an error if a panel cannot be turned into a request.
    pub fn to_requests(&self) -> Result<Vec<PanelRequest>, ScriptError> {
        self.panels
            .iter()
            .map(|panel| {
                let mut builder = PanelRequest::builder();
                builder
                    .name(panel.name.clone())
                    .prompt(panel.prompt.clone())
                    .description(panel.description.clone().unwrap_or_default());
                if let Some(ancestor) = &panel.edit_from {
                    builder.prior(PriorImage::Panel(ancestor.clone()));
                } else if let Some(path) = &panel.base_image {
                    builder.prior(PriorImage::File(path.clone()));
                }
                builder
                    .build()
                    .map_err(|_| ScriptError::new(ScriptErrorKind::EmptyName))
            })
            .collect()
    }
}
