//! HTML gallery rendering for Comicsmith.
//!
//! [`DocumentAssembler`] turns ordered panel records into a single dark-themed
//! HTML page. All caption text is HTML-escaped and image paths are
//! percent-encoded, so arbitrary descriptions cannot break the markup.

mod assembler;
mod escape;
mod manifest;

pub use assembler::{DocumentAssembler, FailedPanelPolicy};
pub use escape::{encode_path, escape_html};
pub use manifest::{MANIFEST_FILE, ManifestEntry, read_manifest, write_manifest};
