//! Recovering display order from panel descriptions.

use crate::{Ordinal, PanelRecord};
use regex::Regex;
use std::sync::LazyLock;

/// Ordinal assigned to panels whose position cannot be parsed.
pub const SENTINEL_ORDINAL: u64 = 999;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Derives a panel's display ordinal from its description.
///
/// The rule is deliberately lenient: the first run of ASCII digits before the
/// first colon is the ordinal (`"Panel 3: hero arrives"` → 3). A description
/// with no colon, no digits in that prefix, or a number too large to
/// represent resolves to [`SENTINEL_ORDINAL`] and is logged as a fallback. It
/// never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelOrderResolver;

impl PanelOrderResolver {
    /// Returns the ordinal for a description, or the sentinel.
    ///
    /// # Examples
    ///
    /// ```
    /// use comicsmith_core::{PanelOrderResolver, SENTINEL_ORDINAL};
    ///
    /// assert_eq!(PanelOrderResolver::resolve("Panel 12: the chase"), 12);
    /// assert_eq!(PanelOrderResolver::resolve("Epilogue: dawn"), SENTINEL_ORDINAL);
    /// assert_eq!(PanelOrderResolver::resolve("Panel 4 without colon"), SENTINEL_ORDINAL);
    /// ```
    pub fn resolve(description: &str) -> u64 {
        match Self::classify(description) {
            Ordinal::Parsed(value) => value,
            _ => SENTINEL_ORDINAL,
        }
    }

    /// Returns the ordinal together with whether it was parsed or fell back.
    pub fn classify(description: &str) -> Ordinal {
        let Some((prefix, _)) = description.split_once(':') else {
            tracing::warn!(description, "No colon in panel description; ordering panel last");
            return Ordinal::Fallback;
        };

        match DIGITS
            .find(prefix)
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            Some(value) => Ordinal::Parsed(value),
            None => {
                tracing::warn!(description, "No panel number before colon; ordering panel last");
                Ordinal::Fallback
            }
        }
    }

    /// Sort key for an ordinal, resolving it from the description if needed.
    pub fn sort_key(record: &PanelRecord) -> u64 {
        match record.ordinal() {
            Ordinal::Parsed(value) => *value,
            Ordinal::Fallback => SENTINEL_ORDINAL,
            Ordinal::Unresolved => Self::resolve(record.description()),
        }
    }

    /// Resolves every record and sorts ascending by ordinal.
    ///
    /// The sort is stable: records sharing an ordinal keep their input order.
    pub fn order(records: Vec<PanelRecord>) -> Vec<PanelRecord> {
        let mut resolved: Vec<PanelRecord> = records
            .into_iter()
            .map(|record| {
                if record.ordinal().is_resolved() {
                    record
                } else {
                    let ordinal = Self::classify(record.description());
                    record.with_ordinal(ordinal)
                }
            })
            .collect();
        resolved.sort_by_key(Self::sort_key);
        resolved
    }
}
