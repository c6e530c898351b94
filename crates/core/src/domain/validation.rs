use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::resource::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEntry {
    pub kind: ResourceKind,
    pub identifier: String,
    pub accessible: bool,
    pub detail: String,
}

impl ValidationEntry {
    pub fn accessible(kind: ResourceKind, identifier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            accessible: true,
            detail: detail.into(),
        }
    }

    pub fn inaccessible(
        kind: ResourceKind,
        identifier: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            accessible: false,
            detail: detail.into(),
        }
    }
}

/// Result of a post-provisioning validation pass, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    entries: Vec<ValidationEntry>,
}

impl ValidationReport {
    pub fn entries(&self) -> &[ValidationEntry] {
        &self.entries
    }

    pub fn entry(&self, kind: ResourceKind) -> Option<&ValidationEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn all_accessible(&self) -> bool {
        self.entries.iter().all(|e| e.accessible)
    }

    pub fn inaccessible(&self) -> impl Iterator<Item = &ValidationEntry> {
        self.entries.iter().filter(|e| !e.accessible)
    }

    pub fn accessible_count(&self) -> usize {
        self.entries.iter().filter(|e| e.accessible).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}/{} resources accessible\n",
            self.accessible_count(),
            self.len()
        );
        for entry in &self.entries {
            let mark = if entry.accessible { "ok" } else { "FAIL" };
            let _ = writeln!(
                out,
                "  [{:>4}] {} ({}): {}",
                mark,
                entry.kind.label(),
                entry.identifier,
                entry.detail
            );
        }
        out
    }
}

impl FromIterator<ValidationEntry> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
