//! Diagnostics data model and the file-keyed diagnostics index.
//!
//! The index is the shared store that every diagnostics consumer reads from (inline messages,
//! markers, problem counts). It has exactly one writer: the diagnostics-ingestion path.
//!
//! A file's list is always replaced wholesale with a freshly allocated [`DiagnosticList`], never
//! mutated in place. Consumers can therefore use [`Arc::ptr_eq`] against the list they last
//! applied as a cheap and correct change signal.

use crate::events::{EventBus, OverlayEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

impl DiagnosticSeverity {
    /// Display priority; a higher rank is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Self::Error => 4,
            Self::Warning => 3,
            Self::Information => 2,
            Self::Hint => 1,
        }
    }

    /// `true` if `self` should win display priority over `other`.
    pub fn is_more_severe_than(self, other: Self) -> bool {
        self.rank() > other.rank()
    }

    /// Stable lowercase name (`"error"`, `"warning"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "information",
            Self::Hint => "hint",
        }
    }
}

/// A single diagnostic for one file.
///
/// Lines and columns are 1-based; the end position is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Producer-assigned id (unique within a file's list).
    pub id: String,
    /// File path the diagnostic belongs to.
    pub file_path: String,
    /// Severity.
    pub severity: DiagnosticSeverity,
    /// Diagnostic message (may span multiple lines).
    pub message: String,
    /// Producer name (e.g. `"rust-analyzer"`).
    pub source: String,
    /// Optional diagnostic code (stringified).
    pub code: Option<String>,
    /// Start line (1-based).
    pub start_line: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line (1-based).
    pub end_line: usize,
    /// End column (1-based, exclusive).
    pub end_column: usize,
}

/// An immutable, shared diagnostic list for one file.
pub type DiagnosticList = Arc<[Diagnostic]>;

/// Which severities an overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityFilter {
    /// Show errors.
    pub error: bool,
    /// Show warnings.
    pub warning: bool,
    /// Show informational diagnostics.
    pub information: bool,
    /// Show hints.
    pub hint: bool,
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self {
            error: true,
            warning: true,
            information: false,
            hint: false,
        }
    }
}

impl SeverityFilter {
    /// Filter that lets every severity through.
    pub fn all() -> Self {
        Self {
            error: true,
            warning: true,
            information: true,
            hint: true,
        }
    }

    /// Filter that hides everything.
    pub fn none() -> Self {
        Self {
            error: false,
            warning: false,
            information: false,
            hint: false,
        }
    }

    /// Whether diagnostics of `severity` pass the filter.
    pub fn allows(&self, severity: DiagnosticSeverity) -> bool {
        match severity {
            DiagnosticSeverity::Error => self.error,
            DiagnosticSeverity::Warning => self.warning,
            DiagnosticSeverity::Information => self.information,
            DiagnosticSeverity::Hint => self.hint,
        }
    }

    /// `true` if no severity passes.
    pub fn is_empty(&self) -> bool {
        !(self.error || self.warning || self.information || self.hint)
    }
}

/// Problem counts across the whole index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticsSummary {
    /// Number of files with at least one diagnostic.
    pub file_count: usize,
    /// Error count.
    pub errors: usize,
    /// Warning count.
    pub warnings: usize,
    /// Information count.
    pub information: usize,
    /// Hint count.
    pub hints: usize,
}

impl DiagnosticsSummary {
    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.information + self.hints
    }
}

/// File-keyed diagnostics store.
pub struct DiagnosticsIndex {
    files: RwLock<HashMap<String, DiagnosticList>>,
    empty: DiagnosticList,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for DiagnosticsIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticsIndex")
            .field("files", &self.files.read().len())
            .finish()
    }
}

impl DiagnosticsIndex {
    /// Create an empty index publishing change events on `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            empty: Arc::from(Vec::<Diagnostic>::new()),
            bus,
        }
    }

    /// Replace the full diagnostic list of `path`.
    ///
    /// An empty list removes the file from the index. A `DiagnosticsChanged` event is published
    /// in both cases, after the index lock has been released.
    pub fn replace(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        let count = diagnostics.len();
        {
            let mut files = self.files.write();
            if diagnostics.is_empty() {
                files.remove(path);
            } else {
                files.insert(path.to_string(), Arc::from(diagnostics));
            }
        }
        tracing::debug!(path, count, "diagnostics replaced");
        self.bus.publish(&OverlayEvent::DiagnosticsChanged {
            path: path.to_string(),
        });
    }

    /// Remove every diagnostic of `path` (same as replacing with an empty list).
    pub fn clear_file(&self, path: &str) {
        self.replace(path, Vec::new());
    }

    /// Remove every diagnostic of every file, publishing one event per affected file.
    pub fn clear_all(&self) {
        let paths: Vec<String> = {
            let mut files = self.files.write();
            files.drain().map(|(path, _)| path).collect()
        };
        for path in paths {
            self.bus.publish(&OverlayEvent::DiagnosticsChanged { path });
        }
    }

    /// Current list for `path`. Unknown files yield a shared empty list.
    pub fn diagnostics_for_file(&self, path: &str) -> DiagnosticList {
        self.files
            .read()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// Paths that currently carry diagnostics, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Problem counts across every file.
    pub fn summary(&self) -> DiagnosticsSummary {
        let files = self.files.read();
        let mut summary = DiagnosticsSummary {
            file_count: files.len(),
            ..DiagnosticsSummary::default()
        };
        for diagnostic in files.values().flat_map(|list| list.iter()) {
            match diagnostic.severity {
                DiagnosticSeverity::Error => summary.errors += 1,
                DiagnosticSeverity::Warning => summary.warnings += 1,
                DiagnosticSeverity::Information => summary.information += 1,
                DiagnosticSeverity::Hint => summary.hints += 1,
            }
        }
        summary
    }
}
