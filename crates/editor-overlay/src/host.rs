//! Host editor adapter interface.
//!
//! The engine never touches a text widget directly. Everything it renders goes through the
//! [`HostEditor`] trait: clear-and-replace decoration sets per editor, owner-tagged marker sets
//! per buffer, and a path → buffer lookup.
//!
//! Hosts must not publish overlay events synchronously from inside these calls.

use crate::diagnostics::{Diagnostic, DiagnosticSeverity};

/// Opaque identifier of an editor pane (widget instance) owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditorHandle(pub u64);

/// Opaque identifier of a buffer (text model) owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(pub u64);

/// Opaque identifier of one applied decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationHandle(pub u64);

/// Visual class of a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationClass {
    /// Gutter bar for an added line.
    GutterAdded,
    /// Gutter bar for a modified line.
    GutterModified,
    /// After-line blame text.
    InlineBlame,
    /// After-line diagnostic message, styled by severity.
    InlineDiagnostic(DiagnosticSeverity),
}

impl DecorationClass {
    /// Stable class name for host-side styling.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::GutterAdded => "overlay-gutter-added",
            Self::GutterModified => "overlay-gutter-modified",
            Self::InlineBlame => "overlay-inline-blame",
            Self::InlineDiagnostic(DiagnosticSeverity::Error) => "overlay-inline-error",
            Self::InlineDiagnostic(DiagnosticSeverity::Warning) => "overlay-inline-warning",
            Self::InlineDiagnostic(DiagnosticSeverity::Information) => "overlay-inline-info",
            Self::InlineDiagnostic(DiagnosticSeverity::Hint) => "overlay-inline-hint",
        }
    }
}

/// One decoration to apply. Line-granular: `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationDescriptor {
    /// 1-based line.
    pub line: usize,
    /// Visual class.
    pub class: DecorationClass,
    /// After-line virtual text, if any.
    pub text: Option<String>,
    /// Hover payload (plain text), if any.
    pub hover: Option<String>,
    /// Whether the decoration spans the whole line (gutter bars do).
    pub whole_line: bool,
}

/// Marker severity in the host's numeric encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MarkerSeverity {
    /// Hint marker.
    Hint = 1,
    /// Informational marker.
    Info = 2,
    /// Warning marker.
    Warning = 4,
    /// Error marker.
    Error = 8,
}

impl From<DiagnosticSeverity> for MarkerSeverity {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => Self::Error,
            DiagnosticSeverity::Warning => Self::Warning,
            DiagnosticSeverity::Information => Self::Info,
            DiagnosticSeverity::Hint => Self::Hint,
        }
    }
}

/// One marker (squiggle + hover) in host terms. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDescriptor {
    /// Severity.
    pub severity: MarkerSeverity,
    /// Message.
    pub message: String,
    /// Producer name.
    pub source: String,
    /// Optional code.
    pub code: Option<String>,
    /// Start line.
    pub start_line: usize,
    /// Start column.
    pub start_column: usize,
    /// End line.
    pub end_line: usize,
    /// End column.
    pub end_column: usize,
}

impl MarkerDescriptor {
    /// Build a marker from a diagnostic, clamping its lines into `1..=line_count`.
    ///
    /// `line_count == None` leaves the lines untouched (apart from the 1-based floor).
    pub fn from_diagnostic(diagnostic: &Diagnostic, line_count: Option<usize>) -> Self {
        let max_line = line_count.unwrap_or(usize::MAX).max(1);
        let start_line = diagnostic.start_line.clamp(1, max_line);
        let end_line = diagnostic.end_line.clamp(start_line, max_line);
        let start_column = diagnostic.start_column.max(1);
        let end_column = if end_line == start_line {
            diagnostic.end_column.max(start_column)
        } else {
            diagnostic.end_column.max(1)
        };

        Self {
            severity: diagnostic.severity.into(),
            message: diagnostic.message.clone(),
            source: diagnostic.source.clone(),
            code: diagnostic.code.clone(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// Failures reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The editor pane is gone (its decorations went with it).
    #[error("editor {0:?} has been disposed")]
    EditorDisposed(EditorHandle),
    /// The buffer is gone.
    #[error("buffer {0:?} has been disposed")]
    BufferDisposed(BufferHandle),
    /// The host refused the request.
    #[error("host rejected request: {0}")]
    Rejected(String),
}

/// Primitives the engine needs from the host editor.
pub trait HostEditor: Send + Sync {
    /// Remove `previous` from `editor` and apply `decorations`, returning the new handles.
    fn set_decorations(
        &self,
        editor: EditorHandle,
        previous: &[DecorationHandle],
        decorations: &[DecorationDescriptor],
    ) -> Result<Vec<DecorationHandle>, HostError>;

    /// Replace every marker owned by `owner` on `buffer`.
    fn set_markers(
        &self,
        buffer: BufferHandle,
        owner: &str,
        markers: &[MarkerDescriptor],
    ) -> Result<(), HostError>;

    /// Buffer currently open for `path`, if any.
    fn model_for_path(&self, path: &str) -> Option<BufferHandle>;

    /// Line count of `buffer`, if the host knows it.
    fn line_count(&self, buffer: BufferHandle) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(start_line: usize, end_line: usize) -> Diagnostic {
        Diagnostic {
            id: "d".to_string(),
            file_path: "/a.rs".to_string(),
            severity: DiagnosticSeverity::Warning,
            message: "m".to_string(),
            source: "s".to_string(),
            code: Some("W1".to_string()),
            start_line,
            start_column: 0,
            end_line,
            end_column: 3,
        }
    }

    #[test]
    fn test_marker_clamps_lines() {
        let marker = MarkerDescriptor::from_diagnostic(&diag(7, 9), Some(5));
        assert_eq!(marker.severity, MarkerSeverity::Warning);
        assert_eq!((marker.start_line, marker.end_line), (5, 5));
        assert_eq!((marker.start_column, marker.end_column), (1, 3));

        let marker = MarkerDescriptor::from_diagnostic(&diag(2, 3), None);
        assert_eq!((marker.start_line, marker.end_line), (2, 3));
    }

    #[test]
    fn test_marker_severity_table() {
        assert_eq!(MarkerSeverity::from(DiagnosticSeverity::Error) as u8, 8);
        assert_eq!(MarkerSeverity::from(DiagnosticSeverity::Warning) as u8, 4);
        assert_eq!(MarkerSeverity::from(DiagnosticSeverity::Information) as u8, 2);
        assert_eq!(MarkerSeverity::from(DiagnosticSeverity::Hint) as u8, 1);
    }
}
