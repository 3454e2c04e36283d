//! `textDocument/publishDiagnostics` parsing.

use crate::lsp_uri::uri_to_path_key;
use editor_overlay::{Diagnostic, DiagnosticSeverity};
use serde_json::Value;

/// JSON-RPC method name of the diagnostics notification.
pub const PUBLISH_DIAGNOSTICS_METHOD: &str = "textDocument/publishDiagnostics";

/// Errors for payloads that cannot be ingested at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LspIngestError {
    /// `params` is not a JSON object.
    #[error("publishDiagnostics params must be an object")]
    NotAnObject,
    /// A required field is missing or has the wrong type.
    #[error("publishDiagnostics params: missing or invalid `{0}`")]
    InvalidField(&'static str),
}

/// A parsed `publishDiagnostics` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDiagnostics {
    /// Document URI as sent by the server.
    pub uri: String,
    /// Index key derived from `uri`.
    pub path: String,
    /// Document version the diagnostics were computed for, if the server sent one.
    pub version: Option<i64>,
    /// Full replacement list, 1-based positions.
    pub diagnostics: Vec<Diagnostic>,
}

fn severity_from_value(value: Option<&Value>) -> DiagnosticSeverity {
    match value.and_then(Value::as_u64) {
        Some(2) => DiagnosticSeverity::Warning,
        Some(3) => DiagnosticSeverity::Information,
        Some(4) => DiagnosticSeverity::Hint,
        // Missing or unknown severities are shown as errors.
        _ => DiagnosticSeverity::Error,
    }
}

fn code_from_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn position_from_value(value: &Value) -> Option<(usize, usize)> {
    let line = value.get("line")?.as_u64()?;
    let character = value.get("character")?.as_u64()?;
    Some((
        usize::try_from(line).ok()?.saturating_add(1),
        usize::try_from(character).ok()?.saturating_add(1),
    ))
}

fn diagnostic_from_value(value: &Value, uri: &str, path: &str, idx: usize) -> Option<Diagnostic> {
    let range = value.get("range")?;
    let (start_line, start_column) = position_from_value(range.get("start")?)?;
    let (end_line, end_column) = position_from_value(range.get("end")?)?;
    let message = value.get("message")?.as_str()?.to_string();

    Some(Diagnostic {
        id: format!("{uri}:{start_line}:{start_column}:{idx}"),
        file_path: path.to_string(),
        severity: severity_from_value(value.get("severity")),
        message,
        source: value
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        code: code_from_value(value.get("code")),
        start_line,
        start_column,
        end_line,
        end_column,
    })
}

/// Parse the `params` of a `publishDiagnostics` notification.
///
/// Positions are converted from LSP's 0-based lines/characters to 1-based. Individual
/// diagnostics without a valid range or message are skipped; the rest of the list still applies.
pub fn parse_publish_diagnostics(params: &Value) -> Result<PublishDiagnostics, LspIngestError> {
    if !params.is_object() {
        return Err(LspIngestError::NotAnObject);
    }
    let uri = params
        .get("uri")
        .and_then(Value::as_str)
        .ok_or(LspIngestError::InvalidField("uri"))?;
    let entries = params
        .get("diagnostics")
        .and_then(Value::as_array)
        .ok_or(LspIngestError::InvalidField("diagnostics"))?;
    let version = params.get("version").and_then(Value::as_i64);

    let path = uri_to_path_key(uri);
    let diagnostics: Vec<Diagnostic> = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| diagnostic_from_value(entry, uri, &path, idx))
        .collect();

    let skipped = entries.len() - diagnostics.len();
    if skipped > 0 {
        tracing::warn!(uri, skipped, "skipped malformed diagnostics");
    }

    Ok(PublishDiagnostics {
        uri: uri.to_string(),
        path,
        version,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_from_value(Some(&json!(1))), DiagnosticSeverity::Error);
        assert_eq!(severity_from_value(Some(&json!(2))), DiagnosticSeverity::Warning);
        assert_eq!(
            severity_from_value(Some(&json!(3))),
            DiagnosticSeverity::Information
        );
        assert_eq!(severity_from_value(Some(&json!(4))), DiagnosticSeverity::Hint);
        assert_eq!(severity_from_value(Some(&json!(9))), DiagnosticSeverity::Error);
        assert_eq!(severity_from_value(None), DiagnosticSeverity::Error);
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(code_from_value(Some(&json!("E0308"))), Some("E0308".to_string()));
        assert_eq!(code_from_value(Some(&json!(2304))), Some("2304".to_string()));
        assert_eq!(code_from_value(Some(&json!({"value": 1}))), None);
        assert_eq!(code_from_value(None), None);
    }
}
