use super::{OverlayKind, OverlayRenderer, RenderContext};
use crate::diagnostics::Diagnostic;
use crate::events::EventTopic;
use crate::host::{DecorationClass, DecorationDescriptor};
use std::collections::BTreeMap;

/// After-line diagnostic messages, one per line.
///
/// Per line the most severe diagnostic is shown (first-seen wins ties). Its first message line is
/// truncated to the configured length and suffixed with ` (+N more)` when other diagnostics share
/// the line. The hover lists every message on the line.
#[derive(Debug, Default)]
pub struct InlineDiagnosticsOverlay;

impl InlineDiagnosticsOverlay {
    /// Create an inline diagnostics overlay.
    pub fn new() -> Self {
        Self
    }
}

struct LineGroup<'a> {
    winner: &'a Diagnostic,
    members: Vec<&'a Diagnostic>,
}

/// Truncate `message` to at most `max_chars` characters, ending in `…` when shortened.
pub(crate) fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = message.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("").trim_end()
}

impl OverlayRenderer for InlineDiagnosticsOverlay {
    fn kind(&self) -> OverlayKind {
        OverlayKind::InlineDiagnostic
    }

    fn dependencies(&self) -> &'static [EventTopic] {
        &[
            EventTopic::DiagnosticsChanged,
            EventTopic::BufferEdited,
            EventTopic::SettingsChanged,
        ]
    }

    fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<DecorationDescriptor> {
        let settings = ctx.settings;
        if !settings.inline_diagnostics_enabled || settings.inline_diagnostic_severities.is_empty()
        {
            return Vec::new();
        }

        let path = ctx.binding.path.as_str();
        let diagnostics = ctx.sources.diagnostics.diagnostics_for_file(path);
        if diagnostics.is_empty() {
            return Vec::new();
        }

        let max_line = ctx.sources.line_count(path);
        let mut groups: BTreeMap<usize, LineGroup<'_>> = BTreeMap::new();
        for diagnostic in diagnostics.iter() {
            if !settings
                .inline_diagnostic_severities
                .allows(diagnostic.severity)
            {
                continue;
            }
            let line = diagnostic.start_line;
            if line == 0 || max_line.is_some_and(|max| line > max) {
                tracing::trace!(
                    path,
                    line,
                    id = %diagnostic.id,
                    "diagnostic outside buffer; skipped"
                );
                continue;
            }

            let group = groups.entry(line).or_insert_with(|| LineGroup {
                winner: diagnostic,
                members: Vec::new(),
            });
            if diagnostic.severity.is_more_severe_than(group.winner.severity) {
                group.winner = diagnostic;
            }
            group.members.push(diagnostic);
        }

        groups
            .into_iter()
            .map(|(line, group)| {
                let mut text = truncate_message(
                    first_line(&group.winner.message),
                    settings.inline_diagnostic_max_length,
                );
                let others = group.members.len() - 1;
                if others > 0 {
                    text.push_str(&format!(" (+{others} more)"));
                }

                let hover = group
                    .members
                    .iter()
                    .map(|d| format!("[{}] {}", d.severity.as_str(), d.message))
                    .collect::<Vec<_>>()
                    .join("\n");

                DecorationDescriptor {
                    line,
                    class: DecorationClass::InlineDiagnostic(group.winner.severity),
                    text: Some(text),
                    hover: Some(hover),
                    whole_line: false,
                }
            })
            .collect()
    }
}
