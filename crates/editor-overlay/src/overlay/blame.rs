use super::{OverlayKind, OverlayRenderer, RenderContext};
use crate::blame::BlameEntry;
use crate::events::EventTopic;
use crate::host::{DecorationClass, DecorationDescriptor};
use crate::line_diff::{LineDiffStrategy, LineStatus, line_count};
use crate::settings::DEFAULT_BLAME_DATE_FORMAT;
use chrono::DateTime;
use std::collections::HashMap;
use std::fmt::Write;

/// After-line blame attribution, mapped through the reference → current line diff.
///
/// Only `Unchanged` lines carry attribution: their reference line is looked up in the blame list.
/// Without a reference snapshot the buffer is assumed to match the blamed content, so current
/// line `n` maps to blame line `n`.
#[derive(Debug, Default)]
pub struct InlineBlameOverlay {
    strategy: LineDiffStrategy,
}

impl InlineBlameOverlay {
    /// Create a blame overlay using the default diff strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blame overlay using `strategy`.
    pub fn with_strategy(strategy: LineDiffStrategy) -> Self {
        Self { strategy }
    }

    /// Map current lines to reference lines: `(current_line, original_line)` pairs.
    fn attributed_lines(&self, ctx: &RenderContext<'_>) -> Vec<(usize, usize)> {
        let Some(texts) = ctx.sources.buffers.texts(&ctx.binding.path) else {
            return Vec::new();
        };

        match texts.reference {
            Some(reference) => self
                .strategy
                .compute(&reference, &texts.current)
                .mappings
                .into_iter()
                .filter(|m| m.status == LineStatus::Unchanged)
                .filter_map(|m| Some((m.current_line, m.original_line?)))
                .collect(),
            None => (1..=line_count(&texts.current)).map(|l| (l, l)).collect(),
        }
    }
}

/// `author, date • summary` (or the uncommitted placeholder).
pub(crate) fn format_blame_text(entry: &BlameEntry, date_format: &str) -> String {
    if entry.is_uncommitted() {
        return "You, Uncommitted changes".to_string();
    }
    let date = format_blame_date(entry.timestamp, date_format);
    if entry.summary.is_empty() {
        format!("{}, {}", entry.author, date)
    } else {
        format!("{}, {} • {}", entry.author, date, entry.summary)
    }
}

/// Format a unix timestamp. A format `chrono` rejects falls back to the default one.
fn format_blame_date(timestamp: i64, date_format: &str) -> String {
    let Some(dt) = DateTime::from_timestamp(timestamp, 0) else {
        return String::new();
    };
    let mut out = String::new();
    if write!(out, "{}", dt.format(date_format)).is_ok() {
        return out;
    }
    out.clear();
    if write!(out, "{}", dt.format(DEFAULT_BLAME_DATE_FORMAT)).is_err() {
        out.clear();
    }
    out
}

fn format_blame_hover(entry: &BlameEntry, date_format: &str) -> String {
    format!(
        "{} {}\n{}\n\n{}",
        entry.short_commit(),
        entry.author,
        format_blame_date(entry.timestamp, date_format),
        entry.summary
    )
}

impl OverlayRenderer for InlineBlameOverlay {
    fn kind(&self) -> OverlayKind {
        OverlayKind::InlineBlame
    }

    fn dependencies(&self) -> &'static [EventTopic] {
        &[
            EventTopic::BlameChanged,
            EventTopic::BranchChanged,
            EventTopic::BufferEdited,
            EventTopic::ReferenceChanged,
            EventTopic::SettingsChanged,
        ]
    }

    fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<DecorationDescriptor> {
        if !ctx.settings.inline_blame_enabled {
            return Vec::new();
        }

        let Some(blame) = ctx.sources.vcs.blame_for_file(&ctx.binding.path) else {
            return Vec::new();
        };
        if blame.is_empty() {
            return Vec::new();
        }

        let by_line: HashMap<usize, &BlameEntry> = blame.iter().map(|e| (e.line, e)).collect();
        let date_format = ctx.settings.blame_date_format.as_str();

        self.attributed_lines(ctx)
            .into_iter()
            .filter_map(|(current_line, original_line)| {
                let entry = by_line.get(&original_line)?;
                Some(DecorationDescriptor {
                    line: current_line,
                    class: DecorationClass::InlineBlame,
                    text: Some(format_blame_text(entry, date_format)),
                    hover: (!entry.is_uncommitted())
                        .then(|| format_blame_hover(entry, date_format)),
                    whole_line: false,
                })
            })
            .collect()
    }
}
