use super::{OverlayKind, OverlayRenderer, RenderContext};
use crate::events::EventTopic;
use crate::host::{DecorationClass, DecorationDescriptor};
use crate::line_diff::{LineDiffResult, LineDiffStrategy, LineStatus};

/// Gutter bars for lines added or modified relative to the reference snapshot.
///
/// The overlay remembers the last diff it rendered and counts how often the diff actually
/// changed, so hosts can tell a real change from a re-render with identical bars.
#[derive(Debug, Default)]
pub struct GutterChangeOverlay {
    strategy: LineDiffStrategy,
    last_result: Option<LineDiffResult>,
    diff_changes: u64,
}

impl GutterChangeOverlay {
    /// Create a gutter overlay using the default diff strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gutter overlay using `strategy`.
    pub fn with_strategy(strategy: LineDiffStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Diff computed by the most recent render pass, if it produced one.
    pub fn last_result(&self) -> Option<&LineDiffResult> {
        self.last_result.as_ref()
    }

    /// Number of render passes whose diff differed from the previous pass.
    pub fn diff_changes(&self) -> u64 {
        self.diff_changes
    }

    fn record(&mut self, path: &str, result: Option<LineDiffResult>) {
        if self.last_result != result {
            self.diff_changes = self.diff_changes.saturating_add(1);
            if let Some(diff) = &result {
                tracing::trace!(
                    path,
                    added = diff.added_count,
                    modified = diff.modified_count,
                    "gutter diff changed"
                );
            }
        }
        self.last_result = result;
    }
}

impl OverlayRenderer for GutterChangeOverlay {
    fn kind(&self) -> OverlayKind {
        OverlayKind::GutterChange
    }

    fn dependencies(&self) -> &'static [EventTopic] {
        &[
            EventTopic::BufferEdited,
            EventTopic::ReferenceChanged,
            EventTopic::SettingsChanged,
        ]
    }

    fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<DecorationDescriptor> {
        if !ctx.settings.gutter_enabled {
            self.record(&ctx.binding.path, None);
            return Vec::new();
        }

        let Some(result) = ctx
            .sources
            .buffers
            .line_diff(&ctx.binding.path, self.strategy)
        else {
            self.record(&ctx.binding.path, None);
            return Vec::new();
        };

        let decorations: Vec<DecorationDescriptor> = result
            .changed_lines()
            .map(|mapping| DecorationDescriptor {
                line: mapping.current_line,
                class: match mapping.status {
                    LineStatus::Modified => DecorationClass::GutterModified,
                    _ => DecorationClass::GutterAdded,
                },
                text: None,
                hover: None,
                whole_line: true,
            })
            .collect();

        self.record(&ctx.binding.path, Some(result));
        decorations
    }

    // The change counter stays monotonic across resets.
    fn reset(&mut self) {
        self.last_result = None;
    }
}
