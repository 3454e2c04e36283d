#![warn(missing_docs)]
//! Editor Overlay - Overlay Synchronization Engine for Headless Editors
//!
//! # Overview
//!
//! `editor-overlay` keeps visual annotations on a live text buffer correct while the buffer is
//! edited, diagnostics arrive from language tooling and user settings change:
//!
//! - **Gutter change bars** (added / modified lines relative to a reference snapshot)
//! - **Inline blame** (version-control attribution, mapped onto the edited buffer)
//! - **Inline diagnostic messages** (most severe diagnostic per line)
//! - **Markers** (squiggles + problem counts, synchronized for every open buffer)
//!
//! It does not draw anything. Rendering goes through the host's decoration and marker API,
//! abstracted as [`HostEditor`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  OverlaySession (pane lifecycle)            │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  OverlayManager × {gutter, blame, inline}   │  ← Decorations
//! │  MarkerSynchronizer                         │  ← Markers
//! ├─────────────────────────────────────────────┤
//! │  EventBus (typed subscribe / publish)       │  ← Notifications
//! ├─────────────────────────────────────────────┤
//! │  Settings · Diagnostics · VCS · Buffers     │  ← State containers
//! ├─────────────────────────────────────────────┤
//! │  Line Diff Engine                           │  ← Content-drift mapping
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Execution Model
//!
//! All notifications are delivered synchronously on the publishing thread, and each relevant
//! notification produces exactly one render pass per attached manager. Shared containers are
//! guarded by `parking_lot` locks, so hosts that publish from several threads keep the
//! single-writer guarantees of the diagnostics index.
//!
//! # Quick Start
//!
//! ```rust
//! use editor_overlay::{LineStatus, compute_line_diff};
//!
//! let diff = compute_line_diff("a\nb\nc", "a\nX\nc");
//! assert_eq!(diff.status(2), LineStatus::Modified);
//! assert_eq!(diff.original_line(3), Some(3));
//! assert_eq!(diff.added_count + diff.modified_count + diff.unchanged_count, 3);
//! ```
//!
//! # Module Description
//!
//! - [`line_diff`] - Line-level reference → current mapping
//! - [`events`] - Typed observer interface
//! - [`diagnostics`] - Diagnostics model and file-keyed index
//! - [`blame`] - Blame cache and branch identity
//! - [`buffers`] - Current text + reference snapshot per file
//! - [`settings`] - User settings
//! - [`host`] - Host editor adapter interface
//! - [`overlay`] - Overlay managers and the three overlay kinds
//! - [`markers`] - Marker synchronizer
//! - [`session`] - Pane lifecycle owner

pub mod blame;
pub mod buffers;
pub mod diagnostics;
pub mod events;
pub mod host;
pub mod line_diff;
pub mod markers;
pub mod overlay;
pub mod session;
pub mod settings;

pub use blame::{BlameEntry, VcsState};
pub use buffers::{BufferTextStore, BufferTexts};
pub use diagnostics::{
    Diagnostic, DiagnosticList, DiagnosticSeverity, DiagnosticsIndex, DiagnosticsSummary,
    SeverityFilter,
};
pub use events::{EventBus, EventHandler, EventTopic, OverlayEvent, SubscriptionToken};
pub use host::{
    BufferHandle, DecorationClass, DecorationDescriptor, DecorationHandle, EditorHandle,
    HostEditor, HostError, MarkerDescriptor, MarkerSeverity,
};
pub use line_diff::{
    LineDiffResult, LineDiffStrategy, LineMapping, LineStatus, compute_line_diff, line_count,
    line_status, original_line_number, split_lines,
};
pub use markers::{DEFAULT_MARKER_OWNER, MarkerSynchronizer};
pub use overlay::{
    BufferBinding, GutterChangeOverlay, InlineBlameOverlay, InlineDiagnosticsOverlay, OverlayKind,
    OverlayManager, OverlayRenderer, OverlaySources, RenderContext,
};
pub use session::{OverlaySession, PaneId, PaneOverlays, SessionError};
pub use settings::{OverlaySettings, SettingsError, SettingsStore};
