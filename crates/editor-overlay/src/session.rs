//! Pane lifecycle: the owner of every overlay manager and the marker synchronizer.
//!
//! An [`OverlaySession`] corresponds to one project window. It creates the shared containers
//! (bus, settings, diagnostics index, VCS state, buffer texts), and for each editor pane it owns
//! one manager per overlay kind. Split views get independent managers, so two panes on the same
//! file never share decoration handles.
//!
//! # Example
//!
//! ```rust,no_run
//! use editor_overlay::{EditorHandle, HostEditor, OverlaySession, OverlaySettings};
//! use std::sync::Arc;
//!
//! fn open(host: Arc<dyn HostEditor>) {
//!     let mut session = OverlaySession::new(host, OverlaySettings::default());
//!     let pane = session.open_pane(EditorHandle(1), "/src/main.rs", "fn main() {}\n", None);
//!     session.buffer_edited("/src/main.rs", "fn main() {\n}\n");
//!     session.close_pane(pane).unwrap();
//! }
//! ```

use crate::blame::VcsState;
use crate::buffers::BufferTextStore;
use crate::diagnostics::DiagnosticsIndex;
use crate::events::EventBus;
use crate::host::{EditorHandle, HostEditor};
use crate::markers::{DEFAULT_MARKER_OWNER, MarkerSynchronizer};
use crate::overlay::{
    GutterChangeOverlay, InlineBlameOverlay, InlineDiagnosticsOverlay, OverlayManager,
    OverlaySources,
};
use crate::settings::{OverlaySettings, SettingsStore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Opaque identifier of a pane inside an [`OverlaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaneId(u64);

impl PaneId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Session-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A pane id was not found.
    #[error("pane {0:?} not found")]
    PaneNotFound(PaneId),
}

/// The three overlay managers of one pane.
#[derive(Debug)]
pub struct PaneOverlays {
    editor: EditorHandle,
    path: String,
    /// Gutter change bars.
    pub gutter: OverlayManager<GutterChangeOverlay>,
    /// Inline blame.
    pub blame: OverlayManager<InlineBlameOverlay>,
    /// Inline diagnostic messages.
    pub diagnostics: OverlayManager<InlineDiagnosticsOverlay>,
}

impl PaneOverlays {
    fn new(sources: &OverlaySources) -> Self {
        Self {
            editor: EditorHandle(0),
            path: String::new(),
            gutter: OverlayManager::new(sources.clone(), GutterChangeOverlay::new()),
            blame: OverlayManager::new(sources.clone(), InlineBlameOverlay::new()),
            diagnostics: OverlayManager::new(sources.clone(), InlineDiagnosticsOverlay::new()),
        }
    }

    fn attach(&mut self, pane: PaneId, editor: EditorHandle, path: &str) {
        self.editor = editor;
        self.path = path.to_string();
        let context = Some(format!("pane-{}", pane.get()));
        self.gutter.attach(editor, path, context.clone());
        self.blame.attach(editor, path, context.clone());
        self.diagnostics.attach(editor, path, context);
    }

    fn detach(&self) {
        self.gutter.detach();
        self.blame.detach();
        self.diagnostics.detach();
    }

    fn refresh(&self) {
        self.gutter.refresh();
        self.blame.refresh();
        self.diagnostics.refresh();
    }

    /// Editor pane the overlays are bound to.
    pub fn editor(&self) -> EditorHandle {
        self.editor
    }

    /// File path shown in the pane.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Owner of the shared containers, the marker synchronizer and every pane's overlays.
pub struct OverlaySession {
    sources: OverlaySources,
    markers: Arc<MarkerSynchronizer>,
    panes: BTreeMap<PaneId, PaneOverlays>,
    next_pane_id: u64,
}

impl std::fmt::Debug for OverlaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySession")
            .field("sources", &self.sources)
            .field("markers", &self.markers)
            .field("panes", &self.panes)
            .finish()
    }
}

impl OverlaySession {
    /// Create a session around `host` with initial `settings`.
    pub fn new(host: Arc<dyn HostEditor>, settings: OverlaySettings) -> Self {
        let sources = OverlaySources::new(host, settings);
        Self::with_sources(sources)
    }

    /// Create a session around existing containers.
    pub fn with_sources(sources: OverlaySources) -> Self {
        let markers = Arc::new(MarkerSynchronizer::new(
            DEFAULT_MARKER_OWNER,
            Arc::clone(&sources.host),
            Arc::clone(&sources.diagnostics),
        ));
        markers.attach(&sources.bus);
        Self {
            sources,
            markers,
            panes: BTreeMap::new(),
            next_pane_id: 1,
        }
    }

    /// Shared containers.
    pub fn sources(&self) -> &OverlaySources {
        &self.sources
    }

    /// Event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.sources.bus
    }

    /// Settings container.
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.sources.settings
    }

    /// Diagnostics index.
    pub fn diagnostics(&self) -> &Arc<DiagnosticsIndex> {
        &self.sources.diagnostics
    }

    /// VCS state.
    pub fn vcs(&self) -> &Arc<VcsState> {
        &self.sources.vcs
    }

    /// Buffer texts.
    pub fn buffers(&self) -> &Arc<BufferTextStore> {
        &self.sources.buffers
    }

    /// Marker synchronizer.
    pub fn markers(&self) -> &Arc<MarkerSynchronizer> {
        &self.markers
    }

    fn ensure_buffer(&self, path: &str, text: &str, reference: Option<&str>) {
        let buffers = &self.sources.buffers;
        if buffers.contains(path) {
            buffers.set_current(path, text);
            if reference.is_some() {
                buffers.set_reference(path, reference);
            }
        } else {
            buffers.open(path, text, reference);
        }
    }

    fn path_in_use(&self, path: &str, except: PaneId) -> bool {
        self.panes
            .iter()
            .any(|(id, pane)| *id != except && pane.path == path)
    }

    fn release_path(&self, path: &str) {
        self.sources.buffers.close(path);
        self.markers.on_buffer_closed(path);
    }

    /// Open a pane showing `path` in `editor` and attach all overlays.
    ///
    /// If another pane already shows `path`, the text is updated and shared. A `Some` reference
    /// replaces the shared one; `None` keeps it. Use [`BufferTextStore::set_reference`] to mark
    /// an open file untracked.
    pub fn open_pane(
        &mut self,
        editor: EditorHandle,
        path: &str,
        text: &str,
        reference: Option<&str>,
    ) -> PaneId {
        let pane_id = PaneId(self.next_pane_id);
        self.next_pane_id = self.next_pane_id.saturating_add(1);

        self.ensure_buffer(path, text, reference);
        let mut pane = PaneOverlays::new(&self.sources);
        pane.attach(pane_id, editor, path);
        self.panes.insert(pane_id, pane);
        self.markers.on_buffer_opened(path);

        tracing::debug!(pane = pane_id.get(), path, "pane opened");
        pane_id
    }

    /// Show a different file (possibly in a different editor widget) in an existing pane.
    ///
    /// Every overlay is re-attached; the previous file is released if no other pane shows it.
    /// Text and reference are shared as in [`OverlaySession::open_pane`].
    pub fn swap_pane_buffer(
        &mut self,
        pane_id: PaneId,
        editor: EditorHandle,
        path: &str,
        text: &str,
        reference: Option<&str>,
    ) -> Result<(), SessionError> {
        let old_path = self
            .panes
            .get(&pane_id)
            .map(|pane| pane.path.clone())
            .ok_or(SessionError::PaneNotFound(pane_id))?;

        self.ensure_buffer(path, text, reference);
        if let Some(pane) = self.panes.get_mut(&pane_id) {
            pane.attach(pane_id, editor, path);
        }
        if old_path != path && !self.path_in_use(&old_path, pane_id) {
            self.release_path(&old_path);
        }
        self.markers.on_buffer_opened(path);

        tracing::debug!(pane = pane_id.get(), from = %old_path, to = path, "pane swapped");
        Ok(())
    }

    /// Detach and drop a pane's overlays. Releases the file if no other pane shows it.
    pub fn close_pane(&mut self, pane_id: PaneId) -> Result<(), SessionError> {
        let pane = self
            .panes
            .remove(&pane_id)
            .ok_or(SessionError::PaneNotFound(pane_id))?;
        pane.detach();
        if !self.path_in_use(&pane.path, pane_id) {
            self.release_path(&pane.path);
        }
        tracing::debug!(pane = pane_id.get(), path = %pane.path, "pane closed");
        Ok(())
    }

    /// Force a render pass of every overlay of one pane.
    pub fn refresh_pane(&self, pane_id: PaneId) -> Result<(), SessionError> {
        let pane = self
            .panes
            .get(&pane_id)
            .ok_or(SessionError::PaneNotFound(pane_id))?;
        pane.refresh();
        Ok(())
    }

    /// Force a render pass of every overlay of every pane, and re-check markers.
    pub fn refresh_all(&self) {
        for pane in self.panes.values() {
            pane.refresh();
        }
        self.markers.resync_all();
    }

    /// Record an edit of `path` (full new text).
    pub fn buffer_edited(&self, path: &str, text: &str) -> bool {
        self.sources.buffers.set_current(path, text)
    }

    /// Overlays of one pane.
    pub fn pane(&self, pane_id: PaneId) -> Option<&PaneOverlays> {
        self.panes.get(&pane_id)
    }

    /// Every pane id, in creation order.
    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.panes.keys().copied().collect()
    }

    /// Panes currently showing `path`.
    pub fn panes_for_path(&self, path: &str) -> Vec<PaneId> {
        self.panes
            .iter()
            .filter(|(_, pane)| pane.path == path)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        for pane in self.panes.values() {
            pane.detach();
        }
        self.markers.detach(&self.sources.bus);
    }
}
