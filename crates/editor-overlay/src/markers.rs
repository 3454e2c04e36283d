//! Diagnostics → host marker synchronization.
//!
//! For every open buffer, the marker set owned by this synchronizer equals the buffer's list in
//! the [`DiagnosticsIndex`], mapped 1:1 through [`MarkerDescriptor::from_diagnostic`].
//!
//! Change detection relies on the index replacing lists wholesale: a buffer is re-synced only
//! when the list it currently carries is not the same allocation ([`Arc::ptr_eq`]) as the one in
//! the index. Emptied lists are always pushed as an explicit empty marker set.

use crate::diagnostics::{DiagnosticList, DiagnosticsIndex};
use crate::events::{EventBus, EventTopic, SubscriptionToken};
use crate::host::{BufferHandle, HostEditor, MarkerDescriptor};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Default owner tag for markers written by the synchronizer.
pub const DEFAULT_MARKER_OWNER: &str = "overlay-diagnostics";

#[derive(Debug)]
struct AppliedMarkers {
    buffer: BufferHandle,
    list: DiagnosticList,
}

#[derive(Debug, Default)]
struct MarkerState {
    applied: HashMap<String, AppliedMarkers>,
    subscription: Option<SubscriptionToken>,
}

/// Keeps host markers equal to the diagnostics index for every open buffer.
pub struct MarkerSynchronizer {
    owner: String,
    host: Arc<dyn HostEditor>,
    diagnostics: Arc<DiagnosticsIndex>,
    state: Mutex<MarkerState>,
}

impl std::fmt::Debug for MarkerSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerSynchronizer")
            .field("owner", &self.owner)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl MarkerSynchronizer {
    /// Create a synchronizer writing markers tagged `owner`.
    pub fn new(
        owner: impl Into<String>,
        host: Arc<dyn HostEditor>,
        diagnostics: Arc<DiagnosticsIndex>,
    ) -> Self {
        Self {
            owner: owner.into(),
            host,
            diagnostics,
            state: Mutex::new(MarkerState::default()),
        }
    }

    /// Owner tag passed to [`HostEditor::set_markers`].
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Subscribe to diagnostics change events on `bus`. Re-attaching replaces the previous
    /// subscription.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        self.detach(bus);
        let weak: Weak<Self> = Arc::downgrade(self);
        let token = bus.subscribe(EventTopic::DiagnosticsChanged, move |event| {
            if let (Some(this), Some(path)) = (weak.upgrade(), event.path()) {
                this.on_diagnostics_changed(path);
            }
        });
        self.state.lock().subscription = Some(token);
    }

    /// Drop the bus subscription, if any.
    pub fn detach(&self, bus: &EventBus) {
        if let Some(token) = self.state.lock().subscription.take() {
            bus.unsubscribe(token);
        }
    }

    /// Re-derive markers for `path` if its list changed since the last apply.
    ///
    /// Returns `true` if a `set_markers` call was made.
    pub fn on_diagnostics_changed(&self, path: &str) -> bool {
        let mut state = self.state.lock();
        let Some(buffer) = self.host.model_for_path(path) else {
            // Not open: nothing to sync; opening it later pulls the current list.
            state.applied.remove(path);
            return false;
        };

        let list = self.diagnostics.diagnostics_for_file(path);
        if let Some(applied) = state.applied.get(path)
            && applied.buffer == buffer
            && Arc::ptr_eq(&applied.list, &list)
        {
            return false;
        }

        self.apply(&mut state, path, buffer, list);
        true
    }

    /// Pull and apply the current list for a newly opened buffer.
    ///
    /// Returns `true` if a `set_markers` call was made.
    pub fn on_buffer_opened(&self, path: &str) -> bool {
        let mut state = self.state.lock();
        let Some(buffer) = self.host.model_for_path(path) else {
            tracing::debug!(path, "opened buffer has no host model yet");
            return false;
        };
        let list = self.diagnostics.diagnostics_for_file(path);
        if let Some(applied) = state.applied.get(path)
            && applied.buffer == buffer
            && Arc::ptr_eq(&applied.list, &list)
        {
            return false;
        }
        self.apply(&mut state, path, buffer, list);
        true
    }

    /// Forget the applied record of a closed buffer (its markers went with it).
    pub fn on_buffer_closed(&self, path: &str) {
        self.state.lock().applied.remove(path);
    }

    /// Re-check every tracked path and every path with diagnostics.
    pub fn resync_all(&self) -> usize {
        let mut paths: Vec<String> = self.state.lock().applied.keys().cloned().collect();
        for path in self.diagnostics.files() {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
            .iter()
            .filter(|path| self.on_diagnostics_changed(path))
            .count()
    }

    /// Paths whose markers are currently tracked as applied, sorted.
    pub fn applied_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().applied.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn apply(
        &self,
        state: &mut MarkerState,
        path: &str,
        buffer: BufferHandle,
        list: DiagnosticList,
    ) {
        let line_count = self.host.line_count(buffer);
        let markers: Vec<MarkerDescriptor> = list
            .iter()
            .map(|d| MarkerDescriptor::from_diagnostic(d, line_count))
            .collect();

        match self.host.set_markers(buffer, &self.owner, &markers) {
            Ok(()) => {
                tracing::debug!(path, markers = markers.len(), "markers synchronized");
                state
                    .applied
                    .insert(path.to_string(), AppliedMarkers { buffer, list });
            }
            Err(error) => {
                // Forget the record so the next event retries.
                tracing::warn!(path, %error, "failed to apply markers");
                state.applied.remove(path);
            }
        }
    }
}
