//! Overlay managers: per-(editor, overlay kind) controllers that keep host decorations in sync
//! with their state sources.
//!
//! An [`OverlayManager`] is a two-state machine, `Detached → Attached → Detached`:
//!
//! - [`attach`](OverlayManager::attach) binds the manager to an editor pane and file path,
//!   subscribes to every [`EventTopic`] the overlay kind depends on and renders once. Attaching
//!   an attached manager detaches it first.
//! - [`detach`](OverlayManager::detach) clears the decorations it applied (by handle), drops
//!   every subscription and forgets the binding. It is idempotent.
//! - [`refresh`](OverlayManager::refresh) forces one render pass.
//!
//! What gets rendered is decided by an [`OverlayRenderer`]; see [`GutterChangeOverlay`],
//! [`InlineBlameOverlay`] and [`InlineDiagnosticsOverlay`]. Every render pass replaces the full
//! decoration set of the manager through a single [`HostEditor::set_decorations`] call.
//!
//! Rendering is best effort: host failures are logged and swallowed, and the manager then
//! treats its decoration list as empty.

mod blame;
mod diagnostics;
mod gutter;

pub use blame::InlineBlameOverlay;
pub use diagnostics::InlineDiagnosticsOverlay;
pub use gutter::GutterChangeOverlay;

use crate::blame::VcsState;
use crate::buffers::BufferTextStore;
use crate::diagnostics::DiagnosticsIndex;
use crate::events::{EventBus, EventTopic, OverlayEvent, SubscriptionToken};
use crate::host::{DecorationDescriptor, DecorationHandle, EditorHandle, HostEditor};
use crate::settings::{OverlaySettings, SettingsStore};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// The overlay categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Added/modified bars in the gutter.
    GutterChange,
    /// After-line blame attribution.
    InlineBlame,
    /// After-line diagnostic messages.
    InlineDiagnostic,
}

impl OverlayKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GutterChange => "gutter-change",
            Self::InlineBlame => "inline-blame",
            Self::InlineDiagnostic => "inline-diagnostic",
        }
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared state containers and the host adapter, injected into every manager.
#[derive(Clone)]
pub struct OverlaySources {
    /// Event bus all containers publish on.
    pub bus: Arc<EventBus>,
    /// User settings.
    pub settings: Arc<SettingsStore>,
    /// Diagnostics index.
    pub diagnostics: Arc<DiagnosticsIndex>,
    /// Blame cache + branch identity.
    pub vcs: Arc<VcsState>,
    /// Current/reference texts.
    pub buffers: Arc<BufferTextStore>,
    /// Host editor adapter.
    pub host: Arc<dyn HostEditor>,
}

impl OverlaySources {
    /// Create fresh containers around `host`, all publishing on one new bus.
    pub fn new(host: Arc<dyn HostEditor>, settings: OverlaySettings) -> Self {
        let bus = Arc::new(EventBus::new());
        Self {
            settings: Arc::new(SettingsStore::new(settings, Arc::clone(&bus))),
            diagnostics: Arc::new(DiagnosticsIndex::new(Arc::clone(&bus))),
            vcs: Arc::new(VcsState::new(Arc::clone(&bus))),
            buffers: Arc::new(BufferTextStore::new(Arc::clone(&bus))),
            bus,
            host,
        }
    }

    /// Current line count of `path`: the host's view if it has one, else the text store's.
    pub fn line_count(&self, path: &str) -> Option<usize> {
        self.host
            .model_for_path(path)
            .and_then(|buffer| self.host.line_count(buffer))
            .or_else(|| self.buffers.line_count(path))
    }
}

impl std::fmt::Debug for OverlaySources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySources")
            .field("bus", &self.bus)
            .field("diagnostics", &self.diagnostics)
            .field("vcs", &self.vcs)
            .field("buffers", &self.buffers)
            .finish_non_exhaustive()
    }
}

/// What a manager is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBinding {
    /// Host editor pane.
    pub editor: EditorHandle,
    /// File path of the buffer shown in the pane.
    pub path: String,
    /// Optional caller-defined context (e.g. split-view id), carried for logging.
    pub context_key: Option<String>,
}

/// Inputs of one render pass.
pub struct RenderContext<'a> {
    /// Binding being rendered.
    pub binding: &'a BufferBinding,
    /// Shared sources.
    pub sources: &'a OverlaySources,
    /// Settings snapshot taken at the start of the pass.
    pub settings: &'a OverlaySettings,
}

/// Rendering rule of one overlay kind.
pub trait OverlayRenderer: Send + 'static {
    /// Overlay kind.
    fn kind(&self) -> OverlayKind;

    /// Topics whose events trigger a render pass.
    fn dependencies(&self) -> &'static [EventTopic];

    /// Build the complete decoration set for the binding. An empty set clears the overlay.
    fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<DecorationDescriptor>;

    /// Called when the manager detaches; drop any per-binding cache here.
    fn reset(&mut self) {}
}

/// Runtime record of one attachment.
#[derive(Debug)]
struct OverlayAttachment {
    binding: BufferBinding,
    decorations: Vec<DecorationHandle>,
    subscriptions: Vec<SubscriptionToken>,
}

struct ManagerState<R> {
    renderer: R,
    attachment: Option<OverlayAttachment>,
    render_count: u64,
}

struct ManagerInner<R> {
    sources: OverlaySources,
    state: Mutex<ManagerState<R>>,
}

impl<R: OverlayRenderer> ManagerInner<R> {
    fn render_pass(&self, state: &mut ManagerState<R>) {
        let Some(attachment) = state.attachment.as_mut() else {
            return;
        };

        let settings = self.sources.settings.get();
        let decorations = state.renderer.render(&RenderContext {
            binding: &attachment.binding,
            sources: &self.sources,
            settings: &settings,
        });

        let kind = state.renderer.kind();
        tracing::trace!(
            %kind,
            path = %attachment.binding.path,
            decorations = decorations.len(),
            "overlay render pass"
        );

        match self.sources.host.set_decorations(
            attachment.binding.editor,
            &attachment.decorations,
            &decorations,
        ) {
            Ok(handles) => attachment.decorations = handles,
            Err(error) => {
                tracing::debug!(
                    %kind,
                    path = %attachment.binding.path,
                    context = ?attachment.binding.context_key,
                    %error,
                    "decoration update failed; treating overlay as cleared"
                );
                attachment.decorations.clear();
            }
        }
        state.render_count = state.render_count.saturating_add(1);
    }

    fn handle_event(&self, event: &OverlayEvent) {
        let mut state = self.state.lock();
        let Some(attachment) = state.attachment.as_ref() else {
            // Delivered after detach.
            return;
        };
        if event
            .path()
            .is_some_and(|path| path != attachment.binding.path)
        {
            return;
        }
        self.render_pass(&mut state);
    }

    fn detach_locked(&self, state: &mut ManagerState<R>) -> bool {
        let Some(attachment) = state.attachment.take() else {
            return false;
        };

        for token in &attachment.subscriptions {
            self.sources.bus.unsubscribe(*token);
        }

        if !attachment.decorations.is_empty()
            && let Err(error) = self.sources.host.set_decorations(
                attachment.binding.editor,
                &attachment.decorations,
                &[],
            )
        {
            // A disposed editor took its decorations with it.
            tracing::debug!(
                kind = %state.renderer.kind(),
                path = %attachment.binding.path,
                %error,
                "clearing decorations on detach failed"
            );
        }

        state.renderer.reset();
        true
    }
}

/// Controller for one overlay kind on one editor pane.
///
/// Managers are plain objects owned by whoever owns the pane; dropping one detaches it.
pub struct OverlayManager<R: OverlayRenderer> {
    inner: Arc<ManagerInner<R>>,
}

impl<R: OverlayRenderer> OverlayManager<R> {
    /// Create a detached manager.
    pub fn new(sources: OverlaySources, renderer: R) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                sources,
                state: Mutex::new(ManagerState {
                    renderer,
                    attachment: None,
                    render_count: 0,
                }),
            }),
        }
    }

    /// Bind to `editor` showing `path`, subscribe to the renderer's dependencies and render once.
    ///
    /// An existing binding is fully detached first.
    pub fn attach(&self, editor: EditorHandle, path: &str, context_key: Option<String>) {
        let mut state = self.inner.state.lock();
        if self.inner.detach_locked(&mut state) {
            tracing::debug!(kind = %state.renderer.kind(), "re-attach: previous binding detached");
        }

        let subscriptions: Vec<SubscriptionToken> = state
            .renderer
            .dependencies()
            .iter()
            .map(|&topic| {
                let weak: Weak<ManagerInner<R>> = Arc::downgrade(&self.inner);
                self.inner.sources.bus.subscribe(topic, move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_event(event);
                    }
                })
            })
            .collect();

        state.attachment = Some(OverlayAttachment {
            binding: BufferBinding {
                editor,
                path: path.to_string(),
                context_key,
            },
            decorations: Vec::new(),
            subscriptions,
        });
        self.inner.render_pass(&mut state);
    }

    /// Clear decorations, unsubscribe and forget the binding. No-op when detached.
    pub fn detach(&self) {
        let mut state = self.inner.state.lock();
        self.inner.detach_locked(&mut state);
    }

    /// Force one render pass. No-op when detached.
    pub fn refresh(&self) {
        let mut state = self.inner.state.lock();
        self.inner.render_pass(&mut state);
    }

    /// `true` while attached.
    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().attachment.is_some()
    }

    /// Overlay kind of this manager.
    pub fn kind(&self) -> OverlayKind {
        self.inner.state.lock().renderer.kind()
    }

    /// Current binding, if attached.
    pub fn binding(&self) -> Option<BufferBinding> {
        self.inner
            .state
            .lock()
            .attachment
            .as_ref()
            .map(|a| a.binding.clone())
    }

    /// Handles of the decorations currently applied by this manager.
    pub fn decoration_handles(&self) -> Vec<DecorationHandle> {
        self.inner
            .state
            .lock()
            .attachment
            .as_ref()
            .map(|a| a.decorations.clone())
            .unwrap_or_default()
    }

    /// Number of subscriptions held by the current attachment.
    pub fn subscription_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .attachment
            .as_ref()
            .map_or(0, |a| a.subscriptions.len())
    }

    /// Total render passes performed over the manager's lifetime.
    pub fn render_count(&self) -> u64 {
        self.inner.state.lock().render_count
    }

    /// Read renderer state (e.g. the gutter's last diff result).
    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.inner.state.lock().renderer)
    }
}

impl<R: OverlayRenderer> Drop for OverlayManager<R> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<R: OverlayRenderer> std::fmt::Debug for OverlayManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("OverlayManager")
            .field("kind", &state.renderer.kind())
            .field("attachment", &state.attachment)
            .field("render_count", &state.render_count)
            .finish()
    }
}
