//! Current text and reference snapshot per open file.
//!
//! The host pushes buffer edits and reference snapshots (e.g. the `HEAD` version of a file) into
//! the [`BufferTextStore`]; overlays read both sides and recompute the line diff on demand.

use crate::events::{EventBus, OverlayEvent};
use crate::line_diff::{LineDiffResult, LineDiffStrategy, line_count};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Both sides of a file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferTexts {
    /// Current buffer text.
    pub current: Arc<str>,
    /// Reference snapshot, if the file is tracked.
    pub reference: Option<Arc<str>>,
}

/// Path-keyed store of [`BufferTexts`].
pub struct BufferTextStore {
    buffers: RwLock<HashMap<String, BufferTexts>>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for BufferTextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferTextStore")
            .field("buffers", &self.buffers.read().len())
            .finish()
    }
}

impl BufferTextStore {
    /// Create an empty store publishing change events on `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Register (or overwrite) a file. Publishes nothing: the caller attaches overlays right
    /// after, and attach performs its own render pass.
    pub fn open(&self, path: &str, current: &str, reference: Option<&str>) {
        self.buffers.write().insert(
            path.to_string(),
            BufferTexts {
                current: Arc::from(current),
                reference: reference.map(Arc::from),
            },
        );
    }

    /// Forget a file. Returns `false` if it was not open.
    pub fn close(&self, path: &str) -> bool {
        self.buffers.write().remove(path).is_some()
    }

    /// `true` if `path` is open.
    pub fn contains(&self, path: &str) -> bool {
        self.buffers.read().contains_key(path)
    }

    /// Replace the current text of an open file.
    ///
    /// Publishes `BufferEdited` only if the text actually changed. Returns whether it did.
    pub fn set_current(&self, path: &str, text: &str) -> bool {
        {
            let mut buffers = self.buffers.write();
            let Some(entry) = buffers.get_mut(path) else {
                tracing::debug!(path, "edit for a buffer that is not open");
                return false;
            };
            if &*entry.current == text {
                return false;
            }
            entry.current = Arc::from(text);
        }
        self.bus.publish(&OverlayEvent::BufferEdited {
            path: path.to_string(),
        });
        true
    }

    /// Replace the reference snapshot of an open file (`None` for untracked files).
    pub fn set_reference(&self, path: &str, reference: Option<&str>) -> bool {
        {
            let mut buffers = self.buffers.write();
            let Some(entry) = buffers.get_mut(path) else {
                return false;
            };
            if entry.reference.as_deref() == reference {
                return false;
            }
            entry.reference = reference.map(Arc::from);
        }
        self.bus.publish(&OverlayEvent::ReferenceChanged {
            path: path.to_string(),
        });
        true
    }

    /// Snapshot of both sides of `path`.
    pub fn texts(&self, path: &str) -> Option<BufferTexts> {
        self.buffers.read().get(path).cloned()
    }

    /// Line count of the current text of `path`.
    pub fn line_count(&self, path: &str) -> Option<usize> {
        self.buffers
            .read()
            .get(path)
            .map(|entry| line_count(&entry.current))
    }

    /// Line diff of `path` (reference → current), recomputed on every call.
    ///
    /// `None` if the file is not open or has no reference snapshot.
    pub fn line_diff(&self, path: &str, strategy: LineDiffStrategy) -> Option<LineDiffResult> {
        let texts = self.texts(path)?;
        let reference = texts.reference?;
        Some(strategy.compute(&reference, &texts.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_current_publishes_only_on_change() {
        let bus = Arc::new(EventBus::new());
        let edits = Arc::new(AtomicUsize::new(0));
        let edits_clone = Arc::clone(&edits);
        bus.subscribe(EventTopic::BufferEdited, move |_| {
            edits_clone.fetch_add(1, Ordering::SeqCst);
        });

        let store = BufferTextStore::new(Arc::clone(&bus));
        store.open("/a.rs", "a\n", Some("a\n"));
        assert!(!store.set_current("/a.rs", "a\n"));
        assert!(store.set_current("/a.rs", "a\nb\n"));
        assert!(!store.set_current("/missing", "x"));
        assert_eq!(edits.load(Ordering::SeqCst), 1);
        assert_eq!(store.line_count("/a.rs"), Some(2));
    }

    #[test]
    fn test_line_diff_requires_reference() {
        let store = BufferTextStore::new(Arc::new(EventBus::new()));
        store.open("/a.rs", "a\nb\n", None);
        assert!(store.line_diff("/a.rs", LineDiffStrategy::Myers).is_none());

        store.set_reference("/a.rs", Some("a\n"));
        let diff = store.line_diff("/a.rs", LineDiffStrategy::Myers).unwrap();
        assert_eq!(diff.added_count, 1);
    }
}
