//! Version-control state consumed by the inline blame overlay.
//!
//! Blame is only valid against the snapshot it was computed from (usually `HEAD`). The
//! [`VcsState`] container caches one blame list per file and drops every cached list when the
//! branch identity changes.

use crate::events::{EventBus, OverlayEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-line attribution for one line of the blamed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameEntry {
    /// 1-based line number in the blamed (reference) snapshot.
    pub line: usize,
    /// Full commit id.
    pub commit: String,
    /// Author name.
    pub author: String,
    /// Author time, in seconds since the unix epoch.
    pub timestamp: i64,
    /// First line of the commit message.
    pub summary: String,
}

impl BlameEntry {
    /// `true` for lines attributed to the working tree rather than a commit
    /// (git reports these with an all-zero commit id).
    pub fn is_uncommitted(&self) -> bool {
        !self.commit.is_empty() && self.commit.bytes().all(|b| b == b'0')
    }

    /// Abbreviated commit id (first 8 characters).
    pub fn short_commit(&self) -> &str {
        let end = self
            .commit
            .char_indices()
            .nth(8)
            .map_or(self.commit.len(), |(idx, _)| idx);
        &self.commit[..end]
    }
}

#[derive(Debug, Default)]
struct VcsInner {
    branch: Option<String>,
    blame: HashMap<String, Arc<[BlameEntry]>>,
}

/// Blame cache plus branch identity.
pub struct VcsState {
    inner: RwLock<VcsInner>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for VcsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("VcsState")
            .field("branch", &inner.branch)
            .field("blamed_files", &inner.blame.len())
            .finish()
    }
}

impl VcsState {
    /// Create an empty state publishing change events on `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            inner: RwLock::new(VcsInner::default()),
            bus,
        }
    }

    /// Current branch identity (`None` for detached/unknown).
    pub fn branch(&self) -> Option<String> {
        self.inner.read().branch.clone()
    }

    /// Update the branch identity.
    ///
    /// A switch drops every cached blame list and publishes a single `BranchChanged` event.
    /// Returns `false` (and publishes nothing) if the branch did not change.
    pub fn set_branch(&self, branch: Option<String>) -> bool {
        {
            let mut inner = self.inner.write();
            if inner.branch == branch {
                return false;
            }
            tracing::debug!(from = ?inner.branch, to = ?branch, "branch switched");
            inner.branch = branch;
            inner.blame.clear();
        }
        self.bus.publish(&OverlayEvent::BranchChanged);
        true
    }

    /// Store the blame list for `path`, replacing any previous list.
    pub fn set_blame(&self, path: &str, mut entries: Vec<BlameEntry>) {
        entries.sort_by_key(|e| e.line);
        self.inner
            .write()
            .blame
            .insert(path.to_string(), Arc::from(entries));
        self.bus.publish(&OverlayEvent::BlameChanged {
            path: path.to_string(),
        });
    }

    /// Drop the cached blame list for `path`.
    pub fn invalidate(&self, path: &str) {
        let removed = self.inner.write().blame.remove(path).is_some();
        if removed {
            self.bus.publish(&OverlayEvent::BlameChanged {
                path: path.to_string(),
            });
        }
    }

    /// Cached blame list for `path`, sorted by line.
    pub fn blame_for_file(&self, path: &str) -> Option<Arc<[BlameEntry]>> {
        self.inner.read().blame.get(path).cloned()
    }
}
