//! Writes parsed LSP diagnostics into the index.

use crate::publish::{
    LspIngestError, PUBLISH_DIAGNOSTICS_METHOD, PublishDiagnostics, parse_publish_diagnostics,
};
use editor_overlay::DiagnosticsIndex;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The designated writer of a [`DiagnosticsIndex`] for language-server diagnostics.
///
/// Publishes are applied in arrival order. A publish whose document version is older than the
/// last applied version of the same file is dropped. The version lock is held while the index is
/// updated, so index subscribers must not call back into the ingest.
pub struct LspDiagnosticsIngest {
    index: Arc<DiagnosticsIndex>,
    versions: Mutex<HashMap<String, i64>>,
}

impl std::fmt::Debug for LspDiagnosticsIngest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LspDiagnosticsIngest")
            .field("index", &self.index)
            .field("versions", &*self.versions.lock())
            .finish()
    }
}

impl LspDiagnosticsIngest {
    /// Create an ingest writing into `index`.
    pub fn new(index: Arc<DiagnosticsIndex>) -> Self {
        Self {
            index,
            versions: Mutex::new(HashMap::new()),
        }
    }

    /// The index written to.
    pub fn index(&self) -> &Arc<DiagnosticsIndex> {
        &self.index
    }

    /// Apply a parsed publish. Returns `false` if it was dropped as stale.
    pub fn apply(&self, publish: PublishDiagnostics) -> bool {
        let mut versions = self.versions.lock();
        if let Some(version) = publish.version {
            if let Some(&last) = versions.get(&publish.path)
                && version < last
            {
                tracing::debug!(
                    path = %publish.path,
                    version,
                    last,
                    "dropping stale diagnostics publish"
                );
                return false;
            }
            versions.insert(publish.path.clone(), version);
        }

        self.index.replace(&publish.path, publish.diagnostics);
        true
    }

    /// Handle a server notification by method name.
    ///
    /// Returns `Ok(true)` if the index was updated, `Ok(false)` for other methods and stale
    /// publishes.
    pub fn handle_notification(
        &self,
        method: &str,
        params: &Value,
    ) -> Result<bool, LspIngestError> {
        if method != PUBLISH_DIAGNOSTICS_METHOD {
            return Ok(false);
        }
        let publish = parse_publish_diagnostics(params).inspect_err(|error| {
            tracing::warn!(method, %error, "unparsable diagnostics notification");
        })?;
        Ok(self.apply(publish))
    }

    /// Handle a raw JSON-RPC message. Requests and responses (anything with an `id`) are ignored.
    pub fn handle_message(&self, message: &Value) -> Result<bool, LspIngestError> {
        if message.get("id").is_some() {
            return Ok(false);
        }
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return Ok(false);
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);
        self.handle_notification(method, &params)
    }

    /// Forget the version record of `path` (e.g. after `didClose`, when versions restart).
    pub fn forget(&self, path: &str) {
        self.versions.lock().remove(path);
    }

    /// Last applied document version of `path`.
    pub fn last_version(&self, path: &str) -> Option<i64> {
        self.versions.lock().get(path).copied()
    }
}
