#![warn(missing_docs)]
//! `editor-overlay-lsp` - LSP diagnostics ingestion for `editor-overlay`.
//!
//! This crate turns `textDocument/publishDiagnostics` notifications into
//! [`editor_overlay::Diagnostic`] records and writes them into an
//! [`editor_overlay::DiagnosticsIndex`]. It does not spawn or talk to language servers; the host
//! forwards the JSON-RPC messages it already receives.
//!
//! ```rust
//! use editor_overlay::{DiagnosticsIndex, EventBus};
//! use editor_overlay_lsp::LspDiagnosticsIngest;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let index = Arc::new(DiagnosticsIndex::new(Arc::new(EventBus::new())));
//! let ingest = LspDiagnosticsIngest::new(Arc::clone(&index));
//!
//! let applied = ingest
//!     .handle_notification(
//!         "textDocument/publishDiagnostics",
//!         &json!({
//!             "uri": "file:///src/main.rs",
//!             "diagnostics": [{
//!                 "range": {
//!                     "start": { "line": 0, "character": 4 },
//!                     "end": { "line": 0, "character": 8 }
//!                 },
//!                 "message": "unused variable"
//!             }]
//!         }),
//!     )
//!     .unwrap();
//!
//! assert!(applied);
//! assert_eq!(index.diagnostics_for_file("/src/main.rs")[0].start_line, 1);
//! ```

pub mod ingest;
pub mod lsp_uri;
pub mod publish;

pub use ingest::LspDiagnosticsIngest;
pub use lsp_uri::{file_uri_to_path, percent_decode_path, uri_to_path_key};
pub use publish::{
    LspIngestError, PUBLISH_DIAGNOSTICS_METHOD, PublishDiagnostics, parse_publish_diagnostics,
};
