#![allow(dead_code)]

use editor_overlay::{
    BufferHandle, DecorationDescriptor, DecorationHandle, Diagnostic, DiagnosticSeverity,
    EditorHandle, HostEditor, HostError, MarkerDescriptor,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct DecorationCall {
    pub editor: EditorHandle,
    pub previous: Vec<DecorationHandle>,
    pub decorations: Vec<DecorationDescriptor>,
}

#[derive(Debug, Clone)]
pub struct MarkerCall {
    pub buffer: BufferHandle,
    pub owner: String,
    pub markers: Vec<MarkerDescriptor>,
}

#[derive(Default)]
struct FakeHostState {
    next_id: u64,
    models: HashMap<String, BufferHandle>,
    line_counts: HashMap<BufferHandle, usize>,
    disposed_editors: HashSet<EditorHandle>,
    live: HashMap<EditorHandle, BTreeMap<DecorationHandle, DecorationDescriptor>>,
    markers: HashMap<(BufferHandle, String), Vec<MarkerDescriptor>>,
    decoration_calls: Vec<DecorationCall>,
    marker_calls: Vec<MarkerCall>,
    reject_markers: bool,
}

/// In-memory host that records every call and tracks live decorations per editor.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<FakeHostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_model(&self, path: &str, line_count: usize) -> BufferHandle {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let handle = BufferHandle(state.next_id);
        state.models.insert(path.to_string(), handle);
        state.line_counts.insert(handle, line_count);
        handle
    }

    pub fn close_model(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(handle) = state.models.remove(path) {
            state.line_counts.remove(&handle);
        }
    }

    pub fn set_line_count(&self, buffer: BufferHandle, line_count: usize) {
        self.state
            .lock()
            .unwrap()
            .line_counts
            .insert(buffer, line_count);
    }

    pub fn dispose_editor(&self, editor: EditorHandle) {
        let mut state = self.state.lock().unwrap();
        state.disposed_editors.insert(editor);
        state.live.remove(&editor);
    }

    pub fn reject_markers(&self, reject: bool) {
        self.state.lock().unwrap().reject_markers = reject;
    }

    /// Live decorations of `editor`, sorted by line.
    pub fn live_decorations(&self, editor: EditorHandle) -> Vec<DecorationDescriptor> {
        let state = self.state.lock().unwrap();
        let mut out: Vec<DecorationDescriptor> = state
            .live
            .get(&editor)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by_key(|d| d.line);
        out
    }

    pub fn live_count(&self, editor: EditorHandle) -> usize {
        self.state
            .lock()
            .unwrap()
            .live
            .get(&editor)
            .map_or(0, |m| m.len())
    }

    pub fn decoration_calls(&self) -> Vec<DecorationCall> {
        self.state.lock().unwrap().decoration_calls.clone()
    }

    pub fn decoration_call_count(&self) -> usize {
        self.state.lock().unwrap().decoration_calls.len()
    }

    pub fn marker_calls(&self) -> Vec<MarkerCall> {
        self.state.lock().unwrap().marker_calls.clone()
    }

    pub fn markers(&self, buffer: BufferHandle, owner: &str) -> Option<Vec<MarkerDescriptor>> {
        self.state
            .lock()
            .unwrap()
            .markers
            .get(&(buffer, owner.to_string()))
            .cloned()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.decoration_calls.clear();
        state.marker_calls.clear();
    }
}

impl HostEditor for FakeHost {
    fn set_decorations(
        &self,
        editor: EditorHandle,
        previous: &[DecorationHandle],
        decorations: &[DecorationDescriptor],
    ) -> Result<Vec<DecorationHandle>, HostError> {
        let mut state = self.state.lock().unwrap();
        state.decoration_calls.push(DecorationCall {
            editor,
            previous: previous.to_vec(),
            decorations: decorations.to_vec(),
        });
        if state.disposed_editors.contains(&editor) {
            return Err(HostError::EditorDisposed(editor));
        }

        let mut next_id = state.next_id;
        let live = state.live.entry(editor).or_default();
        for handle in previous {
            live.remove(handle);
        }
        let mut handles = Vec::with_capacity(decorations.len());
        for decoration in decorations {
            next_id += 1;
            let handle = DecorationHandle(next_id);
            live.insert(handle, decoration.clone());
            handles.push(handle);
        }
        state.next_id = next_id;
        Ok(handles)
    }

    fn set_markers(
        &self,
        buffer: BufferHandle,
        owner: &str,
        markers: &[MarkerDescriptor],
    ) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        state.marker_calls.push(MarkerCall {
            buffer,
            owner: owner.to_string(),
            markers: markers.to_vec(),
        });
        if state.reject_markers {
            return Err(HostError::Rejected("markers disabled".to_string()));
        }
        state
            .markers
            .insert((buffer, owner.to_string()), markers.to_vec());
        Ok(())
    }

    fn model_for_path(&self, path: &str) -> Option<BufferHandle> {
        self.state.lock().unwrap().models.get(path).copied()
    }

    fn line_count(&self, buffer: BufferHandle) -> Option<usize> {
        self.state.lock().unwrap().line_counts.get(&buffer).copied()
    }
}

pub fn diagnostic(
    id: &str,
    path: &str,
    severity: DiagnosticSeverity,
    line: usize,
    message: &str,
) -> Diagnostic {
    Diagnostic {
        id: id.to_string(),
        file_path: path.to_string(),
        severity,
        message: message.to_string(),
        source: "unit-test".to_string(),
        code: None,
        start_line: line,
        start_column: 1,
        end_line: line,
        end_column: 5,
    }
}
