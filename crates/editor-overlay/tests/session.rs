mod common;

use common::{FakeHost, diagnostic};
use editor_overlay::{
    DEFAULT_MARKER_OWNER, DecorationClass, DiagnosticSeverity, EditorHandle, HostEditor,
    OverlaySession, OverlaySettings, SessionError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const MAIN: &str = "/src/main.rs";
const LIB: &str = "/src/lib.rs";

fn session() -> (Arc<FakeHost>, OverlaySession) {
    let host = Arc::new(FakeHost::new());
    let session = OverlaySession::new(
        Arc::clone(&host) as Arc<dyn HostEditor>,
        OverlaySettings::default(),
    );
    (host, session)
}

#[test]
fn test_open_pane_attaches_every_overlay() {
    let (host, mut session) = session();
    host.open_model(MAIN, 3);
    let editor = EditorHandle(1);

    let pane = session.open_pane(editor, MAIN, "a\nX\nc\n", Some("a\nb\nc\n"));

    let overlays = session.pane(pane).unwrap();
    assert_eq!(overlays.editor(), editor);
    assert_eq!(overlays.path(), MAIN);
    assert!(overlays.gutter.is_attached());
    assert!(overlays.blame.is_attached());
    assert!(overlays.diagnostics.is_attached());
    assert_eq!(
        overlays.gutter.binding().and_then(|b| b.context_key),
        Some(format!("pane-{}", pane.get()))
    );

    let live = host.live_decorations(editor);
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].class, DecorationClass::GutterModified);
    assert_eq!(session.markers().applied_paths(), vec![MAIN.to_string()]);
}

#[test]
fn test_edits_flow_to_every_pane_on_the_file() {
    let (host, mut session) = session();
    let left = session.open_pane(EditorHandle(1), MAIN, "a\n", Some("a\n"));
    let right = session.open_pane(EditorHandle(2), MAIN, "a\n", Some("a\n"));
    assert_eq!(session.panes_for_path(MAIN), vec![left, right]);

    assert!(session.buffer_edited(MAIN, "a\nb\n"));
    assert_eq!(host.live_count(EditorHandle(1)), 1);
    assert_eq!(host.live_count(EditorHandle(2)), 1);

    session.close_pane(left).unwrap();
    assert_eq!(host.live_count(EditorHandle(1)), 0);
    assert_eq!(host.live_count(EditorHandle(2)), 1);
    // Still shown on the right.
    assert!(session.buffers().contains(MAIN));
}

#[test]
fn test_second_pane_without_reference_keeps_shared_reference() {
    let (host, mut session) = session();
    let left = session.open_pane(EditorHandle(1), MAIN, "a\nX\nc\n", Some("a\nb\nc\n"));
    assert_eq!(host.live_count(EditorHandle(1)), 1);

    let right = session.open_pane(EditorHandle(2), MAIN, "a\nX\nc\n", None);
    assert_eq!(session.panes_for_path(MAIN), vec![left, right]);
    assert_eq!(host.live_count(EditorHandle(1)), 1);
    assert_eq!(host.live_count(EditorHandle(2)), 1);
    assert_eq!(
        host.live_decorations(EditorHandle(2))[0].class,
        DecorationClass::GutterModified
    );

    // Untracking the file is explicit.
    assert!(session.buffers().set_reference(MAIN, None));
    assert_eq!(host.live_count(EditorHandle(1)), 0);
    assert_eq!(host.live_count(EditorHandle(2)), 0);
}

#[test]
fn test_close_last_pane_releases_file() {
    let (host, mut session) = session();
    host.open_model(MAIN, 1);
    let pane = session.open_pane(EditorHandle(1), MAIN, "a\n", None);
    session.diagnostics().replace(
        MAIN,
        vec![diagnostic("e", MAIN, DiagnosticSeverity::Error, 1, "boom")],
    );
    assert_eq!(host.live_count(EditorHandle(1)), 1);

    session.close_pane(pane).unwrap();
    assert_eq!(host.live_count(EditorHandle(1)), 0);
    assert!(!session.buffers().contains(MAIN));
    assert!(session.markers().applied_paths().is_empty());
    assert!(session.pane_ids().is_empty());

    assert_eq!(
        session.close_pane(pane),
        Err(SessionError::PaneNotFound(pane))
    );
}

#[test]
fn test_swap_pane_buffer() {
    let (host, mut session) = session();
    let editor = EditorHandle(1);
    let pane = session.open_pane(editor, MAIN, "a\nX\n", Some("a\nb\n"));
    assert_eq!(host.live_count(editor), 1);

    session
        .swap_pane_buffer(pane, editor, LIB, "pub fn f() {}\n", Some("pub fn f() {}\n"))
        .unwrap();

    let overlays = session.pane(pane).unwrap();
    assert_eq!(overlays.path(), LIB);
    assert_eq!(overlays.gutter.binding().map(|b| b.path), Some(LIB.to_string()));
    assert_eq!(host.live_count(editor), 0);
    assert!(!session.buffers().contains(MAIN));
    assert!(session.buffers().contains(LIB));

    // Edits of the old file no longer reach the pane.
    let renders = overlays.gutter.render_count();
    assert!(!session.buffer_edited(MAIN, "zzz\n"));
    assert_eq!(session.pane(pane).unwrap().gutter.render_count(), renders);

    let closed = session.open_pane(EditorHandle(2), MAIN, "", None);
    session.close_pane(closed).unwrap();
    assert_eq!(
        session.swap_pane_buffer(closed, editor, MAIN, "", None),
        Err(SessionError::PaneNotFound(closed))
    );
    assert_eq!(session.pane_ids(), vec![pane]);
}

#[test]
fn test_markers_follow_diagnostics_for_open_buffers() {
    let (host, mut session) = session();
    let buffer = host.open_model(MAIN, 4);
    session.open_pane(EditorHandle(1), MAIN, "a\nb\nc\nd\n", None);

    session.diagnostics().replace(
        MAIN,
        vec![
            diagnostic("e", MAIN, DiagnosticSeverity::Error, 2, "boom"),
            diagnostic("w", MAIN, DiagnosticSeverity::Warning, 3, "hmm"),
        ],
    );
    assert_eq!(
        host.markers(buffer, DEFAULT_MARKER_OWNER).map(|m| m.len()),
        Some(2)
    );

    session.diagnostics().clear_all();
    assert_eq!(host.markers(buffer, DEFAULT_MARKER_OWNER), Some(Vec::new()));
    assert_eq!(host.live_count(EditorHandle(1)), 0);
}

#[test]
fn test_refresh() {
    let (_host, mut session) = session();
    let pane = session.open_pane(EditorHandle(1), MAIN, "a\n", None);

    session.refresh_pane(pane).unwrap();
    session.refresh_all();
    let overlays = session.pane(pane).unwrap();
    assert_eq!(overlays.gutter.render_count(), 3);
    assert_eq!(overlays.blame.render_count(), 3);
    assert_eq!(overlays.diagnostics.render_count(), 3);
}

#[test]
fn test_drop_detaches_everything() {
    let (host, mut session) = session();
    let bus = Arc::clone(session.bus());
    session.open_pane(EditorHandle(1), MAIN, "a\nX\n", Some("a\nb\n"));
    session.open_pane(EditorHandle(2), LIB, "x\n", Some("y\n"));
    assert!(bus.subscriber_count() > 0);

    drop(session);
    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(host.live_count(EditorHandle(1)), 0);
    assert_eq!(host.live_count(EditorHandle(2)), 0);
}
