mod common;

use common::{FakeHost, diagnostic};
use editor_overlay::{
    DecorationClass, DiagnosticSeverity, EditorHandle, HostEditor, InlineDiagnosticsOverlay,
    OverlayManager, OverlaySettings, OverlaySources, SeverityFilter,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PATH: &str = "/src/eval.rs";
const EDITOR: EditorHandle = EditorHandle(11);

fn setup() -> (Arc<FakeHost>, OverlaySources, OverlayManager<InlineDiagnosticsOverlay>) {
    let host = Arc::new(FakeHost::new());
    let sources = OverlaySources::new(
        Arc::clone(&host) as Arc<dyn HostEditor>,
        OverlaySettings::default(),
    );
    sources.buffers.open(PATH, "l1\nl2\nl3\nl4\nl5\n", None);
    let manager = OverlayManager::new(sources.clone(), InlineDiagnosticsOverlay::new());
    manager.attach(EDITOR, PATH, None);
    (host, sources, manager)
}

#[test]
fn test_no_diagnostics_renders_nothing() {
    let (host, _sources, manager) = setup();
    assert_eq!(manager.render_count(), 1);
    assert_eq!(host.live_count(EDITOR), 0);
}

#[test]
fn test_error_wins_over_warning_on_same_line() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![
            diagnostic("w", PATH, DiagnosticSeverity::Warning, 3, "unused variable"),
            diagnostic("e", PATH, DiagnosticSeverity::Error, 3, "type mismatch"),
        ],
    );

    let live = host.live_decorations(EDITOR);
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].line, 3);
    assert_eq!(
        live[0].class,
        DecorationClass::InlineDiagnostic(DiagnosticSeverity::Error)
    );
    assert_eq!(live[0].text.as_deref(), Some("type mismatch (+1 more)"));
    assert_eq!(
        live[0].hover.as_deref(),
        Some("[warning] unused variable\n[error] type mismatch")
    );
}

#[test]
fn test_first_seen_wins_ties() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![
            diagnostic("a", PATH, DiagnosticSeverity::Warning, 1, "first"),
            diagnostic("b", PATH, DiagnosticSeverity::Warning, 1, "second"),
            diagnostic("c", PATH, DiagnosticSeverity::Warning, 2, "other line"),
        ],
    );

    let texts: Vec<(usize, Option<String>)> = host
        .live_decorations(EDITOR)
        .into_iter()
        .map(|d| (d.line, d.text))
        .collect();
    assert_eq!(
        texts,
        vec![
            (1, Some("first (+1 more)".to_string())),
            (2, Some("other line".to_string())),
        ]
    );
}

#[test]
fn test_long_and_multiline_messages_are_shortened() {
    let (host, sources, _manager) = setup();
    sources.settings.update(|s| s.inline_diagnostic_max_length = 12);
    sources.diagnostics.replace(
        PATH,
        vec![
            diagnostic(
                "long",
                PATH,
                DiagnosticSeverity::Error,
                1,
                "mismatched types: expected u32",
            ),
            diagnostic(
                "multi",
                PATH,
                DiagnosticSeverity::Error,
                2,
                "borrow error\nnote: value moved here",
            ),
        ],
    );

    let live = host.live_decorations(EDITOR);
    assert_eq!(live[0].text.as_deref(), Some("mismatched …"));
    assert_eq!(live[1].text.as_deref(), Some("borrow error"));
    assert_eq!(
        live[1].hover.as_deref(),
        Some("[error] borrow error\nnote: value moved here")
    );
}

#[test]
fn test_severity_filter() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![
            diagnostic("h", PATH, DiagnosticSeverity::Hint, 1, "consider this"),
            diagnostic("i", PATH, DiagnosticSeverity::Information, 2, "fyi"),
            diagnostic("w", PATH, DiagnosticSeverity::Warning, 3, "careful"),
        ],
    );
    // Default filter: errors and warnings only.
    let lines: Vec<usize> = host
        .live_decorations(EDITOR)
        .iter()
        .map(|d| d.line)
        .collect();
    assert_eq!(lines, vec![3]);

    sources
        .settings
        .update(|s| s.inline_diagnostic_severities = SeverityFilter::all());
    assert_eq!(host.live_count(EDITOR), 3);

    sources
        .settings
        .update(|s| s.inline_diagnostic_severities = SeverityFilter::none());
    assert_eq!(host.live_count(EDITOR), 0);
}

#[test]
fn test_lines_outside_buffer_are_skipped() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![
            diagnostic("in", PATH, DiagnosticSeverity::Error, 5, "last line"),
            diagnostic("out", PATH, DiagnosticSeverity::Error, 9, "stale"),
            diagnostic("zero", PATH, DiagnosticSeverity::Error, 0, "bogus"),
        ],
    );
    let lines: Vec<usize> = host
        .live_decorations(EDITOR)
        .iter()
        .map(|d| d.line)
        .collect();
    assert_eq!(lines, vec![5]);

    // Growing the buffer brings the stale diagnostic back into range.
    sources
        .buffers
        .set_current(PATH, "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9\n");
    assert_eq!(host.live_count(EDITOR), 2);
}

#[test]
fn test_host_line_count_takes_precedence() {
    let (host, sources, manager) = setup();
    host.open_model(PATH, 2);
    sources.diagnostics.replace(
        PATH,
        vec![diagnostic("e", PATH, DiagnosticSeverity::Error, 4, "beyond host model")],
    );
    assert_eq!(host.live_count(EDITOR), 0);
    assert_eq!(manager.render_count(), 2);
}

#[test]
fn test_clearing_file_removes_messages() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![diagnostic("e", PATH, DiagnosticSeverity::Error, 1, "boom")],
    );
    assert_eq!(host.live_count(EDITOR), 1);

    sources.diagnostics.clear_file(PATH);
    assert_eq!(host.live_count(EDITOR), 0);
}

#[test]
fn test_disabled_setting() {
    let (host, sources, _manager) = setup();
    sources.diagnostics.replace(
        PATH,
        vec![diagnostic("e", PATH, DiagnosticSeverity::Error, 1, "boom")],
    );
    sources
        .settings
        .update(|s| s.inline_diagnostics_enabled = false);
    assert_eq!(host.live_count(EDITOR), 0);
}
