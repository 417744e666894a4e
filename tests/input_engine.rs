mod support;

use loo_tui::{InputEngine, Submission};
use pretty_assertions::assert_eq;
use support::{FakeSource, ScriptedTerminal};

fn run(chunks: &[&[u8]]) -> (Submission, ScriptedTerminal) {
    let mut engine = InputEngine::new(ScriptedTerminal::new(chunks), "> ");
    let submission = engine
        .read_submission(&FakeSource::new())
        .expect("scripted terminal never fails");
    let terminal = std::mem::take(engine.terminal_mut());
    (submission, terminal)
}

#[test]
fn enter_submits_trimmed_line() {
    let (submission, terminal) = run(&[b"  hello  ", b"\r"]);
    assert_eq!(submission, Submission::Line("hello".to_string()));
    assert_eq!(terminal.starts, 1);
    assert_eq!(terminal.stops, 1);
    assert!(terminal.output().ends_with("\r\n"));
}

#[test]
fn tab_drills_into_directories_and_completes_files() {
    let (submission, terminal) = run(&[b"@s", b"\t", b"e", b"\t", b"\r"]);
    assert_eq!(submission, Submission::Line("@src/engine.rs".to_string()));

    // Initial frame, then one per chunk, then the final frame before the newline.
    assert_eq!(terminal.writes.len(), 7);
    assert!(terminal.writes[2].contains("\r\n\x1b[2K> bin/"));
    assert!(terminal.writes[2].contains("\r\n\x1b[2K  engine.rs"));
    assert!(terminal.writes[3].starts_with("\x1b[1B\r\x1b[2K\x1b[1B\r\x1b[2K\x1b[2A"));
}

#[test]
fn ctrl_c_clears_text_then_exits_when_empty() {
    let (submission, terminal) = run(&[b"draft", b"\x03", b"\x03"]);
    assert_eq!(submission, Submission::Exit);
    assert_eq!(terminal.stops, 1);
}

#[test]
fn ctrl_d_on_empty_line_exits() {
    let (submission, _) = run(&[b"\x04"]);
    assert_eq!(submission, Submission::Exit);
}

#[test]
fn closed_input_exits() {
    let (submission, terminal) = run(&[b"partial"]);
    assert_eq!(submission, Submission::Exit);
    assert!(terminal.output().ends_with("\r\n"));
}

#[test]
fn empty_enter_keeps_prompting() {
    let (submission, _) = run(&[b"   \r", b"/model\r"]);
    assert_eq!(submission, Submission::Line("/model".to_string()));
}

#[test]
fn submitting_with_suggestions_open_erases_them() {
    let (submission, terminal) = run(&[b"/", b"\r"]);
    assert_eq!(submission, Submission::Line("/".to_string()));

    let last_frame = &terminal.writes[terminal.writes.len() - 2];
    assert!(last_frame.starts_with("\x1b[1B\r\x1b[2K\x1b[1B\r\x1b[2K\x1b[2A"));
    assert!(!last_frame.contains("/model"));
}

#[test]
fn paste_flattens_newlines() {
    let (submission, _) = run(&[b"\x1b[200~one\ntwo\x1b[201~", b"\r"]);
    assert_eq!(submission, Submission::Line("one two".to_string()));
}

#[test]
fn arrow_down_moves_the_selection() {
    let (submission, _) = run(&[b"/", b"\x1b[B", b"\t", b"\r"]);
    assert_eq!(submission, Submission::Line("/list-models".to_string()));
}

#[test]
fn arrow_split_across_reads_is_not_an_escape() {
    let (submission, _) = run(&[b"/", b"\x1b", b"[B", b"\t", b"\r"]);
    assert_eq!(submission, Submission::Line("/list-models".to_string()));
}

#[test]
fn escape_clears_only_after_a_pause() {
    let (submission, _) = run(&[b"draft", b"\x1b", b"", b"ok", b"\r"]);
    assert_eq!(submission, Submission::Line("ok".to_string()));
}

#[test]
fn word_keys_move_and_delete() {
    let (submission, _) = run(&[
        b"one two three",
        b"\x1bb",
        b"\x1bd",
        b"\x1b[1;5D",
        b"X",
        b"\r",
    ]);
    assert_eq!(submission, Submission::Line("one Xtwo".to_string()));
}

#[test]
fn kill_ring_survives_between_lines() {
    let source = FakeSource::new();
    let mut engine = InputEngine::new(
        ScriptedTerminal::new(&[b"hello world", b"\x17", b"\r", b"\x15", b"\x19", b"\r"]),
        "> ",
    );

    let first = engine.read_submission(&source).expect("first line");
    assert_eq!(first, Submission::Line("hello".to_string()));

    // Ctrl+U on an empty line cuts nothing and must not clobber the ring.
    let second = engine.read_submission(&source).expect("second line");
    assert_eq!(second, Submission::Line("world".to_string()));
    assert_eq!(engine.terminal().starts, 2);
    assert_eq!(engine.terminal().stops, 2);
}
