mod support;

use loo_tui::{next_state, render_frame, AutocompleteState, DirEntry, InputBuffer};
use pretty_assertions::assert_eq;
use support::FakeSource;

fn no_descriptions(_: &str) -> Option<String> {
    None
}

fn frame_for(buffer: &mut InputBuffer, text: &str, source: &FakeSource) -> loo_tui::Frame {
    buffer.set_text(text);
    buffer.refresh(source);
    render_frame(buffer, "> ", 80, &no_descriptions)
}

#[test]
fn slash_lists_every_command_in_registration_order() {
    let state = next_state("/", &FakeSource::new());
    match state {
        AutocompleteState::CommandSuggest { prefix, matches } => {
            assert_eq!(prefix, "");
            assert_eq!(
                matches.to_vec(),
                vec!["model".to_string(), "list-models".to_string()]
            );
        }
        other => panic!("expected command suggestions, got {other:?}"),
    }
}

#[test]
fn no_match_goes_inactive_and_next_frame_erases_previous_rows() {
    let source = FakeSource::new();
    let mut buffer = InputBuffer::new();

    let first = frame_for(&mut buffer, "/", &source);
    assert_eq!(first.drawn_lines, 2);

    let second = frame_for(&mut buffer, "/i", &source);
    assert_eq!(buffer.autocomplete_state(), &AutocompleteState::Inactive);
    assert_eq!(second.erased_lines, 2);
    assert_eq!(second.drawn_lines, 0);
    assert!(second
        .output
        .starts_with("\x1b[1B\r\x1b[2K\x1b[1B\r\x1b[2K\x1b[2A"));

    let third = frame_for(&mut buffer, "/ix", &source);
    assert_eq!(third.erased_lines, 0);
}

#[test]
fn directory_path_lists_contents_on_first_evaluation() {
    let state = next_state("@src/", &FakeSource::new());
    match state {
        AutocompleteState::PathSuggest { prefix, entries } => {
            assert_eq!(prefix, "src/");
            assert_eq!(
                entries.to_vec(),
                vec![DirEntry::dir("bin"), DirEntry::file("engine.rs")]
            );
        }
        other => panic!("expected path suggestions, got {other:?}"),
    }
}

#[test]
fn empty_directory_is_inactive() {
    assert_eq!(
        next_state("@src/bin/", &FakeSource::new()),
        AutocompleteState::Inactive
    );
}

#[test]
fn same_text_gives_same_state_regardless_of_history() {
    let source = FakeSource::new();
    let direct = next_state("open @src/e", &source);

    let mut buffer = InputBuffer::new();
    for text in ["open @", "open @s", "open @src/", "open @src/e"] {
        buffer.set_text(text);
        buffer.refresh(&source);
    }
    assert_eq!(buffer.autocomplete_state(), &direct);
}

#[test]
fn shrinking_suggestions_erase_the_old_count() {
    let source = FakeSource::new();
    let mut buffer = InputBuffer::new();

    let wide = frame_for(&mut buffer, "@src/", &source);
    assert_eq!(wide.drawn_lines, 2);
    let narrow = frame_for(&mut buffer, "@src/e", &source);
    assert_eq!(narrow.erased_lines, 2);
    assert_eq!(narrow.drawn_lines, 1);
    assert!(narrow.output.ends_with("\x1b[1A\r\x1b[8C"));
}
