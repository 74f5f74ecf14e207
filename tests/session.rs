use pretty_assertions::assert_eq;
use promptline::{
    EditMode, EditSession, ExternalPrinter, History, HistoryRules, ReadLineRequest,
    ReadlineError, ScriptedTerminal,
};

fn session() -> (EditSession, ScriptedTerminal) {
    let term = ScriptedTerminal::new();
    let handle = term.clone();
    (EditSession::with_terminal(Box::new(term)), handle)
}

fn session_with_history(entries: &[&str]) -> (EditSession, ScriptedTerminal) {
    let (session, term) = session();
    let mut history = History::new(100);
    let rules = HistoryRules::default();
    for entry in entries {
        history.add(entry, &rules);
    }
    (session.with_history(history), term)
}

#[test]
fn typing_and_accepting_returns_the_line() {
    let (mut session, term) = session();
    term.feed_str("hello\r");
    let line = session.read_line("> ").unwrap();
    assert_eq!(line, "hello");
    assert_eq!(session.history().len(), 1);
    assert!(term.output_text().contains("> hello"));
}

#[test]
fn eof_on_empty_buffer() {
    let (mut session, term) = session();
    term.feed(b"\x04");
    assert!(matches!(session.read_line("> "), Err(ReadlineError::Eof)));
}

#[test]
fn stream_end_is_eof() {
    let (mut session, _term) = session();
    assert!(matches!(session.read_line("> "), Err(ReadlineError::Eof)));
}

#[test]
fn ctrl_c_interrupts() {
    let (mut session, term) = session();
    term.feed_str("half-typed");
    term.feed(b"\x03");
    assert!(matches!(
        session.read_line("> "),
        Err(ReadlineError::Interrupted)
    ));
}

#[test]
fn word_motion_kill_undo_redo() {
    let (mut session, term) = session();
    // M-b to the start of "world", M-d kills it, undo brings it back,
    // C-x r re-kills it
    term.feed_str("\x1bb\x1bd\x1f\x18r\r");
    let line = session
        .read_line_with(
            ReadLineRequest::new("> ").with_initial_buffer("hello world"),
        )
        .unwrap();
    assert_eq!(line, "hello ");
}

#[test]
fn undo_restores_killed_word() {
    let (mut session, term) = session();
    term.feed_str("\x1bb\x1bd\x1f\r");
    let line = session
        .read_line_with(
            ReadLineRequest::new("> ").with_initial_buffer("hello world"),
        )
        .unwrap();
    assert_eq!(line, "hello world");
}

#[test]
fn arrow_history_walk() {
    let (mut session, term) = session_with_history(&["ls", "ls -l", "git status"]);
    // Three ups land on the oldest entry
    term.feed_str("\x1b[A\x1b[A\x1b[A\r");
    assert_eq!(session.read_line("> ").unwrap(), "ls");
}

#[test]
fn down_after_up_returns_towards_newest() {
    let (mut session, term) = session_with_history(&["ls", "ls -l", "git status"]);
    term.feed_str("\x1b[A\x1b[A\x1b[A\x1b[B\r");
    assert_eq!(session.read_line("> ").unwrap(), "ls -l");
}

#[test]
fn history_cycle_restores_in_progress_line() {
    let (mut session, term) = session_with_history(&["ls"]);
    term.feed_str("draft\x1b[A\x1b[B\r");
    assert_eq!(session.read_line("> ").unwrap(), "draft");
}

#[test]
fn incremental_search_finds_and_accepts() {
    let (mut session, term) = session_with_history(&["ls", "ls -l", "git status"]);
    // C-r stat RET accepts the matched entry
    term.feed_str("\x12stat\r");
    assert_eq!(session.read_line("> ").unwrap(), "git status");
}

#[test]
fn incremental_search_abort_restores_buffer() {
    let (mut session, term) = session_with_history(&["git status"]);
    term.feed_str("draft\x12git\x07\r");
    assert_eq!(session.read_line("> ").unwrap(), "draft");
}

#[test]
fn prefix_history_search_matches_typed_prefix() {
    let (mut session, term) = session_with_history(&["git status", "ls"]);
    // M-p only visits entries starting with "git"
    term.feed_str("git\x1bp\r");
    assert_eq!(session.read_line("> ").unwrap(), "git status");
}

#[test]
fn completion_beeps_then_lists_then_menus() {
    let (mut session, term) = session();
    let mut session = session.with_string_completions(vec![
        "commit".into(),
        "checkout".into(),
        "clone".into(),
    ]);
    // TAB: common prefix adds nothing, bell. TAB: list. TAB: menu picks the
    // first candidate. RET commits it, RET accepts the line.
    term.feed_str("c\t\t\t\r\r");
    let line = session.read_line("> ").unwrap();
    assert_eq!(line, "commit");
    let raw = String::from_utf8_lossy(&term.output()).to_string();
    assert!(raw.contains('\x07'), "first TAB should beep");
    assert!(term.output_text().contains("checkout"), "second TAB lists");
}

#[test]
fn sole_candidate_completes_in_place() {
    let (mut session, term) = session();
    let mut session =
        session.with_string_completions(vec!["checkout".into(), "commit".into()]);
    term.feed_str("che\t\r");
    assert_eq!(session.read_line("> ").unwrap(), "checkout");
}

#[test]
fn menu_cycles_with_tab() {
    let (mut session, term) = session();
    let mut session = session.with_string_completions(vec![
        "commit".into(),
        "checkout".into(),
        "clone".into(),
    ]);
    // Enter the menu (TAB TAB TAB), one more TAB moves to the second pick
    term.feed_str("c\t\t\t\t\r\r");
    assert_eq!(session.read_line("> ").unwrap(), "checkout");
}

#[test]
fn masked_read_echoes_stars_and_skips_history() {
    let (mut session, term) = session();
    term.feed_str("s3cret\r");
    let line = session
        .read_line_with(ReadLineRequest::new("pw: ").with_mask('*'))
        .unwrap();
    assert_eq!(line, "s3cret");
    assert_eq!(session.history().len(), 0);
    let text = term.output_text();
    assert!(text.contains("pw: ******"), "echo was {text:?}");
    assert!(!text.contains("s3cret"), "secret leaked to the screen");
}

#[test]
fn incomplete_quote_continues_on_secondary_prompt() {
    let (mut session, term) = session();
    term.feed_str("echo 'ab\rcd'\r");
    let line = session.read_line("> ").unwrap();
    assert_eq!(line, "echo 'ab\ncd'");
    // Secondary prompt shows the missing token
    assert!(term.output_text().contains("'> "));
}

#[test]
fn kill_and_yank_round_trip() {
    let (mut session, term) = session();
    term.feed_str("foo bar\x17\x19\r");
    assert_eq!(session.read_line("> ").unwrap(), "foo bar");
}

#[test]
fn yank_pop_rotates_kill_ring() {
    let (mut session, term) = session();
    // Two separate kills (typing in between breaks the merge), then yank
    // and rotate back to the older entry
    term.feed_str("foo\x17bar\x17\x19\x1by\r");
    assert_eq!(session.read_line("> ").unwrap(), "foo");
}

#[test]
fn contiguous_kills_merge_into_one_entry() {
    let (mut session, term) = session();
    // Two back-to-back backward kills merge; one yank restores both words
    term.feed_str("foo bar\x17\x17\x19\r");
    assert_eq!(session.read_line("> ").unwrap(), "foo bar");
}

#[test]
fn numeric_argument_repeats_self_insert() {
    let (mut session, term) = session();
    term.feed_str("\x1b3x\r");
    assert_eq!(session.read_line("> ").unwrap(), "xxx");
}

#[test]
fn transpose_chars_at_end() {
    let (mut session, term) = session();
    term.feed_str("ab\x14\r");
    assert_eq!(session.read_line("> ").unwrap(), "ba");
}

#[test]
fn vi_mode_word_delete() {
    let (mut session, term) = session();
    let mut session = session.with_edit_mode(EditMode::Vi);
    term.feed_str("hello world\x1bbdw\r");
    assert_eq!(session.read_line("> ").unwrap(), "hello ");
}

#[test]
fn vi_dot_repeats_last_change() {
    let (mut session, term) = session();
    let mut session = session.with_edit_mode(EditMode::Vi);
    // x deletes the 'd'; `.` repeats and deletes the 'l'
    term.feed_str("world\x1b0x.\r");
    assert_eq!(session.read_line("> ").unwrap(), "rld");
}

#[test]
fn vi_change_word_enters_insert() {
    let (mut session, term) = session();
    let mut session = session.with_edit_mode(EditMode::Vi);
    term.feed_str("hello world\x1bbcwthere\x1b\r");
    assert_eq!(session.read_line("> ").unwrap(), "hello there");
}

#[test]
fn vi_inner_quotes_object() {
    let (mut session, term) = session();
    let mut session = session.with_edit_mode(EditMode::Vi);
    // ci" empties the quoted span and replaces it
    term.feed_str("say \"hi there\"\x1bhhdi\"\r");
    assert_eq!(session.read_line("> ").unwrap(), "say \"\"");
}

#[test]
fn bracketed_paste_inserts_atomically() {
    let (mut session, term) = session();
    term.feed(b"\x1b[200~pasted text\x1b[201~\r");
    assert_eq!(session.read_line("> ").unwrap(), "pasted text");
}

#[test]
fn external_print_appears_above_prompt() {
    let printer = ExternalPrinter::new(4);
    printer.print("note from elsewhere").unwrap();
    let (session, term) = session();
    let mut session = session.with_external_printer(printer);
    term.feed_str("ok\r");
    assert_eq!(session.read_line("> ").unwrap(), "ok");
    let text = term.output_text();
    let note = text.find("note from elsewhere").expect("note printed");
    let prompt = text.rfind("> ok").expect("prompt painted");
    assert!(note < prompt, "note should precede the final prompt paint");
}

#[test]
fn accepted_lines_enter_history_with_dedup() {
    let (mut session, term) = session();
    term.feed_str("ls\r");
    session.read_line("> ").unwrap();
    term.feed_str("ls\r");
    session.read_line("> ").unwrap();
    assert_eq!(session.history().len(), 1);
}

#[test]
fn second_read_reuses_the_session() {
    let (mut session, term) = session();
    term.feed_str("one\r");
    assert_eq!(session.read_line("> ").unwrap(), "one");
    term.feed_str("two\r");
    assert_eq!(session.read_line("> ").unwrap(), "two");
    assert_eq!(session.history().len(), 2);
}

#[test]
fn status_lines_reserve_bottom_rows() {
    let term = ScriptedTerminal::with_size(80, 24);
    let handle = term.clone();
    let mut session = EditSession::with_terminal(Box::new(term));
    session
        .status_lines(vec![
            promptline::StyledText::plain("mode: insert"),
            promptline::StyledText::plain("file: a.txt"),
        ])
        .unwrap();
    let raw = String::from_utf8_lossy(&handle.output()).to_string();
    assert!(raw.contains("\x1b[1;22r"), "scroll region carved: {raw:?}");
    assert!(raw.contains("mode: insert"));

    // The prompt still works with the bar up
    handle.feed_str("x\r");
    assert_eq!(session.read_line("> ").unwrap(), "x");
}

#[test]
fn suggestion_hint_is_accepted_at_line_end() {
    let (mut session, term) = session_with_history(&["git status"]);
    // Type a prefix; C-e accepts the dimmed remainder
    term.feed_str("git\x05\r");
    assert_eq!(session.read_line("> ").unwrap(), "git status");
}

#[test]
fn quoted_insert_takes_next_key_literally() {
    let (mut session, term) = session();
    term.feed_str("\x16\x07\r");
    let line = session.read_line("> ").unwrap();
    assert_eq!(line, "\x07");
}

#[test]
fn wide_input_still_round_trips() {
    let (mut session, term) = session();
    term.feed_str("日本語 input\r");
    assert_eq!(session.read_line("> ").unwrap(), "日本語 input");
}
