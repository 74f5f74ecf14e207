//! Named editing operations.
//!
//! Every widget is a plain function `fn(&mut EditSession) -> bool`; key
//! bindings store widget names, so rebinding stays table-driven and
//! embedders can invoke widgets programmatically by name. A `false` return
//! rings the bell per `bell-style`.

mod completion;
mod edit;
mod history;
mod kill;
mod misc;
mod motion;
mod vi;

use crate::engine::EditSession;

/// A named editing operation.
pub type Widget = fn(&mut EditSession) -> bool;

macro_rules! widget_table {
    ($(($name:literal, $func:path)),+ $(,)?) => {
        /// Resolve a widget by its binding name.
        pub fn lookup(name: &str) -> Option<Widget> {
            match name {
                $($name => Some($func as Widget),)+
                _ => None,
            }
        }

        /// Every widget name, for introspection and rebinding UIs.
        pub fn names() -> &'static [&'static str] {
            &[$($name),+]
        }
    };
}

widget_table![
    // Motion
    ("forward-char", motion::forward_char),
    ("backward-char", motion::backward_char),
    ("forward-word", motion::forward_word),
    ("backward-word", motion::backward_word),
    ("beginning-of-line", motion::beginning_of_line),
    ("end-of-line", motion::end_of_line),
    ("beginning-of-line-hist", motion::beginning_of_line_hist),
    ("up-line-or-history", motion::up_line_or_history),
    ("down-line-or-history", motion::down_line_or_history),
    ("vi-first-non-blank", motion::vi_first_non_blank),
    // Mutation
    ("self-insert", edit::self_insert),
    ("backward-delete-char", edit::backward_delete_char),
    ("delete-char", edit::delete_char),
    ("transpose-chars", edit::transpose_chars),
    ("transpose-words", edit::transpose_words),
    ("capitalize-word", edit::capitalize_word),
    ("up-case-word", edit::up_case_word),
    ("down-case-word", edit::down_case_word),
    ("quoted-insert", edit::quoted_insert),
    ("overwrite-mode", edit::overwrite_mode),
    ("bracketed-paste", edit::bracketed_paste),
    // Kills, mark and yank
    ("kill-word", kill::kill_word),
    ("backward-kill-word", kill::backward_kill_word),
    ("kill-line", kill::kill_line),
    ("backward-kill-line", kill::backward_kill_line),
    ("kill-whole-line", kill::kill_whole_line),
    ("set-mark-command", kill::set_mark_command),
    ("exchange-point-and-mark", kill::exchange_point_and_mark),
    ("kill-region", kill::kill_region),
    ("copy-region-as-kill", kill::copy_region_as_kill),
    ("yank", kill::yank),
    ("yank-pop", kill::yank_pop),
    // History
    ("up-history", history::up_history),
    ("down-history", history::down_history),
    ("beginning-of-history", history::beginning_of_history),
    ("end-of-history", history::end_of_history),
    ("history-search-forward", history::history_search_forward),
    ("history-search-backward", history::history_search_backward),
    (
        "history-incremental-search-forward",
        history::history_incremental_search_forward
    ),
    (
        "history-incremental-search-backward",
        history::history_incremental_search_backward
    ),
    (
        "history-incremental-pattern-search-forward",
        history::history_incremental_pattern_search_forward
    ),
    (
        "history-incremental-pattern-search-backward",
        history::history_incremental_pattern_search_backward
    ),
    // Completion
    ("complete-word", completion::complete_word),
    ("expand-or-complete", completion::expand_or_complete),
    ("menu-complete", completion::menu_complete),
    ("menu-expand-or-complete", completion::menu_expand_or_complete),
    ("reverse-menu-complete", completion::reverse_menu_complete),
    ("menu-select", completion::menu_select),
    ("list-choices", completion::list_choices),
    // Undo and meta
    ("undo", misc::undo),
    ("redo", misc::redo),
    ("split-undo", misc::split_undo),
    ("digit-argument", misc::digit_argument),
    ("universal-argument", misc::universal_argument),
    ("neg-argument", misc::neg_argument),
    ("accept-line", misc::accept_line),
    ("abort", misc::abort),
    ("send-break", misc::send_break),
    ("clear-screen", misc::clear_screen),
    ("redraw-line", misc::redraw_line),
    ("redisplay", misc::redisplay),
    ("beep", misc::beep),
    // Vi
    ("vi-cmd-mode", vi::vi_cmd_mode),
    ("vi-insert", vi::vi_insert),
    ("vi-insert-bol", vi::vi_insert_bol),
    ("vi-add-next", vi::vi_add_next),
    ("vi-add-eol", vi::vi_add_eol),
    ("vi-open-line-below", vi::vi_open_line_below),
    ("vi-open-line-above", vi::vi_open_line_above),
    (
        "vi-digit-or-beginning-of-line",
        vi::vi_digit_or_beginning_of_line
    ),
    ("vi-forward-word", vi::vi_forward_word),
    ("vi-forward-blank-word", vi::vi_forward_blank_word),
    ("vi-forward-word-end", vi::vi_forward_word_end),
    ("vi-forward-blank-word-end", vi::vi_forward_blank_word_end),
    ("vi-backward-word", vi::vi_backward_word),
    ("vi-backward-blank-word", vi::vi_backward_blank_word),
    ("vi-find-next-char", vi::vi_find_next_char),
    ("vi-find-prev-char", vi::vi_find_prev_char),
    ("vi-find-next-char-skip", vi::vi_find_next_char_skip),
    ("vi-find-prev-char-skip", vi::vi_find_prev_char_skip),
    ("vi-repeat-find", vi::vi_repeat_find),
    ("vi-rev-repeat-find", vi::vi_rev_repeat_find),
    ("vi-delete-char", vi::vi_delete_char),
    ("vi-backward-delete-char", vi::vi_backward_delete_char),
    ("vi-replace-chars", vi::vi_replace_chars),
    ("vi-replace", vi::vi_replace),
    ("vi-substitute", vi::vi_substitute),
    ("vi-change-whole-line", vi::vi_change_whole_line),
    ("vi-kill-eol", vi::vi_kill_eol),
    ("vi-change-eol", vi::vi_change_eol),
    ("vi-delete", vi::vi_delete),
    ("vi-change", vi::vi_change),
    ("vi-yank", vi::vi_yank),
    ("vi-yank-whole-line", vi::vi_yank_whole_line),
    ("vi-put-after", vi::vi_put_after),
    ("vi-put-before", vi::vi_put_before),
    ("vi-swap-case", vi::vi_swap_case),
    ("vi-repeat-change", vi::vi_repeat_change),
    ("vi-set-buffer", vi::vi_set_buffer),
    ("vi-oper-doubled", vi::vi_oper_doubled),
    ("vi-select-around", vi::vi_select_around),
    ("vi-select-inside", vi::vi_select_inside),
    ("visual-mode", vi::visual_mode),
    ("visual-line-mode", vi::visual_line_mode),
    ("vi-delete-visual", vi::vi_delete_visual),
    ("vi-yank-visual", vi::vi_yank_visual),
    ("vi-change-visual", vi::vi_change_visual),
    ("vi-swap-case-visual", vi::vi_swap_case_visual),
];

/// Kill widgets merge contiguous kills in the ring.
pub(crate) fn is_kill(name: &str) -> bool {
    matches!(
        name,
        "kill-word"
            | "backward-kill-word"
            | "kill-line"
            | "backward-kill-line"
            | "kill-whole-line"
            | "kill-region"
    )
}

pub(crate) fn is_yank(name: &str) -> bool {
    matches!(name, "yank" | "yank-pop" | "vi-put-after" | "vi-put-before")
}

pub(crate) fn is_history(name: &str) -> bool {
    name.starts_with("history-")
        || matches!(
            name,
            "up-history"
                | "down-history"
                | "beginning-of-history"
                | "end-of-history"
                | "up-line-or-history"
                | "down-line-or-history"
        )
}

pub(crate) fn is_completion(name: &str) -> bool {
    matches!(
        name,
        "complete-word"
            | "expand-or-complete"
            | "menu-complete"
            | "menu-expand-or-complete"
            | "reverse-menu-complete"
            | "menu-select"
            | "list-choices"
    )
}

/// Widgets that begin a repeatable vi change (the `.` command replays the
/// keys from here until command mode returns).
pub(crate) fn is_vi_change_starter(name: &str) -> bool {
    matches!(
        name,
        "vi-delete-char"
            | "vi-backward-delete-char"
            | "vi-replace-chars"
            | "vi-replace"
            | "vi-substitute"
            | "vi-change-whole-line"
            | "vi-kill-eol"
            | "vi-change-eol"
            | "vi-delete"
            | "vi-change"
            | "vi-swap-case"
            | "vi-put-after"
            | "vi-put-before"
            | "vi-insert"
            | "vi-insert-bol"
            | "vi-add-next"
            | "vi-add-eol"
            | "vi-open-line-below"
            | "vi-open-line-above"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_every_listed_name() {
        for name in names() {
            assert!(lookup(name).is_some(), "widget {name} missing");
        }
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        assert!(lookup("no-such-widget").is_none());
    }

    #[test]
    fn families_are_disjoint_enough() {
        assert!(is_kill("kill-line"));
        assert!(!is_kill("yank"));
        assert!(is_history("up-history"));
        assert!(is_completion("menu-complete"));
        assert!(is_vi_change_starter("vi-delete"));
        assert!(!is_vi_change_starter("vi-yank"));
    }
}
