use super::{notation::keyseq, Binding, KeyMap};

fn bind(km: &mut KeyMap, spec: &str, widget: &str) {
    km.bind(&keyseq(spec), Binding::widget(widget))
        .expect("default binding sequences are non-empty");
}

fn bind_arrows(km: &mut KeyMap) {
    for (seq, widget) in [
        ("\\e[A", "up-line-or-history"),
        ("\\e[B", "down-line-or-history"),
        ("\\e[C", "forward-char"),
        ("\\e[D", "backward-char"),
        ("\\eOA", "up-line-or-history"),
        ("\\eOB", "down-line-or-history"),
        ("\\eOC", "forward-char"),
        ("\\eOD", "backward-char"),
        ("\\e[H", "beginning-of-line"),
        ("\\e[F", "end-of-line"),
        ("\\e[1~", "beginning-of-line"),
        ("\\e[4~", "end-of-line"),
        ("\\e[3~", "delete-char"),
    ] {
        bind(km, seq, widget);
    }
}

fn bind_digit_arguments(km: &mut KeyMap, meta: bool) {
    for digit in '0'..='9' {
        let spec = if meta {
            format!("\\M-{digit}")
        } else {
            digit.to_string()
        };
        km.bind(&keyseq(&spec), Binding::widget("digit-argument"))
            .expect("digit sequences are non-empty");
    }
    let neg = if meta { "\\M--".to_string() } else { "-".to_string() };
    km.bind(&keyseq(&neg), Binding::widget("neg-argument"))
        .expect("non-empty");
}

/// The default Emacs keymap.
pub fn default_emacs_keymap() -> KeyMap {
    let mut km = KeyMap::with_fallback(Binding::widget("self-insert"));

    bind(&mut km, "^@", "set-mark-command");
    bind(&mut km, "^A", "beginning-of-line");
    bind(&mut km, "^B", "backward-char");
    bind(&mut km, "^C", "send-break");
    bind(&mut km, "^D", "delete-char");
    bind(&mut km, "^E", "end-of-line");
    bind(&mut km, "^F", "forward-char");
    bind(&mut km, "^G", "abort");
    bind(&mut km, "^H", "backward-delete-char");
    bind(&mut km, "^I", "expand-or-complete");
    bind(&mut km, "^J", "accept-line");
    bind(&mut km, "^K", "kill-line");
    bind(&mut km, "^L", "clear-screen");
    bind(&mut km, "^M", "accept-line");
    bind(&mut km, "^N", "down-line-or-history");
    bind(&mut km, "^P", "up-line-or-history");
    bind(&mut km, "^O", "overwrite-mode");
    bind(&mut km, "^Q", "quoted-insert");
    bind(&mut km, "^R", "history-incremental-search-backward");
    bind(&mut km, "^S", "history-incremental-search-forward");
    bind(&mut km, "^T", "transpose-chars");
    bind(&mut km, "^U", "backward-kill-line");
    bind(&mut km, "^V", "quoted-insert");
    bind(&mut km, "^W", "backward-kill-word");
    bind(&mut km, "^Y", "yank");
    bind(&mut km, "^_", "undo");
    bind(&mut km, "^?", "backward-delete-char");
    bind(&mut km, "^X^U", "undo");
    bind(&mut km, "^X^X", "exchange-point-and-mark");
    bind(&mut km, "^Xr", "redo");

    bind(&mut km, "\\M-b", "backward-word");
    bind(&mut km, "\\M-f", "forward-word");
    bind(&mut km, "\\M-d", "kill-word");
    bind(&mut km, "\\M-c", "capitalize-word");
    bind(&mut km, "\\M-u", "up-case-word");
    bind(&mut km, "\\M-l", "down-case-word");
    bind(&mut km, "\\M-t", "transpose-words");
    bind(&mut km, "\\M-y", "yank-pop");
    bind(&mut km, "\\M-w", "copy-region-as-kill");
    bind(&mut km, "\\M-<", "beginning-of-history");
    bind(&mut km, "\\M->", "end-of-history");
    bind(&mut km, "\\M-^H", "backward-kill-word");
    km.bind(&[0x1b, 0x7f], Binding::widget("backward-kill-word"))
        .expect("non-empty");
    bind(&mut km, "\\M-n", "history-search-forward");
    bind(&mut km, "\\M-p", "history-search-backward");

    bind_digit_arguments(&mut km, true);
    bind(&mut km, "\\e[Z", "reverse-menu-complete");
    bind(&mut km, "\\e[200~", "bracketed-paste");
    bind_arrows(&mut km);

    km
}

/// The default Vi insert-mode keymap.
pub fn default_viins_keymap() -> KeyMap {
    let mut km = KeyMap::with_fallback(Binding::widget("self-insert"));

    bind(&mut km, "\\e", "vi-cmd-mode");
    bind(&mut km, "^A", "beginning-of-line");
    bind(&mut km, "^C", "send-break");
    bind(&mut km, "^D", "delete-char");
    bind(&mut km, "^E", "end-of-line");
    bind(&mut km, "^G", "abort");
    bind(&mut km, "^H", "backward-delete-char");
    bind(&mut km, "^I", "expand-or-complete");
    bind(&mut km, "^J", "accept-line");
    bind(&mut km, "^M", "accept-line");
    bind(&mut km, "^R", "history-incremental-search-backward");
    bind(&mut km, "^U", "backward-kill-line");
    bind(&mut km, "^V", "quoted-insert");
    bind(&mut km, "^W", "backward-kill-word");
    bind(&mut km, "^Y", "yank");
    bind(&mut km, "^?", "backward-delete-char");
    bind(&mut km, "\\e[Z", "reverse-menu-complete");
    bind(&mut km, "\\e[200~", "bracketed-paste");
    bind_arrows(&mut km);

    km
}

/// The default Vi command-mode keymap. No fallback: unbound keys are
/// undefined and ring the bell.
pub fn default_vicmd_keymap() -> KeyMap {
    let mut km = KeyMap::new();

    bind(&mut km, "\\e", "vi-cmd-mode");
    bind(&mut km, "h", "backward-char");
    bind(&mut km, "l", "forward-char");
    bind(&mut km, " ", "forward-char");
    bind(&mut km, "0", "vi-digit-or-beginning-of-line");
    bind(&mut km, "^", "vi-first-non-blank");
    bind(&mut km, "$", "end-of-line");
    bind(&mut km, "w", "vi-forward-word");
    bind(&mut km, "W", "vi-forward-blank-word");
    bind(&mut km, "e", "vi-forward-word-end");
    bind(&mut km, "E", "vi-forward-blank-word-end");
    bind(&mut km, "b", "vi-backward-word");
    bind(&mut km, "B", "vi-backward-blank-word");
    bind(&mut km, "f", "vi-find-next-char");
    bind(&mut km, "F", "vi-find-prev-char");
    bind(&mut km, "t", "vi-find-next-char-skip");
    bind(&mut km, "T", "vi-find-prev-char-skip");
    bind(&mut km, ";", "vi-repeat-find");
    bind(&mut km, ",", "vi-rev-repeat-find");
    bind(&mut km, "j", "down-line-or-history");
    bind(&mut km, "k", "up-line-or-history");
    bind(&mut km, "G", "end-of-history");
    bind(&mut km, "gg", "beginning-of-history");

    bind(&mut km, "i", "vi-insert");
    bind(&mut km, "I", "vi-insert-bol");
    bind(&mut km, "a", "vi-add-next");
    bind(&mut km, "A", "vi-add-eol");
    bind(&mut km, "o", "vi-open-line-below");
    bind(&mut km, "O", "vi-open-line-above");
    bind(&mut km, "x", "vi-delete-char");
    bind(&mut km, "X", "vi-backward-delete-char");
    bind(&mut km, "r", "vi-replace-chars");
    bind(&mut km, "R", "vi-replace");
    bind(&mut km, "s", "vi-substitute");
    bind(&mut km, "S", "vi-change-whole-line");
    bind(&mut km, "D", "vi-kill-eol");
    bind(&mut km, "C", "vi-change-eol");
    bind(&mut km, "d", "vi-delete");
    bind(&mut km, "c", "vi-change");
    bind(&mut km, "y", "vi-yank");
    bind(&mut km, "Y", "vi-yank-whole-line");
    bind(&mut km, "p", "vi-put-after");
    bind(&mut km, "P", "vi-put-before");
    bind(&mut km, "u", "undo");
    bind(&mut km, "^R", "redo");
    bind(&mut km, "~", "vi-swap-case");
    bind(&mut km, ".", "vi-repeat-change");
    bind(&mut km, "\"", "vi-set-buffer");
    bind(&mut km, "v", "visual-mode");
    bind(&mut km, "V", "visual-line-mode");
    bind(&mut km, "/", "history-incremental-search-backward");
    bind(&mut km, "?", "history-incremental-search-forward");
    bind(&mut km, "^J", "accept-line");
    bind(&mut km, "^M", "accept-line");
    bind(&mut km, "^L", "clear-screen");
    bind(&mut km, "^C", "send-break");
    bind(&mut km, "^D", "delete-char");

    for digit in '1'..='9' {
        km.bind(&[digit as u8], Binding::widget("digit-argument"))
            .expect("non-empty");
    }
    bind_arrows(&mut km);

    km
}

/// Vi operator-pending keymap: motions and text objects that the pending
/// operator is applied over.
pub fn default_viopp_keymap() -> KeyMap {
    let mut km = KeyMap::new();

    bind(&mut km, "\\e", "vi-cmd-mode");
    bind(&mut km, "h", "backward-char");
    bind(&mut km, "l", "forward-char");
    bind(&mut km, " ", "forward-char");
    bind(&mut km, "0", "vi-digit-or-beginning-of-line");
    bind(&mut km, "^", "vi-first-non-blank");
    bind(&mut km, "$", "end-of-line");
    bind(&mut km, "w", "vi-forward-word");
    bind(&mut km, "W", "vi-forward-blank-word");
    bind(&mut km, "e", "vi-forward-word-end");
    bind(&mut km, "E", "vi-forward-blank-word-end");
    bind(&mut km, "b", "vi-backward-word");
    bind(&mut km, "B", "vi-backward-blank-word");
    bind(&mut km, "f", "vi-find-next-char");
    bind(&mut km, "F", "vi-find-prev-char");
    bind(&mut km, "t", "vi-find-next-char-skip");
    bind(&mut km, "T", "vi-find-prev-char-skip");
    bind(&mut km, ";", "vi-repeat-find");
    bind(&mut km, ",", "vi-rev-repeat-find");
    bind(&mut km, "a", "vi-select-around");
    bind(&mut km, "i", "vi-select-inside");
    bind(&mut km, "d", "vi-oper-doubled");
    bind(&mut km, "c", "vi-oper-doubled");
    bind(&mut km, "y", "vi-oper-doubled");

    for digit in '1'..='9' {
        km.bind(&[digit as u8], Binding::widget("digit-argument"))
            .expect("non-empty");
    }

    km
}

/// Vi visual-selection keymap.
pub fn default_visual_keymap() -> KeyMap {
    let mut km = KeyMap::new();

    bind(&mut km, "\\e", "vi-cmd-mode");
    bind(&mut km, "h", "backward-char");
    bind(&mut km, "l", "forward-char");
    bind(&mut km, " ", "forward-char");
    bind(&mut km, "0", "vi-digit-or-beginning-of-line");
    bind(&mut km, "^", "vi-first-non-blank");
    bind(&mut km, "$", "end-of-line");
    bind(&mut km, "w", "vi-forward-word");
    bind(&mut km, "W", "vi-forward-blank-word");
    bind(&mut km, "e", "vi-forward-word-end");
    bind(&mut km, "b", "vi-backward-word");
    bind(&mut km, "f", "vi-find-next-char");
    bind(&mut km, "F", "vi-find-prev-char");
    bind(&mut km, "t", "vi-find-next-char-skip");
    bind(&mut km, "T", "vi-find-prev-char-skip");
    bind(&mut km, "j", "down-line-or-history");
    bind(&mut km, "k", "up-line-or-history");
    bind(&mut km, "v", "visual-mode");
    bind(&mut km, "V", "visual-line-mode");
    bind(&mut km, "o", "exchange-point-and-mark");
    bind(&mut km, "d", "vi-delete-visual");
    bind(&mut km, "x", "vi-delete-visual");
    bind(&mut km, "y", "vi-yank-visual");
    bind(&mut km, "c", "vi-change-visual");
    bind(&mut km, "~", "vi-swap-case-visual");

    for digit in '1'..='9' {
        km.bind(&[digit as u8], Binding::widget("digit-argument"))
            .expect("non-empty");
    }

    km
}

/// Keymap consulted while incremental search is active. The engine
/// reinterprets the widget names; anything unbound terminates the search
/// and is replayed against the main keymap.
pub fn default_isearch_keymap() -> KeyMap {
    let mut km = KeyMap::with_fallback(Binding::widget("self-insert"));

    bind(&mut km, "^G", "abort");
    bind(&mut km, "^R", "history-incremental-search-backward");
    bind(&mut km, "^S", "history-incremental-search-forward");
    bind(&mut km, "^H", "backward-delete-char");
    bind(&mut km, "^?", "backward-delete-char");
    bind(&mut km, "^M", "accept-line");
    bind(&mut km, "^J", "accept-line");

    km
}

/// Keymap consulted while the completion menu is active.
pub fn default_menu_keymap() -> KeyMap {
    let mut km = KeyMap::with_fallback(Binding::widget("self-insert"));

    bind(&mut km, "^I", "menu-complete");
    bind(&mut km, "\\e[Z", "reverse-menu-complete");
    bind(&mut km, "^G", "send-break");
    bind(&mut km, "^M", "accept-line");
    bind(&mut km, "^J", "accept-line");
    bind(&mut km, "\\e[C", "menu-complete");
    bind(&mut km, "\\e[D", "reverse-menu-complete");
    bind(&mut km, "\\e[B", "menu-complete");
    bind(&mut km, "\\e[A", "reverse-menu-complete");

    km
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Lookup;

    #[test]
    fn emacs_escape_prefix_is_ambiguous_with_meta_bindings() {
        let km = default_emacs_keymap();
        // ESC b is meta-b; ESC alone is only a prefix here
        assert!(matches!(km.lookup(b"\x1bb"), Lookup::Exact(_)));
        assert!(matches!(km.lookup(b"\x1b"), Lookup::Prefix));
    }

    #[test]
    fn viins_escape_is_bound_and_prefix() {
        let km = default_viins_keymap();
        assert!(matches!(km.lookup(b"\x1b"), Lookup::ExactPrefix(_)));
    }

    #[test]
    fn vicmd_has_no_self_insert_fallback() {
        let km = default_vicmd_keymap();
        assert!(km.fallback().is_none());
        assert!(matches!(km.lookup(b"q"), Lookup::Unbound));
    }

    #[test]
    fn vicmd_g_prefix_resolves_gg() {
        let km = default_vicmd_keymap();
        assert!(matches!(km.lookup(b"g"), Lookup::Prefix));
        assert!(matches!(km.lookup(b"gg"), Lookup::Exact(_)));
    }
}
