use crate::config::{vars, EditOption};
use crate::core_editor::RegionType;
use crate::engine::{EditSession, LoopStatus, BRACKETED_PASTE_END};

pub(crate) fn self_insert(s: &mut EditSession) -> bool {
    let c = match s.last_char {
        Some(c) => c,
        None => match std::str::from_utf8(&s.last_seq)
            .ok()
            .and_then(|t| t.chars().next())
        {
            Some(c) => c,
            None => return false,
        },
    };
    // A word terminator typed right after a completion drops its suffix
    if let Some(suffix) = s.inserted_suffix.take() {
        let after_completion = s
            .last_widget
            .as_deref()
            .map(super::is_completion)
            .unwrap_or(false);
        let removers = s
            .variables
            .str_or(vars::REMOVE_SUFFIX_CHARS, " \t\n;&|")
            .to_string();
        if after_completion && s.opt(EditOption::AutoRemoveSlash) && removers.contains(c) {
            let end = s.editor.line_buffer().insertion_point();
            if end >= suffix.len()
                && s.editor.line_buffer().substring(0..end).ends_with(&suffix)
            {
                s.editor.delete_range(end - suffix.len()..end);
            }
        }
    }
    let n = s.take_count().max(1) as usize;
    let mut text = String::new();
    for _ in 0..n {
        text.push(c);
    }
    s.editor.insert_str(&text);
    true
}

pub(crate) fn backward_delete_char(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let cursor = s.editor.line_buffer().insertion_point();
    if cursor == 0 {
        return false;
    }
    let target = super::motion::nth_target(s, n, |b| b.grapheme_left_index());
    s.editor.delete_range(target..cursor);
    true
}

/// Delete right; on an empty buffer this is end-of-input.
pub(crate) fn delete_char(s: &mut EditSession) -> bool {
    if s.editor.line_buffer().is_empty() {
        s.status = LoopStatus::Eof;
        return true;
    }
    let n = s.take_count().max(1) as usize;
    let cursor = s.editor.line_buffer().insertion_point();
    if cursor == s.editor.line_buffer().len() {
        return false;
    }
    let target = super::motion::nth_target(s, n, |b| b.grapheme_right_index());
    s.editor.delete_range(cursor..target);
    true
}

pub(crate) fn transpose_chars(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let cursor = buffer.insertion_point();
    if buffer.len() < 2 || cursor == 0 {
        return false;
    }
    let at_end = cursor == buffer.len();
    let (left, mid, right) = if at_end {
        let mid = buffer.grapheme_left_index();
        let left = buffer.grapheme_left_index_from(mid);
        (left, mid, cursor)
    } else {
        let left = buffer.grapheme_left_index();
        let right = buffer.grapheme_right_index();
        (left, cursor, right)
    };
    let a = s.editor.line_buffer().substring(left..mid).to_string();
    let b = s.editor.line_buffer().substring(mid..right).to_string();
    s.editor.replace_range(left..right, &format!("{b}{a}"));
    true
}

pub(crate) fn transpose_words(s: &mut EditSession) -> bool {
    s.take_count();
    let wc = s.word_chars();
    let origin = s.editor.line_buffer().insertion_point();

    let b_end = s.editor.line_buffer().word_right_end_index(&wc);
    s.editor.move_to(b_end);
    let b_start = s.editor.line_buffer().word_left_index(&wc);
    s.editor.move_to(b_start);
    let a_start = s.editor.line_buffer().word_left_index(&wc);
    s.editor.move_to(a_start);
    let a_end = s.editor.line_buffer().word_right_end_index(&wc);
    s.editor.move_to(origin);

    if a_start >= b_start || a_end > b_start || b_start >= b_end {
        return false;
    }

    let word_a = s.editor.line_buffer().substring(a_start..a_end).to_string();
    let word_b = s.editor.line_buffer().substring(b_start..b_end).to_string();
    // Rightmost first so the left offsets stay valid
    s.editor.replace_range(b_start..b_end, &word_a);
    s.editor.replace_range(a_start..a_end, &word_b);
    let gap = b_start - a_end;
    s.editor.move_to(a_start + word_b.len() + gap + word_a.len());
    true
}

fn transform_word(s: &mut EditSession, f: impl Fn(&str) -> String) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    for _ in 0..n {
        let cursor = s.editor.line_buffer().insertion_point();
        let end = s.editor.line_buffer().word_right_end_index(&wc);
        if end == cursor {
            return false;
        }
        let transformed = f(s.editor.line_buffer().substring(cursor..end));
        s.editor.replace_range(cursor..end, &transformed);
    }
    true
}

pub(crate) fn up_case_word(s: &mut EditSession) -> bool {
    transform_word(s, |w| w.to_uppercase())
}

pub(crate) fn down_case_word(s: &mut EditSession) -> bool {
    transform_word(s, |w| w.to_lowercase())
}

pub(crate) fn capitalize_word(s: &mut EditSession) -> bool {
    transform_word(s, |w| {
        let mut out = String::with_capacity(w.len());
        let mut seen_alpha = false;
        for c in w.chars() {
            if c.is_alphanumeric() && !seen_alpha {
                seen_alpha = true;
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
        }
        out
    })
}

/// Insert the next key literally, bypassing all bindings.
pub(crate) fn quoted_insert(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some(c) = s.read_char() else {
        return false;
    };
    let mut text = String::new();
    for _ in 0..n {
        text.push(c);
    }
    s.editor.insert_str(&text);
    true
}

pub(crate) fn overwrite_mode(s: &mut EditSession) -> bool {
    s.take_count();
    s.editor.toggle_overwrite();
    true
}

/// Collect a bracketed paste body and insert it as one atomic edit.
pub(crate) fn bracketed_paste(s: &mut EditSession) -> bool {
    let body = {
        let EditSession {
            terminal, decoder, ..
        } = s;
        match decoder.read_until(terminal.as_mut(), BRACKETED_PASTE_END) {
            Ok(body) => body,
            Err(_) => return false,
        }
    };
    let text = String::from_utf8_lossy(&body)
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let start = s.editor.line_buffer().insertion_point();
    s.editor.edit_atomically(|ed| ed.insert_str(&text));
    s.editor.set_mark(start, RegionType::Paste);
    true
}
