/// Control-modified byte for a letter or symbol (`ctrl('A')` == 0x01).
pub const fn ctrl(c: char) -> u8 {
    (c as u8) & 0x1f
}

/// Translate readline-style key notation into raw bytes.
///
/// Supported forms, composable in one string:
/// - `\C-x` / `^X`: control
/// - `\M-x`: meta (ESC prefix)
/// - `\e`: escape; `\t` `\n` `\r`: the usual escapes
/// - `\\` and `\^`: literal backslash / caret
/// - anything else: the character itself, UTF-8 encoded
pub fn keyseq(spec: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(spec.len());
    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('C') => {
                    // \C-x
                    if chars.peek() == Some(&'-') {
                        chars.next();
                    }
                    if let Some(target) = chars.next() {
                        out.push(ctrl(target.to_ascii_uppercase()));
                    }
                }
                Some('M') => {
                    if chars.peek() == Some(&'-') {
                        chars.next();
                    }
                    out.push(0x1b);
                    match chars.next() {
                        // \M-^H is meta plus control
                        Some('^') => {
                            if let Some(target) = chars.next() {
                                out.push(ctrl(target.to_ascii_uppercase()));
                            }
                        }
                        Some(target) => push_char(&mut out, target),
                        None => {}
                    }
                }
                Some('e') => out.push(0x1b),
                Some('t') => out.push(b'\t'),
                Some('n') => out.push(b'\n'),
                Some('r') => out.push(b'\r'),
                Some('\\') => out.push(b'\\'),
                Some('^') => out.push(b'^'),
                Some(other) => push_char(&mut out, other),
                None => {}
            },
            '^' => match chars.next() {
                Some('?') => out.push(0x7f),
                Some(target) => out.push(ctrl(target.to_ascii_uppercase())),
                None => out.push(b'^'),
            },
            other => push_char(&mut out, other),
        }
    }
    out
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("^A", vec![0x01])]
    #[case("^?", vec![0x7f])]
    #[case("\\C-a", vec![0x01])]
    #[case("\\M-b", vec![0x1b, b'b'])]
    #[case("\\e[A", vec![0x1b, b'[', b'A'])]
    #[case("abc", vec![b'a', b'b', b'c'])]
    #[case("\\\\", vec![b'\\'])]
    #[case("^X^U", vec![0x18, 0x15])]
    fn notation_translates(#[case] spec: &str, #[case] expected: Vec<u8>) {
        assert_eq!(keyseq(spec), expected);
    }

    #[test]
    fn multibyte_chars_are_utf8_encoded() {
        assert_eq!(keyseq("é"), "é".as_bytes().to_vec());
    }
}
