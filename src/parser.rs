use thiserror::Error;

/// Why a line could not be parsed to completion: the input is missing a
/// closing token. Never surfaces to the embedder; `accept-line` turns it
/// into a secondary-prompt continuation with the missing token available to
/// the prompt template as `%M`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("incomplete input, missing {missing}")]
pub struct IncompleteInput {
    pub missing: String,
}

/// What the parse result will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    /// The user pressed `accept-line`; incomplete input should continue on
    /// a secondary prompt
    AcceptLine,
    /// Completion wants the word under the cursor
    Complete,
}

/// A line split into words with the cursor located inside one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub words: Vec<String>,
    /// Index into `words` of the word being edited
    pub word_index: usize,
    /// Cursor offset in bytes within that word
    pub word_cursor: usize,
    pub line: String,
    pub cursor: usize,
    /// Cursor offset within the raw (unescaped) word, when they differ
    pub raw_word_cursor: Option<usize>,
}

impl ParsedLine {
    /// The word being edited.
    pub fn word(&self) -> &str {
        self.words
            .get(self.word_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Byte offset in `line` where the edited word starts.
    pub fn word_start(&self) -> usize {
        self.cursor - self.word_cursor
    }
}

pub trait Parser: Send {
    fn parse(
        &self,
        line: &str,
        cursor: usize,
        context: ParseContext,
    ) -> std::result::Result<ParsedLine, IncompleteInput>;
}

/// Whitespace splitter honoring single quotes, double quotes and backslash
/// escapes. Newlines count as whitespace, so multi-line buffers parse as
/// one command.
#[derive(Debug, Default, Clone)]
pub struct DefaultParser;

impl Parser for DefaultParser {
    fn parse(
        &self,
        line: &str,
        cursor: usize,
        context: ParseContext,
    ) -> std::result::Result<ParsedLine, IncompleteInput> {
        let mut words: Vec<(usize, String)> = Vec::new();
        let mut current: Option<(usize, String)> = None;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (idx, c) in line.char_indices() {
            if escaped {
                current
                    .get_or_insert_with(|| (idx, String::new()))
                    .1
                    .push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' if quote != Some('\'') => {
                    escaped = true;
                    current.get_or_insert_with(|| (idx, String::new()));
                }
                '\'' | '"' => match quote {
                    Some(q) if q == c => quote = None,
                    Some(_) => current
                        .get_or_insert_with(|| (idx, String::new()))
                        .1
                        .push(c),
                    None => {
                        quote = Some(c);
                        current.get_or_insert_with(|| (idx, String::new()));
                    }
                },
                c if c.is_whitespace() && quote.is_none() => {
                    if let Some(word) = current.take() {
                        words.push(word);
                    }
                }
                c => {
                    current
                        .get_or_insert_with(|| (idx, String::new()))
                        .1
                        .push(c);
                }
            }
        }
        if let Some(word) = current.take() {
            words.push(word);
        }

        if context == ParseContext::AcceptLine {
            if let Some(q) = quote {
                return Err(IncompleteInput { missing: q.to_string() });
            }
            if escaped {
                return Err(IncompleteInput {
                    missing: "\\".to_string(),
                });
            }
        }

        // Locate the word the cursor is in; in whitespace, the cursor opens
        // a fresh empty word at its own position.
        let mut found: Option<usize> = None;
        let mut insert_at: Option<usize> = None;
        let mut raw_cursor = 0;
        for (i, (start, word)) in words.iter().enumerate() {
            let raw_end = next_word_boundary(line, *start, word);
            if cursor >= *start && cursor <= raw_end {
                found = Some(i);
                raw_cursor = cursor - *start;
                break;
            }
            if cursor < *start {
                insert_at = Some(i);
                break;
            }
        }
        let word_index = match (found, insert_at) {
            (Some(i), _) => i,
            (None, Some(i)) => {
                words.insert(i, (cursor, String::new()));
                i
            }
            (None, None) => {
                words.push((cursor, String::new()));
                words.len() - 1
            }
        };
        let word_len = words[word_index].1.len();
        let word_cursor = raw_cursor.min(word_len);

        Ok(ParsedLine {
            words: words.into_iter().map(|(_, w)| w).collect(),
            word_index,
            word_cursor,
            line: line.to_string(),
            cursor,
            raw_word_cursor: (raw_cursor != word_cursor).then_some(raw_cursor),
        })
    }
}

/// End offset in `line` of the raw text belonging to a word that started at
/// `start`. Quoting can make the raw span longer than the cooked word.
fn next_word_boundary(line: &str, start: usize, _word: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in line[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quote != Some('\'') => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == c => quote = None,
                Some(_) => {}
                None => quote = Some(c),
            },
            c if c.is_whitespace() && quote.is_none() => return start + idx,
            _ => {}
        }
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str, cursor: usize) -> ParsedLine {
        DefaultParser.parse(line, cursor, ParseContext::Complete).unwrap()
    }

    #[test]
    fn splits_words_and_finds_cursor_word() {
        let parsed = parse("git checkout main", 6);
        assert_eq!(parsed.words, vec!["git", "checkout", "main"]);
        assert_eq!(parsed.word_index, 1);
        assert_eq!(parsed.word_cursor, 2);
        assert_eq!(parsed.word(), "checkout");
        assert_eq!(parsed.word_start(), 4);
    }

    #[test]
    fn cursor_in_whitespace_opens_empty_word() {
        let parsed = parse("ls  -l", 3);
        assert_eq!(parsed.word(), "");
        assert_eq!(parsed.word_cursor, 0);
    }

    #[test]
    fn cursor_at_end_continues_last_word() {
        let parsed = parse("comm", 4);
        assert_eq!(parsed.word_index, 0);
        assert_eq!(parsed.word_cursor, 4);
    }

    #[test]
    fn quotes_group_words() {
        let parsed = parse("echo 'hello world' x", 20);
        assert_eq!(parsed.words, vec!["echo", "hello world", "x"]);
    }

    #[test]
    fn unclosed_quote_is_incomplete_on_accept() {
        let err = DefaultParser
            .parse("echo 'oops", 10, ParseContext::AcceptLine)
            .unwrap_err();
        assert_eq!(err.missing, "'");
    }

    #[test]
    fn unclosed_quote_is_fine_for_completion() {
        let parsed = parse("echo 'oo", 8);
        assert_eq!(parsed.word(), "oo");
    }

    #[test]
    fn trailing_backslash_is_incomplete() {
        let err = DefaultParser
            .parse("echo abc\\", 9, ParseContext::AcceptLine)
            .unwrap_err();
        assert_eq!(err.missing, "\\");
    }

    #[test]
    fn newlines_are_word_separators() {
        let parsed = parse("one\ntwo", 7);
        assert_eq!(parsed.words, vec!["one", "two"]);
        assert_eq!(parsed.word_index, 1);
    }
}
