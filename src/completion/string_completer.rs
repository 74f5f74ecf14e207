use super::{Candidate, Completer};
use crate::parser::ParsedLine;

/// Completes the current word from a fixed list of strings.
#[derive(Debug, Clone, Default)]
pub struct StringsCompleter {
    words: Vec<String>,
}

impl StringsCompleter {
    pub fn new(words: Vec<String>) -> Self {
        StringsCompleter { words }
    }
}

impl Completer for StringsCompleter {
    fn complete(&mut self, _parsed: &ParsedLine, out: &mut Vec<Candidate>) {
        // The engine's matcher chain does the narrowing; offer everything
        out.extend(self.words.iter().map(Candidate::new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DefaultParser, ParseContext, Parser};
    use pretty_assertions::assert_eq;

    #[test]
    fn offers_all_words() {
        let mut completer =
            StringsCompleter::new(vec!["commit".into(), "checkout".into()]);
        let parsed = DefaultParser.parse("c", 1, ParseContext::Complete).unwrap();
        let mut out = Vec::new();
        completer.complete(&parsed, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, "commit");
    }
}
