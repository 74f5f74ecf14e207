mod engine;
mod matcher;
mod string_completer;

pub use engine::{group_candidates, layout_lines, normalize_and_dedup, CandidateLayout, MenuState};
pub use matcher::{common_prefix, match_candidates, MatchOptions};
pub use string_completer::StringsCompleter;

use crate::parser::ParsedLine;

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted into the buffer
    pub value: String,
    /// Text shown in listings and menus (may carry ANSI styling)
    pub display: String,
    pub descr: Option<String>,
    pub group: Option<String>,
    /// Appended after the value on acceptance (a path separator, usually)
    pub suffix: Option<String>,
    /// Whether the candidate is complete, i.e. a word terminator may follow
    pub complete: bool,
    /// Disambiguation key for deduplication
    pub key: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Candidate {
            display: value.clone(),
            value,
            descr: None,
            group: None,
            suffix: None,
            complete: true,
            key: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn with_descr(mut self, descr: impl Into<String>) -> Self {
        self.descr = Some(descr.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn partial(mut self) -> Self {
        self.complete = false;
        self
    }

    /// Two candidates are equivalent when value, group and key all match.
    pub(crate) fn dedup_key(&self) -> (&str, &str, &str) {
        (
            self.value.as_str(),
            self.group.as_deref().unwrap_or(""),
            self.key.as_deref().unwrap_or(""),
        )
    }
}

/// A source of completion candidates.
pub trait Completer: Send {
    /// Append candidates for the word under the cursor in `parsed`.
    fn complete(&mut self, parsed: &ParsedLine, out: &mut Vec<Candidate>);
}
