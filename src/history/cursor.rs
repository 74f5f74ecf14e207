use super::History;

/// How history navigation filters entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavigationQuery {
    /// Plain chronological walking
    #[default]
    Normal,
    /// Only entries starting with the given prefix
    Prefix(String),
    /// Only entries containing the given substring
    Substring(String),
}

/// Result of moving the cursor toward newer entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMove {
    /// Landed on an entry
    Entry(usize),
    /// Walked past the newest entry; the saved in-progress line applies
    Restore,
    /// Already past the newest entry
    Stay,
}

/// Navigation cursor over a [`History`].
///
/// The position past the newest entry is the in-progress line: entering
/// navigation saves it, and walking forward off the end restores it
/// verbatim. The cursor is independent of any search sub-loop state.
#[derive(Debug, Default)]
pub struct HistoryCursor {
    /// `None` while on the in-progress line
    position: Option<usize>,
    query: NavigationQuery,
    saved_line: Option<(String, usize)>,
}

impl HistoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_navigating(&self) -> bool {
        self.position.is_some()
    }

    pub fn set_query(&mut self, query: NavigationQuery) {
        if self.query != query {
            self.query = query;
        }
    }

    pub fn query(&self) -> &NavigationQuery {
        &self.query
    }

    /// Remember the in-progress line before the first navigation step.
    pub fn save_line(&mut self, line: &str, cursor: usize) {
        if self.position.is_none() {
            self.saved_line = Some((line.to_string(), cursor));
        }
    }

    pub fn take_saved_line(&mut self) -> Option<(String, usize)> {
        self.saved_line.take()
    }

    /// Back to the in-progress line without restoring it.
    pub fn reset(&mut self) {
        self.position = None;
        self.query = NavigationQuery::Normal;
        self.saved_line = None;
    }

    fn matches(&self, text: &str) -> bool {
        match &self.query {
            NavigationQuery::Normal => true,
            NavigationQuery::Prefix(prefix) => text.starts_with(prefix.as_str()),
            NavigationQuery::Substring(needle) => text.contains(needle.as_str()),
        }
    }

    /// Move toward older entries. Returns the new position, or `None` when
    /// no older entry matches (cursor unchanged).
    pub fn back(&mut self, history: &History) -> Option<usize> {
        let mut i = self.position.unwrap_or(history.len());
        while i > 0 {
            i -= 1;
            if self.matches(&history.get(i)?.text) {
                self.position = Some(i);
                return Some(i);
            }
        }
        None
    }

    /// Move toward newer entries.
    pub fn forward(&mut self, history: &History) -> ForwardMove {
        let Some(pos) = self.position else {
            return ForwardMove::Stay;
        };
        let mut i = pos + 1;
        while i < history.len() {
            if let Some(entry) = history.get(i) {
                if self.matches(&entry.text) {
                    self.position = Some(i);
                    return ForwardMove::Entry(i);
                }
            }
            i += 1;
        }
        self.position = None;
        ForwardMove::Restore
    }

    /// Jump to the oldest entry.
    pub fn first(&mut self, history: &History) -> Option<usize> {
        for i in 0..history.len() {
            let matched = history
                .get(i)
                .map(|e| self.matches(&e.text))
                .unwrap_or(false);
            if matched {
                self.position = Some(i);
                return Some(i);
            }
        }
        None
    }

    /// Jump past the newest entry (the in-progress line).
    pub fn last(&mut self) -> ForwardMove {
        if self.position.is_some() {
            self.position = None;
            ForwardMove::Restore
        } else {
            ForwardMove::Stay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{History, HistoryRules};
    use pretty_assertions::assert_eq;

    fn history(entries: &[&str]) -> History {
        let mut h = History::new(100);
        let rules = HistoryRules::default();
        for entry in entries {
            h.add(entry, &rules);
        }
        h
    }

    #[test]
    fn back_walks_newest_to_oldest() {
        let h = history(&["ls", "ls -l", "git status"]);
        let mut cursor = HistoryCursor::new();
        assert_eq!(cursor.back(&h), Some(2));
        assert_eq!(cursor.back(&h), Some(1));
        assert_eq!(cursor.back(&h), Some(0));
        assert_eq!(cursor.back(&h), None);
        assert_eq!(cursor.position(), Some(0));
    }

    #[test]
    fn forward_past_newest_restores_saved_line() {
        let h = history(&["ls"]);
        let mut cursor = HistoryCursor::new();
        cursor.save_line("in progress", 3);
        cursor.back(&h);
        assert_eq!(cursor.forward(&h), ForwardMove::Restore);
        assert_eq!(cursor.take_saved_line(), Some(("in progress".into(), 3)));
        assert_eq!(cursor.forward(&h), ForwardMove::Stay);
    }

    #[test]
    fn prefix_query_skips_non_matches() {
        let h = history(&["ls", "git status", "ls -l", "make"]);
        let mut cursor = HistoryCursor::new();
        cursor.set_query(NavigationQuery::Prefix("ls".into()));
        assert_eq!(cursor.back(&h), Some(2));
        assert_eq!(cursor.back(&h), Some(0));
        assert_eq!(cursor.back(&h), None);
    }

    #[test]
    fn substring_query_matches_anywhere() {
        let h = history(&["git status", "echo stat"]);
        let mut cursor = HistoryCursor::new();
        cursor.set_query(NavigationQuery::Substring("stat".into()));
        assert_eq!(cursor.back(&h), Some(1));
        assert_eq!(cursor.back(&h), Some(0));
    }

    #[test]
    fn first_and_last_jump_to_the_edges() {
        let h = history(&["a", "b", "c"]);
        let mut cursor = HistoryCursor::new();
        assert_eq!(cursor.first(&h), Some(0));
        assert_eq!(cursor.last(), ForwardMove::Restore);
        assert!(cursor.position().is_none());
    }
}
