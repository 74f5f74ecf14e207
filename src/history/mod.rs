mod cursor;

pub use cursor::{ForwardMove, HistoryCursor, NavigationQuery};

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::ops::Deref;
use std::path::PathBuf;

use tracing::warn;

/// One accepted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Monotonically increasing across the session
    pub index: u64,
    /// Unix milliseconds, when timestamping is on
    pub timestamp: Option<i64>,
    pub text: String,
}

/// Filters applied before a line enters history.
#[derive(Debug, Clone, Default)]
pub struct HistoryRules {
    /// Skip lines starting with a space
    pub ignore_space: bool,
    /// Skip a line equal to the previous entry
    pub ignore_dups: bool,
    /// Canonicalize runs of blanks before comparing and storing
    pub reduce_blanks: bool,
    /// Skip lines matching any of these globs
    pub ignore_patterns: Vec<glob::Pattern>,
    /// Append each accepted line to the file immediately
    pub incremental: bool,
    /// Stamp entries with the wall clock
    pub timestamped: bool,
}

impl HistoryRules {
    /// Parse a colon-separated glob list (the `history-ignore` variable).
    pub fn parse_ignore_patterns(spec: &str) -> Vec<glob::Pattern> {
        spec.split(':')
            .filter(|p| !p.is_empty())
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }
}

/// Append-only command history: an in-memory ring capped at `capacity`,
/// optionally mirrored to a file capped at `file_capacity`.
///
/// The file holds one entry per line (`#<unix-millis>` stamp lines when
/// timestamping), newlines inside entries escaped as a backslash-newline
/// pair. The close-time rewrite goes through a temp file and rename, so a
/// failed write leaves the previous file intact.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_index: u64,
    file: Option<PathBuf>,
    file_capacity: usize,
    /// Entries added this session that are not yet in the file
    unsaved: Vec<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(500)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        History {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_index: 0,
            file: None,
            file_capacity: 10_000,
            unsaved: Vec::new(),
        }
    }

    /// History mirrored to `path`, loading whatever the file already holds.
    pub fn with_file(capacity: usize, file_capacity: usize, path: PathBuf) -> io::Result<Self> {
        let mut history = Self::new(capacity);
        history.file_capacity = file_capacity.max(1);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        history.file = Some(path);
        history.load()?;
        Ok(history)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.unsaved.clear();
    }

    /// Apply the ignore rules and append. Returns whether the line was
    /// stored.
    pub fn add(&mut self, line: &str, rules: &HistoryRules) -> bool {
        if line.is_empty() {
            return false;
        }
        if rules.ignore_space && line.starts_with(' ') {
            return false;
        }
        let text = if rules.reduce_blanks {
            reduce_blanks(line)
        } else {
            line.to_string()
        };
        if text.is_empty() {
            return false;
        }
        if rules.ignore_dups {
            if let Some(last) = self.entries.back() {
                if last.text == text {
                    return false;
                }
            }
        }
        if rules.ignore_patterns.iter().any(|p| p.matches(&text)) {
            return false;
        }

        let entry = HistoryEntry {
            index: self.next_index,
            timestamp: rules
                .timestamped
                .then(|| chrono::Utc::now().timestamp_millis()),
            text,
        };
        self.next_index += 1;

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.clone());

        if rules.incremental && self.file.is_some() {
            // A failed incremental write loses only this record
            if let Err(err) = self.append_to_file(&entry) {
                warn!(%err, "incremental history write failed");
                self.unsaved.push(entry);
            }
        } else {
            self.unsaved.push(entry);
        }
        true
    }

    fn load(&mut self) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let file = File::open(path)?;
        let mut lock = fd_lock::RwLock::new(file);
        // Read-lock while another session may be rewriting
        let guard = lock.try_read();
        let entries = match &guard {
            Ok(guard) => read_entries(guard.deref())?,
            Err(_) => read_entries(&File::open(path)?)?,
        };
        for (timestamp, text) in entries {
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back(HistoryEntry {
                index: self.next_index,
                timestamp,
                text,
            });
            self.next_index += 1;
        }
        Ok(())
    }

    fn append_to_file(&mut self, entry: &HistoryEntry) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut lock = fd_lock::RwLock::new(file);
        let mut guard = lock.write()?;
        guard.write_all(encode_entry(entry).as_bytes())?;
        guard.flush()
    }

    /// Merge session entries into the file and rewrite it atomically,
    /// truncating to `file_capacity`. On error the previous file survives.
    pub fn sync(&mut self) -> io::Result<()> {
        let Some(path) = self.file.clone() else {
            self.unsaved.clear();
            return Ok(());
        };
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        let mut lock = fd_lock::RwLock::new(file);
        let guard = lock.write()?;

        let mut merged: Vec<(Option<i64>, String)> = read_entries(guard.deref())?;
        merged.extend(
            self.unsaved
                .iter()
                .map(|e| (e.timestamp, e.text.clone())),
        );
        if merged.len() > self.file_capacity {
            merged.drain(..merged.len() - self.file_capacity);
        }

        let tmp = path.with_extension("tmp");
        {
            let mut out = File::create(&tmp)?;
            for (timestamp, text) in &merged {
                out.write_all(
                    encode_entry(&HistoryEntry {
                        index: 0,
                        timestamp: *timestamp,
                        text: text.clone(),
                    })
                    .as_bytes(),
                )?;
            }
            out.sync_all()?;
        }
        std::fs::rename(&tmp, &path)?;
        drop(guard);
        self.unsaved.clear();
        Ok(())
    }
}

impl Drop for History {
    fn drop(&mut self) {
        if !self.unsaved.is_empty() {
            if let Err(err) = self.sync() {
                warn!(%err, "history rewrite on close failed, keeping previous file");
            }
        }
    }
}

/// Collapse runs of blanks into single spaces and trim the edges.
fn reduce_blanks(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_blank = false;
    for c in line.trim().chars() {
        if c == ' ' || c == '\t' {
            in_blank = true;
        } else {
            if in_blank && !out.is_empty() {
                out.push(' ');
            }
            in_blank = false;
            out.push(c);
        }
    }
    out
}

fn encode_entry(entry: &HistoryEntry) -> String {
    let mut out = String::new();
    if let Some(ts) = entry.timestamp {
        out.push('#');
        out.push_str(&ts.to_string());
        out.push('\n');
    }
    out.push_str(&entry.text.replace('\n', "\\\n"));
    out.push('\n');
    out
}

fn read_entries(file: &File) -> io::Result<Vec<(Option<i64>, String)>> {
    let mut entries = Vec::new();
    let reader = BufReader::new(file);
    let mut pending_timestamp: Option<i64> = None;
    let mut continuation: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        if let Some(mut text) = continuation.take() {
            text.push('\n');
            if let Some(stripped) = line.strip_suffix('\\') {
                text.push_str(stripped);
                continuation = Some(text);
            } else {
                text.push_str(&line);
                entries.push((pending_timestamp.take(), text));
            }
            continue;
        }
        if let Some(stamp) = line.strip_prefix('#') {
            if let Ok(ts) = stamp.trim().parse() {
                pending_timestamp = Some(ts);
                continue;
            }
        }
        if let Some(stripped) = line.strip_suffix('\\') {
            continuation = Some(stripped.to_string());
        } else if !line.is_empty() {
            entries.push((pending_timestamp.take(), line));
        }
    }
    if let Some(text) = continuation {
        entries.push((pending_timestamp, text));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules() -> HistoryRules {
        HistoryRules {
            ignore_space: true,
            ignore_dups: true,
            reduce_blanks: true,
            ..Default::default()
        }
    }

    #[test]
    fn consecutive_duplicates_store_once() {
        let mut h = History::new(10);
        assert!(h.add("ls", &rules()));
        assert!(!h.add("ls", &rules()));
        assert!(h.add("pwd", &rules()));
        assert!(h.add("ls", &rules()));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn leading_space_skips_the_entry() {
        let mut h = History::new(10);
        assert!(!h.add(" secret", &rules()));
        assert!(h.is_empty());
    }

    #[test]
    fn blanks_are_reduced_before_compare() {
        let mut h = History::new(10);
        h.add("git  status", &rules());
        assert!(!h.add("git status", &rules()));
        assert_eq!(h.get(0).unwrap().text, "git status");
    }

    #[test]
    fn ignore_patterns_filter_globs() {
        let mut h = History::new(10);
        let mut r = rules();
        r.ignore_patterns = HistoryRules::parse_ignore_patterns("exit:clear*");
        assert!(!h.add("exit", &r));
        assert!(!h.add("clear -x", &r));
        assert!(h.add("ls", &r));
    }

    #[test]
    fn ring_caps_at_capacity() {
        let mut h = History::new(2);
        h.add("a", &rules());
        h.add("b", &rules());
        h.add("c", &rules());
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(0).unwrap().text, "b");
    }

    #[test]
    fn file_round_trips_ordered_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let mut h = History::with_file(100, 100, path.clone()).unwrap();
            h.add("first", &rules());
            h.add("second line", &rules());
            h.sync().unwrap();
        }
        let h = History::with_file(100, 100, path).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(0).unwrap().text, "first");
        assert_eq!(h.get(1).unwrap().text, "second line");
    }

    #[test]
    fn timestamps_survive_the_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut r = rules();
        r.timestamped = true;
        {
            let mut h = History::with_file(100, 100, path.clone()).unwrap();
            h.add("stamped", &r);
            h.sync().unwrap();
        }
        let h = History::with_file(100, 100, path).unwrap();
        assert!(h.get(0).unwrap().timestamp.is_some());
    }

    #[test]
    fn embedded_newlines_escape_and_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let mut h = History::with_file(100, 100, path.clone()).unwrap();
            h.add("line one\nline two", &HistoryRules::default());
            h.sync().unwrap();
        }
        let h = History::with_file(100, 100, path).unwrap();
        assert_eq!(h.get(0).unwrap().text, "line one\nline two");
    }

    #[test]
    fn incremental_appends_without_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut r = rules();
        r.incremental = true;
        {
            let mut h = History::with_file(100, 100, path.clone()).unwrap();
            h.add("immediate", &r);
            // No sync; the incremental append already hit the disk
        }
        let h = History::with_file(100, 100, path).unwrap();
        assert_eq!(h.get(0).unwrap().text, "immediate");
    }

    #[test]
    fn file_capacity_truncates_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let mut h = History::with_file(100, 2, path.clone()).unwrap();
            h.add("a", &rules());
            h.add("b", &rules());
            h.add("c", &rules());
            h.sync().unwrap();
        }
        let h = History::with_file(100, 2, path).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(0).unwrap().text, "b");
    }
}
