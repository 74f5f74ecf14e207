use std::collections::{HashMap, VecDeque};

const KILL_RING_CAPACITY: usize = 60;

/// Which side a kill grew from, controlling how contiguous kills merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillDirection {
    /// `kill-word`, `kill-line`: new text appends to the top entry
    Forward,
    /// `backward-kill-word`, `backward-kill-line`: new text prepends
    Backward,
}

/// Rotating store of killed text plus vi-style named registers.
///
/// `kill` pushes a new entry unless the previous widget was also a kill, in
/// which case the texts merge into one entry. `yank` returns the entry under
/// the yank pointer; `yank_pop` rotates the pointer to the previous entry.
#[derive(Debug, Default)]
pub struct KillRing {
    entries: VecDeque<String>,
    yank_index: usize,
    registers: HashMap<char, String>,
}

impl KillRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push killed text, merging with the top entry when `merge` is set.
    pub fn kill(&mut self, text: &str, direction: KillDirection, merge: bool) {
        if text.is_empty() {
            return;
        }
        if merge {
            if let Some(top) = self.entries.front_mut() {
                match direction {
                    KillDirection::Forward => top.push_str(text),
                    KillDirection::Backward => top.insert_str(0, text),
                }
                self.yank_index = 0;
                return;
            }
        }
        self.entries.push_front(text.to_string());
        self.entries.truncate(KILL_RING_CAPACITY);
        self.yank_index = 0;
    }

    /// Text under the yank pointer.
    pub fn yank(&mut self) -> Option<&str> {
        self.yank_index = 0;
        self.entries.front().map(String::as_str)
    }

    /// Rotate to the previous entry; returns it for the caller to swap in
    /// place of the just-yanked region.
    pub fn yank_pop(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.yank_index = (self.yank_index + 1) % self.entries.len();
        self.entries.get(self.yank_index).map(String::as_str)
    }

    // --- vi registers ------------------------------------------------------

    /// Store into a named register. An uppercase name appends to the
    /// lowercase register, vi style.
    pub fn set_register(&mut self, name: char, text: &str) {
        if name.is_ascii_uppercase() {
            let slot = self.registers.entry(name.to_ascii_lowercase()).or_default();
            slot.push_str(text);
        } else {
            self.registers.insert(name, text.to_string());
        }
    }

    pub fn register(&self, name: char) -> Option<&str> {
        self.registers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Overwrite every stored string with NULs and drop them. Used when a
    /// session held secrets.
    pub fn zero_out(&mut self) {
        for entry in self.entries.iter_mut() {
            let nulls = "\0".repeat(entry.len());
            *entry = nulls;
        }
        self.entries.clear();
        for (_, entry) in self.registers.iter_mut() {
            let nulls = "\0".repeat(entry.len());
            *entry = nulls;
        }
        self.registers.clear();
        self.yank_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kills_stack_and_yank_returns_newest() {
        let mut ring = KillRing::new();
        ring.kill("one", KillDirection::Forward, false);
        ring.kill("two", KillDirection::Forward, false);
        assert_eq!(ring.yank(), Some("two"));
    }

    #[test]
    fn contiguous_kills_merge_by_direction() {
        let mut ring = KillRing::new();
        ring.kill("world", KillDirection::Forward, false);
        ring.kill("!", KillDirection::Forward, true);
        assert_eq!(ring.yank(), Some("world!"));

        ring.kill("hello ", KillDirection::Backward, true);
        assert_eq!(ring.yank(), Some("hello world!"));
    }

    #[test]
    fn yank_pop_cycles_through_entries() {
        let mut ring = KillRing::new();
        ring.kill("a", KillDirection::Forward, false);
        ring.kill("b", KillDirection::Forward, false);
        ring.kill("c", KillDirection::Forward, false);

        assert_eq!(ring.yank(), Some("c"));
        assert_eq!(ring.yank_pop(), Some("b"));
        assert_eq!(ring.yank_pop(), Some("a"));
        assert_eq!(ring.yank_pop(), Some("c"));
    }

    #[test]
    fn uppercase_register_appends() {
        let mut ring = KillRing::new();
        ring.set_register('a', "foo");
        ring.set_register('A', "bar");
        assert_eq!(ring.register('a'), Some("foobar"));
    }

    #[test]
    fn zero_out_leaves_nothing_behind() {
        let mut ring = KillRing::new();
        ring.kill("s3cret", KillDirection::Forward, false);
        ring.set_register('a', "s3cret");
        ring.zero_out();
        assert!(ring.is_empty());
        assert_eq!(ring.register('a'), None);
    }
}
