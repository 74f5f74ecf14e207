use std::collections::HashSet;

use nu_ansi_term::Style;
use unicode_width::UnicodeWidthStr;

use super::Candidate;
use crate::painting::StyledText;

/// State of the interactive menu sub-loop.
#[derive(Debug, Clone)]
pub struct MenuState {
    pub candidates: Vec<Candidate>,
    pub selected: usize,
    /// Byte offset in the buffer where the completed word starts
    pub word_start: usize,
    /// Length of the candidate text currently substituted in the buffer
    pub inserted_len: usize,
    /// Buffer and cursor to restore on abort
    pub original_buffer: String,
    pub original_cursor: usize,
}

impl MenuState {
    pub fn current(&self) -> &Candidate {
        &self.candidates[self.selected]
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.candidates.len();
    }

    pub fn prev(&mut self) {
        self.selected = (self.selected + self.candidates.len() - 1) % self.candidates.len();
    }
}

/// Strip ANSI escapes out of the display strings and drop equivalent
/// candidates (same value, group and key), keeping first occurrences.
pub fn normalize_and_dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for mut candidate in candidates {
        let key = {
            let (v, g, k) = candidate.dedup_key();
            (v.to_string(), g.to_string(), k.to_string())
        };
        if !seen.insert(key) {
            continue;
        }
        if candidate.display.contains('\x1b') {
            candidate.display = String::from_utf8(strip_ansi_escapes::strip(&candidate.display))
                .unwrap_or_else(|_| candidate.value.clone());
        }
        out.push(candidate);
    }
    out
}

/// Cluster candidate indices by group, in first-appearance order, with the
/// ungrouped bucket renamed and sorted last. Without grouping, a single
/// anonymous bucket keeps the original order.
pub fn group_candidates(
    candidates: &[Candidate],
    grouped: bool,
    others_group: &str,
) -> Vec<(Option<String>, Vec<usize>)> {
    if !grouped {
        return vec![(None, (0..candidates.len()).collect())];
    }
    let mut groups: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    let mut others: Vec<usize> = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        match &candidate.group {
            Some(name) => {
                match groups.iter_mut().find(|(g, _)| g.as_deref() == Some(name)) {
                    Some((_, members)) => members.push(i),
                    None => groups.push((Some(name.clone()), vec![i])),
                }
            }
            None => others.push(i),
        }
    }
    if !others.is_empty() {
        // The catch-all group only earns a header next to real groups
        if groups.is_empty() {
            groups.push((None, others));
        } else {
            groups.push((Some(others_group.to_string()), others));
        }
    }
    groups
}

/// Layout configuration for listings and menus.
#[derive(Debug, Clone)]
pub struct CandidateLayout {
    pub width: usize,
    /// Fill row-major instead of column-major
    pub rows_first: bool,
    /// Drop alignment padding
    pub packed: bool,
    pub grouped: bool,
    pub others_group: String,
    pub group_style: Style,
    /// Highlight this candidate (menu mode)
    pub selected: Option<usize>,
}

impl CandidateLayout {
    /// Render candidates into display lines: optional group headers, then
    /// the members in columns computed from the terminal width.
    pub fn lines(&self, candidates: &[Candidate]) -> Vec<StyledText> {
        let mut lines = Vec::new();
        for (name, members) in group_candidates(candidates, self.grouped, &self.others_group) {
            if let Some(name) = name {
                let mut header = StyledText::new();
                header.push(self.group_style, name);
                lines.push(header);
            }
            self.layout_group(candidates, &members, &mut lines);
        }
        lines
    }

    fn entry_text(candidate: &Candidate) -> String {
        match &candidate.descr {
            Some(descr) => format!("{}  ({})", candidate.display, descr),
            None => candidate.display.clone(),
        }
    }

    fn layout_group(
        &self,
        candidates: &[Candidate],
        members: &[usize],
        lines: &mut Vec<StyledText>,
    ) {
        if members.is_empty() {
            return;
        }
        let texts: Vec<String> = members
            .iter()
            .map(|&i| Self::entry_text(&candidates[i]))
            .collect();
        let pad = 2;
        let widest = texts.iter().map(|t| t.width()).max().unwrap_or(1);
        let col_width = if self.packed { 0 } else { widest + pad };
        let columns = if self.packed {
            // Greedy estimate from the average width
            let avg = texts.iter().map(|t| t.width() + pad).sum::<usize>() / texts.len().max(1);
            (self.width / avg.max(1)).max(1)
        } else {
            (self.width / col_width.max(1)).max(1)
        };
        let rows = texts.len().div_ceil(columns);

        for row in 0..rows {
            let mut line = StyledText::new();
            for col in 0..columns {
                let slot = if self.rows_first {
                    row * columns + col
                } else {
                    col * rows + row
                };
                if slot >= texts.len() {
                    continue;
                }
                let mut text = texts[slot].clone();
                if !self.packed {
                    let fill = col_width.saturating_sub(text.width());
                    text.push_str(&" ".repeat(fill));
                } else {
                    text.push_str("  ");
                }
                let style = if self.selected == Some(members[slot]) {
                    Style::new().reverse()
                } else {
                    Style::new()
                };
                line.push(style, text);
            }
            lines.push(line);
        }
    }
}

/// Convenience wrapper used by the session: lay out candidates with a
/// plain configuration.
pub fn layout_lines(
    candidates: &[Candidate],
    width: usize,
    rows_first: bool,
    packed: bool,
    grouped: bool,
    others_group: &str,
    group_style: Style,
    selected: Option<usize>,
) -> Vec<StyledText> {
    CandidateLayout {
        width,
        rows_first,
        packed,
        grouped,
        others_group: others_group.to_string(),
        group_style,
        selected,
    }
    .lines(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidates(values: &[&str]) -> Vec<Candidate> {
        values.iter().map(|v| Candidate::new(*v)).collect()
    }

    #[test]
    fn dedup_drops_equivalent_candidates() {
        let mut cands = candidates(&["a", "b", "a"]);
        cands[2].key = Some("other".into());
        let out = normalize_and_dedup(cands);
        // The keyed duplicate is a different candidate
        assert_eq!(out.len(), 3);

        let out = normalize_and_dedup(candidates(&["a", "b", "a"]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn dedup_strips_ansi_from_display() {
        let mut cand = Candidate::new("plain");
        cand.display = "\x1b[32mplain\x1b[0m".into();
        let out = normalize_and_dedup(vec![cand]);
        assert_eq!(out[0].display, "plain");
    }

    #[test]
    fn grouping_clusters_and_appends_others() {
        let mut cands = candidates(&["a", "b", "c", "d"]);
        cands[0].group = Some("files".into());
        cands[2].group = Some("files".into());
        cands[1].group = Some("vars".into());
        let groups = group_candidates(&cands, true, "others");
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], (Some("files".into()), vec![0, 2]));
        assert_eq!(groups[1], (Some("vars".into()), vec![1]));
        assert_eq!(groups[2], (Some("others".into()), vec![3]));
    }

    #[test]
    fn ungrouped_layout_keeps_order() {
        let groups = group_candidates(&candidates(&["x", "y"]), false, "others");
        assert_eq!(groups, vec![(None, vec![0, 1])]);
    }

    #[test]
    fn column_major_layout_by_default() {
        let layout = CandidateLayout {
            width: 20,
            rows_first: false,
            packed: false,
            grouped: false,
            others_group: "others".into(),
            group_style: Style::new(),
            selected: None,
        };
        // width 20, widest 1 + 2 pad -> 6 columns, so one row
        let lines = layout.lines(&candidates(&["a", "b", "c"]));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].raw_string().trim_end(), "a  b  c");
    }

    #[test]
    fn narrow_width_wraps_to_rows_column_major() {
        let layout = CandidateLayout {
            width: 8,
            rows_first: false,
            packed: false,
            grouped: false,
            others_group: "others".into(),
            group_style: Style::new(),
            selected: None,
        };
        let lines = layout.lines(&candidates(&["aa", "bb", "cc", "dd"]));
        // 2 columns of width 4 -> 2 rows; column-major puts aa/bb left
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].raw_string().trim_end(), "aa  cc");
        assert_eq!(lines[1].raw_string().trim_end(), "bb  dd");
    }

    #[test]
    fn rows_first_fills_across() {
        let layout = CandidateLayout {
            width: 8,
            rows_first: true,
            packed: false,
            grouped: false,
            others_group: "others".into(),
            group_style: Style::new(),
            selected: None,
        };
        let lines = layout.lines(&candidates(&["aa", "bb", "cc", "dd"]));
        assert_eq!(lines[0].raw_string().trim_end(), "aa  bb");
        assert_eq!(lines[1].raw_string().trim_end(), "cc  dd");
    }

    #[test]
    fn selected_candidate_is_highlighted() {
        let layout = CandidateLayout {
            width: 40,
            rows_first: false,
            packed: false,
            grouped: false,
            others_group: "others".into(),
            group_style: Style::new(),
            selected: Some(1),
        };
        let lines = layout.lines(&candidates(&["aa", "bb"]));
        let runs = lines[0].runs();
        assert!(runs.iter().any(|(style, text)| {
            text.starts_with("bb") && *style == Style::new().reverse()
        }));
    }

    #[test]
    fn menu_cycles_both_ways() {
        let mut menu = MenuState {
            candidates: candidates(&["a", "b", "c"]),
            selected: 0,
            word_start: 0,
            inserted_len: 0,
            original_buffer: String::new(),
            original_cursor: 0,
        };
        menu.next();
        assert_eq!(menu.current().value, "b");
        menu.prev();
        menu.prev();
        assert_eq!(menu.current().value, "c");
    }
}
