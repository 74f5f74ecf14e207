use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Well known variable names. Embedders may set any string key; these are the
/// ones the engine itself reads.
pub mod vars {
    pub const AMBIGUOUS_BINDING: &str = "ambiguous-binding";
    pub const BELL_STYLE: &str = "bell-style";
    pub const COMMENT_BEGIN: &str = "comment-begin";
    pub const COMPLETION_STYLE_GROUP: &str = "completion-style-group";
    pub const ERRORS: &str = "errors";
    pub const FEATURES_MAX_BUFFER_SIZE: &str = "features-max-buffer-size";
    pub const HISTORY_FILE: &str = "history-file";
    pub const HISTORY_FILE_SIZE: &str = "history-file-size";
    pub const HISTORY_IGNORE: &str = "history-ignore";
    pub const HISTORY_SIZE: &str = "history-size";
    pub const LINE_OFFSET: &str = "line-offset";
    pub const LIST_MAX: &str = "list-max";
    pub const MAX_REPEAT_COUNT: &str = "max-repeat-count";
    pub const MENU_LIST_MAX: &str = "menu-list-max";
    pub const OTHERS_GROUP_NAME: &str = "others-group-name";
    pub const REMOVE_SUFFIX_CHARS: &str = "REMOVE_SUFFIX_CHARS";
    pub const SEARCH_TERMINATORS: &str = "search-terminators";
    pub const SECONDARY_PROMPT_PATTERN: &str = "secondary-prompt-pattern";
    pub const SUGGESTIONS_MIN_BUFFER_SIZE: &str = "suggestions-min-buffer-size";
    pub const TAB_WIDTH: &str = "tab-width";
    pub const WORDCHARS: &str = "WORDCHARS";
}

/// How `beep` and failed widgets make themselves heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BellStyle {
    /// Stay silent
    None,
    /// BEL
    #[default]
    Audible,
    /// Flash the screen
    Visible,
}

/// String-keyed configuration variables with typed accessors.
///
/// Unset variables fall back to the documented default of each accessor, so
/// a fresh `Variables` behaves like a fully configured session.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn unset(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Integer variable, falling back on missing or unparsable values.
    pub fn int(&self, name: &str, default: i64) -> i64 {
        self.get(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn usize(&self, name: &str, default: usize) -> usize {
        self.get(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Millisecond variable as a [`Duration`].
    pub fn millis(&self, name: &str, default_ms: u64) -> Duration {
        let ms = self.int(name, default_ms as i64).max(0) as u64;
        Duration::from_millis(ms)
    }

    pub fn bell_style(&self) -> BellStyle {
        match self.str_or(vars::BELL_STYLE, "audible") {
            "none" | "off" => BellStyle::None,
            "visible" => BellStyle::Visible,
            _ => BellStyle::Audible,
        }
    }
}

/// Boolean behavior switches, each with a fixed default.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EditOption {
    CompleteInWord,
    CaseInsensitive,
    AutoGroup,
    AutoMenu,
    AutoList,
    Group,
    AutoParamSlash,
    AutoRemoveSlash,
    BracketedPaste,
    HistoryIgnoreSpace,
    HistoryIgnoreDups,
    HistoryReduceBlanks,
    HistoryBeep,
    HistoryIncremental,
    HistoryTimestamped,
    DelayLineWrap,
    EmptyWordOptions,
    CompleteMatcherTypo,
    DisableUndo,
    EraseLineOnFinish,
    InsertTab,
    Mouse,
    ListRowsFirst,
    ListPacked,
}

impl EditOption {
    /// Default state when the embedder has not touched the option.
    pub const fn default_on(self) -> bool {
        use EditOption::*;
        matches!(
            self,
            AutoGroup
                | AutoMenu
                | AutoList
                | Group
                | AutoParamSlash
                | AutoRemoveSlash
                | BracketedPaste
                | HistoryIgnoreSpace
                | HistoryIgnoreDups
                | HistoryReduceBlanks
                | HistoryBeep
                | HistoryIncremental
                | HistoryTimestamped
                | EmptyWordOptions
                | CompleteMatcherTypo
        )
    }
}

/// Option set: defaults plus explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct Options {
    overrides: HashMap<EditOption, bool>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, option: EditOption) -> bool {
        self.overrides
            .get(&option)
            .copied()
            .unwrap_or_else(|| option.default_on())
    }

    pub fn set(&mut self, option: EditOption, on: bool) {
        self.overrides.insert(option, on);
    }

    /// Forget any override, returning the option to its default.
    pub fn reset(&mut self, option: EditOption) {
        self.overrides.remove(&option);
    }

    /// Snapshot of every option's effective state.
    pub fn effective(&self) -> Vec<(EditOption, bool)> {
        EditOption::iter().map(|o| (o, self.is_set(o))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unset_variables_use_defaults() {
        let vars = Variables::new();
        assert_eq!(vars.int(vars::ERRORS, 2), 2);
        assert_eq!(vars.usize(vars::HISTORY_SIZE, 500), 500);
        assert_eq!(vars.millis(vars::AMBIGUOUS_BINDING, 1000).as_millis(), 1000);
        assert_eq!(vars.bell_style(), BellStyle::Audible);
    }

    #[test]
    fn garbage_numeric_values_fall_back() {
        let mut vars = Variables::new();
        vars.set(vars::LIST_MAX, "not-a-number");
        assert_eq!(vars.usize(vars::LIST_MAX, 100), 100);
    }

    #[test]
    fn option_defaults_match_documentation() {
        let opts = Options::new();
        assert!(opts.is_set(EditOption::AutoMenu));
        assert!(opts.is_set(EditOption::BracketedPaste));
        assert!(!opts.is_set(EditOption::CompleteInWord));
        assert!(!opts.is_set(EditOption::DisableUndo));
        assert!(!opts.is_set(EditOption::DelayLineWrap));
    }

    #[test]
    fn overrides_survive_and_reset() {
        let mut opts = Options::new();
        opts.set(EditOption::AutoMenu, false);
        assert!(!opts.is_set(EditOption::AutoMenu));
        opts.reset(EditOption::AutoMenu);
        assert!(opts.is_set(EditOption::AutoMenu));
    }

    #[test]
    fn option_names_render_like_config_keys() {
        assert_eq!(EditOption::HistoryIgnoreDups.to_string(), "HISTORY_IGNORE_DUPS");
        assert_eq!(EditOption::AutoParamSlash.to_string(), "AUTO_PARAM_SLASH");
    }
}
