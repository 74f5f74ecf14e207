use std::collections::HashMap;

use nu_ansi_term::{Color, Style};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    completion::{
        self, common_prefix, match_candidates, Candidate, Completer, MatchOptions, MenuState,
        StringsCompleter,
    },
    config::{vars, BellStyle, EditOption, Options, Variables},
    core_editor::{Editor, KillDirection},
    expander::{Expander, NullExpander},
    external_printer::ExternalPrinter,
    highlighter::{Highlighter, NullHighlighter},
    history::{History, HistoryCursor, HistoryRules, NavigationQuery},
    keymap::{
        default_emacs_keymap, default_isearch_keymap, default_menu_keymap, default_vicmd_keymap,
        default_viins_keymap, default_viopp_keymap, default_visual_keymap, keyseq, Binding,
        Decoded, InputDecoder, KeyMap, Lookup,
    },
    masking::{CharMask, MaskingCallback},
    parser::{DefaultParser, ParseContext, Parser},
    painting::{cells_of_ansi_str, Cell, Painter, StatusBar, StyledText, WrapModel},
    prompt::{PromptContext, PromptTemplate},
    result::{ReadlineError, Result},
    terminal::{CrosstermTerminal, Terminal},
    widgets,
};

const BRACKETED_PASTE_ON: &[u8] = b"\x1b[?2004h";
const BRACKETED_PASTE_OFF: &[u8] = b"\x1b[?2004l";
pub(crate) const BRACKETED_PASTE_END: &[u8] = b"\x1b[201~";

/// Editing style used by a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Emacs,
    Vi,
}

/// How the read loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LoopStatus {
    #[default]
    Editing,
    Accepted,
    Aborted,
    Eof,
}

/// Everything one `read_line` call can be configured with.
#[derive(Default)]
pub struct ReadLineRequest {
    pub(crate) prompt: PromptTemplate,
    pub(crate) right_prompt: Option<PromptTemplate>,
    pub(crate) masking: Option<Box<dyn MaskingCallback>>,
    pub(crate) initial_buffer: Option<String>,
}

impl ReadLineRequest {
    pub fn new(prompt: impl Into<PromptTemplate>) -> Self {
        ReadLineRequest {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_right_prompt(mut self, prompt: impl Into<PromptTemplate>) -> Self {
        self.right_prompt = Some(prompt.into());
        self
    }

    /// Echo every grapheme as `mask` and keep the line out of history.
    #[must_use]
    pub fn with_mask(mut self, mask: char) -> Self {
        self.masking = Some(Box::new(CharMask::new(mask)));
        self
    }

    #[must_use]
    pub fn with_masking_callback(mut self, masking: Box<dyn MaskingCallback>) -> Self {
        self.masking = Some(masking);
        self
    }

    #[must_use]
    pub fn with_initial_buffer(mut self, buffer: impl Into<String>) -> Self {
        self.initial_buffer = Some(buffer.into());
        self
    }
}

pub(crate) struct SearchState {
    pub pattern: String,
    pub backward: bool,
    pub regex: bool,
    pub failing: bool,
    /// History index of the current match
    pub current: Option<usize>,
    /// Byte offset of the match inside the entry
    pub match_offset: usize,
    pub saved_buffer: String,
    pub saved_cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViOperator {
    Delete,
    Change,
    Yank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MotionKind {
    Exclusive,
    Inclusive,
    Linewise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindKind {
    Next,
    Prev,
    NextSkip,
    PrevSkip,
}

#[derive(Default)]
pub(crate) struct ViState {
    pub pending_op: Option<ViOperator>,
    pub register: Option<char>,
    pub last_find: Option<(FindKind, char)>,
}

/// What a completion widget asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompleteKind {
    /// Insert the sole candidate or the common prefix
    Word,
    /// Like `Word`, after giving the expander a shot
    ExpandOrWord,
    /// Enter the menu immediately
    Menu,
    /// Enter the menu starting from the last candidate
    MenuReverse,
    /// Only list the possibilities
    List,
}

/// The interactive line-edit session.
///
/// Owns the buffer, kill ring, keymaps, history cursor and painter, and
/// runs the read loop: decode a key, look it up in the active keymap, run
/// the bound widget, reconcile the screen. Incremental search and the
/// completion menu are sub-loops that reinterpret keys until they finish.
pub struct EditSession {
    pub(crate) terminal: Box<dyn Terminal>,
    pub(crate) editor: Editor,
    pub(crate) decoder: InputDecoder,
    pub(crate) painter: Painter,
    pub(crate) status_bar: StatusBar,

    pub(crate) keymaps: HashMap<String, KeyMap>,
    pub(crate) keymap_name: String,
    pub(crate) main_keymap: String,

    pub(crate) variables: Variables,
    pub(crate) options: Options,

    pub(crate) history: History,
    pub(crate) history_cursor: HistoryCursor,

    pub(crate) parser: Box<dyn Parser>,
    pub(crate) completers: Vec<Box<dyn Completer>>,
    pub(crate) highlighter: Box<dyn Highlighter>,
    pub(crate) expander: Box<dyn Expander>,
    pub(crate) masking: Option<Box<dyn MaskingCallback>>,

    pub(crate) printer: Option<ExternalPrinter>,

    // Per-read state
    pub(crate) status: LoopStatus,
    pub(crate) prompt: PromptTemplate,
    pub(crate) right_prompt: Option<PromptTemplate>,
    pub(crate) continuation_missing: String,
    pub(crate) pending_arg: Option<i64>,
    pub(crate) last_widget: Option<String>,
    pub(crate) last_char: Option<char>,
    pub(crate) last_seq: Vec<u8>,
    pub(crate) search: Option<SearchState>,
    pub(crate) menu: Option<MenuState>,
    pub(crate) footer: Vec<StyledText>,
    pub(crate) hint: Option<String>,
    pub(crate) vi: ViState,
    pub(crate) vi_recording: Option<Vec<u8>>,
    pub(crate) vi_last_change: Option<Vec<u8>>,
    pub(crate) inserted_suffix: Option<String>,
    pub(crate) reading: bool,
    pub(crate) cached_size: (u16, u16),
}

impl EditSession {
    /// A session on the process terminal with an Emacs keymap, in-memory
    /// history and no completion sources.
    pub fn create() -> Self {
        Self::with_terminal(Box::new(CrosstermTerminal::new()))
    }

    /// A session on any [`Terminal`] implementation.
    pub fn with_terminal(terminal: Box<dyn Terminal>) -> Self {
        let mut keymaps = HashMap::new();
        keymaps.insert("emacs".to_string(), default_emacs_keymap());
        keymaps.insert("viins".to_string(), default_viins_keymap());
        keymaps.insert("vicmd".to_string(), default_vicmd_keymap());
        keymaps.insert("viopp".to_string(), default_viopp_keymap());
        keymaps.insert("visual".to_string(), default_visual_keymap());
        keymaps.insert("isearch".to_string(), default_isearch_keymap());
        keymaps.insert("menu".to_string(), default_menu_keymap());

        let cached_size = terminal.size();
        EditSession {
            terminal,
            editor: Editor::new(),
            decoder: InputDecoder::new(),
            painter: Painter::new(),
            status_bar: StatusBar::new(),
            keymaps,
            keymap_name: "emacs".to_string(),
            main_keymap: "emacs".to_string(),
            variables: Variables::new(),
            options: Options::new(),
            history: History::default(),
            history_cursor: HistoryCursor::new(),
            parser: Box::new(DefaultParser),
            completers: Vec::new(),
            highlighter: Box::new(NullHighlighter),
            expander: Box::new(NullExpander),
            masking: None,
            printer: None,
            status: LoopStatus::Editing,
            prompt: PromptTemplate::default(),
            right_prompt: None,
            continuation_missing: String::new(),
            pending_arg: None,
            last_widget: None,
            last_char: None,
            last_seq: Vec::new(),
            search: None,
            menu: None,
            footer: Vec::new(),
            hint: None,
            vi: ViState::default(),
            vi_recording: None,
            vi_last_change: None,
            inserted_suffix: None,
            reading: false,
            cached_size,
        }
    }

    // --- builder-style configuration --------------------------------------

    #[must_use]
    pub fn with_edit_mode(mut self, mode: EditMode) -> Self {
        self.main_keymap = match mode {
            EditMode::Emacs => "emacs".to_string(),
            EditMode::Vi => "viins".to_string(),
        };
        self.keymap_name = self.main_keymap.clone();
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: Box<dyn Completer>) -> Self {
        self.completers.push(completer);
        self
    }

    #[must_use]
    pub fn with_string_completions(self, words: Vec<String>) -> Self {
        self.with_completer(Box::new(StringsCompleter::new(words)))
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Box<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Box<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    #[must_use]
    pub fn with_expander(mut self, expander: Box<dyn Expander>) -> Self {
        self.expander = expander;
        self
    }

    /// Attach a print-above queue; hand its sender to other threads.
    #[must_use]
    pub fn with_external_printer(mut self, printer: ExternalPrinter) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn variables(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn options(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Status-bar surface shared with the terminal.
    pub fn status_lines(&mut self, lines: Vec<StyledText>) -> Result<()> {
        let Self {
            status_bar,
            terminal,
            ..
        } = self;
        status_bar.update(terminal.as_mut(), lines)?;
        Ok(())
    }

    /// Bind a key sequence (readline notation) to a widget by name in the
    /// named keymap.
    pub fn bind(&mut self, keymap: &str, sequence: &str, widget: &str) -> Result<()> {
        if widgets::lookup(widget).is_none() {
            return Err(ReadlineError::IllegalArgument(format!(
                "unknown widget `{widget}`"
            )));
        }
        let keymap = self.keymaps.get_mut(keymap).ok_or_else(|| {
            ReadlineError::IllegalArgument(format!("unknown keymap `{keymap}`"))
        })?;
        keymap.bind(&keyseq(sequence), Binding::widget(widget))
    }

    /// Select the main keymap by name.
    pub fn set_keymap(&mut self, name: &str) -> Result<()> {
        if !self.keymaps.contains_key(name) {
            return Err(ReadlineError::IllegalArgument(format!(
                "unknown keymap `{name}`"
            )));
        }
        self.main_keymap = name.to_string();
        self.keymap_name = name.to_string();
        Ok(())
    }

    /// All widget names available for binding.
    pub fn widget_names() -> &'static [&'static str] {
        widgets::names()
    }

    // --- the read loop ----------------------------------------------------

    /// Read one line with the given prompt.
    pub fn read_line(&mut self, prompt: impl Into<PromptTemplate>) -> Result<String> {
        self.read_line_with(ReadLineRequest::new(prompt))
    }

    /// Read one line with full per-call configuration.
    pub fn read_line_with(&mut self, request: ReadLineRequest) -> Result<String> {
        if self.reading {
            return Err(ReadlineError::AlreadyReading);
        }
        self.reading = true;
        let result = self.read_line_inner(request);
        self.reading = false;
        result
    }

    fn read_line_inner(&mut self, request: ReadLineRequest) -> Result<String> {
        self.prompt = request.prompt;
        self.right_prompt = request.right_prompt;
        let masked = request.masking.is_some();
        self.masking = request.masking;

        self.status = LoopStatus::Editing;
        self.keymap_name = self.main_keymap.clone();
        self.editor = Editor::new();
        self.editor
            .set_undo_disabled(self.opt(EditOption::DisableUndo));
        if let Some(initial) = request.initial_buffer {
            self.editor.edit_atomically(|ed| ed.insert_str(&initial));
        }
        self.continuation_missing.clear();
        self.pending_arg = None;
        self.last_widget = None;
        self.search = None;
        self.menu = None;
        self.footer.clear();
        self.hint = None;
        self.vi = ViState::default();
        self.vi_recording = None;
        self.inserted_suffix = None;
        self.history_cursor.reset();
        self.painter.reset();
        self.cached_size = self.terminal.size();

        debug!("entering read loop");
        self.terminal.set_raw_mode(true)?;
        if self.opt(EditOption::BracketedPaste) {
            self.terminal.write_all(BRACKETED_PASTE_ON)?;
        }
        {
            let Self {
                status_bar,
                terminal,
                ..
            } = self;
            status_bar.restore(terminal.as_mut())?;
        }

        let outcome = self.run_loop();

        // Always hand the terminal back in a sane state
        if self.opt(EditOption::BracketedPaste) {
            let _ = self.terminal.write_all(BRACKETED_PASTE_OFF);
        }
        {
            let Self {
                status_bar,
                terminal,
                ..
            } = self;
            let _ = status_bar.suspend(terminal.as_mut());
        }
        let erase = self.opt(EditOption::EraseLineOnFinish);
        {
            let Self {
                painter, terminal, ..
            } = self;
            let _ = painter.finish(terminal.as_mut(), erase);
        }
        let _ = self.terminal.set_raw_mode(false);

        let status = self.status;
        let line = self.editor.line_buffer().get_buffer().to_string();
        if masked {
            self.editor.zero_out();
        }

        outcome?;
        match status {
            LoopStatus::Accepted => {
                let line = self.expander.expand_history(&line, &self.history);
                self.store_history(&line, masked);
                Ok(line)
            }
            LoopStatus::Aborted => Err(ReadlineError::Interrupted),
            LoopStatus::Eof | LoopStatus::Editing => Err(ReadlineError::Eof),
        }
    }

    fn store_history(&mut self, line: &str, masked: bool) {
        let text = if masked {
            match self.masking.as_ref().and_then(|m| m.history(line)) {
                Some(text) => text,
                None => return,
            }
        } else {
            line.to_string()
        };
        let rules = self.history_rules();
        self.history.add(&text, &rules);
    }

    pub(crate) fn history_rules(&self) -> HistoryRules {
        HistoryRules {
            ignore_space: self.opt(EditOption::HistoryIgnoreSpace),
            ignore_dups: self.opt(EditOption::HistoryIgnoreDups),
            reduce_blanks: self.opt(EditOption::HistoryReduceBlanks),
            ignore_patterns: HistoryRules::parse_ignore_patterns(
                self.variables.str_or(vars::HISTORY_IGNORE, ""),
            ),
            incremental: self.opt(EditOption::HistoryIncremental),
            timestamped: self.opt(EditOption::HistoryTimestamped),
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        self.redisplay(true)?;
        loop {
            self.drain_one_external_print()?;
            self.check_resize()?;

            let ambiguous = self.variables.millis(vars::AMBIGUOUS_BINDING, 1000);
            let keymap_name = self.active_keymap_name().to_string();
            let decoded = {
                let Self {
                    terminal,
                    decoder,
                    keymaps,
                    ..
                } = self;
                let keymap = keymaps
                    .get(&keymap_name)
                    .expect("active keymap always exists");
                decoder.next(terminal.as_mut(), keymap, ambiguous)?
            };

            if self.search.is_some() {
                self.handle_search_key(decoded)?;
            } else if self.menu.is_some() {
                self.handle_menu_key(decoded)?;
            } else {
                self.handle_main_key(decoded)?;
            }

            if self.status != LoopStatus::Editing {
                return Ok(());
            }
            self.redisplay(true)?;
        }
    }

    fn active_keymap_name(&self) -> &str {
        if self.search.is_some() {
            "isearch"
        } else if self.menu.is_some() {
            "menu"
        } else {
            &self.keymap_name
        }
    }

    fn drain_one_external_print(&mut self) -> Result<()> {
        let Some(text) = self.printer.as_ref().and_then(|p| p.try_recv()) else {
            return Ok(());
        };
        {
            let Self {
                painter, terminal, ..
            } = self;
            painter.print_above(terminal.as_mut(), &text)?;
        }
        self.redisplay(true)?;
        Ok(())
    }

    fn check_resize(&mut self) -> Result<()> {
        let size = self.terminal.size();
        if size != self.cached_size {
            self.cached_size = size;
            {
                let Self {
                    status_bar,
                    terminal,
                    ..
                } = self;
                status_bar.resize(terminal.as_mut())?;
            }
            self.painter.mark_dirty();
            self.redisplay(true)?;
        }
        Ok(())
    }

    fn handle_main_key(&mut self, decoded: Decoded) -> Result<()> {
        match decoded {
            Decoded::Eof => {
                self.status = LoopStatus::Eof;
            }
            Decoded::SelfInsert(c) => {
                self.last_char = Some(c);
                self.last_seq = c.to_string().into_bytes();
                let fallback = self
                    .keymaps
                    .get(self.active_keymap_name())
                    .and_then(|km| km.fallback().cloned());
                match fallback {
                    Some(binding) => self.dispatch(binding, 0)?,
                    None => self.ring_bell(),
                }
            }
            Decoded::Unbound(_) => self.ring_bell(),
            Decoded::Binding { binding, seq } => {
                self.last_seq = seq;
                self.last_char = None;
                self.dispatch(binding, 0)?;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, binding: Binding, depth: u8) -> Result<()> {
        if depth > 8 {
            warn!("binding reference chain too deep, ignoring");
            return Ok(());
        }
        match binding {
            Binding::Widget(name) => self.run_widget(&name),
            Binding::Macro(bytes) => {
                self.decoder.push_macro(&bytes);
                Ok(())
            }
            Binding::Reference { keymap, seq } => {
                let resolved = self
                    .keymaps
                    .get(&keymap)
                    .map(|km| km.lookup(&seq))
                    .and_then(|lookup| match lookup {
                        Lookup::Exact(b) | Lookup::ExactPrefix(b) => Some(b.clone()),
                        _ => None,
                    });
                match resolved {
                    Some(binding) => self.dispatch(binding, depth + 1),
                    None => {
                        self.ring_bell();
                        Ok(())
                    }
                }
            }
        }
    }

    fn run_widget(&mut self, name: &str) -> Result<()> {
        let Some(widget) = widgets::lookup(name) else {
            warn!(widget = name, "key bound to unknown widget");
            self.ring_bell();
            return Ok(());
        };

        let merge_insert =
            name == "self-insert" && self.last_widget.as_deref() == Some("self-insert");
        if !merge_insert && !matches!(name, "undo" | "redo") {
            self.editor.split_undo();
        }

        self.track_vi_recording_before(name);
        let ok = widget(self);
        self.track_vi_recording_after();

        if !ok {
            let quiet = widgets::is_history(name) && !self.opt(EditOption::HistoryBeep);
            if !quiet {
                self.ring_bell();
            }
        }

        // Listings stay up only across completion widgets
        if !widgets::is_completion(name) && self.menu.is_none() {
            self.footer.clear();
        }
        self.last_widget = Some(name.to_string());
        Ok(())
    }

    fn track_vi_recording_before(&mut self, name: &str) {
        let in_vi = matches!(self.keymap_name.as_str(), "vicmd" | "viopp" | "visual");
        if in_vi && self.vi_recording.is_none() && widgets::is_vi_change_starter(name) {
            self.vi_recording = Some(self.last_seq.clone());
        } else if let Some(recording) = &mut self.vi_recording {
            recording.extend_from_slice(&self.last_seq);
        }
    }

    fn track_vi_recording_after(&mut self) {
        if self.vi_recording.is_some()
            && self.keymap_name == "vicmd"
            && self.vi.pending_op.is_none()
        {
            self.vi_last_change = self.vi_recording.take();
        }
    }

    // --- helpers shared with widgets --------------------------------------

    pub(crate) fn opt(&self, option: EditOption) -> bool {
        self.options.is_set(option)
    }

    pub(crate) fn word_chars(&self) -> String {
        self.variables.str_or(vars::WORDCHARS, "").to_string()
    }

    /// Consume the pending numeric argument (default 1), capped.
    pub(crate) fn take_count(&mut self) -> i64 {
        let max = self.variables.int(vars::MAX_REPEAT_COUNT, 9999).max(1);
        let count = self.pending_arg.take().unwrap_or(1);
        count.clamp(-max, max)
    }

    pub(crate) fn ring_bell(&mut self) {
        let result = match self.variables.bell_style() {
            BellStyle::None => Ok(()),
            BellStyle::Audible => self.terminal.bell(),
            BellStyle::Visible => self.terminal.visible_bell(),
        };
        if let Err(err) = result {
            warn!(%err, "bell write failed");
        }
    }

    pub(crate) fn read_char(&mut self) -> Option<char> {
        let Self {
            terminal, decoder, ..
        } = self;
        decoder.read_char(terminal.as_mut()).ok().flatten()
    }

    pub(crate) fn set_keymap_internal(&mut self, name: &str) {
        if self.keymaps.contains_key(name) {
            self.keymap_name = name.to_string();
        } else {
            warn!(keymap = name, "switch to unknown keymap ignored");
        }
    }

    pub(crate) fn vi_insert_keymap(&self) -> &'static str {
        "viins"
    }

    pub(crate) fn last_key_digit(&self) -> Option<i64> {
        self.last_seq
            .last()
            .filter(|b| b.is_ascii_digit())
            .map(|b| i64::from(b - b'0'))
    }

    pub(crate) fn clear_screen_now(&mut self) -> bool {
        let Self {
            painter, terminal, ..
        } = self;
        painter.clear_screen(terminal.as_mut()).is_ok()
    }

    // --- accept / history -------------------------------------------------

    /// `accept-line`: a complete parse finishes the read; an incomplete one
    /// inserts a newline and continues under the secondary prompt.
    pub(crate) fn try_accept(&mut self) -> bool {
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();
        match self.parser.parse(&buffer, cursor, ParseContext::AcceptLine) {
            Ok(_) => {
                self.status = LoopStatus::Accepted;
                true
            }
            Err(incomplete) => {
                self.continuation_missing = incomplete.missing;
                let end = self.editor.line_buffer().len();
                self.editor.move_to(end);
                self.editor.insert_str("\n");
                true
            }
        }
    }

    pub(crate) fn history_up(&mut self, prefix_search: bool) -> bool {
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();
        if !self.history_cursor.is_navigating() {
            self.history_cursor.save_line(&buffer, cursor);
            let query = if prefix_search {
                NavigationQuery::Prefix(buffer[..cursor].to_string())
            } else {
                NavigationQuery::Normal
            };
            self.history_cursor.set_query(query);
        }
        match self.history_cursor.back(&self.history) {
            Some(index) => {
                let text = self.history.get(index).map(|e| e.text.clone()).unwrap_or_default();
                // Prefix search keeps the cursor on the typed prefix
                let position = if prefix_search {
                    cursor.min(text.len())
                } else {
                    text.len()
                };
                self.editor.reset_buffer_to(&text, position);
                true
            }
            None => false,
        }
    }

    pub(crate) fn history_down(&mut self) -> bool {
        use crate::history::ForwardMove;
        match self.history_cursor.forward(&self.history) {
            ForwardMove::Entry(index) => {
                let text = self.history.get(index).map(|e| e.text.clone()).unwrap_or_default();
                let cursor = text.len();
                self.editor.reset_buffer_to(&text, cursor);
                true
            }
            ForwardMove::Restore => {
                let (text, cursor) = self
                    .history_cursor
                    .take_saved_line()
                    .unwrap_or_default();
                self.editor.reset_buffer_to(&text, cursor);
                true
            }
            ForwardMove::Stay => false,
        }
    }

    pub(crate) fn history_first(&mut self) -> bool {
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();
        self.history_cursor.save_line(&buffer, cursor);
        match self.history_cursor.first(&self.history) {
            Some(index) => {
                let text = self.history.get(index).map(|e| e.text.clone()).unwrap_or_default();
                let cursor = text.len();
                self.editor.reset_buffer_to(&text, cursor);
                true
            }
            None => false,
        }
    }

    pub(crate) fn history_last(&mut self) -> bool {
        use crate::history::ForwardMove;
        match self.history_cursor.last() {
            ForwardMove::Restore => {
                let (text, cursor) = self
                    .history_cursor
                    .take_saved_line()
                    .unwrap_or_default();
                self.editor.reset_buffer_to(&text, cursor);
                true
            }
            _ => false,
        }
    }

    // --- incremental search sub-loop --------------------------------------

    pub(crate) fn enter_search(&mut self, backward: bool, regex: bool) {
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();
        self.search = Some(SearchState {
            pattern: String::new(),
            backward,
            regex,
            failing: false,
            current: None,
            match_offset: 0,
            saved_buffer: buffer,
            saved_cursor: cursor,
        });
    }

    fn handle_search_key(&mut self, decoded: Decoded) -> Result<()> {
        match decoded {
            Decoded::Eof => {
                self.exit_search(true);
                self.status = LoopStatus::Eof;
            }
            Decoded::SelfInsert(c) => {
                let terminators = self
                    .variables
                    .str_or(vars::SEARCH_TERMINATORS, "\x1b")
                    .to_string();
                if terminators.contains(c) {
                    self.exit_search(true);
                } else {
                    let search = self.search.as_mut().expect("in search");
                    search.pattern.push(c);
                    self.search_step(false);
                }
            }
            Decoded::Unbound(seq) => {
                // Terminate the search and let the main keymap have the key
                self.exit_search(true);
                self.decoder.push_macro(&seq);
            }
            Decoded::Binding { binding, seq } => {
                let Binding::Widget(name) = &binding else {
                    self.exit_search(true);
                    self.decoder.push_macro(&seq);
                    return Ok(());
                };
                match name.as_str() {
                    "abort" => self.exit_search(false),
                    "accept-line" => {
                        self.exit_search(true);
                        self.run_widget("accept-line")?;
                    }
                    "history-incremental-search-backward" => {
                        if let Some(search) = self.search.as_mut() {
                            search.backward = true;
                        }
                        self.search_step(true);
                    }
                    "history-incremental-search-forward" => {
                        if let Some(search) = self.search.as_mut() {
                            search.backward = false;
                        }
                        self.search_step(true);
                    }
                    "backward-delete-char" => {
                        if let Some(search) = self.search.as_mut() {
                            search.pattern.pop();
                        }
                        self.search_step(false);
                    }
                    _ => {
                        self.exit_search(true);
                        self.decoder.push_macro(&seq);
                    }
                }
            }
        }
        if self.status == LoopStatus::Editing {
            self.redisplay(true)?;
        }
        Ok(())
    }

    /// Find the next match. `skip_current` moves past the current hit
    /// (repeated `C-r`), otherwise the current position is re-checked
    /// (pattern grew).
    fn search_step(&mut self, skip_current: bool) {
        let Some(search) = self.search.as_ref() else {
            return;
        };
        let pattern = search.pattern.clone();
        let backward = search.backward;
        let use_regex = search.regex;
        let current = search.current;
        if pattern.is_empty() {
            if let Some(search) = self.search.as_mut() {
                search.failing = false;
            }
            return;
        }
        let re = use_regex.then(|| regex::Regex::new(&pattern).ok()).flatten();
        let matches = |text: &str| -> Option<usize> {
            if use_regex {
                re.as_ref().and_then(|re| re.find(text)).map(|m| m.start())
            } else {
                text.find(&pattern)
            }
        };

        let len = self.history.len() as i64;
        let start = match (current, skip_current) {
            (None, _) => {
                if backward {
                    len - 1
                } else {
                    0
                }
            }
            (Some(current), false) => current as i64,
            (Some(current), true) => {
                if backward {
                    current as i64 - 1
                } else {
                    current as i64 + 1
                }
            }
        };

        let mut hit = None;
        let mut index = start;
        while index >= 0 && index < len {
            if let Some(entry) = self.history.get(index as usize) {
                if let Some(offset) = matches(&entry.text) {
                    hit = Some((index as usize, offset));
                    break;
                }
            }
            index += if backward { -1 } else { 1 };
        }
        if let Some(search) = self.search.as_mut() {
            match hit {
                Some((index, offset)) => {
                    search.current = Some(index);
                    search.match_offset = offset;
                    search.failing = false;
                }
                None => search.failing = true,
            }
        }
    }

    /// Leave the search sub-loop. `keep` lands on the matched entry with
    /// the cursor on the first match; otherwise the pre-search buffer is
    /// restored.
    fn exit_search(&mut self, keep: bool) {
        let Some(search) = self.search.take() else {
            return;
        };
        if keep {
            if let Some(index) = search.current {
                let text = self
                    .history
                    .get(index)
                    .map(|e| e.text.clone())
                    .unwrap_or_default();
                self.editor.reset_buffer_to(&text, search.match_offset);
                return;
            }
            self.editor
                .reset_buffer_to(&search.saved_buffer, search.saved_cursor);
        } else {
            self.editor
                .reset_buffer_to(&search.saved_buffer, search.saved_cursor);
        }
    }

    // --- completion -------------------------------------------------------

    pub(crate) fn start_completion(&mut self, kind: CompleteKind) -> bool {
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();

        if kind == CompleteKind::ExpandOrWord {
            let parsed = self
                .parser
                .parse(&buffer, cursor, ParseContext::Complete)
                .ok();
            if let Some(parsed) = parsed {
                let word = parsed.word();
                if self.opt(EditOption::InsertTab) && word.is_empty() {
                    self.editor.insert_str("\t");
                    return true;
                }
                let expanded = self.expander.expand_var(word);
                if expanded != word {
                    let start = parsed.word_start();
                    self.editor
                        .replace_range(start..start + word.len(), &expanded);
                    return true;
                }
            }
        }

        let Ok(parsed) = self.parser.parse(&buffer, cursor, ParseContext::Complete) else {
            return false;
        };
        let word = parsed.word().to_string();
        let word_start = parsed.word_start();
        let word_prefix = if self.opt(EditOption::CompleteInWord) {
            word[..parsed.word_cursor.min(word.len())].to_string()
        } else {
            word.clone()
        };
        if word.is_empty() && !self.opt(EditOption::EmptyWordOptions) {
            return false;
        }

        let mut raw: Vec<Candidate> = Vec::new();
        for completer in self.completers.iter_mut() {
            completer.complete(&parsed, &mut raw);
        }
        let candidates = completion::normalize_and_dedup(raw);

        let match_opts = MatchOptions {
            case_insensitive: self.opt(EditOption::CaseInsensitive),
            typo: self.opt(EditOption::CompleteMatcherTypo),
            errors: self.variables.int(vars::ERRORS, 2).max(0) as usize,
        };
        let matched: Vec<Candidate> = match_candidates(&word_prefix, &candidates, match_opts)
            .into_iter()
            .map(|i| candidates[i].clone())
            .collect();

        if matched.is_empty() {
            return false;
        }

        if matched.len() == 1 {
            let sole = matched.into_iter().next().expect("one candidate");
            self.insert_candidate(&sole, word_start, word.len());
            return true;
        }

        match kind {
            CompleteKind::Menu | CompleteKind::MenuReverse => {
                self.enter_menu(matched, word_start, word.len(), kind == CompleteKind::MenuReverse);
                true
            }
            CompleteKind::List => self.list_candidates(&matched),
            CompleteKind::Word | CompleteKind::ExpandOrWord => {
                let prefix = common_prefix(matched.iter().map(|c| c.value.as_str()));
                if prefix.len() > word_prefix.len() {
                    self.editor
                        .replace_range(word_start..word_start + word.len(), &prefix);
                    return true;
                }
                // Nothing extended: repeated attempts list or menu
                let repeated = self
                    .last_widget
                    .as_deref()
                    .map(|w| widgets::is_completion(w))
                    .unwrap_or(false);
                if repeated && self.opt(EditOption::AutoMenu) && !self.footer.is_empty() {
                    self.enter_menu(matched, word_start, word.len(), false);
                    return true;
                }
                if repeated && self.opt(EditOption::AutoList) {
                    return self.list_candidates(&matched);
                }
                false
            }
        }
    }

    fn insert_candidate(&mut self, candidate: &Candidate, word_start: usize, word_len: usize) {
        let mut text = candidate.value.clone();
        self.inserted_suffix = None;
        if let Some(suffix) = &candidate.suffix {
            if self.opt(EditOption::AutoParamSlash) {
                text.push_str(suffix);
                self.inserted_suffix = Some(suffix.clone());
            }
        }
        self.editor
            .replace_range(word_start..word_start + word_len, &text);
    }

    fn list_candidates(&mut self, matched: &[Candidate]) -> bool {
        let list_max = self.variables.usize(vars::LIST_MAX, 100);
        if list_max > 0 && matched.len() > list_max {
            if !self.confirm_listing(matched.len()) {
                self.footer.clear();
                return true;
            }
        }
        self.footer = self.layout_candidates(matched, None);
        true
    }

    /// `do you wish to see all N possibilities?` gate for huge listings.
    fn confirm_listing(&mut self, count: usize) -> bool {
        let mut line = StyledText::new();
        line.push(
            Style::new(),
            format!("display all {count} possibilities? (y or n)"),
        );
        self.footer = vec![line];
        let _ = self.redisplay(true);
        matches!(self.read_char(), Some('y') | Some('Y'))
    }

    fn layout_candidates(
        &self,
        candidates: &[Candidate],
        selected: Option<usize>,
    ) -> Vec<StyledText> {
        let grouped = self.opt(EditOption::AutoGroup) && self.opt(EditOption::Group);
        let others = self
            .variables
            .str_or(vars::OTHERS_GROUP_NAME, "others")
            .to_string();
        let group_style = match self.variables.get(vars::COMPLETION_STYLE_GROUP) {
            Some("underline") => Style::new().underline(),
            Some("none") => Style::new(),
            _ => Style::new().bold().fg(Color::Cyan),
        };
        completion::layout_lines(
            candidates,
            self.cached_size.0 as usize,
            self.opt(EditOption::ListRowsFirst),
            self.opt(EditOption::ListPacked),
            grouped,
            &others,
            group_style,
            selected,
        )
    }

    pub(crate) fn enter_menu(
        &mut self,
        candidates: Vec<Candidate>,
        word_start: usize,
        word_len: usize,
        reverse: bool,
    ) {
        let menu_max = self.variables.usize(vars::MENU_LIST_MAX, 0);
        if menu_max > 0 && candidates.len() > menu_max {
            self.list_candidates(&candidates);
            return;
        }
        let buffer = self.editor.line_buffer().get_buffer().to_string();
        let cursor = self.editor.line_buffer().insertion_point();
        let selected = if reverse { candidates.len() - 1 } else { 0 };
        let mut menu = MenuState {
            candidates,
            selected,
            word_start,
            inserted_len: word_len,
            original_buffer: buffer,
            original_cursor: cursor,
        };
        self.apply_menu_selection(&mut menu);
        self.footer = self.layout_candidates(&menu.candidates, Some(menu.selected));
        self.menu = Some(menu);
    }

    fn apply_menu_selection(&mut self, menu: &mut MenuState) {
        let value = menu.current().value.clone();
        self.editor
            .replace_range(menu.word_start..menu.word_start + menu.inserted_len, &value);
        menu.inserted_len = value.len();
    }

    fn handle_menu_key(&mut self, decoded: Decoded) -> Result<()> {
        match decoded {
            Decoded::Eof => {
                self.leave_menu(true);
                self.status = LoopStatus::Eof;
            }
            Decoded::SelfInsert(c) => {
                // A printable key accepts the pick and keeps typing
                self.accept_menu_pick(Some(c));
            }
            Decoded::Unbound(seq) => {
                self.leave_menu(true);
                self.decoder.push_macro(&seq);
            }
            Decoded::Binding { binding, seq } => {
                let Binding::Widget(name) = &binding else {
                    self.leave_menu(true);
                    self.decoder.push_macro(&seq);
                    return Ok(());
                };
                match name.as_str() {
                    "menu-complete" => self.cycle_menu(true),
                    "reverse-menu-complete" => self.cycle_menu(false),
                    "send-break" | "abort" => self.leave_menu(false),
                    "accept-line" => self.accept_menu_pick(None),
                    _ => {
                        self.leave_menu(true);
                        self.decoder.push_macro(&seq);
                    }
                }
            }
        }
        if self.status == LoopStatus::Editing {
            self.redisplay(true)?;
        }
        Ok(())
    }

    fn cycle_menu(&mut self, forward: bool) {
        let Some(mut menu) = self.menu.take() else {
            return;
        };
        if forward {
            menu.next();
        } else {
            menu.prev();
        }
        self.apply_menu_selection(&mut menu);
        self.footer = self.layout_candidates(&menu.candidates, Some(menu.selected));
        self.menu = Some(menu);
    }

    /// Commit the highlighted candidate. A forwarded char is typed after
    /// it, with the suffix-removal rule applied.
    fn accept_menu_pick(&mut self, forward: Option<char>) {
        let Some(menu) = self.menu.take() else {
            return;
        };
        let suffix = menu.current().suffix.clone();
        self.footer.clear();
        if let Some(c) = forward {
            let remove_chars = self
                .variables
                .str_or(vars::REMOVE_SUFFIX_CHARS, " \t\n;&|")
                .to_string();
            if self.opt(EditOption::AutoRemoveSlash) && remove_chars.contains(c) {
                if let Some(suffix) = suffix {
                    let end = self.editor.line_buffer().insertion_point();
                    if end >= suffix.len() {
                        self.editor.delete_range(end - suffix.len()..end);
                    }
                }
            }
            self.editor.insert_str(&c.to_string());
        }
    }

    /// Leave the menu; `keep` leaves the current pick in the buffer,
    /// otherwise the pre-menu buffer comes back.
    fn leave_menu(&mut self, keep: bool) {
        let Some(menu) = self.menu.take() else {
            return;
        };
        self.footer.clear();
        if !keep {
            self.editor
                .reset_buffer_to(&menu.original_buffer, menu.original_cursor);
        }
    }

    // --- vi machinery -----------------------------------------------------

    /// Apply a motion: plain movement in command mode, or the span the
    /// pending operator consumes in operator-pending mode.
    pub(crate) fn vi_motion(&mut self, target: usize, kind: MotionKind) -> bool {
        let Some(op) = self.vi.pending_op.take() else {
            self.editor.move_to(target);
            return true;
        };
        let cursor = self.editor.line_buffer().insertion_point();
        let (mut start, mut end) = if cursor <= target {
            (cursor, target)
        } else {
            (target, cursor)
        };
        match kind {
            MotionKind::Inclusive => {
                end = self.editor.line_buffer().grapheme_right_index_from(end);
            }
            MotionKind::Linewise => {
                let buf = self.editor.line_buffer();
                start = buf.clamp(start);
                end = buf.clamp(end);
                let text = buf.get_buffer();
                start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
                end = text[end..]
                    .find('\n')
                    .map(|i| end + i + 1)
                    .unwrap_or(text.len());
            }
            MotionKind::Exclusive => {}
        }
        self.apply_vi_operator(op, start, end)
    }

    pub(crate) fn apply_vi_operator(&mut self, op: ViOperator, start: usize, end: usize) -> bool {
        if start >= end {
            self.set_keymap_internal("vicmd");
            return false;
        }
        let text = self
            .editor
            .line_buffer()
            .substring(start..end)
            .to_string();
        if let Some(register) = self.vi.register.take() {
            self.editor.kill_ring().set_register(register, &text);
        }
        match op {
            ViOperator::Delete => {
                self.editor
                    .kill_range(start..end, KillDirection::Forward, false);
                self.set_keymap_internal("vicmd");
            }
            ViOperator::Change => {
                self.editor
                    .kill_range(start..end, KillDirection::Forward, false);
                self.set_keymap_internal(self.vi_insert_keymap());
            }
            ViOperator::Yank => {
                self.editor.copy_range(start..end, false);
                self.editor.move_to(start);
                self.set_keymap_internal("vicmd");
            }
        }
        true
    }

    // --- redisplay --------------------------------------------------------

    pub(crate) fn redisplay(&mut self, flush: bool) -> Result<()> {
        self.update_hint();
        let (rows, cursor) = self.compose_rows();
        let (cols, screen_rows) = self.cached_size;
        let usable = (screen_rows as usize).saturating_sub(self.status_bar.reserved_rows());
        let wrap = WrapModel::new(cols as usize, self.opt(EditOption::DelayLineWrap));
        let Self {
            painter, terminal, ..
        } = self;
        if let Err(err) = painter.update(terminal.as_mut(), wrap, usable, rows, cursor, flush) {
            // Writes are best-effort: go dirty and repaint fully next tick
            warn!(%err, "paint failed, scheduling full repaint");
            painter.mark_dirty();
        }
        Ok(())
    }

    fn update_hint(&mut self) {
        self.hint = None;
        if self.masking.is_some() || self.search.is_some() || self.menu.is_some() {
            return;
        }
        let buffer = self.editor.line_buffer();
        let min = self.variables.usize(vars::SUGGESTIONS_MIN_BUFFER_SIZE, 1);
        if buffer.is_empty()
            || buffer.len() < min
            || buffer.insertion_point() != buffer.len()
        {
            return;
        }
        let text = buffer.get_buffer();
        self.hint = self
            .history
            .iter()
            .rev()
            .find(|e| e.text.starts_with(text) && e.text.len() > text.len())
            .map(|e| e.text[text.len()..].to_string());
    }

    /// Visible form of the buffer, after masking.
    fn display_buffer_and_cursor(&self) -> (String, usize) {
        let buffer = self.editor.line_buffer();
        let text = buffer.get_buffer();
        let cursor = buffer.insertion_point();
        match &self.masking {
            None => (text.to_string(), cursor),
            Some(masking) => {
                let display = masking.display(text);
                if display.is_empty() {
                    return (String::new(), 0);
                }
                let graphemes_before = text[..cursor].graphemes(true).count();
                let display_cursor = display
                    .grapheme_indices(true)
                    .nth(graphemes_before)
                    .map(|(i, _)| i)
                    .unwrap_or(display.len());
                (display, display_cursor)
            }
        }
    }

    /// Build the attributed screen rows and cursor target for this tick.
    fn compose_rows(&self) -> (Vec<Vec<Cell>>, (usize, usize)) {
        let (cols, _) = self.cached_size;
        let wrap = WrapModel::new(cols as usize, self.opt(EditOption::DelayLineWrap));
        let tab_width = self.variables.usize(vars::TAB_WIDTH, 4).max(1);

        if self.search.is_some() {
            return self.compose_search_rows(&wrap, tab_width);
        }

        let (display, display_cursor) = self.display_buffer_and_cursor();
        let line_offset = self.variables.usize(vars::LINE_OFFSET, 0);
        let primary = self.prompt.expand(PromptContext {
            line_number: line_offset + 1,
            missing: "",
            initial_width: 0,
        });
        let secondary_template = PromptTemplate::from(
            self.variables
                .str_or(vars::SECONDARY_PROMPT_PATTERN, "%M> "),
        );

        // Highlight (or plain text for masked/huge buffers)
        let features_max = self.variables.usize(vars::FEATURES_MAX_BUFFER_SIZE, 1000);
        let styled = if self.masking.is_some() || display.len() > features_max {
            StyledText::plain(display.clone())
        } else {
            self.highlighter.highlight(&display, display_cursor)
        };

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        let mut cursor_target = (0usize, 0usize);

        // Prompt lines above the line holding the buffer
        for (i, line) in primary.lines.iter().enumerate() {
            if i + 1 == primary.lines.len() {
                break;
            }
            rows.extend(wrap.wrap(0, &cells_of_ansi_str(line, Style::new())));
        }
        let prompt_last = primary.lines.last().cloned().unwrap_or_default();

        // Split the styled buffer into logical lines, tabs expanded
        let logical_lines = split_styled_lines(&styled, tab_width);
        let cursor_line = display[..display_cursor].matches('\n').count();
        let cursor_in_line = display_cursor
            - display[..display_cursor]
                .rfind('\n')
                .map(|i| i + 1)
                .unwrap_or(0);

        for (i, line_cells) in logical_lines.iter().enumerate() {
            let mut cells: Vec<Cell> = if i == 0 {
                cells_of_ansi_str(&prompt_last, Style::new())
            } else {
                let cont = secondary_template.expand(PromptContext {
                    line_number: line_offset + 1 + i,
                    missing: &self.continuation_missing,
                    initial_width: primary.last_width(),
                });
                cells_of_ansi_str(&cont.text().replace('\n', " "), Style::new())
            };
            let prefix_len = cells.len();
            cells.extend(line_cells.cells.iter().cloned());

            // Suggestion hint rendered dimmed after the buffer end
            if i + 1 == logical_lines.len() {
                if let Some(hint) = &self.hint {
                    let dim = Style::new().fg(Color::DarkGray);
                    for grapheme in hint.graphemes(true) {
                        cells.push(Cell::new(grapheme, dim));
                    }
                }
            }

            if i == cursor_line {
                let cell_index = prefix_len + line_cells.cell_index_of(cursor_in_line);
                let (row_in_line, col) = wrap.position(0, &cells, cell_index);
                cursor_target = (rows.len() + row_in_line, col);
            }

            let mut wrapped = wrap.wrap(0, &cells);
            // Right prompt on the first buffer row when there is room
            if i == 0 {
                if let Some(right) = &self.right_prompt {
                    let expanded = right.expand(PromptContext::default());
                    let right_cells = cells_of_ansi_str(&expanded.text(), Style::new());
                    let right_width: usize =
                        right_cells.iter().map(|c| c.width as usize).sum();
                    if wrapped.len() == 1 {
                        let used: usize =
                            wrapped[0].iter().map(|c| c.width as usize).sum();
                        if used + right_width + 1 < cols as usize {
                            let gap = cols as usize - used - right_width;
                            for _ in 0..gap {
                                wrapped[0].push(Cell::new(" ", Style::new()));
                            }
                            wrapped[0].extend(right_cells);
                        }
                    }
                }
            }
            rows.append(&mut wrapped);
        }

        // Listing / menu footer
        for line in &self.footer {
            rows.extend(wrap.wrap(0, &line.cells()));
        }

        (rows, cursor_target)
    }

    fn compose_search_rows(
        &self,
        wrap: &WrapModel,
        _tab_width: usize,
    ) -> (Vec<Vec<Cell>>, (usize, usize)) {
        let search = self.search.as_ref().expect("in search");
        let direction = if search.backward { "reverse-i-search" } else { "i-search" };
        let state = if search.failing { "failing " } else { "" };
        let indicator = format!("({state}{direction})`{}': ", search.pattern);
        let matched = search
            .current
            .and_then(|i| self.history.get(i))
            .map(|e| e.text.replace('\n', " "))
            .unwrap_or_default();

        let mut cells = cells_of_ansi_str(&indicator, Style::new());
        let prefix_len = cells.len();
        cells.extend(StyledText::plain(matched.clone()).cells());

        let match_cell = matched[..search.match_offset.min(matched.len())]
            .graphemes(true)
            .count();
        let (row, col) = wrap.position(0, &cells, prefix_len + match_cell);
        (wrap.wrap(0, &cells), (row, col))
    }
}

/// One logical buffer line as cells plus a byte-offset lookup table.
struct LogicalLine {
    cells: Vec<Cell>,
    /// Byte offset within the line for each cell (tab expansions repeat)
    offsets: Vec<usize>,
    byte_len: usize,
}

impl LogicalLine {
    fn cell_index_of(&self, byte_offset: usize) -> usize {
        if byte_offset >= self.byte_len {
            return self.cells.len();
        }
        self.offsets
            .iter()
            .position(|&o| o >= byte_offset)
            .unwrap_or(self.cells.len())
    }
}

/// Split highlighted text on newlines into per-line cells, expanding tabs.
fn split_styled_lines(styled: &StyledText, tab_width: usize) -> Vec<LogicalLine> {
    let mut lines: Vec<LogicalLine> = vec![LogicalLine {
        cells: Vec::new(),
        offsets: Vec::new(),
        byte_len: 0,
    }];
    for (style, text) in styled.runs() {
        for grapheme in text.graphemes(true) {
            let line = lines.last_mut().unwrap();
            match grapheme {
                "\n" => {
                    lines.push(LogicalLine {
                        cells: Vec::new(),
                        offsets: Vec::new(),
                        byte_len: 0,
                    });
                }
                "\t" => {
                    for _ in 0..tab_width {
                        line.cells.push(Cell::new(" ", *style));
                        line.offsets.push(line.byte_len);
                    }
                    line.byte_len += 1;
                }
                g => {
                    line.cells.push(Cell::new(g, *style));
                    line.offsets.push(line.byte_len);
                    line.byte_len += g.len();
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_styled_lines_expands_tabs() {
        let styled = StyledText::plain("a\tb");
        let lines = split_styled_lines(&styled, 4);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].cells.len(), 6);
        // The byte after the tab maps past the expansion
        assert_eq!(lines[0].cell_index_of(2), 5);
    }

    #[test]
    fn split_styled_lines_breaks_on_newline() {
        let styled = StyledText::plain("one\ntwo");
        let lines = split_styled_lines(&styled, 4);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].cells.len(), 3);
        assert_eq!(lines[1].cells.len(), 3);
    }
}
