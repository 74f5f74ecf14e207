//! # promptline
//!
//! An interactive line-editor library for terminal applications: prompt the
//! user, edit with Emacs or Vi keybindings, browse and search history,
//! complete words, compose multi-line input, and get the finished line back.
//!
//! ## Basic example
//!
//! ```rust,no_run
//! use promptline::{EditSession, ReadlineError};
//!
//! fn main() {
//!     let mut session = EditSession::create();
//!     loop {
//!         match session.read_line("> ") {
//!             Ok(line) => println!("We processed: {line}"),
//!             Err(ReadlineError::Interrupted) => continue,
//!             Err(ReadlineError::Eof) => break,
//!             Err(err) => {
//!                 eprintln!("error: {err}");
//!                 break;
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Completion, history and masking
//!
//! ```rust,no_run
//! use promptline::{EditSession, History, ReadLineRequest};
//!
//! let history = History::with_file(500, 10_000, "history.txt".into())
//!     .expect("history file");
//! let mut session = EditSession::create()
//!     .with_history(history)
//!     .with_string_completions(vec!["commit".into(), "checkout".into()]);
//!
//! // A masked read: echoes `*` and stays out of history
//! let secret = session.read_line_with(
//!     ReadLineRequest::new("pw: ").with_mask('*'),
//! );
//! ```
//!
//! Collaborators (terminal, parser, completer, highlighter, expander,
//! masking) are trait seams; bring your own implementations or use the
//! defaults.

mod config;
pub use config::{vars, BellStyle, EditOption, Options, Variables};

mod result;
pub use result::{ReadlineError, Result};

mod terminal;
pub use terminal::{Capability, CrosstermTerminal, ScriptedTerminal, TermInput, Terminal};

mod core_editor;
pub use core_editor::{Editor, KillDirection, KillRing, LineBuffer, RegionType};

mod keymap;
pub use keymap::{
    ctrl, default_emacs_keymap, default_vicmd_keymap, default_viins_keymap, keyseq, Binding,
    InputDecoder, KeyMap, Lookup,
};

mod parser;
pub use parser::{DefaultParser, IncompleteInput, ParseContext, ParsedLine, Parser};

mod highlighter;
pub use highlighter::{DefaultHighlighter, Highlighter, NullHighlighter};

mod expander;
pub use expander::{Expander, NullExpander};

mod masking;
pub use masking::{CharMask, MaskingCallback};

mod prompt;
pub use prompt::{ExpandedPrompt, PromptContext, PromptTemplate};

mod painting;
pub use painting::{Cell, Painter, StatusBar, StatusState, StyledText, WrapModel};

mod completion;
pub use completion::{Candidate, Completer, StringsCompleter};

mod history;
pub use history::{
    ForwardMove, History, HistoryCursor, HistoryEntry, HistoryRules, NavigationQuery,
};

mod external_printer;
pub use external_printer::ExternalPrinter;

mod widgets;
pub use widgets::Widget;

mod engine;
pub use engine::{EditMode, EditSession, ReadLineRequest};
