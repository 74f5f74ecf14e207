use thiserror::Error;

/// Ways a call to [`read_line`](crate::EditSession::read_line) can fail.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadlineError {
    /// The user aborted the edit (`Ctrl-C`, `abort`, `send-break`). The
    /// buffer contents are discarded.
    #[error("interrupted")]
    Interrupted,

    /// End of input: `Ctrl-D` on an empty line or the input stream closed.
    #[error("end of input")]
    Eof,

    /// The terminal read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A second read was started while one is already in progress on the
    /// same session.
    #[error("a read is already in progress on this session")]
    AlreadyReading,

    /// Programmer error surfaced synchronously (unknown keymap name, empty
    /// key sequence, ...).
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

/// Standard [`std::result::Result`] with [`ReadlineError`] as the error variant
pub type Result<T> = std::result::Result<T, ReadlineError>;
