use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};

/// One unit of terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermInput {
    /// A raw byte from the input stream
    Byte(u8),
    /// The requested deadline elapsed before a byte arrived
    Timeout,
    /// The input stream is closed
    Eof,
}

/// Features a [`Terminal`] implementation may or may not provide. The
/// painter and status bar pick cheaper strategies when a capability is
/// missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Absolute cursor addressing (CUP)
    CursorAddress,
    /// Insert/delete whole lines (IL/DL)
    InsertDeleteLine,
    /// DECSTBM scroll regions, needed for the status bar
    ScrollRegion,
    /// DECSC/DECRC cursor save and restore
    SaveRestoreCursor,
}

/// The capability surface the edit session consumes.
///
/// Input is byte-oriented: key decoding walks a prefix tree over the raw
/// byte stream, so implementations hand out single bytes with an optional
/// deadline. Output is a plain byte sink the painter queues escape
/// sequences into.
pub trait Terminal: Send {
    /// Read one input unit, waiting at most `timeout` (forever if `None`).
    fn read_input(&mut self, timeout: Option<Duration>) -> io::Result<TermInput>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// `(columns, rows)`
    fn size(&self) -> (u16, u16);

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()>;

    fn supports(&self, cap: Capability) -> bool;

    /// Nesting-safe DECSC. Only the outermost save emits bytes; the depth
    /// counter makes repeated saves from shared writers harmless.
    fn save_cursor(&mut self) -> io::Result<()>;

    /// Nesting-safe DECRC, the inverse of [`Terminal::save_cursor`].
    fn restore_cursor(&mut self) -> io::Result<()>;

    fn bell(&mut self) -> io::Result<()> {
        self.write_all(b"\x07")?;
        self.flush()
    }

    /// Reverse-video flash for `bell-style visible`.
    fn visible_bell(&mut self) -> io::Result<()> {
        self.write_all(b"\x1b[?5h\x1b[?5l")?;
        self.flush()
    }
}

const INPUT_PUMP_CAPACITY: usize = 1024;

/// Terminal backed by the process stdin/stderr pair.
///
/// Raw-mode toggling and size queries go through crossterm; input bytes are
/// pumped off stdin by a dedicated thread so reads can carry a deadline.
pub struct CrosstermTerminal {
    input: Option<Receiver<u8>>,
    pump: Option<JoinHandle<()>>,
    stop_pump: Arc<AtomicBool>,
    out: io::BufWriter<io::Stderr>,
    raw: bool,
    save_depth: u32,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        let mut term = CrosstermTerminal {
            input: None,
            pump: None,
            stop_pump: Arc::new(AtomicBool::new(false)),
            out: io::BufWriter::new(io::stderr()),
            raw: false,
            save_depth: 0,
        };
        term.resume();
        term
    }

    /// Stop the input pump. Pending reads observe EOF. With `wait` the call
    /// joins the pump thread before returning.
    pub fn pause(&mut self, wait: bool) {
        self.stop_pump.store(true, Ordering::SeqCst);
        self.input = None;
        if let Some(handle) = self.pump.take() {
            if wait {
                let _ = handle.join();
            }
        }
    }

    /// Restart the input pump after [`CrosstermTerminal::pause`].
    pub fn resume(&mut self) {
        if self.input.is_some() {
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        self.stop_pump = stop.clone();
        let (tx, rx) = bounded::<u8>(INPUT_PUMP_CAPACITY);
        self.input = Some(rx);
        self.pump = Some(std::thread::spawn(move || {
            let stdin = io::stdin();
            let mut handle = stdin.lock();
            let mut byte = [0u8; 1];
            loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                match handle.read(&mut byte) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(byte[0]).is_err() {
                            break;
                        }
                    }
                }
            }
        }));
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        // Leaving the terminal cooked even on panic; disabling twice is fine
        let _ = crossterm::terminal::disable_raw_mode();
        self.pause(false);
    }
}

impl Terminal for CrosstermTerminal {
    fn read_input(&mut self, timeout: Option<Duration>) -> io::Result<TermInput> {
        let Some(rx) = &self.input else {
            return Ok(TermInput::Eof);
        };
        match timeout {
            Some(deadline) => match rx.recv_timeout(deadline) {
                Ok(byte) => Ok(TermInput::Byte(byte)),
                Err(RecvTimeoutError::Timeout) => Ok(TermInput::Timeout),
                Err(RecvTimeoutError::Disconnected) => Ok(TermInput::Eof),
            },
            None => match rx.recv() {
                Ok(byte) => Ok(TermInput::Byte(byte)),
                Err(_) => Ok(TermInput::Eof),
            },
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn size(&self) -> (u16, u16) {
        match crossterm::terminal::size() {
            // A reported zero size would divide the wrap model by zero
            Ok((0, _)) | Ok((_, 0)) | Err(_) => (80, 24),
            Ok(size) => size,
        }
    }

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        if enabled == self.raw {
            return Ok(());
        }
        if enabled {
            crossterm::terminal::enable_raw_mode()?;
        } else {
            crossterm::terminal::disable_raw_mode()?;
        }
        self.raw = enabled;
        Ok(())
    }

    fn supports(&self, _cap: Capability) -> bool {
        true
    }

    fn save_cursor(&mut self) -> io::Result<()> {
        if self.save_depth == 0 {
            self.write_all(b"\x1b7")?;
        }
        self.save_depth += 1;
        Ok(())
    }

    fn restore_cursor(&mut self) -> io::Result<()> {
        match self.save_depth {
            0 => Ok(()),
            1 => {
                self.save_depth = 0;
                self.write_all(b"\x1b8")
            }
            _ => {
                self.save_depth -= 1;
                Ok(())
            }
        }
    }
}

/// Scripted input events for the in-memory terminal.
#[derive(Debug, Clone, Copy)]
enum ScriptEvent {
    Byte(u8),
    /// Makes the next deadline-carrying read report a timeout
    Timeout,
}

#[derive(Debug)]
struct ScriptedInner {
    script: VecDeque<ScriptEvent>,
    output: Vec<u8>,
    size: (u16, u16),
    raw: bool,
    save_depth: u32,
    caps_disabled: Vec<Capability>,
}

/// In-memory [`Terminal`] for tests and embedders' test suites.
///
/// Input is a scripted byte queue (with explicit timeout markers for
/// exercising ambiguous bindings); output is captured verbatim. Clones
/// share state, so a test can keep a handle after moving the terminal into
/// a session.
#[derive(Debug, Clone)]
pub struct ScriptedTerminal {
    inner: std::sync::Arc<std::sync::Mutex<ScriptedInner>>,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::with_size(80, 24)
    }

    pub fn with_size(columns: u16, rows: u16) -> Self {
        ScriptedTerminal {
            inner: std::sync::Arc::new(std::sync::Mutex::new(ScriptedInner {
                script: VecDeque::new(),
                output: Vec::new(),
                size: (columns, rows),
                raw: false,
                save_depth: 0,
                caps_disabled: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedInner> {
        self.inner.lock().expect("scripted terminal poisoned")
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.lock()
            .script
            .extend(bytes.iter().copied().map(ScriptEvent::Byte));
    }

    pub fn feed_str(&self, text: &str) {
        self.feed(text.as_bytes());
    }

    /// Queue a point at which a deadline-carrying read times out.
    pub fn feed_timeout(&self) {
        self.lock().script.push_back(ScriptEvent::Timeout);
    }

    pub fn set_size(&self, columns: u16, rows: u16) {
        self.lock().size = (columns, rows);
    }

    pub fn disable_capability(&self, cap: Capability) {
        self.lock().caps_disabled.push(cap);
    }

    /// Everything written so far.
    pub fn output(&self) -> Vec<u8> {
        self.lock().output.clone()
    }

    /// Drain and return everything written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().output)
    }

    /// Output with ANSI escape sequences removed.
    pub fn output_text(&self) -> String {
        String::from_utf8(strip_ansi_escapes::strip(self.output())).unwrap_or_default()
    }
}

impl Default for ScriptedTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ScriptedTerminal {
    fn read_input(&mut self, timeout: Option<Duration>) -> io::Result<TermInput> {
        loop {
            let mut inner = self.lock();
            match inner.script.pop_front() {
                None => return Ok(TermInput::Eof),
                Some(ScriptEvent::Timeout) => {
                    if timeout.is_some() {
                        return Ok(TermInput::Timeout);
                    }
                    // A blocking read skips over the marker
                }
                Some(ScriptEvent::Byte(byte)) => return Ok(TermInput::Byte(byte)),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.lock().output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        self.lock().size
    }

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        self.lock().raw = enabled;
        Ok(())
    }

    fn supports(&self, cap: Capability) -> bool {
        !self.lock().caps_disabled.contains(&cap)
    }

    fn save_cursor(&mut self) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.save_depth == 0 {
            inner.output.extend_from_slice(b"\x1b7");
        }
        inner.save_depth += 1;
        Ok(())
    }

    fn restore_cursor(&mut self) -> io::Result<()> {
        let mut inner = self.lock();
        match inner.save_depth {
            0 => Ok(()),
            1 => {
                inner.save_depth = 0;
                inner.output.extend_from_slice(b"\x1b8");
                Ok(())
            }
            _ => {
                inner.save_depth -= 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scripted_input_plays_back_in_order() {
        let mut term = ScriptedTerminal::new();
        term.feed_str("ab");
        assert_eq!(term.read_input(None).unwrap(), TermInput::Byte(b'a'));
        assert_eq!(term.read_input(None).unwrap(), TermInput::Byte(b'b'));
        assert_eq!(term.read_input(None).unwrap(), TermInput::Eof);
    }

    #[test]
    fn timeout_marker_only_fires_for_deadline_reads() {
        let mut term = ScriptedTerminal::new();
        term.feed_timeout();
        term.feed_str("x");
        assert_eq!(
            term.read_input(Some(Duration::from_millis(5))).unwrap(),
            TermInput::Timeout
        );
        assert_eq!(term.read_input(None).unwrap(), TermInput::Byte(b'x'));
    }

    #[test]
    fn nested_cursor_saves_emit_once() {
        let mut term = ScriptedTerminal::new();
        term.save_cursor().unwrap();
        term.save_cursor().unwrap();
        term.restore_cursor().unwrap();
        term.restore_cursor().unwrap();
        // One save and one restore on the wire despite two of each
        assert_eq!(term.output(), b"\x1b7\x1b8");
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut term = ScriptedTerminal::new();
        term.restore_cursor().unwrap();
        assert!(term.output().is_empty());
    }
}
