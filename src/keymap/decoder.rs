use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use super::{Binding, KeyMap, Lookup};
use crate::terminal::{TermInput, Terminal};

/// One decoded unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A bound key sequence
    Binding { binding: Binding, seq: Vec<u8> },
    /// A printable character with no binding of its own
    SelfInsert(char),
    /// An unbound, unprintable sequence
    Unbound(Vec<u8>),
    /// Input stream closed
    Eof,
}

/// Byte-stream key decoder.
///
/// Walks the active keymap's prefix tree byte by byte, keeping the last
/// complete match around so an ambiguous binding (complete *and* prefix of a
/// longer one) can be resolved by deadline: when the timer runs out the
/// short match is emitted and the extra bytes are replayed. Macro expansions
/// are replayed the same way, pushed at the head of the stream.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pushback: VecDeque<u8>,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be decoded before anything from the terminal.
    pub fn push_macro(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.pushback.push_front(*byte);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pushback.is_empty()
    }

    fn next_byte(
        &mut self,
        term: &mut dyn Terminal,
        timeout: Option<Duration>,
    ) -> io::Result<TermInput> {
        if let Some(byte) = self.pushback.pop_front() {
            return Ok(TermInput::Byte(byte));
        }
        term.read_input(timeout)
    }

    /// Decode the next unit against `keymap`.
    pub fn next(
        &mut self,
        term: &mut dyn Terminal,
        keymap: &KeyMap,
        ambiguous: Duration,
    ) -> io::Result<Decoded> {
        let mut seq: Vec<u8> = Vec::new();
        let mut last_match: Option<(Binding, usize)> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            let timeout = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            match self.next_byte(term, timeout)? {
                TermInput::Timeout => {
                    if let Some((binding, consumed)) = last_match.take() {
                        self.push_macro(&seq[consumed..]);
                        seq.truncate(consumed);
                        return Ok(Decoded::Binding { binding, seq });
                    }
                    deadline = None;
                }
                TermInput::Eof => {
                    if let Some((binding, consumed)) = last_match.take() {
                        self.push_macro(&seq[consumed..]);
                        seq.truncate(consumed);
                        return Ok(Decoded::Binding { binding, seq });
                    }
                    if seq.is_empty() {
                        return Ok(Decoded::Eof);
                    }
                    return self.finish_unmatched(term, seq);
                }
                TermInput::Byte(byte) => {
                    seq.push(byte);
                    match keymap.lookup(&seq) {
                        Lookup::Exact(binding) => {
                            return Ok(Decoded::Binding {
                                binding: binding.clone(),
                                seq,
                            });
                        }
                        Lookup::ExactPrefix(binding) => {
                            last_match = Some((binding.clone(), seq.len()));
                            deadline = Some(Instant::now() + ambiguous);
                        }
                        Lookup::Prefix => {}
                        Lookup::Unbound => {
                            if let Some((binding, consumed)) = last_match.take() {
                                self.push_macro(&seq[consumed..]);
                                seq.truncate(consumed);
                                return Ok(Decoded::Binding { binding, seq });
                            }
                            return self.finish_unmatched(term, seq);
                        }
                    }
                }
            }
        }
    }

    /// No binding matched anywhere in `seq`: consume its first byte as a
    /// (possibly multi-byte) character and replay the rest.
    fn finish_unmatched(&mut self, term: &mut dyn Terminal, seq: Vec<u8>) -> io::Result<Decoded> {
        self.push_macro(&seq[1..]);
        let first = seq[0];
        if first < 0x20 || first == 0x7f {
            return Ok(Decoded::Unbound(vec![first]));
        }
        if first < 0x80 {
            return Ok(Decoded::SelfInsert(first as char));
        }
        match self.assemble_utf8(term, first)? {
            Some(c) => Ok(Decoded::SelfInsert(c)),
            None => Ok(Decoded::Unbound(vec![first])),
        }
    }

    /// Read one character, bypassing the keymap (`quoted-insert`).
    pub fn read_char(&mut self, term: &mut dyn Terminal) -> io::Result<Option<char>> {
        match self.next_byte(term, None)? {
            TermInput::Eof | TermInput::Timeout => Ok(None),
            TermInput::Byte(byte) if byte < 0x80 => Ok(Some(byte as char)),
            TermInput::Byte(byte) => self.assemble_utf8(term, byte),
        }
    }

    /// Collect raw bytes up to (and excluding) `terminator`. Used for
    /// bracketed paste bodies.
    pub fn read_until(
        &mut self,
        term: &mut dyn Terminal,
        terminator: &[u8],
    ) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.next_byte(term, None)? {
                TermInput::Eof | TermInput::Timeout => return Ok(out),
                TermInput::Byte(byte) => {
                    out.push(byte);
                    if out.ends_with(terminator) {
                        out.truncate(out.len() - terminator.len());
                        return Ok(out);
                    }
                }
            }
        }
    }

    fn assemble_utf8(&mut self, term: &mut dyn Terminal, first: u8) -> io::Result<Option<char>> {
        let width = match first {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(None),
        };
        let mut bytes = vec![first];
        while bytes.len() < width {
            match self.next_byte(term, None)? {
                TermInput::Byte(byte) if byte & 0xc0 == 0x80 => bytes.push(byte),
                TermInput::Byte(byte) => {
                    // Not a continuation byte; put it back and give up
                    self.push_macro(&[byte]);
                    return Ok(None);
                }
                TermInput::Eof | TermInput::Timeout => return Ok(None),
            }
        }
        Ok(std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;
    use pretty_assertions::assert_eq;

    const AMBIGUOUS: Duration = Duration::from_millis(5);

    fn keymap() -> KeyMap {
        let mut km = KeyMap::new();
        km.bind(b"\x01", Binding::widget("beginning-of-line")).unwrap();
        km.bind(b"\x1b", Binding::widget("vi-cmd-mode")).unwrap();
        km.bind(b"\x1b[A", Binding::widget("up-history")).unwrap();
        km.bind(b"\x1bf", Binding::widget("forward-word")).unwrap();
        km
    }

    fn next(term: &mut ScriptedTerminal, decoder: &mut InputDecoder) -> Decoded {
        decoder.next(term, &keymap(), AMBIGUOUS).unwrap()
    }

    #[test]
    fn exact_single_byte_binding() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"\x01");
        let mut decoder = InputDecoder::new();
        assert_eq!(
            next(&mut term, &mut decoder),
            Decoded::Binding {
                binding: Binding::widget("beginning-of-line"),
                seq: vec![0x01],
            }
        );
    }

    #[test]
    fn longer_match_wins_over_ambiguous_prefix() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"\x1b[A");
        let mut decoder = InputDecoder::new();
        assert_eq!(
            next(&mut term, &mut decoder),
            Decoded::Binding {
                binding: Binding::widget("up-history"),
                seq: b"\x1b[A".to_vec(),
            }
        );
    }

    #[test]
    fn ambiguity_timeout_emits_short_match_and_replays() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"\x1b");
        term.feed_timeout();
        term.feed(b"x");
        let mut decoder = InputDecoder::new();
        assert_eq!(
            next(&mut term, &mut decoder),
            Decoded::Binding {
                binding: Binding::widget("vi-cmd-mode"),
                seq: vec![0x1b],
            }
        );
        // The byte after the timeout is still in the stream
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('x'));
    }

    #[test]
    fn failed_long_match_replays_residue() {
        let mut term = ScriptedTerminal::new();
        // ESC [ Z has no binding; ESC alone is the last complete match
        term.feed(b"\x1b[Z");
        let mut decoder = InputDecoder::new();
        assert_eq!(
            next(&mut term, &mut decoder),
            Decoded::Binding {
                binding: Binding::widget("vi-cmd-mode"),
                seq: vec![0x1b],
            }
        );
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('['));
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('Z'));
    }

    #[test]
    fn plain_byte_self_inserts() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"q");
        let mut decoder = InputDecoder::new();
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('q'));
    }

    #[test]
    fn multibyte_char_self_inserts_whole() {
        let mut term = ScriptedTerminal::new();
        term.feed_str("é");
        let mut decoder = InputDecoder::new();
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('é'));
    }

    #[test]
    fn unbound_control_byte_reports_sequence() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"\x1f");
        let mut decoder = InputDecoder::new();
        assert_eq!(next(&mut term, &mut decoder), Decoded::Unbound(vec![0x1f]));
    }

    #[test]
    fn macro_replay_is_decoded_first() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"z");
        let mut decoder = InputDecoder::new();
        decoder.push_macro(b"\x01");
        assert!(matches!(
            next(&mut term, &mut decoder),
            Decoded::Binding { .. }
        ));
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('z'));
    }

    #[test]
    fn eof_on_empty_stream() {
        let mut term = ScriptedTerminal::new();
        let mut decoder = InputDecoder::new();
        assert_eq!(next(&mut term, &mut decoder), Decoded::Eof);
    }

    #[test]
    fn read_until_consumes_terminator() {
        let mut term = ScriptedTerminal::new();
        term.feed(b"pasted text\x1b[201~rest");
        let mut decoder = InputDecoder::new();
        let body = decoder.read_until(&mut term, b"\x1b[201~").unwrap();
        assert_eq!(body, b"pasted text");
        assert_eq!(next(&mut term, &mut decoder), Decoded::SelfInsert('r'));
    }
}
