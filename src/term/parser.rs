//! Escape-sequence interpreter
//!
//! Classifies each incoming byte as a control character, a graphics-mode
//! character, a plain character or part of an in-progress escape
//! sequence, and owns the bounded escape buffer. Completed CSI sequences
//! are dispatched to [`super::csi`].
//!
//! The interpreter never blocks and never fails: malformed or
//! unsupported input is discarded.

use tracing::debug;

use super::csi;
use super::screen::Screen;

/// Capacity of the escape buffer. A sequence that cannot be resolved
/// within this many bytes is abandoned.
pub const ESBUF_CAP: usize = 128;

/// Outcome of a custom escape-sequence handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// The handler consumed the sequence; built-in interpretation is
    /// skipped and the buffer cleared.
    Handled,
    /// The sequence may become handleable with more bytes; keep
    /// buffering, interpret nothing.
    Incomplete,
    /// Not a sequence the handler cares about; fall through to the
    /// built-in interpretation.
    Unhandled,
}

/// Custom escape hook. Invoked on every byte appended to an in-progress
/// sequence with the buffered bytes (the ESC itself excluded), before
/// built-in interpretation, so it may intercept sequences the built-in
/// table would otherwise own.
pub type EscapeHandler = Box<dyn FnMut(&mut Screen, &[u8]) -> HandlerResult>;

/// The per-byte state machine.
pub struct VtParser {
    escaped: bool,
    graphmode: bool,
    esbuf: Vec<u8>,
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub fn new() -> Self {
        VtParser {
            escaped: false,
            graphmode: false,
            esbuf: Vec::with_capacity(ESBUF_CAP),
        }
    }

    /// Whether a sequence is currently buffering.
    pub fn in_sequence(&self) -> bool {
        self.escaped
    }

    /// Feed a single byte through the state machine.
    pub fn feed(&mut self, byte: u8, screen: &mut Screen, handler: &mut Option<EscapeHandler>) {
        if byte == 0 {
            return; // NUL has no effect whatsoever
        }

        if byte == 0x9B {
            // 8-bit CSI: a fresh sequence pre-seeded with '['
            self.begin_sequence();
            self.esbuf.push(b'[');
            return;
        }

        if (1..=31).contains(&byte) {
            // BEL terminates a buffering xterm-style sequence; every
            // other control byte acts regardless of mode.
            if byte == 0x07 && self.escaped && self.esbuf.first() == Some(&b']') {
                self.esbuf.push(byte);
                self.try_interpret(screen, handler);
                return;
            }
            self.control(byte, screen);
            return;
        }

        if self.escaped {
            if self.esbuf.len() < ESBUF_CAP {
                self.esbuf.push(byte);
                self.try_interpret(screen, handler);
                return;
            }
            // Buffer exhausted without resolving: abandon the sequence
            // and let the byte fall through as a plain character.
            debug!(len = self.esbuf.len(), "escape buffer overflow, sequence abandoned");
            self.cancel_sequence();
        }

        if self.graphmode {
            screen.put_char(graph_substitute(byte));
        } else {
            screen.put_char(byte);
        }
    }

    fn control(&mut self, byte: u8, screen: &mut Screen) {
        match byte {
            b'\r' => screen.carriage_return(),
            b'\n' => screen.line_feed(),
            0x08 => screen.backspace(),
            b'\t' => screen.tab(),
            0x1B => self.begin_sequence(), // aborts any in-progress one
            0x0E => self.graphmode = true,
            0x0F => self.graphmode = false,
            0x18 | 0x1A => self.cancel_sequence(),
            0x07 => {} // bell: no visual effect for now
            _ => debug!(byte, "ignoring control byte"),
        }
    }

    fn begin_sequence(&mut self) {
        self.escaped = true;
        self.esbuf.clear();
    }

    fn cancel_sequence(&mut self) {
        self.escaped = false;
        self.esbuf.clear();
    }

    /// Attempt to resolve the buffered sequence. Called after every
    /// appended byte; does nothing until enough bytes have arrived.
    fn try_interpret(&mut self, screen: &mut Screen, handler: &mut Option<EscapeHandler>) {
        let first = match self.esbuf.first() {
            Some(&b) => b,
            None => return,
        };

        if let Some(h) = handler {
            match h(screen, &self.esbuf) {
                HandlerResult::Handled => {
                    self.cancel_sequence();
                    return;
                }
                HandlerResult::Incomplete => return,
                HandlerResult::Unhandled => {}
            }
        }

        if first == b'M' {
            screen.reverse_line_feed();
            self.cancel_sequence();
            return;
        }

        if first != b'[' && first != b']' {
            debug!(first = %(first as char), "unrecognized escape sequence, discarding");
            self.cancel_sequence();
            return;
        }

        let last = *self.esbuf.last().unwrap_or(&0);
        if first == b'[' && is_csi_final(last) {
            csi::dispatch(screen, &self.esbuf);
            self.cancel_sequence();
            return;
        }
        if first == b']' && last == 0x07 {
            // xterm-style sequence: recognized as complete, not interpreted.
            debug!("ignoring xterm escape sequence");
            self.cancel_sequence();
            return;
        }

        // Took almost all available space and still unresolved: abort.
        if self.esbuf.len() + 1 >= ESBUF_CAP {
            self.cancel_sequence();
        }
    }
}

fn is_csi_final(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'@' || byte == b'`'
}

/// Pitiful ASCII approximation of the linux console line-drawing set.
fn graph_substitute(byte: u8) -> u8 {
    match byte {
        b'j' | b'k' | b'l' | b'm' | b'n' | b't' | b'u' | b'v' | b'w' => b'+',
        b'x' => b'|',
        _ => b'%',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;
    use std::rc::Rc;

    fn feed_all(parser: &mut VtParser, screen: &mut Screen, bytes: &[u8]) {
        let mut handler = None;
        for &b in bytes {
            parser.feed(b, screen, &mut handler);
        }
    }

    fn row_text(screen: &Screen, row: u16) -> String {
        screen.grid().row(row).iter().map(|c| c.printable()).collect()
    }

    #[test]
    fn cursor_position_sequence() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b[5;10H");
        assert_eq!(screen.cursor(), (4, 9));
    }

    #[test]
    fn cursor_position_clamps_out_of_range() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b[99;99H");
        assert_eq!(screen.cursor(), (4, 9));
    }

    #[test]
    fn erase_display_clears_and_dirties_everything() {
        let mut screen = Screen::new(3, 4);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"abcd\r\nefgh");
        screen.grid_mut().clear_dirty();
        feed_all(&mut parser, &mut screen, b"\x1b[2J");
        for r in 0..3 {
            assert_eq!(row_text(&screen, r), "    ");
            assert!(screen.grid().is_line_dirty(r));
        }
    }

    #[test]
    fn sgr_sets_and_resets_attributes() {
        let mut screen = Screen::new(1, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b[1;33;44mA\x1b[mB");
        let a = screen.grid().cell(0, 0);
        assert!(a.attr.bold());
        assert_eq!(a.attr.fg(), 3);
        assert_eq!(a.attr.bg(), 4);
        let b = screen.grid().cell(0, 1);
        assert_eq!(b.attr, crate::term::attr::Attr::DEFAULT);
    }

    #[test]
    fn nul_bytes_have_no_effect() {
        let mut screen = Screen::new(1, 8);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"a\x00b");
        assert_eq!(row_text(&screen, 0), "ab      ");
    }

    #[test]
    fn esc_mid_sequence_restarts() {
        let mut screen = Screen::new(2, 10);
        let mut parser = VtParser::new();
        // The first sequence is abandoned at the second ESC; only the
        // second one takes effect.
        feed_all(&mut parser, &mut screen, b"\x1b[5\x1b[2;2Hx");
        assert_eq!(screen.cursor(), (1, 2));
        assert_eq!(screen.grid().cell(1, 1).ch, b'x');
    }

    #[test]
    fn can_aborts_sequence() {
        let mut screen = Screen::new(2, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b[2;2\x18Hx");
        // The CUP never fires; 'H' and 'x' print as plain characters.
        assert_eq!(row_text(&screen, 0), "Hx        ");
    }

    #[test]
    fn eight_bit_csi_is_esc_bracket() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x9b3;4H");
        assert_eq!(screen.cursor(), (2, 3));
    }

    #[test]
    fn reverse_line_feed_sequence() {
        let mut screen = Screen::new(3, 3);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"top");
        feed_all(&mut parser, &mut screen, b"\x1b[1;1H\x1bM");
        assert_eq!(row_text(&screen, 0), "   ");
        assert_eq!(row_text(&screen, 1), "top");
    }

    #[test]
    fn graphics_mode_substitution() {
        let mut screen = Screen::new(1, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x0ejx?\x0fj");
        assert_eq!(row_text(&screen, 0), "+|%j      ");
    }

    #[test]
    fn unrecognized_escape_is_discarded() {
        let mut screen = Screen::new(1, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b#ab");
        // '#' opens no recognized sequence: it and the buffer are dropped,
        // subsequent bytes print normally.
        assert_eq!(row_text(&screen, 0), "ab        ");
    }

    #[test]
    fn xterm_sequence_recognized_but_ignored() {
        let mut screen = Screen::new(1, 20);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b]0;title\x07done");
        assert_eq!(row_text(&screen, 0), "done                ");
        assert!(!parser.in_sequence());
    }

    #[test]
    fn private_mode_csi_is_consumed_without_effect() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        feed_all(&mut parser, &mut screen, b"\x1b[?25lx");
        assert_eq!(screen.cursor(), (0, 1));
        assert_eq!(screen.grid().cell(0, 0).ch, b'x');
    }

    #[test]
    fn overlong_sequence_is_abandoned() {
        let mut screen = Screen::new(2, 40);
        let mut parser = VtParser::new();
        let mut handler: Option<EscapeHandler> = None;
        parser.feed(0x1B, &mut screen, &mut handler);
        parser.feed(b'[', &mut screen, &mut handler);
        for _ in 0..ESBUF_CAP {
            parser.feed(b';', &mut screen, &mut handler);
        }
        assert!(!parser.in_sequence());
        // Parsing is not corrupted afterwards.
        feed_all(&mut parser, &mut screen, b"\x1b[2;3H");
        assert_eq!(screen.cursor(), (1, 2));
    }

    #[test]
    fn too_many_csi_params_dispatches_nothing() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        screen.move_cursor(2, 2);
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..40 {
            seq.extend_from_slice(b"1;");
        }
        seq.push(b'H');
        feed_all(&mut parser, &mut screen, &seq);
        // The CUP was discarded; the cursor did not move home.
        assert_eq!(screen.cursor(), (2, 2));
        assert!(!parser.in_sequence());
        feed_all(&mut parser, &mut screen, b"\x1b[1;1H");
        assert_eq!(screen.cursor(), (0, 0));
    }

    #[test]
    fn custom_handler_incomplete_then_handled() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        let calls = Rc::new(StdCell::new(0u32));
        let calls_in = calls.clone();
        let n = 4usize;
        let mut handler: Option<EscapeHandler> = Some(Box::new(move |_screen, seq| {
            calls_in.set(calls_in.get() + 1);
            if seq.len() <= n {
                HandlerResult::Incomplete
            } else {
                HandlerResult::Handled
            }
        }));
        parser.feed(0x1B, &mut screen, &mut handler);
        for &b in b"[2;2H" {
            parser.feed(b, &mut screen, &mut handler);
        }
        // Invoked once per appended byte, N of them Incomplete plus the
        // final Handled; the built-in CUP never fired.
        assert_eq!(calls.get(), n as u32 + 1);
        assert!(!parser.in_sequence());
        assert_eq!(screen.cursor(), (0, 0));
    }

    #[test]
    fn custom_handler_unhandled_falls_through() {
        let mut screen = Screen::new(5, 10);
        let mut parser = VtParser::new();
        let mut handler: Option<EscapeHandler> =
            Some(Box::new(|_screen, _seq| HandlerResult::Unhandled));
        parser.feed(0x1B, &mut screen, &mut handler);
        for &b in b"[3;4H" {
            parser.feed(b, &mut screen, &mut handler);
        }
        assert_eq!(screen.cursor(), (2, 3));
    }
}
