//! The virtual terminal handle
//!
//! Ties a screen, the escape-sequence parser and an optional pty-backed
//! child process together behind the operations the multiplexer layer
//! drives: spawn/disown, the bounded update pump, write, inject,
//! keypress and draw.
//!
//! Everything here is single-threaded and cooperative: one turn pumps
//! available pty bytes, renders, then handles one input event. The
//! engine only sets dirty flags; the renderer clears them.

use crossterm::event::KeyEvent;
use crossterm::style::ContentStyle;
use tracing::warn;

use crate::keymap::Keymap;
use crate::pty::{Pty, Result};
use crate::term::{EscapeHandler, Screen, Snapshot, VtParser};

/// Cap on pump iterations per `update` call. A child flooding the pty
/// would otherwise keep one call busy forever; callers invoke `update`
/// once per UI tick instead and the backlog drains across calls.
const UPDATE_ITERATIONS: usize = 5;

/// Bytes read from the pty per pump iteration.
const READ_CHUNK: usize = 512;

/// Injected into the terminal's own display when a pty write fails: the
/// terminal is usually the only error channel the interactive user sees.
const WRITE_ERROR_MSG: &[u8] = b"\n(muxvt: pty write error)\n";

/// Sink for `draw`: receives every cell with its resolved display style,
/// then the cursor position.
pub trait Render {
    fn cell(&mut self, row: u16, col: u16, ch: char, style: ContentStyle);
    fn cursor(&mut self, row: u16, col: u16);
}

/// A virtual terminal: fixed-size grid, escape interpreter and an
/// optionally attached child process.
pub struct Terminal {
    screen: Screen,
    parser: VtParser,
    pty: Option<Pty>,
    handler: Option<EscapeHandler>,
}

impl Terminal {
    /// A fresh terminal: space-filled grid at the default attribute,
    /// cursor at the origin, no child attached. Dimensions are fixed for
    /// the terminal's lifetime.
    pub fn new(rows: u16, cols: u16) -> Self {
        Terminal {
            screen: Screen::new(rows, cols),
            parser: VtParser::new(),
            pty: None,
            handler: None,
        }
    }

    pub fn rows(&self) -> u16 {
        self.screen.rows()
    }

    pub fn cols(&self) -> u16 {
        self.screen.cols()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn has_pty(&self) -> bool {
        self.pty.is_some()
    }

    pub fn child_pid(&self) -> Option<i32> {
        self.pty.as_ref().map(|p| p.child_pid())
    }

    /// Spawn `command` under a freshly allocated pty sized to this
    /// terminal. Any previously attached child is disowned first.
    pub fn spawn(&mut self, command: &str) -> Result<i32> {
        self.disown();
        let pty = Pty::spawn(self.rows(), self.cols(), command)?;
        let pid = pty.child_pid();
        self.pty = Some(pty);
        Ok(pid)
    }

    /// Close and forget the pty and child pid, leaving the grid as it
    /// is. Called by the host once it has observed the child's death;
    /// the terminal stays readable but is no longer process-backed.
    pub fn disown(&mut self) {
        self.pty = None;
    }

    /// Pump available pty bytes through the interpreter. Non-blocking
    /// and bounded; returns whether anything was consumed.
    pub fn update(&mut self) -> bool {
        let mut processed = false;
        for _ in 0..UPDATE_ITERATIONS {
            let mut buf = [0u8; READ_CHUNK];
            let n = match &self.pty {
                None => return processed,
                Some(pty) => {
                    if !pty.poll_readable() {
                        return processed;
                    }
                    match pty.read(&mut buf) {
                        Some(n) => n,
                        None => return processed,
                    }
                }
            };
            self.inject(&buf[..n]);
            processed = true;
        }
        processed
    }

    /// Send bytes to the child, or inject them directly when no pty is
    /// attached. A write failure surfaces as a diagnostic in the
    /// terminal's own display and the rest of the write is abandoned.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.pty.is_none() {
            self.inject(bytes);
            return;
        }
        let mut rest = bytes;
        let failed = loop {
            if rest.is_empty() {
                break false;
            }
            let pty = match &self.pty {
                Some(p) => p,
                None => break false,
            };
            match pty.write(rest) {
                Ok(n) if n > 0 => rest = &rest[n..],
                Ok(_) => break true,
                Err(err) => {
                    warn!(%err, "pty write failed");
                    break true;
                }
            }
        };
        if failed {
            self.inject(WRITE_ERROR_MSG);
        }
    }

    /// Apply bytes directly to the grid, bypassing any child process.
    /// Never blocks, never fails; malformed input is discarded.
    pub fn inject(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.parser.feed(b, &mut self.screen, &mut self.handler);
        }
    }

    /// Translate a key event and send the result through `write`, so it
    /// follows the same pty-vs-direct routing as any other output.
    pub fn keypress(&mut self, keymap: &Keymap, key: &KeyEvent) {
        let bytes = keymap.translate(key);
        if !bytes.is_empty() {
            self.write(&bytes);
        }
    }

    /// Render the grid and cursor position into `renderer`, pumping the
    /// pty first. Dirty flags are left alone; the renderer clears them
    /// through `screen_mut().grid_mut().clear_dirty()` once it has
    /// painted.
    pub fn draw<R: Render>(&mut self, renderer: &mut R) {
        self.update();
        for row in 0..self.rows() {
            for (col, cell) in self.screen.grid().row(row).iter().enumerate() {
                renderer.cell(row, col as u16, cell.printable(), cell.attr.content_style());
            }
        }
        let (row, col) = self.screen.cursor();
        renderer.cursor(row, col);
    }

    /// Opaque copy of the full cell grid. Only valid for `restore` on a
    /// terminal of identical dimensions.
    pub fn snapshot(&self) -> Snapshot {
        self.screen.snapshot()
    }

    /// Overwrite the grid from a snapshot, marking every row dirty.
    /// False when the dimensions do not match.
    pub fn restore(&mut self, snap: &Snapshot) -> bool {
        self.screen.restore(snap)
    }

    /// Register the custom escape hook. It runs on every byte of every
    /// in-progress sequence, ahead of built-in interpretation.
    pub fn install_handler(&mut self, handler: EscapeHandler) {
        self.handler = Some(handler);
    }

    pub fn remove_handler(&mut self) {
        self.handler = None;
    }
}
