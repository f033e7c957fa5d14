//! muxvt - virtual terminal engine for multiplexing remote shells
//!
//! Each session a multiplexer manages is driven by a private virtual
//! terminal that interprets the byte stream of a child process (usually
//! `ssh`) exactly as a real terminal would, maintaining a
//! character/attribute grid for a UI layer to render.
//!
//! # Features
//!
//! - **Escape interpretation**: a linux-console-compatible subset of
//!   VT100 control codes and CSI sequences; anything unrecognized is
//!   silently discarded
//! - **Dirty tracking**: per-row and cursor dirty flags so renderers
//!   repaint only what changed
//! - **Bounded non-blocking pump**: pty bytes drain across `update`
//!   calls, never inside one
//! - **Keypress translation**: extended keys become the sequences a
//!   linux console emits
//! - **Snapshot/restore**: opaque full-grid copies between
//!   identically-sized terminals
//!
//! # Quick start
//!
//! ```no_run
//! use muxvt::{Keymap, Terminal};
//!
//! let mut term = Terminal::new(24, 80);
//! let keymap = Keymap::new();
//! term.spawn("ssh build-host").expect("spawn failed");
//! loop {
//!     term.update();                    // pump pty output
//!     // render via term.draw(...), clear dirty flags,
//!     // then feed one input event through term.keypress(&keymap, ...)
//!     # break;
//! }
//! ```

pub mod keymap;
pub mod pty;
pub mod term;
pub mod terminal;

pub use keymap::Keymap;
pub use pty::{Pty, PtyError};
pub use term::{Attr, Cell, EscapeHandler, Grid, HandlerResult, Screen, Snapshot, VtParser};
pub use terminal::{Render, Terminal};
