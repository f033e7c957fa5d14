//! Virtual terminal state and escape-sequence interpretation
//!
//! The submodules split along the data/behavior seam: [`grid`] is pure
//! storage, [`screen`] layers cursor and scrolling semantics over it,
//! [`parser`] drives the byte-level state machine and [`csi`] holds the
//! command handlers it dispatches to.

pub mod attr;
pub mod csi;
pub mod grid;
pub mod parser;
pub mod screen;

pub use attr::{Attr, AttrFlags};
pub use grid::{Cell, Grid, Snapshot};
pub use parser::{EscapeHandler, HandlerResult, VtParser};
pub use screen::Screen;
