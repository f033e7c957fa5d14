//! Cell grid storage
//!
//! The grid is one contiguous buffer of cells indexed `row * cols + col`,
//! which makes scrolling a pair of `copy_within` calls and snapshotting a
//! single buffer clone. Dimensions are fixed for the grid's lifetime.
//!
//! Dirty tracking is cooperative: the engine only sets the flags and the
//! renderer is the sole clearer. Both run on the same thread, one turn at
//! a time, so no locking is involved.

use super::attr::Attr;

/// One character cell: a printable byte plus its packed attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: u8,
    pub attr: Attr,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: b' ',
        attr: Attr::DEFAULT,
    };

    pub fn new(ch: u8, attr: Attr) -> Self {
        Cell { ch, attr }
    }

    /// A space carrying the given attribute, used when erasing.
    pub fn blank_with(attr: Attr) -> Self {
        Cell { ch: b' ', attr }
    }

    /// The display character. Control bytes are never stored, but a
    /// restored snapshot from a foreign source could carry one, so clamp
    /// on the way out.
    pub fn printable(&self) -> char {
        if self.ch >= 32 {
            self.ch as char
        } else {
            ' '
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::BLANK
    }
}

/// Opaque copy of a grid's full cell contents.
#[derive(Clone)]
pub struct Snapshot {
    rows: u16,
    cols: u16,
    cells: Box<[Cell]>,
}

/// The rows x cols cell matrix with per-row dirty flags.
pub struct Grid {
    rows: u16,
    cols: u16,
    cells: Vec<Cell>,
    line_dirty: Vec<bool>,
    cursor_dirty: bool,
}

impl Grid {
    pub fn new(rows: u16, cols: u16) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Grid {
            rows,
            cols,
            cells: vec![Cell::BLANK; rows as usize * cols as usize],
            line_dirty: vec![true; rows as usize],
            cursor_dirty: true,
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[inline]
    fn index(&self, row: u16, col: u16) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row as usize * self.cols as usize + col as usize
    }

    pub fn cell(&self, row: u16, col: u16) -> Cell {
        self.cells[self.index(row, col)]
    }

    pub fn set_cell(&mut self, row: u16, col: u16, cell: Cell) {
        let idx = self.index(row, col);
        self.cells[idx] = cell;
    }

    pub fn row(&self, row: u16) -> &[Cell] {
        let start = self.index(row, 0);
        &self.cells[start..start + self.cols as usize]
    }

    pub fn row_mut(&mut self, row: u16) -> &mut [Cell] {
        let start = self.index(row, 0);
        let cols = self.cols as usize;
        &mut self.cells[start..start + cols]
    }

    /// Fill columns `[c0, c1]` of a row, inclusive on both ends.
    pub fn fill_row_span(&mut self, row: u16, c0: u16, c1: u16, cell: Cell) {
        let start = self.index(row, c0);
        let end = self.index(row, c1) + 1;
        self.cells[start..end].fill(cell);
    }

    /// Copy the whole of row `src` over row `dst`.
    pub fn copy_row(&mut self, src: u16, dst: u16) {
        let cols = self.cols as usize;
        let from = self.index(src, 0);
        let to = self.index(dst, 0);
        self.cells.copy_within(from..from + cols, to);
    }

    pub fn fill_all(&mut self, cell: Cell) {
        self.cells.fill(cell);
        self.mark_all_dirty();
    }

    pub fn mark_dirty(&mut self, row: u16) {
        self.line_dirty[row as usize] = true;
    }

    pub fn mark_all_dirty(&mut self) {
        self.line_dirty.fill(true);
        self.cursor_dirty = true;
    }

    pub fn mark_cursor_dirty(&mut self) {
        self.cursor_dirty = true;
    }

    pub fn is_line_dirty(&self, row: u16) -> bool {
        self.line_dirty[row as usize]
    }

    pub fn is_cursor_dirty(&self) -> bool {
        self.cursor_dirty
    }

    /// Reset all dirty flags. Only the renderer calls this, after it has
    /// repainted what the flags cover.
    pub fn clear_dirty(&mut self) {
        self.line_dirty.fill(false);
        self.cursor_dirty = false;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.clone().into_boxed_slice(),
        }
    }

    /// Overwrite the grid from a snapshot and mark every row dirty.
    /// Returns false (and leaves the grid untouched) when the snapshot
    /// was taken at different dimensions.
    pub fn restore(&mut self, snap: &Snapshot) -> bool {
        if snap.rows != self.rows || snap.cols != self.cols {
            return false;
        }
        self.cells.copy_from_slice(&snap.cells);
        self.mark_all_dirty();
        true
    }
}
