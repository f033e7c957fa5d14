//! Screen state: grid plus cursor, write attribute and scrolling region
//!
//! All mutators here are pure grid/cursor operations. They raise the
//! relevant dirty flags themselves, so the parser and the CSI handlers
//! never touch the flags directly.

use super::attr::Attr;
use super::grid::{Cell, Grid, Snapshot};

pub struct Screen {
    grid: Grid,
    /// Cursor position, always within `[0, rows) x [0, cols]`. A column
    /// equal to `cols` means the next printed character wraps first.
    cursor_row: u16,
    cursor_col: u16,
    /// Attribute applied to newly written cells.
    attr: Attr,
    /// Scrolling region bounds, inclusive. `top <= bottom` always holds.
    scroll_top: u16,
    scroll_bottom: u16,
    /// Single-slot save register for CSI s / u. A second save overwrites.
    saved_row: u16,
    saved_col: u16,
}

impl Screen {
    pub fn new(rows: u16, cols: u16) -> Self {
        let grid = Grid::new(rows, cols);
        let scroll_bottom = grid.rows() - 1;
        Screen {
            grid,
            cursor_row: 0,
            cursor_col: 0,
            attr: Attr::DEFAULT,
            scroll_top: 0,
            scroll_bottom,
            saved_row: 0,
            saved_col: 0,
        }
    }

    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Cursor position, clamped for display. The internal column may sit
    /// one past the last column between writing the final cell of a line
    /// and wrapping.
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_row, self.cursor_col.min(self.cols() - 1))
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    pub fn attr_mut(&mut self) -> &mut Attr {
        &mut self.attr
    }

    pub fn set_attr(&mut self, attr: Attr) {
        self.attr = attr;
    }

    pub fn scroll_region(&self) -> (u16, u16) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.grid.snapshot()
    }

    pub fn restore(&mut self, snap: &Snapshot) -> bool {
        self.grid.restore(snap)
    }

    /// Write one printable byte at the cursor, wrapping and scrolling as
    /// needed, then advance the cursor.
    pub fn put_char(&mut self, ch: u8) {
        if self.cursor_col >= self.cols() {
            self.cursor_col = 0;
            self.line_feed_no_cr();
        }
        let cell = Cell::new(ch, self.attr);
        self.grid.set_cell(self.cursor_row, self.cursor_col, cell);
        self.cursor_col += 1;
        self.grid.mark_dirty(self.cursor_row);
        self.grid.mark_cursor_dirty();
    }

    pub fn carriage_return(&mut self) {
        self.cursor_col = 0;
        self.grid.mark_cursor_dirty();
    }

    /// Line feed: column to 0, cursor down one line, scrolling the region
    /// when the cursor is already on its bottom row.
    pub fn line_feed(&mut self) {
        self.cursor_col = 0;
        self.line_feed_no_cr();
    }

    /// The line-advance half of a line feed, also used by wrapping.
    fn line_feed_no_cr(&mut self) {
        self.grid.mark_cursor_dirty();
        if self.cursor_row < self.scroll_bottom {
            self.cursor_row += 1;
            return;
        }
        // At the region bottom: the region scrolls, the cursor stays put.
        // The vacated row is cleared with the default attribute, not the
        // current one.
        self.cursor_row = self.scroll_bottom;
        self.shift_up(self.scroll_top, self.scroll_bottom, 1, Cell::BLANK);
    }

    /// Reverse line feed (ESC M): mirror of `line_feed` at the region top.
    pub fn reverse_line_feed(&mut self) {
        self.grid.mark_cursor_dirty();
        if self.cursor_row > self.scroll_top {
            self.cursor_row -= 1;
            return;
        }
        self.cursor_row = self.scroll_top;
        self.shift_down(self.scroll_top, self.scroll_bottom, 1, Cell::BLANK);
    }

    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        }
        self.grid.mark_cursor_dirty();
    }

    /// Tab: write spaces at the current attribute until the column is a
    /// multiple of 8. A column already on a tab stop does not move.
    pub fn tab(&mut self) {
        while self.cursor_col % 8 != 0 {
            self.put_char(b' ');
        }
    }

    /// Shift rows `[first, last]` up by `n`, filling the vacated bottom
    /// rows with `fill`. The scrolling-engine primitive behind line feed
    /// and delete-line.
    pub fn shift_up(&mut self, first: u16, last: u16, n: u16, fill: Cell) {
        if first > last || n == 0 {
            return;
        }
        let n = n.min(last - first + 1);
        for row in first..=last {
            self.grid.mark_dirty(row);
            if row + n <= last {
                self.grid.copy_row(row + n, row);
            } else {
                let cols = self.cols();
                self.grid.fill_row_span(row, 0, cols - 1, fill);
            }
        }
    }

    /// Shift rows `[first, last]` down by `n`, filling the vacated top
    /// rows with `fill`.
    pub fn shift_down(&mut self, first: u16, last: u16, n: u16, fill: Cell) {
        if first > last || n == 0 {
            return;
        }
        let n = n.min(last - first + 1);
        for row in (first..=last).rev() {
            self.grid.mark_dirty(row);
            if row >= first + n {
                self.grid.copy_row(row - n, row);
            } else {
                let cols = self.cols();
                self.grid.fill_row_span(row, 0, cols - 1, fill);
            }
        }
    }

    /// Move the cursor to an absolute position, clamped to the grid.
    pub fn move_cursor(&mut self, row: u16, col: u16) {
        self.cursor_row = row.min(self.rows() - 1);
        self.cursor_col = col.min(self.cols() - 1);
        self.grid.mark_cursor_dirty();
    }

    /// Move the cursor relative to its current position. Negative deltas
    /// stop at the grid edge.
    pub fn move_cursor_by(&mut self, d_row: i32, d_col: i32) {
        let row = (self.cursor_row as i32 + d_row).clamp(0, self.rows() as i32 - 1);
        let col = (self.cursor_col.min(self.cols() - 1) as i32 + d_col)
            .clamp(0, self.cols() as i32 - 1);
        self.cursor_row = row as u16;
        self.cursor_col = col as u16;
        self.grid.mark_cursor_dirty();
    }

    /// Set the scrolling region from 0-based inclusive bounds, clamping
    /// to the grid. An inverted range is rejected and the prior region
    /// retained.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let top = top.min(self.rows() - 1);
        let bottom = bottom.min(self.rows() - 1);
        if top > bottom {
            return;
        }
        self.scroll_top = top;
        self.scroll_bottom = bottom;
    }

    pub fn save_cursor(&mut self) {
        self.saved_row = self.cursor_row;
        self.saved_col = self.cursor_col.min(self.cols() - 1);
    }

    pub fn restore_cursor(&mut self) {
        self.move_cursor(self.saved_row, self.saved_col);
    }

    /// Clear the inclusive cell range from (r0, c0) to (r1, c1), walking
    /// row by row, to spaces at the current attribute. Used by erase-display.
    pub fn erase_region(&mut self, r0: u16, c0: u16, r1: u16, c1: u16) {
        let blank = Cell::blank_with(self.attr);
        for row in r0..=r1 {
            let start = if row == r0 { c0 } else { 0 };
            let end = if row == r1 { c1 } else { self.cols() - 1 };
            self.grid.fill_row_span(row, start, end, blank);
            self.grid.mark_dirty(row);
        }
    }
}
