//! CSI command set
//!
//! One handler per recognized final byte, all pure mutators over the
//! screen state. Sequences arrive here already complete: the buffer
//! starts with `[` and ends with a final byte in `[A-Za-z@\`]`.

use tracing::debug;

use super::attr::Attr;
use super::grid::Cell;
use super::screen::Screen;

/// Parameter count cap. A sequence with more parameters than this is
/// discarded without dispatching anything.
pub const MAX_CSI_PARAMS: usize = 32;

/// Interpret a complete CSI sequence against the screen.
pub(crate) fn dispatch(screen: &mut Screen, esbuf: &[u8]) {
    if esbuf.starts_with(b"[?") {
        // Private-mode CSI: parameters consumed, nothing executes.
        debug!("ignoring private-mode CSI");
        return;
    }
    let verb = match esbuf.last() {
        Some(&b) => b,
        None => return,
    };
    let params = match parse_params(&esbuf[1..esbuf.len() - 1]) {
        Some(p) => p,
        None => {
            debug!(len = esbuf.len(), "CSI parameter cap exceeded, discarding");
            return;
        }
    };

    match verb {
        b'm' => sgr(screen, &params),
        b'J' => erase_display(screen, &params),
        b'H' | b'f' => cursor_position(screen, &params),
        b'A' | b'B' | b'C' | b'D' | b'E' | b'F' | b'G' | b'e' | b'a' | b'd' | b'`' => {
            motion(screen, verb, &params)
        }
        b'K' => erase_line(screen, &params),
        b'@' => insert_chars(screen, &params),
        b'P' => delete_chars(screen, &params),
        b'L' => insert_lines(screen, &params),
        b'M' => delete_lines(screen, &params),
        b'X' => erase_chars(screen, &params),
        b'r' => set_scroll_region(screen, &params),
        b's' => screen.save_cursor(),
        b'u' => screen.restore_cursor(),
        _ => debug!(verb = %(verb as char), "unrecognized CSI verb"),
    }
}

/// Parse the `;`-separated numeric parameters between the `[` and the
/// final byte. An empty parameter is 0. Returns None past the cap.
fn parse_params(body: &[u8]) -> Option<Vec<u16>> {
    let mut params = Vec::new();
    let mut current: Option<u32> = None;
    for &b in body {
        match b {
            b'0'..=b'9' => {
                let v = current.unwrap_or(0) * 10 + u32::from(b - b'0');
                current = Some(v.min(u32::from(u16::MAX)));
            }
            b';' => {
                if params.len() >= MAX_CSI_PARAMS {
                    return None;
                }
                params.push(current.take().unwrap_or(0) as u16);
            }
            _ => break,
        }
    }
    if let Some(v) = current {
        if params.len() >= MAX_CSI_PARAMS {
            return None;
        }
        params.push(v as u16);
    }
    Some(params)
}

/// First parameter as a count: defaults to 1, and 0 means 1.
fn param_n(params: &[u16]) -> u16 {
    params.first().copied().filter(|&p| p > 0).unwrap_or(1)
}

fn sgr(screen: &mut Screen, params: &[u16]) {
    if params.is_empty() {
        screen.set_attr(Attr::DEFAULT);
        return;
    }
    let mut attr = screen.attr();
    for &p in params {
        match p {
            0 => attr = Attr::DEFAULT,
            1 | 2 | 4 => attr.set_bold(true),
            5 => attr.set_blink(true),
            7 | 27 => attr.swap_colors(),
            8 => attr = Attr(0), // fully invisible
            22 | 24 => attr.set_bold(false),
            25 => attr.set_blink(false),
            28 => attr = Attr::DEFAULT,
            30..=37 => attr.set_fg((p - 30) as u8),
            40..=47 => attr.set_bg((p - 40) as u8),
            39 => attr.set_fg(7),
            49 => attr.set_bg(0),
            _ => {}
        }
    }
    screen.set_attr(attr);
}

fn erase_display(screen: &mut Screen, params: &[u16]) {
    let (row, col) = screen.cursor();
    let last_row = screen.rows() - 1;
    let last_col = screen.cols() - 1;
    match params.first() {
        Some(2) => screen.erase_region(0, 0, last_row, last_col),
        Some(1) => screen.erase_region(0, 0, row, col),
        _ => screen.erase_region(row, col, last_row, last_col),
    }
}

fn cursor_position(screen: &mut Screen, params: &[u16]) {
    if params.is_empty() {
        screen.move_cursor(0, 0);
        return;
    }
    if params.len() < 2 {
        return; // malformed
    }
    screen.move_cursor(params[0].saturating_sub(1), params[1].saturating_sub(1));
}

fn motion(screen: &mut Screen, verb: u8, params: &[u16]) {
    let n = i32::from(param_n(params));
    match verb {
        b'A' => screen.move_cursor_by(-n, 0),
        b'B' | b'e' => screen.move_cursor_by(n, 0),
        b'C' | b'a' => screen.move_cursor_by(0, n),
        b'D' => screen.move_cursor_by(0, -n),
        b'E' => {
            screen.move_cursor_by(n, 0);
            screen.carriage_return();
        }
        b'F' => {
            screen.move_cursor_by(-n, 0);
            screen.carriage_return();
        }
        b'G' | b'`' => {
            let (row, _) = screen.cursor();
            screen.move_cursor(row, param_n(params) - 1);
        }
        b'd' => {
            let (_, col) = screen.cursor();
            screen.move_cursor(param_n(params) - 1, col);
        }
        _ => {}
    }
}

fn erase_line(screen: &mut Screen, params: &[u16]) {
    let (row, col) = screen.cursor();
    let last_col = screen.cols() - 1;
    match params.first() {
        Some(1) => screen.erase_region(row, 0, row, col),
        Some(2) => screen.erase_region(row, 0, row, last_col),
        _ => screen.erase_region(row, col, row, last_col),
    }
}

/// ICH: shift the characters at and after the cursor right, discarding
/// any that fall off the end, and blank the gap.
fn insert_chars(screen: &mut Screen, params: &[u16]) {
    let (row, col) = screen.cursor();
    let cols = screen.cols() as usize;
    let col = col as usize;
    let n = (param_n(params) as usize).min(cols - col);
    let blank = Cell::blank_with(screen.attr());

    let line = screen.grid_mut().row_mut(row);
    line.copy_within(col..cols - n, col + n);
    line[col..col + n].fill(blank);
    screen.grid_mut().mark_dirty(row);
}

/// DCH: shift the characters after cursor+n left, blanking the tail.
fn delete_chars(screen: &mut Screen, params: &[u16]) {
    let (row, col) = screen.cursor();
    let cols = screen.cols() as usize;
    let col = col as usize;
    let n = (param_n(params) as usize).min(cols - col);
    let blank = Cell::blank_with(screen.attr());

    let line = screen.grid_mut().row_mut(row);
    line.copy_within(col + n..cols, col);
    line[cols - n..cols].fill(blank);
    screen.grid_mut().mark_dirty(row);
}

/// IL: shift rows down within [cursor, scroll bottom], clearing the
/// opened rows at the current attribute. A cursor below the scrolling
/// region makes this a no-op.
fn insert_lines(screen: &mut Screen, params: &[u16]) {
    let n = param_n(params);
    let (row, _) = screen.cursor();
    let (_, bottom) = screen.scroll_region();
    let blank = Cell::blank_with(screen.attr());
    screen.shift_down(row, bottom, n, blank);
}

/// DL: shift rows up within [cursor, scroll bottom], clearing the
/// trailing rows at the current attribute.
fn delete_lines(screen: &mut Screen, params: &[u16]) {
    let n = param_n(params);
    let (row, _) = screen.cursor();
    let (_, bottom) = screen.scroll_region();
    let blank = Cell::blank_with(screen.attr());
    screen.shift_up(row, bottom, n, blank);
}

/// ECH: clear n cells starting at the cursor, bounded by the line end.
fn erase_chars(screen: &mut Screen, params: &[u16]) {
    let n = param_n(params);
    let (row, col) = screen.cursor();
    // Widen before adding: n comes straight off the wire and col + n can
    // exceed u16.
    let end = (u32::from(col) + u32::from(n) - 1).min(u32::from(screen.cols()) - 1) as u16;
    screen.erase_region(row, col, row, end);
}

fn set_scroll_region(screen: &mut Screen, params: &[u16]) {
    if params.is_empty() {
        let bottom = screen.rows() - 1;
        screen.set_scroll_region(0, bottom);
        return;
    }
    if params.len() < 2 {
        return; // malformed
    }
    screen.set_scroll_region(params[0].saturating_sub(1), params[1].saturating_sub(1));
}
