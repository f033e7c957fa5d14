//! Packed cell attributes
//!
//! A cell attribute is a single byte, laid out MSB to LSB as
//! bold(1) | foreground(3) | blink(1) | background(3). This matches the
//! linux console's 8-color model and keeps snapshots byte-dense.

use bitflags::bitflags;
use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

bitflags! {
    /// The two single-bit fields of the packed attribute byte.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        const BOLD  = 0x80;
        const BLINK = 0x08;
    }
}

const FG_MASK: u8 = 0x70;
const FG_SHIFT: u8 = 4;
const BG_MASK: u8 = 0x07;

/// A packed 8-bit display attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attr(pub u8);

impl Attr {
    /// White text on black background, no bold, no blink. This is the
    /// "no special pair" value: `color_pair()` maps it to 0.
    pub const DEFAULT: Attr = Attr(0x70);

    pub fn fg(self) -> u8 {
        (self.0 & FG_MASK) >> FG_SHIFT
    }

    pub fn bg(self) -> u8 {
        self.0 & BG_MASK
    }

    pub fn bold(self) -> bool {
        AttrFlags::from_bits_truncate(self.0).contains(AttrFlags::BOLD)
    }

    pub fn blink(self) -> bool {
        AttrFlags::from_bits_truncate(self.0).contains(AttrFlags::BLINK)
    }

    pub fn set_fg(&mut self, fg: u8) {
        self.0 = (self.0 & !FG_MASK) | ((fg & 0x07) << FG_SHIFT);
    }

    pub fn set_bg(&mut self, bg: u8) {
        self.0 = (self.0 & !BG_MASK) | (bg & 0x07);
    }

    pub fn set_bold(&mut self, on: bool) {
        if on {
            self.0 |= AttrFlags::BOLD.bits();
        } else {
            self.0 &= !AttrFlags::BOLD.bits();
        }
    }

    pub fn set_blink(&mut self, on: bool) {
        if on {
            self.0 |= AttrFlags::BLINK.bits();
        } else {
            self.0 &= !AttrFlags::BLINK.bits();
        }
    }

    /// Swap foreground and background (SGR 7 / 27 negative image).
    pub fn swap_colors(&mut self) {
        let fg = self.fg();
        let bg = self.bg();
        self.set_fg(bg);
        self.set_bg(fg);
    }

    /// Curses-style color pair index: `bg * 8 + 7 - fg`.
    ///
    /// Pair 0 is the default white-on-black combination, which curses
    /// hosts must not redefine.
    pub fn color_pair(self) -> u8 {
        self.bg() * 8 + 7 - self.fg()
    }

    /// Resolve to a crossterm style for hosts that render with crossterm.
    pub fn content_style(self) -> ContentStyle {
        let mut attributes = Attributes::default();
        if self.bold() {
            attributes.set(Attribute::Bold);
        }
        if self.blink() {
            attributes.set(Attribute::SlowBlink);
        }
        let foreground_color = if self.fg() == 7 && !self.bold() {
            Some(Color::Reset)
        } else {
            Some(Color::AnsiValue(self.fg()))
        };
        let background_color = if self.bg() == 0 {
            Some(Color::Reset)
        } else {
            Some(Color::AnsiValue(self.bg()))
        };
        ContentStyle {
            foreground_color,
            background_color,
            underline_color: None,
            attributes,
        }
    }
}

impl Default for Attr {
    fn default() -> Self {
        Attr::DEFAULT
    }
}
