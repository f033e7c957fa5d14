//! Keypress translation
//!
//! Maps extended key codes to the byte sequences a linux console emits,
//! falling back to literal byte emission for plain characters. The table
//! is built eagerly once, owned by whoever drives the terminals, and
//! passed by reference; there is no lazily initialized global.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Immutable key-code-to-sequence mapping for a linux console.
pub struct Keymap {
    table: HashMap<KeyCode, &'static [u8]>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

impl Keymap {
    pub fn new() -> Self {
        let mut table: HashMap<KeyCode, &'static [u8]> = HashMap::new();
        table.insert(KeyCode::Enter, b"\r");
        table.insert(KeyCode::Up, b"\x1b[A");
        table.insert(KeyCode::Down, b"\x1b[B");
        table.insert(KeyCode::Right, b"\x1b[C");
        table.insert(KeyCode::Left, b"\x1b[D");
        table.insert(KeyCode::Backspace, b"\x08");
        table.insert(KeyCode::Home, b"\x1b[1~");
        table.insert(KeyCode::Insert, b"\x1b[2~");
        table.insert(KeyCode::Delete, b"\x1b[3~");
        table.insert(KeyCode::End, b"\x1b[4~");
        table.insert(KeyCode::PageUp, b"\x1b[5~");
        table.insert(KeyCode::PageDown, b"\x1b[6~");
        table.insert(KeyCode::F(1), b"\x1b[[A");
        table.insert(KeyCode::F(2), b"\x1b[[B");
        table.insert(KeyCode::F(3), b"\x1b[[C");
        table.insert(KeyCode::F(4), b"\x1b[[D");
        table.insert(KeyCode::F(5), b"\x1b[[E");
        table.insert(KeyCode::F(6), b"\x1b[17~");
        table.insert(KeyCode::F(7), b"\x1b[18~");
        table.insert(KeyCode::F(8), b"\x1b[19~");
        table.insert(KeyCode::F(9), b"\x1b[20~");
        table.insert(KeyCode::F(10), b"\x1b[21~");
        Keymap { table }
    }

    /// Translate a key event into the bytes to send to the child.
    /// Unknown keys yield nothing; plain characters are emitted
    /// literally, with Ctrl folding into the control range (so Ctrl+Z
    /// produces 0x1A, the suspend byte).
    pub fn translate(&self, key: &KeyEvent) -> Vec<u8> {
        if let Some(seq) = self.table.get(&key.code) {
            return seq.to_vec();
        }
        match key.code {
            KeyCode::Char(ch) if ch.is_ascii() => {
                let byte = ch as u8;
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    vec![byte.to_ascii_uppercase() & 0x1F]
                } else {
                    vec![byte]
                }
            }
            KeyCode::Esc => vec![0x1B],
            KeyCode::Tab => vec![b'\t'],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrow_keys_use_csi_sequences() {
        let keymap = Keymap::new();
        assert_eq!(keymap.translate(&plain(KeyCode::Up)), b"\x1b[A");
        assert_eq!(keymap.translate(&plain(KeyCode::Down)), b"\x1b[B");
        assert_eq!(keymap.translate(&plain(KeyCode::Right)), b"\x1b[C");
        assert_eq!(keymap.translate(&plain(KeyCode::Left)), b"\x1b[D");
    }

    #[test]
    fn function_keys_follow_the_console_table() {
        let keymap = Keymap::new();
        assert_eq!(keymap.translate(&plain(KeyCode::F(1))), b"\x1b[[A");
        assert_eq!(keymap.translate(&plain(KeyCode::F(6))), b"\x1b[17~");
        assert_eq!(keymap.translate(&plain(KeyCode::F(10))), b"\x1b[21~");
    }

    #[test]
    fn enter_is_carriage_return() {
        let keymap = Keymap::new();
        assert_eq!(keymap.translate(&plain(KeyCode::Enter)), b"\r");
    }

    #[test]
    fn plain_characters_pass_through() {
        let keymap = Keymap::new();
        assert_eq!(keymap.translate(&plain(KeyCode::Char('q'))), b"q");
        assert_eq!(keymap.translate(&plain(KeyCode::Char(' '))), b" ");
    }

    #[test]
    fn ctrl_folds_into_control_range() {
        let keymap = Keymap::new();
        let ctrl_z = KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(keymap.translate(&ctrl_z), vec![0x1A]);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(keymap.translate(&ctrl_c), vec![0x03]);
    }

    #[test]
    fn unknown_keys_emit_nothing() {
        let keymap = Keymap::new();
        assert!(keymap.translate(&plain(KeyCode::CapsLock)).is_empty());
    }
}
