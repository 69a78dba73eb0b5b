use mux_term::CursorKeyMode;

use crate::key::{Key, Modifiers};

fn ctrl_byte(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii() && (b'@'..=b'_').contains(&(upper as u8)) {
        Some((upper as u8) & 0x1f)
    } else {
        None
    }
}

fn encode_char(c: char, mods: Modifiers) -> Vec<u8> {
    if mods.ctrl {
        if let Some(byte) = ctrl_byte(c) {
            let mut bytes = vec![byte];
            if mods.alt {
                bytes.insert(0, 0x1b);
            }
            return bytes;
        }
    }

    let mut bytes = Vec::new();
    if mods.alt {
        bytes.push(0x1b);
    }
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    bytes
}

/// `CSI letter` (no modifier) / `SS3 letter` under DECCKM / `CSI 1;Pm letter`
/// when modified — the shared shape of arrow keys and Home/End (spec §6.3
/// "DECCKM-aware cursor keys").
fn encode_cursor_key(letter: u8, mods: Modifiers, cursor_key_mode: CursorKeyMode) -> Vec<u8> {
    match mods.xterm_code() {
        Some(code) => format!("\x1b[1;{code}{}", letter as char).into_bytes(),
        None => match cursor_key_mode {
            CursorKeyMode::Application => vec![0x1b, b'O', letter],
            CursorKeyMode::Normal => vec![0x1b, b'[', letter],
        },
    }
}

/// `CSI Pn ~` / `CSI Pn;Pm ~` for the VT220 editing keys (Insert, Delete,
/// PageUp, PageDown).
fn encode_tilde_key(n: u8, mods: Modifiers) -> Vec<u8> {
    match mods.xterm_code() {
        Some(code) => format!("\x1b[{n};{code}~").into_bytes(),
        None => format!("\x1b[{n}~").into_bytes(),
    }
}

/// `SS3 letter` / `CSI 1;Pm letter` for F1-F4 (no DECCKM dependence — F-keys
/// aren't cursor keys, but unmodified xterm still emits the SS3 form).
fn encode_f1_to_f4(letter: u8, mods: Modifiers) -> Vec<u8> {
    match mods.xterm_code() {
        Some(code) => format!("\x1b[1;{code}{}", letter as char).into_bytes(),
        None => vec![0x1b, b'O', letter],
    }
}

/// Encodes one logical key press into the bytes to write to the PTY (spec
/// §6.3's "Input encoding"). `cursor_key_mode` is the session's current
/// DECCKM state; modified cursor keys always use the CSI form regardless
/// of it, matching xterm.
pub fn encode_key(key: Key, mods: Modifiers, cursor_key_mode: CursorKeyMode) -> Vec<u8> {
    match key {
        Key::Char(c) => encode_char(c, mods),
        Key::Enter => {
            if mods.alt {
                b"\n".to_vec()
            } else {
                b"\r".to_vec()
            }
        }
        Key::Tab => {
            if mods.shift {
                b"\x1b[Z".to_vec()
            } else {
                b"\t".to_vec()
            }
        }
        Key::Backspace => vec![0x7f],
        Key::Escape => vec![0x1b],
        Key::Space => {
            if mods.ctrl {
                vec![0x00]
            } else {
                b" ".to_vec()
            }
        }
        Key::ArrowUp => encode_cursor_key(b'A', mods, cursor_key_mode),
        Key::ArrowDown => encode_cursor_key(b'B', mods, cursor_key_mode),
        Key::ArrowRight => encode_cursor_key(b'C', mods, cursor_key_mode),
        Key::ArrowLeft => encode_cursor_key(b'D', mods, cursor_key_mode),
        Key::Home => encode_cursor_key(b'H', mods, cursor_key_mode),
        Key::End => encode_cursor_key(b'F', mods, cursor_key_mode),
        Key::Insert => encode_tilde_key(2, mods),
        Key::Delete => encode_tilde_key(3, mods),
        Key::PageUp => encode_tilde_key(5, mods),
        Key::PageDown => encode_tilde_key(6, mods),
        Key::F(1) => encode_f1_to_f4(b'P', mods),
        Key::F(2) => encode_f1_to_f4(b'Q', mods),
        Key::F(3) => encode_f1_to_f4(b'R', mods),
        Key::F(4) => encode_f1_to_f4(b'S', mods),
        Key::F(5) => encode_tilde_key(15, mods),
        Key::F(6) => encode_tilde_key(17, mods),
        Key::F(7) => encode_tilde_key(18, mods),
        Key::F(8) => encode_tilde_key(19, mods),
        Key::F(9) => encode_tilde_key(20, mods),
        Key::F(10) => encode_tilde_key(21, mods),
        Key::F(11) => encode_tilde_key(23, mods),
        Key::F(12) => encode_tilde_key(24, mods),
        Key::F(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_enter_emits_newline_not_carriage_return() {
        assert_eq!(encode_key(Key::Enter, Modifiers { alt: true, ..Modifiers::NONE }, CursorKeyMode::Normal), b"\n");
    }

    #[test]
    fn plain_enter_emits_carriage_return() {
        assert_eq!(encode_key(Key::Enter, Modifiers::NONE, CursorKeyMode::Normal), b"\r");
    }

    #[test]
    fn shift_tab_emits_cbt() {
        assert_eq!(encode_key(Key::Tab, Modifiers { shift: true, ..Modifiers::NONE }, CursorKeyMode::Normal), b"\x1b[Z");
    }

    #[test]
    fn backspace_emits_del() {
        assert_eq!(encode_key(Key::Backspace, Modifiers::NONE, CursorKeyMode::Normal), vec![0x7f]);
    }

    #[test]
    fn ctrl_letter_emits_control_byte() {
        assert_eq!(
            encode_key(Key::Char('a'), Modifiers { ctrl: true, ..Modifiers::NONE }, CursorKeyMode::Normal),
            vec![1]
        );
        assert_eq!(
            encode_key(Key::Char('c'), Modifiers { ctrl: true, ..Modifiers::NONE }, CursorKeyMode::Normal),
            vec![3]
        );
    }

    #[test]
    fn arrow_key_uses_ss3_under_application_mode() {
        assert_eq!(encode_key(Key::ArrowUp, Modifiers::NONE, CursorKeyMode::Application), b"\x1bOA");
        assert_eq!(encode_key(Key::ArrowUp, Modifiers::NONE, CursorKeyMode::Normal), b"\x1b[A");
    }

    #[test]
    fn modified_arrow_key_always_uses_csi_with_modifier_code() {
        let mods = Modifiers { shift: true, ..Modifiers::NONE };
        assert_eq!(encode_key(Key::ArrowRight, mods, CursorKeyMode::Application), b"\x1b[1;2C");
    }

    #[test]
    fn page_keys_use_tilde_sequences() {
        assert_eq!(encode_key(Key::PageUp, Modifiers::NONE, CursorKeyMode::Normal), b"\x1b[5~");
        assert_eq!(encode_key(Key::Delete, Modifiers::NONE, CursorKeyMode::Normal), b"\x1b[3~");
    }

    #[test]
    fn plain_character_passes_through_as_utf8() {
        assert_eq!(encode_key(Key::Char('é'), Modifiers::NONE, CursorKeyMode::Normal), "é".as_bytes());
    }
}
