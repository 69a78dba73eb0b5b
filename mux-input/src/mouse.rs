use crate::key::Modifiers;

/// Which button a mouse event reports, matching the xterm button-id space
/// used by the SGR 1006 protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

/// Press, release, or drag-motion-while-a-button-is-held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Drag,
}

impl MouseButton {
    fn base_code(self) -> u8 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::WheelUp => 64,
            MouseButton::WheelDown => 65,
        }
    }

    fn from_base_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            64 => Some(MouseButton::WheelUp),
            65 => Some(MouseButton::WheelDown),
            _ => None,
        }
    }
}

/// Bits `Cb` carries beyond the button id: shift/alt/ctrl and the
/// drag-motion flag (spec §6.3, xterm's extended mouse protocol).
const CB_SHIFT: u8 = 4;
const CB_ALT: u8 = 8;
const CB_CTRL: u8 = 16;
const CB_DRAG: u8 = 32;

/// Encodes a mouse event as an SGR 1006 sequence: `CSI < Cb ; Px ; Py M`
/// on press/drag, `CSI < Cb ; Px ; Py m` on release (spec §6.3 "SGR 1006
/// mouse"). `x`/`y` are 1-based terminal cell coordinates.
pub fn encode_mouse_sgr(button: MouseButton, x: u16, y: u16, kind: MouseEventKind, mods: Modifiers) -> Vec<u8> {
    let mut cb = button.base_code();
    if mods.shift {
        cb |= CB_SHIFT;
    }
    if mods.alt {
        cb |= CB_ALT;
    }
    if mods.ctrl {
        cb |= CB_CTRL;
    }
    if kind == MouseEventKind::Drag {
        cb |= CB_DRAG;
    }
    let terminator = if kind == MouseEventKind::Release { 'm' } else { 'M' };
    format!("\x1b[<{cb};{x};{y}{terminator}").into_bytes()
}

/// Decodes an SGR 1006 sequence produced by [`encode_mouse_sgr`] back into
/// its button/position/kind/modifiers (spec §8 testable property 7: "Mouse-
/// encoded SGR sequence round-trip"). Returns `None` for anything that
/// isn't a well-formed `CSI < Cb ; Px ; Py M/m` sequence.
pub fn decode_mouse_sgr(bytes: &[u8]) -> Option<(MouseButton, u16, u16, MouseEventKind, Modifiers)> {
    let text = std::str::from_utf8(bytes).ok()?;
    let body = text.strip_prefix("\x1b[<")?;
    let (body, terminator) = match body.as_bytes().last() {
        Some(b'M') => (&body[..body.len() - 1], 'M'),
        Some(b'm') => (&body[..body.len() - 1], 'm'),
        _ => return None,
    };

    let mut fields = body.split(';');
    let cb: u8 = fields.next()?.parse().ok()?;
    let x: u16 = fields.next()?.parse().ok()?;
    let y: u16 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let drag = cb & CB_DRAG != 0;
    let base = cb & !(CB_SHIFT | CB_ALT | CB_CTRL | CB_DRAG);
    let button = MouseButton::from_base_code(base)?;

    let kind = if terminator == 'm' {
        MouseEventKind::Release
    } else if drag {
        MouseEventKind::Drag
    } else {
        MouseEventKind::Press
    };

    let mods = Modifiers {
        shift: cb & CB_SHIFT != 0,
        alt: cb & CB_ALT != 0,
        ctrl: cb & CB_CTRL != 0,
        meta: false,
    };

    Some((button, x, y, kind, mods))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_press_with_no_modifiers() {
        let bytes = encode_mouse_sgr(MouseButton::Left, 10, 5, MouseEventKind::Press, Modifiers::NONE);
        assert_eq!(bytes, b"\x1b[<0;10;5M");
    }

    #[test]
    fn left_release_uses_lowercase_terminator() {
        let bytes = encode_mouse_sgr(MouseButton::Left, 10, 5, MouseEventKind::Release, Modifiers::NONE);
        assert_eq!(bytes, b"\x1b[<0;10;5m");
    }

    #[test]
    fn drag_sets_motion_bit() {
        let bytes = encode_mouse_sgr(MouseButton::Left, 1, 1, MouseEventKind::Drag, Modifiers::NONE);
        assert_eq!(bytes, b"\x1b[<32;1;1M");
    }

    #[test]
    fn modifiers_combine_into_button_code() {
        let mods = Modifiers { shift: true, ctrl: true, ..Modifiers::NONE };
        let bytes = encode_mouse_sgr(MouseButton::Right, 3, 4, MouseEventKind::Press, mods);
        assert_eq!(bytes, b"\x1b[<22;3;4M");
    }

    #[test]
    fn wheel_events_use_64_66_base_codes() {
        let bytes = encode_mouse_sgr(MouseButton::WheelUp, 1, 1, MouseEventKind::Press, Modifiers::NONE);
        assert_eq!(bytes, b"\x1b[<64;1;1M");
        let bytes = encode_mouse_sgr(MouseButton::WheelDown, 1, 1, MouseEventKind::Press, Modifiers::NONE);
        assert_eq!(bytes, b"\x1b[<65;1;1M");
    }

    #[test]
    fn decode_recovers_button_position_and_kind() {
        let decoded = decode_mouse_sgr(b"\x1b[<0;10;5M").unwrap();
        assert_eq!(decoded, (MouseButton::Left, 10, 5, MouseEventKind::Press, Modifiers::NONE));

        let decoded = decode_mouse_sgr(b"\x1b[<0;10;5m").unwrap();
        assert_eq!(decoded.3, MouseEventKind::Release);

        let decoded = decode_mouse_sgr(b"\x1b[<32;1;1M").unwrap();
        assert_eq!(decoded.3, MouseEventKind::Drag);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(decode_mouse_sgr(b"not a mouse sequence").is_none());
        assert!(decode_mouse_sgr(b"\x1b[<0;10;5X").is_none());
        assert!(decode_mouse_sgr(b"\x1b[<99;1;1M").is_none());
    }

    /// Spec §8 testable property 7: decoding an encoded SGR sequence
    /// yields the input event back (modifier-ordering doesn't apply here
    /// since modifiers are bit flags, not an ordered sequence).
    #[test]
    fn encode_decode_round_trips_for_every_button_kind_and_modifier_combo() {
        let buttons = [
            MouseButton::Left,
            MouseButton::Middle,
            MouseButton::Right,
            MouseButton::WheelUp,
            MouseButton::WheelDown,
        ];
        let kinds = [MouseEventKind::Press, MouseEventKind::Release, MouseEventKind::Drag];
        let mod_combos = [
            Modifiers::NONE,
            Modifiers { shift: true, ..Modifiers::NONE },
            Modifiers { alt: true, ..Modifiers::NONE },
            Modifiers { ctrl: true, ..Modifiers::NONE },
            Modifiers { shift: true, alt: true, ctrl: true, ..Modifiers::NONE },
        ];

        for &button in &buttons {
            for &kind in &kinds {
                for &mods in &mod_combos {
                    let encoded = encode_mouse_sgr(button, 42, 7, kind, mods);
                    let (decoded_button, x, y, decoded_kind, decoded_mods) =
                        decode_mouse_sgr(&encoded).unwrap();
                    assert_eq!(decoded_button, button);
                    assert_eq!((x, y), (42, 7));
                    assert_eq!(decoded_mods, mods);
                    // Release always wins the terminator regardless of the
                    // drag bit, matching `encode_mouse_sgr`'s own rule.
                    let expected_kind = if kind == MouseEventKind::Release {
                        MouseEventKind::Release
                    } else {
                        kind
                    };
                    assert_eq!(decoded_kind, expected_kind);
                }
            }
        }
    }
}
