//! [`KeyToken`] to macOS `CGKeyCode` translation (ANSI layout).
//!
//! CGKeyCode values are defined in Carbon `Events.h` (HIToolbox framework).
//! They name physical key positions, so characters that need Shift on a US
//! layout are reported together with a `needs_shift` flag.

use super::{us_shifted_base, KeyToken, Modifier, ModifierKind, NamedKey, Side};

/// A key position plus whether Shift must be held to produce the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    pub keycode: u16,
    pub needs_shift: bool,
}

/// Translates a key token to a `CGKeyCode` position.
///
/// Returns `None` for characters with no key on the ANSI layout; the
/// CoreGraphics backend types those as Unicode strings instead.
pub fn key_position(token: KeyToken) -> Option<KeyPosition> {
    match token {
        KeyToken::Modifier(m) => Some(unshifted(modifier_keycode(m))),
        KeyToken::Named(k) => Some(unshifted(named_keycode(k))),
        KeyToken::Char(c) => char_position(c),
    }
}

/// Position of a printable character, including the Shift requirement.
pub fn char_position(c: char) -> Option<KeyPosition> {
    if let Some(keycode) = ansi_keycode(c) {
        return Some(unshifted(keycode));
    }
    let base = us_shifted_base(c)?;
    ansi_keycode(base).map(|keycode| KeyPosition { keycode, needs_shift: true })
}

fn unshifted(keycode: u16) -> KeyPosition {
    KeyPosition { keycode, needs_shift: false }
}

fn modifier_keycode(m: Modifier) -> u16 {
    match (m.kind, m.side) {
        (ModifierKind::Cmd, Side::Left) => 0x37,   // kVK_Command
        (ModifierKind::Cmd, Side::Right) => 0x36,  // kVK_RightCommand
        (ModifierKind::Shift, Side::Left) => 0x38, // kVK_Shift
        (ModifierKind::Shift, Side::Right) => 0x3C,
        (ModifierKind::Alt, Side::Left) => 0x3A,   // kVK_Option
        (ModifierKind::Alt, Side::Right) => 0x3D,
        (ModifierKind::Ctrl, Side::Left) => 0x3B,  // kVK_Control
        (ModifierKind::Ctrl, Side::Right) => 0x3E,
    }
}

fn named_keycode(k: NamedKey) -> u16 {
    match k {
        NamedKey::Enter => 0x24,     // kVK_Return
        NamedKey::Tab => 0x30,
        NamedKey::Space => 0x31,
        NamedKey::Backspace => 0x33, // kVK_Delete
        NamedKey::Esc => 0x35,
        NamedKey::Delete => 0x75,    // kVK_ForwardDelete
        NamedKey::Home => 0x73,
        NamedKey::PageUp => 0x74,
        NamedKey::End => 0x77,
        NamedKey::PageDown => 0x79,
        NamedKey::Left => 0x7B,
        NamedKey::Right => 0x7C,
        NamedKey::Down => 0x7D,
        NamedKey::Up => 0x7E,
        NamedKey::Function(n) => match n {
            1 => 0x7A,
            2 => 0x78,
            3 => 0x63,
            4 => 0x76,
            5 => 0x60,
            6 => 0x61,
            7 => 0x62,
            8 => 0x64,
            9 => 0x65,
            10 => 0x6D,
            11 => 0x67,
            _ => 0x6F, // F12
        },
    }
}

fn ansi_keycode(c: char) -> Option<u16> {
    let code = match c {
        'a' => 0x00,
        's' => 0x01,
        'd' => 0x02,
        'f' => 0x03,
        'h' => 0x04,
        'g' => 0x05,
        'z' => 0x06,
        'x' => 0x07,
        'c' => 0x08,
        'v' => 0x09,
        'b' => 0x0B,
        'q' => 0x0C,
        'w' => 0x0D,
        'e' => 0x0E,
        'r' => 0x0F,
        'y' => 0x10,
        't' => 0x11,
        '1' => 0x12,
        '2' => 0x13,
        '3' => 0x14,
        '4' => 0x15,
        '6' => 0x16,
        '5' => 0x17,
        '=' => 0x18,
        '9' => 0x19,
        '7' => 0x1A,
        '-' => 0x1B,
        '8' => 0x1C,
        '0' => 0x1D,
        ']' => 0x1E,
        'o' => 0x1F,
        'u' => 0x20,
        '[' => 0x21,
        'i' => 0x22,
        'p' => 0x23,
        'l' => 0x25,
        'j' => 0x26,
        '\'' => 0x27,
        'k' => 0x28,
        ';' => 0x29,
        '\\' => 0x2A,
        ',' => 0x2B,
        '/' => 0x2C,
        'n' => 0x2D,
        'm' => 0x2E,
        '.' => 0x2F,
        ' ' => 0x31,
        '`' => 0x32,
        _ => return None,
    };
    Some(code)
}
