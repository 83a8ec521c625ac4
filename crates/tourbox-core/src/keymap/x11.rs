//! [`KeyToken`] to X11 KeySym translation for the Linux XTest backend.
//!
//! KeySym values are defined in `X11/keysymdef.h`.
//!
//! # Characters (for beginners)
//!
//! X11 gives every Latin-1 character a KeySym equal to its code point
//! (`'a'` = `0x61`, `'é'` = `0xE9`).  Any other Unicode character uses the
//! "Unicode KeySym" range: `0x0100_0000 + code point`.  The XTest backend
//! looks the KeySym up in the server's keyboard map to find the keycode to
//! press, and adds Shift when the KeySym lives on the shifted level.

use super::{KeyToken, Modifier, ModifierKind, NamedKey, Side};

/// Offset of the Unicode KeySym range.
const UNICODE_KEYSYM_BASE: u32 = 0x0100_0000;

/// Translates a key token to an X11 KeySym.
///
/// Returns `None` for control characters other than newline and tab.
pub fn keysym(token: KeyToken) -> Option<u32> {
    match token {
        KeyToken::Modifier(m) => Some(modifier_keysym(m)),
        KeyToken::Named(k) => Some(named_keysym(k)),
        KeyToken::Char(c) => char_keysym(c),
    }
}

/// KeySym for one character of `type:` text.
pub fn char_keysym(c: char) -> Option<u32> {
    let cp = c as u32;
    match c {
        '\n' | '\r' => Some(0xFF0D), // XK_Return
        '\t' => Some(0xFF09),        // XK_Tab
        _ if c.is_control() => None,
        _ if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) => Some(cp),
        _ => Some(UNICODE_KEYSYM_BASE + cp),
    }
}

fn modifier_keysym(m: Modifier) -> u32 {
    match (m.kind, m.side) {
        (ModifierKind::Shift, Side::Left) => 0xFFE1,   // XK_Shift_L
        (ModifierKind::Shift, Side::Right) => 0xFFE2,  // XK_Shift_R
        (ModifierKind::Ctrl, Side::Left) => 0xFFE3,    // XK_Control_L
        (ModifierKind::Ctrl, Side::Right) => 0xFFE4,   // XK_Control_R
        (ModifierKind::Alt, Side::Left) => 0xFFE9,     // XK_Alt_L
        (ModifierKind::Alt, Side::Right) => 0xFFEA,    // XK_Alt_R
        (ModifierKind::Cmd, Side::Left) => 0xFFEB,     // XK_Super_L
        (ModifierKind::Cmd, Side::Right) => 0xFFEC,    // XK_Super_R
    }
}

fn named_keysym(k: NamedKey) -> u32 {
    match k {
        NamedKey::Home => 0xFF50,
        NamedKey::Left => 0xFF51,
        NamedKey::Up => 0xFF52,
        NamedKey::Right => 0xFF53,
        NamedKey::Down => 0xFF54,
        NamedKey::PageUp => 0xFF55,   // XK_Prior
        NamedKey::PageDown => 0xFF56, // XK_Next
        NamedKey::End => 0xFF57,
        NamedKey::Enter => 0xFF0D,
        NamedKey::Tab => 0xFF09,
        NamedKey::Esc => 0xFF1B,
        NamedKey::Space => 0x0020,
        NamedKey::Backspace => 0xFF08,
        NamedKey::Delete => 0xFFFF,
        // XK_F1 = 0xFFBE, consecutive through XK_F12 = 0xFFC9
        NamedKey::Function(n) => 0xFFBD + u32::from(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_characters_use_code_point() {
        assert_eq!(keysym(KeyToken::Char('a')), Some(0x61));
        assert_eq!(keysym(KeyToken::Char(']')), Some(0x5D));
    }

    #[test]
    fn test_non_latin1_characters_use_unicode_range() {
        assert_eq!(char_keysym('€'), Some(0x0100_20AC));
    }

    #[test]
    fn test_newline_maps_to_return_and_controls_are_rejected() {
        assert_eq!(char_keysym('\n'), Some(0xFF0D));
        assert_eq!(char_keysym('\u{7}'), None);
    }

    #[test]
    fn test_function_keys_are_consecutive() {
        assert_eq!(keysym(KeyToken::Named(NamedKey::Function(1))), Some(0xFFBE));
        assert_eq!(keysym(KeyToken::Named(NamedKey::Function(12))), Some(0xFFC9));
    }

    #[test]
    fn test_cmd_maps_to_super() {
        assert_eq!(keysym(KeyToken::Modifier(Modifier::CMD)), Some(0xFFEB));
    }
}
