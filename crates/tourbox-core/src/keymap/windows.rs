//! [`KeyToken`] to Windows Virtual-Key code translation.
//!
//! Named keys and modifiers use the fixed `VK_*` constants from `WinUser.h`.
//! Characters depend on the active keyboard layout, so the `SendInput`
//! backend resolves them at runtime with `VkKeyScanW`; [`ascii_vk`] is the
//! layout-independent fallback for letters and digits.

use super::{KeyToken, Modifier, ModifierKind, NamedKey, Side};

/// Translates a modifier or named key to a Virtual-Key code.
///
/// Returns `None` for [`KeyToken::Char`]; see [`ascii_vk`].
pub fn virtual_key(token: KeyToken) -> Option<u16> {
    match token {
        KeyToken::Modifier(m) => Some(modifier_vk(m)),
        KeyToken::Named(k) => Some(named_vk(k)),
        KeyToken::Char(_) => None,
    }
}

/// VK code for ASCII letters and digits (`VK_A` = `'A'`, `VK_0` = `'0'`).
pub fn ascii_vk(c: char) -> Option<u16> {
    if c.is_ascii_alphanumeric() {
        Some(c.to_ascii_uppercase() as u16)
    } else {
        None
    }
}

fn modifier_vk(m: Modifier) -> u16 {
    match (m.kind, m.side) {
        (ModifierKind::Shift, Side::Left) => 0xA0, // VK_LSHIFT
        (ModifierKind::Shift, Side::Right) => 0xA1,
        (ModifierKind::Ctrl, Side::Left) => 0xA2,  // VK_LCONTROL
        (ModifierKind::Ctrl, Side::Right) => 0xA3,
        (ModifierKind::Alt, Side::Left) => 0xA4,   // VK_LMENU
        (ModifierKind::Alt, Side::Right) => 0xA5,
        (ModifierKind::Cmd, Side::Left) => 0x5B,   // VK_LWIN
        (ModifierKind::Cmd, Side::Right) => 0x5C,
    }
}

fn named_vk(k: NamedKey) -> u16 {
    match k {
        NamedKey::Backspace => 0x08,
        NamedKey::Tab => 0x09,
        NamedKey::Enter => 0x0D,
        NamedKey::Esc => 0x1B,
        NamedKey::Space => 0x20,
        NamedKey::PageUp => 0x21,   // VK_PRIOR
        NamedKey::PageDown => 0x22, // VK_NEXT
        NamedKey::End => 0x23,
        NamedKey::Home => 0x24,
        NamedKey::Left => 0x25,
        NamedKey::Up => 0x26,
        NamedKey::Right => 0x27,
        NamedKey::Down => 0x28,
        NamedKey::Delete => 0x2E,
        // VK_F1 = 0x70 through VK_F12 = 0x7B
        NamedKey::Function(n) => 0x6F + u16::from(n),
    }
}
