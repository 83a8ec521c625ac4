//! Windows keystroke synthesis via the SendInput API.
//!
//! Modifiers and named keys map to fixed Virtual-Key codes.  Characters are
//! looked up in the active keyboard layout with `VkKeyScanW`, which also
//! reports whether Shift is needed.  `type:` text bypasses the layout
//! entirely and is sent as `KEYEVENTF_UNICODE` input, one UTF-16 unit per
//! event.

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

use tourbox_core::keymap::windows::{ascii_vk, virtual_key};
use tourbox_core::KeyToken;

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

const VK_LSHIFT: u16 = 0xA0;
const VK_RETURN: u16 = 0x0D;
const VK_TAB: u16 = 0x09;

/// SendInput keyboard backend.
pub struct SendInputKeyboard;

impl SendInputKeyboard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SendInputKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

/// A Virtual-Key code plus whether Shift must be held.
#[derive(Debug, Clone, Copy)]
struct KeyStroke {
    vk: u16,
    shifted: bool,
}

fn resolve(key: KeyToken) -> Result<KeyStroke, SynthesisError> {
    if let Some(vk) = virtual_key(key) {
        return Ok(KeyStroke { vk, shifted: false });
    }
    let KeyToken::Char(c) = key else {
        return Err(SynthesisError::Unmappable(key));
    };
    let mut units = [0u16; 2];
    if c.encode_utf16(&mut units).len() == 1 {
        // SAFETY: VkKeyScanW has no preconditions.
        let scan = unsafe { VkKeyScanW(units[0]) };
        if scan != -1 {
            let vk = (scan as u16) & 0xFF;
            let shifted = (scan as u16 >> 8) & 0x01 != 0;
            return Ok(KeyStroke { vk, shifted });
        }
    }
    ascii_vk(c)
        .map(|vk| KeyStroke { vk, shifted: c.is_ascii_uppercase() })
        .ok_or(SynthesisError::Unmappable(key))
}

/// Navigation, Insert/Delete, the Windows keys, and right Ctrl/Alt live on
/// the extended part of the keyboard.
fn is_extended(vk: u16) -> bool {
    matches!(vk, 0x21..=0x28 | 0x2D | 0x2E | 0x5B | 0x5C | 0xA3 | 0xA5)
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), SynthesisError> {
    // SAFETY: every INPUT is a fully initialised keyboard record on the stack.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(SynthesisError::Platform(format!(
            "SendInput inserted {sent} of {} events",
            inputs.len()
        )));
    }
    Ok(())
}

fn vk_input(vk: u16, up: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if is_extended(vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if up {
        flags |= KEYEVENTF_KEYUP;
    }
    keyboard_input(vk, 0, flags)
}

fn send_stroke(stroke: KeyStroke, up: bool) -> Result<(), SynthesisError> {
    let inputs = match (stroke.shifted, up) {
        (false, _) => vec![vk_input(stroke.vk, up)],
        (true, false) => vec![vk_input(VK_LSHIFT, false), vk_input(stroke.vk, false)],
        (true, true) => vec![vk_input(stroke.vk, true), vk_input(VK_LSHIFT, true)],
    };
    send(&inputs)
}

impl PlatformKeyboard for SendInputKeyboard {
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        send_stroke(resolve(key)?, false)
    }

    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        send_stroke(resolve(key)?, true)
    }

    fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
        let mut inputs = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            match c {
                '\n' | '\r' => {
                    inputs.push(vk_input(VK_RETURN, false));
                    inputs.push(vk_input(VK_RETURN, true));
                }
                '\t' => {
                    inputs.push(vk_input(VK_TAB, false));
                    inputs.push(vk_input(VK_TAB, true));
                }
                _ => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units).iter() {
                        inputs.push(keyboard_input(0, *unit, KEYEVENTF_UNICODE));
                        inputs.push(keyboard_input(0, *unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
                    }
                }
            }
        }
        if inputs.is_empty() {
            return Ok(());
        }
        send(&inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourbox_core::NamedKey;

    #[test]
    fn test_navigation_keys_are_extended() {
        let vk = virtual_key(KeyToken::Named(NamedKey::PageDown)).unwrap();
        assert!(is_extended(vk));
        assert!(!is_extended(VK_RETURN));
    }
}
