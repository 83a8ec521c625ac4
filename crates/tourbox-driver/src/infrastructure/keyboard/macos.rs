//! macOS keystroke synthesis via CoreGraphics.
//!
//! # What is CoreGraphics event injection? (for beginners)
//!
//! `CGEventPost` injects a synthesized event into the HID event stream, the
//! same level as a physical keyboard.  A key press is:
//!
//! 1. `CGEventSource::new(HIDSystemState)`: an event source that mimics
//!    hardware state.
//! 2. `CGEvent::new_keyboard_event(source, keycode, key_down)`.
//! 3. `event.post(CGEventTapLocation::HID)`.
//!
//! Posting a modifier key-down does not by itself make later events carry
//! the modifier, so the backend tracks which modifiers are held and stamps
//! their flags on every event it posts.
//!
//! # Characters
//!
//! `CGKeyCode`s name physical ANSI key positions.  Characters on the ANSI
//! layout are pressed by position (adding the Shift flag when needed); any
//! other character in `type:` text is posted as a Unicode string attached to
//! a keyboard event.
//!
//! # Accessibility permission
//!
//! Posting at the HID tap requires the **Accessibility** permission (System
//! Settings → Privacy & Security → Accessibility).  Without it the events are
//! silently dropped.

use std::sync::Mutex;

use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

use tourbox_core::keymap::macos::{char_position, key_position, KeyPosition};
use tourbox_core::keymap::ModifierKind;
use tourbox_core::{KeyToken, NamedKey};

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

/// CoreGraphics keyboard backend.
pub struct CoreGraphicsKeyboard {
    /// Flags of the modifiers currently held down by this backend.
    held: Mutex<CGEventFlags>,
}

impl CoreGraphicsKeyboard {
    /// Checks that an event source can be created.
    pub fn new() -> Result<Self, SynthesisError> {
        source()?;
        Ok(Self { held: Mutex::new(CGEventFlags::CGEventFlagNull) })
    }

    fn held_flags(&self) -> Result<CGEventFlags, SynthesisError> {
        self.held
            .lock()
            .map(|flags| *flags)
            .map_err(|_| SynthesisError::Platform("modifier state lock poisoned".to_string()))
    }

    fn update_held(&self, flag: CGEventFlags, down: bool) -> Result<(), SynthesisError> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| SynthesisError::Platform("modifier state lock poisoned".to_string()))?;
        if down {
            held.insert(flag);
        } else {
            held.remove(flag);
        }
        Ok(())
    }

    fn send_key(&self, key: KeyToken, down: bool) -> Result<(), SynthesisError> {
        let position = key_position(key).ok_or(SynthesisError::Unmappable(key))?;
        if let KeyToken::Modifier(m) = key {
            self.update_held(modifier_flag(m.kind), down)?;
        }
        post(position, down, self.held_flags()?)
    }
}

fn source() -> Result<CGEventSource, SynthesisError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| SynthesisError::Unavailable("cannot create CGEventSource".to_string()))
}

fn modifier_flag(kind: ModifierKind) -> CGEventFlags {
    match kind {
        ModifierKind::Cmd => CGEventFlags::CGEventFlagCommand,
        ModifierKind::Ctrl => CGEventFlags::CGEventFlagControl,
        ModifierKind::Alt => CGEventFlags::CGEventFlagAlternate,
        ModifierKind::Shift => CGEventFlags::CGEventFlagShift,
    }
}

fn keyboard_event(keycode: CGKeyCode, down: bool) -> Result<CGEvent, SynthesisError> {
    CGEvent::new_keyboard_event(source()?, keycode, down)
        .map_err(|_| SynthesisError::Platform(format!("cannot create key event for keycode {keycode}")))
}

fn post(position: KeyPosition, down: bool, held: CGEventFlags) -> Result<(), SynthesisError> {
    let mut flags = held;
    if position.needs_shift {
        flags.insert(CGEventFlags::CGEventFlagShift);
    }
    let event = keyboard_event(position.keycode, down)?;
    event.set_flags(flags);
    event.post(CGEventTapLocation::HID);
    Ok(())
}

/// Posts `c` as a Unicode string attached to a key-down/key-up pair.
fn post_unicode(c: char) -> Result<(), SynthesisError> {
    let text = c.to_string();
    for down in [true, false] {
        let event = keyboard_event(0, down)?;
        event.set_string(&text);
        event.post(CGEventTapLocation::HID);
    }
    Ok(())
}

impl PlatformKeyboard for CoreGraphicsKeyboard {
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.send_key(key, true)
    }

    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.send_key(key, false)
    }

    fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
        let held = self.held_flags()?;
        for c in text.chars() {
            let position = match c {
                '\n' | '\r' => key_position(NamedKey::Enter.into()),
                '\t' => key_position(NamedKey::Tab.into()),
                _ => char_position(c),
            };
            match position {
                Some(position) => {
                    post(position, true, held)?;
                    post(position, false, held)?;
                }
                None => post_unicode(c)?,
            }
        }
        Ok(())
    }
}
