//! Linux X11 keystroke synthesis via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! events as if the user had pressed physical keys.  The events go to the
//! focused window exactly like real input.
//!
//! `XTestFakeKeyEvent` takes an X11 *keycode* (a server-specific key
//! position), not a KeySym, so every key goes through:
//! ```text
//! KeyToken → X11 KeySym → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! A character whose KeySym only appears on the shifted level of its key
//! (`'A'`, `'!'`) is produced by holding Shift around the key.
//!
//! # Characters outside the keymap
//!
//! `type:` text may contain characters the server's keyboard map does not
//! have (`é` or `ñ` on a US layout).  For those the backend borrows an
//! unused keycode: it binds the KeySym to it with `XChangeKeyboardMapping`,
//! taps it, and unbinds it again.  The whole string is planned before the
//! first key goes out, so a character that cannot be typed at all fails
//! the action without leaving half the text behind.
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`.  When the
//! display cannot be opened the backend fails at construction time.

use std::ptr;
use std::sync::Mutex;

use tracing::debug;
use x11::xlib;
use x11::xtest;

use tourbox_core::keymap::x11::{char_keysym, keysym};
use tourbox_core::KeyToken;

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

/// `CurrentTime`: let the server timestamp the synthesized event.
const CURRENT_TIME: xlib::Time = 0;

/// `XK_Shift_L`.
const XK_SHIFT_L: u32 = 0xFFE1;

/// `NoSymbol`.
const NO_SYMBOL: xlib::KeySym = 0;

/// Raw display connection.
struct DisplayHandle(*mut xlib::Display);

// SAFETY: the pointer is only dereferenced by Xlib while the owning `Mutex`
// is held, so calls from different threads never overlap.
unsafe impl Send for DisplayHandle {}

/// XTest keyboard backend.
pub struct XTestKeyboard {
    display: Mutex<DisplayHandle>,
}

/// A keycode plus whether Shift must be held to get the wanted KeySym.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyStroke {
    keycode: u32,
    shifted: bool,
}

impl XTestKeyboard {
    /// Opens the display named by `DISPLAY`.
    pub fn open() -> Result<Self, SynthesisError> {
        // SAFETY: a null name selects the DISPLAY environment variable.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(SynthesisError::Unavailable(
                "cannot open X display (is DISPLAY set?)".to_string(),
            ));
        }
        debug!("X display opened for XTest");
        Ok(Self { display: Mutex::new(DisplayHandle(display)) })
    }

    fn with_display<T>(
        &self,
        f: impl FnOnce(*mut xlib::Display) -> Result<T, SynthesisError>,
    ) -> Result<T, SynthesisError> {
        let guard = self
            .display
            .lock()
            .map_err(|_| SynthesisError::Platform("X display lock poisoned".to_string()))?;
        let result = f(guard.0);
        // SAFETY: the display is open for the lifetime of `self`.
        unsafe { xlib::XFlush(guard.0) };
        result
    }
}

/// Finds the key that produces `sym` and whether it sits on the shifted level.
fn stroke_for(display: *mut xlib::Display, sym: u32) -> Option<KeyStroke> {
    // SAFETY: `display` is a live connection held under the backend's lock.
    let keycode = unsafe { xlib::XKeysymToKeycode(display, sym as xlib::KeySym) };
    if keycode == 0 {
        return None;
    }
    // SAFETY: as above; index 0 is the unshifted level.
    #[allow(deprecated)]
    let base = unsafe { xlib::XKeycodeToKeysym(display, keycode, 0) } as u32;
    Some(KeyStroke { keycode: keycode as u32, shifted: base != sym })
}

fn fake_key(display: *mut xlib::Display, keycode: u32, down: bool) -> Result<(), SynthesisError> {
    // SAFETY: `display` is a live connection held under the backend's lock.
    let ok = unsafe { xtest::XTestFakeKeyEvent(display, keycode, down as i32, CURRENT_TIME) };
    if ok == 0 {
        return Err(SynthesisError::Platform(format!("XTestFakeKeyEvent failed for keycode {keycode}")));
    }
    Ok(())
}

fn shift_keycode(display: *mut xlib::Display) -> Result<u32, SynthesisError> {
    stroke_for(display, XK_SHIFT_L)
        .map(|s| s.keycode)
        .ok_or_else(|| SynthesisError::Platform("no Shift key in the X keymap".to_string()))
}

/// Presses (or releases) a stroke, holding Shift around it when needed.
fn send_stroke(display: *mut xlib::Display, stroke: KeyStroke, down: bool) -> Result<(), SynthesisError> {
    if !stroke.shifted {
        return fake_key(display, stroke.keycode, down);
    }
    let shift = shift_keycode(display)?;
    if down {
        fake_key(display, shift, true)?;
        fake_key(display, stroke.keycode, true)
    } else {
        fake_key(display, stroke.keycode, false)?;
        fake_key(display, shift, false)
    }
}

fn resolve(display: *mut xlib::Display, key: KeyToken) -> Result<KeyStroke, SynthesisError> {
    let sym = keysym(key).ok_or(SynthesisError::Unmappable(key))?;
    let mut stroke = stroke_for(display, sym).ok_or(SynthesisError::Unmappable(key))?;
    // Named keys and modifiers never need Shift, whatever level they sit on.
    if !matches!(key, KeyToken::Char(_)) {
        stroke.shifted = false;
    }
    Ok(stroke)
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// How one character of `type:` text is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharStroke {
    /// A key already in the server's map.
    Mapped(KeyStroke),
    /// A KeySym the map lacks; bound to a spare keycode while it is typed.
    Borrowed(u32),
}

/// Works out every character before anything is typed.
fn plan_text(
    text: &str,
    lookup: impl Fn(u32) -> Option<KeyStroke>,
) -> Result<Vec<CharStroke>, SynthesisError> {
    text.chars()
        .map(|c| {
            let sym = char_keysym(c).ok_or(SynthesisError::Unmappable(KeyToken::Char(c)))?;
            Ok(lookup(sym).map_or(CharStroke::Borrowed(sym), CharStroke::Mapped))
        })
        .collect()
}

/// The highest keycode with no KeySym on any level.
///
/// `map` is the `XGetKeyboardMapping` table starting at `min_keycode`, with
/// `per_keycode` entries per keycode.
fn find_spare_keycode(min_keycode: u32, per_keycode: usize, map: &[xlib::KeySym]) -> Option<u32> {
    if per_keycode == 0 {
        return None;
    }
    map.chunks(per_keycode)
        .enumerate()
        .rev()
        .find(|(_, syms)| syms.iter().all(|sym| *sym == NO_SYMBOL))
        .map(|(offset, _)| min_keycode + offset as u32)
}

fn spare_keycode(display: *mut xlib::Display) -> Result<u32, SynthesisError> {
    let (mut min, mut max) = (0, 0);
    // SAFETY: `display` is a live connection held under the backend's lock.
    unsafe { xlib::XDisplayKeycodes(display, &mut min, &mut max) };
    let count = max - min + 1;
    if count <= 0 {
        return Err(SynthesisError::Platform("X server reports no keycodes".to_string()));
    }

    let mut per_keycode = 0;
    // SAFETY: as above; the range comes straight from XDisplayKeycodes.
    let raw = unsafe {
        xlib::XGetKeyboardMapping(display, min as xlib::KeyCode, count, &mut per_keycode)
    };
    if raw.is_null() {
        return Err(SynthesisError::Platform("cannot read the X keyboard mapping".to_string()));
    }
    // SAFETY: Xlib returns `count * per_keycode` KeySyms, freed below.
    let map = unsafe { std::slice::from_raw_parts(raw, (count * per_keycode) as usize) };
    let spare = find_spare_keycode(min as u32, per_keycode as usize, map);
    // SAFETY: `raw` was allocated by Xlib and `map` is not used after this.
    unsafe { xlib::XFree(raw.cast()) };

    spare.ok_or_else(|| SynthesisError::Platform("no spare keycode for text outside the keymap".to_string()))
}

fn bind_keycode(display: *mut xlib::Display, keycode: u32, sym: xlib::KeySym) {
    let mut syms = [sym; 2];
    // SAFETY: `display` is live; `syms` holds one keycode's worth of levels.
    unsafe {
        xlib::XChangeKeyboardMapping(display, keycode as i32, syms.len() as i32, syms.as_mut_ptr(), 1);
        xlib::XSync(display, xlib::False);
    }
}

/// Types a KeySym through a temporarily bound spare keycode.
fn tap_borrowed(display: *mut xlib::Display, keycode: u32, sym: u32) -> Result<(), SynthesisError> {
    bind_keycode(display, keycode, sym as xlib::KeySym);
    let tapped = fake_key(display, keycode, true).and_then(|()| fake_key(display, keycode, false));
    // SAFETY: `display` is live; the tap must reach the server before unbinding.
    unsafe { xlib::XSync(display, xlib::False) };
    bind_keycode(display, keycode, NO_SYMBOL);
    tapped
}

impl PlatformKeyboard for XTestKeyboard {
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.with_display(|display| {
            let stroke = resolve(display, key)?;
            send_stroke(display, stroke, true)
        })
    }

    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.with_display(|display| {
            let stroke = resolve(display, key)?;
            send_stroke(display, stroke, false)
        })
    }

    fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
        self.with_display(|display| {
            let plan = plan_text(text, |sym| stroke_for(display, sym))?;
            let spare = if plan.iter().any(|s| matches!(s, CharStroke::Borrowed(_))) {
                Some(spare_keycode(display)?)
            } else {
                None
            };
            for stroke in plan {
                match stroke {
                    CharStroke::Mapped(stroke) => {
                        send_stroke(display, stroke, true)?;
                        send_stroke(display, stroke, false)?;
                    }
                    CharStroke::Borrowed(sym) => {
                        let keycode = spare.ok_or_else(|| {
                            SynthesisError::Platform("no spare keycode reserved".to_string())
                        })?;
                        tap_borrowed(display, keycode, sym)?;
                    }
                }
            }
            Ok(())
        })
    }
}

impl Drop for XTestKeyboard {
    fn drop(&mut self) {
        if let Ok(handle) = self.display.get_mut() {
            // SAFETY: the display was opened in `open` and is closed once.
            unsafe { xlib::XCloseDisplay(handle.0) };
        }
    }
}
