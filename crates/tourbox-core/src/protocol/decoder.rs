//! Byte-to-event decoding for the TourBox serial stream.
//!
//! Wire format (one byte per event):
//! ```text
//!   bit 7      bits 6..0
//! [ flag ][ control code ]
//! ```
//!
//! - For **stateful controls** (buttons and clicks) the flag is the
//!   press/release bit: `0` = press, `1` = release.
//! - For **rotary controls** every byte is a complete, self-contained tick.
//!   A clear flag is a primary tick of the control named by the code; a set
//!   flag is an alternate tick, which belongs to the opposite-direction
//!   control.  `0x49` is therefore a `scroll_up` tick and `0xc9` a
//!   `scroll_down` tick, never a "release" of `scroll_up`.
//!
//! Decoding is a table lookup with no timing, debouncing, or deduplication:
//! one byte always yields exactly one [`Decoded`] value.

use std::fmt;

use super::controls::{ControlId, CODE_MASK, FLAG_BIT};

/// Which half of the rotary code space a tick came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickDirection {
    /// Flag bit clear: the control named by the code itself.
    Primary,
    /// Flag bit set: the opposite-direction partner of the coded control.
    Alternate,
}

/// What happened to a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Press,
    Release,
    RotaryTick(TickDirection),
}

/// One decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonEvent {
    pub control: ControlId,
    pub kind: EventKind,
}

impl ButtonEvent {
    pub fn press(control: ControlId) -> Self {
        Self { control, kind: EventKind::Press }
    }

    pub fn release(control: ControlId) -> Self {
        Self { control, kind: EventKind::Release }
    }

    pub fn tick(control: ControlId, direction: TickDirection) -> Self {
        Self { control, kind: EventKind::RotaryTick(direction) }
    }

    /// Re-encodes the event as the byte the device would send.
    ///
    /// Used by the monitor output and by tests that script a device.
    pub fn to_byte(&self) -> u8 {
        match self.kind {
            EventKind::Press | EventKind::RotaryTick(TickDirection::Primary) => self.control.code(),
            EventKind::Release => self.control.code() | FLAG_BIT,
            EventKind::RotaryTick(TickDirection::Alternate) => {
                // The alternate byte carries the partner's code.
                let coded = self.control.opposite().unwrap_or(self.control);
                coded.code() | FLAG_BIT
            }
        }
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Press => write!(f, "{} press", self.control),
            EventKind::Release => write!(f, "{} release", self.control),
            EventKind::RotaryTick(TickDirection::Primary) => write!(f, "{} tick", self.control),
            EventKind::RotaryTick(TickDirection::Alternate) => {
                write!(f, "{} tick (alternate)", self.control)
            }
        }
    }
}

/// Result of decoding one wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoded {
    Event(ButtonEvent),
    /// The control code is not in the hardware table.
    Unknown(u8),
}

/// Stateless byte decoder backed by a 128-entry control table.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    table: [Option<ControlId>; 128],
}

impl EventDecoder {
    /// Builds the decoder from the fixed hardware table in [`ControlId`].
    pub fn new() -> Self {
        let mut table = [None; 128];
        for control in ControlId::ALL {
            table[control.code() as usize] = Some(control);
        }
        Self { table }
    }

    /// Decodes a single byte.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tourbox_core::protocol::{ButtonEvent, ControlId, Decoded, EventDecoder};
    ///
    /// let decoder = EventDecoder::new();
    /// assert_eq!(decoder.decode(0x01), Decoded::Event(ButtonEvent::press(ControlId::Side)));
    /// assert_eq!(decoder.decode(0x81), Decoded::Event(ButtonEvent::release(ControlId::Side)));
    /// assert_eq!(decoder.decode(0x05), Decoded::Unknown(0x05));
    /// ```
    pub fn decode(&self, byte: u8) -> Decoded {
        let flagged = byte & FLAG_BIT != 0;
        let Some(coded) = self.table[(byte & CODE_MASK) as usize] else {
            return Decoded::Unknown(byte);
        };

        let event = match (coded.opposite(), flagged) {
            (None, false) => ButtonEvent::press(coded),
            (None, true) => ButtonEvent::release(coded),
            (Some(_), false) => ButtonEvent::tick(coded, TickDirection::Primary),
            (Some(partner), true) => ButtonEvent::tick(partner, TickDirection::Alternate),
        };
        Decoded::Event(event)
    }
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_button_press_and_release() {
        // Arrange
        let decoder = EventDecoder::new();

        // Act / Assert
        assert_eq!(decoder.decode(0x00), Decoded::Event(ButtonEvent::press(ControlId::Tall)));
        assert_eq!(decoder.decode(0x80), Decoded::Event(ButtonEvent::release(ControlId::Tall)));
        assert_eq!(decoder.decode(0x2a), Decoded::Event(ButtonEvent::press(ControlId::Tour)));
    }

    #[test]
    fn test_decode_primary_rotary_tick() {
        let decoder = EventDecoder::new();
        assert_eq!(
            decoder.decode(0x49),
            Decoded::Event(ButtonEvent::tick(ControlId::ScrollUp, TickDirection::Primary))
        );
        assert_eq!(
            decoder.decode(0x44),
            Decoded::Event(ButtonEvent::tick(ControlId::KnobCw, TickDirection::Primary))
        );
    }

    #[test]
    fn test_decode_alternate_tick_belongs_to_partner_control() {
        let decoder = EventDecoder::new();
        assert_eq!(
            decoder.decode(0xc9),
            Decoded::Event(ButtonEvent::tick(ControlId::ScrollDown, TickDirection::Alternate))
        );
        assert_eq!(
            decoder.decode(0x89),
            Decoded::Event(ButtonEvent::tick(ControlId::ScrollUp, TickDirection::Alternate))
        );
        assert_eq!(
            decoder.decode(0xcf),
            Decoded::Event(ButtonEvent::tick(ControlId::DialCcw, TickDirection::Alternate))
        );
    }

    #[test]
    fn test_decode_unknown_keeps_raw_byte() {
        let decoder = EventDecoder::new();
        assert_eq!(decoder.decode(0x7e), Decoded::Unknown(0x7e));
        assert_eq!(decoder.decode(0xfe), Decoded::Unknown(0xfe));
    }

    #[test]
    fn test_duplicate_bytes_decode_identically() {
        let decoder = EventDecoder::new();
        assert_eq!(decoder.decode(0x01), decoder.decode(0x01));
    }

    #[test]
    fn test_to_byte_inverts_decode_for_every_known_byte() {
        let decoder = EventDecoder::new();
        for byte in 0..=u8::MAX {
            if let Decoded::Event(event) = decoder.decode(byte) {
                assert_eq!(event.to_byte(), byte, "event {event} did not re-encode");
            }
        }
    }

    #[test]
    fn test_display_is_human_readable() {
        assert_eq!(ButtonEvent::press(ControlId::C1).to_string(), "c1 press");
        assert_eq!(
            ButtonEvent::tick(ControlId::KnobCcw, TickDirection::Alternate).to_string(),
            "knob_ccw tick (alternate)"
        );
    }
}
