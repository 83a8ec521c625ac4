//! The fixed set of physical controls on a TourBox and their wire codes.
//!
//! # How the device identifies a control (for beginners)
//!
//! Every event the TourBox sends is a single byte.  The low seven bits
//! (`byte & 0x7F`) identify *which* control fired; the high bit carries the
//! press/release flag (or, for rotary controls, the tick direction, see
//! [`crate::protocol::decoder`]).  The codes are fixed by the hardware:
//!
//! | Control        | Code   | Kind   |
//! |----------------|--------|--------|
//! | `tall`         | `0x00` | button |
//! | `side`         | `0x01` | button |
//! | `top`          | `0x02` | button |
//! | `short`        | `0x03` | button |
//! | `knob_ccw`     | `0x04` | rotary |
//! | `scroll_down`  | `0x09` | rotary |
//! | `scroll_click` | `0x0a` | button |
//! | `dial_ccw`     | `0x0f` | rotary |
//! | `dpad_up`      | `0x10` | button |
//! | `dpad_down`    | `0x11` | button |
//! | `dpad_left`    | `0x12` | button |
//! | `dpad_right`   | `0x13` | button |
//! | `c1`           | `0x22` | button |
//! | `c2`           | `0x23` | button |
//! | `tour`         | `0x2a` | button |
//! | `knob_click`   | `0x37` | button |
//! | `dial_click`   | `0x38` | button |
//! | `knob_cw`      | `0x44` | rotary |
//! | `scroll_up`    | `0x49` | rotary |
//! | `dial_cw`      | `0x4f` | rotary |
//!
//! Rotary controls come in opposite-direction pairs (`scroll_up` /
//! `scroll_down`, `knob_cw` / `knob_ccw`, `dial_cw` / `dial_ccw`).  Each
//! direction is its own control with its own profile mapping; there is no
//! shared "scroll" control carrying a signed delta.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mask selecting the control code bits of a wire byte.
pub const CODE_MASK: u8 = 0x7F;

/// The high bit of a wire byte: release for buttons, alternate direction for
/// rotary controls.
pub const FLAG_BIT: u8 = 0x80;

/// Identity of one physical control on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    Side,
    Top,
    Tall,
    Short,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    C1,
    C2,
    ScrollUp,
    ScrollDown,
    ScrollClick,
    KnobCw,
    KnobCcw,
    KnobClick,
    DialCw,
    DialCcw,
    DialClick,
    Tour,
}

/// Returned when a profile names a control that does not exist on the device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown control name: \"{0}\"")]
pub struct UnknownControl(pub String);

impl ControlId {
    /// Every control, in the order profiles and mapping tables list them.
    pub const ALL: [ControlId; 20] = [
        ControlId::Side,
        ControlId::Top,
        ControlId::Tall,
        ControlId::Short,
        ControlId::DpadUp,
        ControlId::DpadDown,
        ControlId::DpadLeft,
        ControlId::DpadRight,
        ControlId::C1,
        ControlId::C2,
        ControlId::ScrollUp,
        ControlId::ScrollDown,
        ControlId::ScrollClick,
        ControlId::KnobCw,
        ControlId::KnobCcw,
        ControlId::KnobClick,
        ControlId::DialCw,
        ControlId::DialCcw,
        ControlId::DialClick,
        ControlId::Tour,
    ];

    /// The 7-bit wire code for this control (press / primary-direction form).
    pub const fn code(self) -> u8 {
        match self {
            ControlId::Tall => 0x00,
            ControlId::Side => 0x01,
            ControlId::Top => 0x02,
            ControlId::Short => 0x03,
            ControlId::KnobCcw => 0x04,
            ControlId::ScrollDown => 0x09,
            ControlId::ScrollClick => 0x0a,
            ControlId::DialCcw => 0x0f,
            ControlId::DpadUp => 0x10,
            ControlId::DpadDown => 0x11,
            ControlId::DpadLeft => 0x12,
            ControlId::DpadRight => 0x13,
            ControlId::C1 => 0x22,
            ControlId::C2 => 0x23,
            ControlId::Tour => 0x2a,
            ControlId::KnobClick => 0x37,
            ControlId::DialClick => 0x38,
            ControlId::KnobCw => 0x44,
            ControlId::ScrollUp => 0x49,
            ControlId::DialCw => 0x4f,
        }
    }

    /// The name used for this control in profile files.
    pub const fn name(self) -> &'static str {
        match self {
            ControlId::Side => "side",
            ControlId::Top => "top",
            ControlId::Tall => "tall",
            ControlId::Short => "short",
            ControlId::DpadUp => "dpad_up",
            ControlId::DpadDown => "dpad_down",
            ControlId::DpadLeft => "dpad_left",
            ControlId::DpadRight => "dpad_right",
            ControlId::C1 => "c1",
            ControlId::C2 => "c2",
            ControlId::ScrollUp => "scroll_up",
            ControlId::ScrollDown => "scroll_down",
            ControlId::ScrollClick => "scroll_click",
            ControlId::KnobCw => "knob_cw",
            ControlId::KnobCcw => "knob_ccw",
            ControlId::KnobClick => "knob_click",
            ControlId::DialCw => "dial_cw",
            ControlId::DialCcw => "dial_ccw",
            ControlId::DialClick => "dial_click",
            ControlId::Tour => "tour",
        }
    }

    /// Looks up a control by its 7-bit wire code.
    ///
    /// Returns `None` for codes the hardware table does not define.
    pub fn from_code(code: u8) -> Option<ControlId> {
        let code = code & CODE_MASK;
        ControlId::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// `true` for scroll wheel, knob, and dial directions.
    pub const fn is_rotary(self) -> bool {
        self.opposite().is_some()
    }

    /// The opposite-direction partner of a rotary control.
    ///
    /// Returns `None` for stateful buttons.
    pub const fn opposite(self) -> Option<ControlId> {
        match self {
            ControlId::ScrollUp => Some(ControlId::ScrollDown),
            ControlId::ScrollDown => Some(ControlId::ScrollUp),
            ControlId::KnobCw => Some(ControlId::KnobCcw),
            ControlId::KnobCcw => Some(ControlId::KnobCw),
            ControlId::DialCw => Some(ControlId::DialCcw),
            ControlId::DialCcw => Some(ControlId::DialCw),
            _ => None,
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlId {
    type Err = UnknownControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ControlId::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownControl(s.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
