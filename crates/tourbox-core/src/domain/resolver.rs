//! Event-to-action resolution.
//!
//! Resolution is a pure function of the event, the profile snapshot, and the
//! resolver's construction-time policy.  It never fails: anything that should
//! not fire resolves to the empty sequence.
//!
//! | Event                          | Resolves to |
//! |--------------------------------|-------------|
//! | Press of a button              | the button's mapping |
//! | Release of a button            | empty |
//! | Rotary tick                    | the ticking control's own mapping |
//! | Alternate tick with `ignore`   | empty |
//! | Unknown byte                   | empty (logged at warning level) |
//! | Disabled or unmapped control   | empty |

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::action::ActionSequence;
use super::profile::Profile;
use crate::protocol::{ButtonEvent, Decoded, EventKind, TickDirection};

/// What to do with rotary ticks decoded from a byte with the flag bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlternateTickPolicy {
    /// Resolve the tick through its own control like any other tick.
    #[default]
    Dispatch,
    /// Drop it.  For device revisions that send a primary and an alternate
    /// byte for every detent.
    Ignore,
}

impl fmt::Display for AlternateTickPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlternateTickPolicy::Dispatch => f.write_str("dispatch"),
            AlternateTickPolicy::Ignore => f.write_str("ignore"),
        }
    }
}

/// Maps decoded events to the action sequences of a profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionResolver {
    alternate_ticks: AlternateTickPolicy,
}

impl ActionResolver {
    pub fn new(alternate_ticks: AlternateTickPolicy) -> Self {
        Self { alternate_ticks }
    }

    pub fn alternate_ticks(&self) -> AlternateTickPolicy {
        self.alternate_ticks
    }

    /// Resolves one event against `profile`.
    ///
    /// The returned sequence borrows from the profile snapshot, so an
    /// in-flight sequence stays valid even if the driver swaps profiles.
    pub fn resolve<'p>(&self, event: &ButtonEvent, profile: &'p Profile) -> &'p ActionSequence {
        match event.kind {
            EventKind::Release => ActionSequence::empty(),
            EventKind::RotaryTick(TickDirection::Alternate) if self.alternate_ticks == AlternateTickPolicy::Ignore => {
                trace!(%event, "alternate tick ignored");
                ActionSequence::empty()
            }
            EventKind::Press | EventKind::RotaryTick(_) => profile.lookup(event.control),
        }
    }

    /// Like [`resolve`](Self::resolve), but also accepts unknown bytes,
    /// which are reported and resolve to nothing.
    pub fn resolve_decoded<'p>(&self, decoded: &Decoded, profile: &'p Profile) -> &'p ActionSequence {
        match decoded {
            Decoded::Event(event) => self.resolve(event, profile),
            Decoded::Unknown(byte) => {
                warn!("unknown control code 0x{byte:02x}");
                ActionSequence::empty()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ControlId, EventDecoder};
    use serde_json::json;

    fn profile() -> Profile {
        Profile::load(json!({
            "name": "Resolver test",
            "mappings": {
                "side": { "action": "cmd+c" },
                "scroll_up": { "action": "up" },
                "scroll_down": { "action": "down" },
                "c2": { "action": "none" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_press_resolves_to_mapping() {
        // Arrange
        let profile = profile();
        let resolver = ActionResolver::default();

        // Act
        let seq = resolver.resolve(&ButtonEvent::press(ControlId::Side), &profile);

        // Assert
        assert_eq!(seq, profile.lookup(ControlId::Side));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_release_always_resolves_to_empty() {
        let profile = profile();
        let resolver = ActionResolver::default();
        for control in ControlId::ALL.into_iter().filter(|c| !c.is_rotary()) {
            assert!(resolver.resolve(&ButtonEvent::release(control), &profile).is_empty());
        }
    }

    #[test]
    fn test_ticks_resolve_through_their_own_control() {
        let profile = profile();
        let resolver = ActionResolver::default();
        let decoder = EventDecoder::new();

        let up = resolver.resolve_decoded(&decoder.decode(0x49), &profile);
        let down = resolver.resolve_decoded(&decoder.decode(0xc9), &profile);

        assert_eq!(up, profile.lookup(ControlId::ScrollUp));
        assert_eq!(down, profile.lookup(ControlId::ScrollDown));
        assert_ne!(up, down);
    }

    #[test]
    fn test_ignore_policy_drops_alternate_ticks_only() {
        let profile = profile();
        let resolver = ActionResolver::new(AlternateTickPolicy::Ignore);
        let decoder = EventDecoder::new();

        assert!(resolver.resolve_decoded(&decoder.decode(0xc9), &profile).is_empty());
        assert!(!resolver.resolve_decoded(&decoder.decode(0x49), &profile).is_empty());
        assert!(!resolver.resolve_decoded(&decoder.decode(0x09), &profile).is_empty());
    }

    #[test]
    fn test_unknown_and_disabled_resolve_to_empty() {
        let profile = profile();
        let resolver = ActionResolver::default();
        assert!(resolver.resolve_decoded(&Decoded::Unknown(0x7e), &profile).is_empty());
        assert!(resolver.resolve(&ButtonEvent::press(ControlId::C2), &profile).is_empty());
        assert!(resolver.resolve(&ButtonEvent::press(ControlId::Tour), &profile).is_empty());
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Holder {
            policy: AlternateTickPolicy,
        }
        let holder: Holder = serde_json::from_str(r#"{ "policy": "ignore" }"#).unwrap();
        assert_eq!(holder.policy, AlternateTickPolicy::Ignore);
    }
}
