//! Integration tests for the TourBox byte decoder and resolver.
//!
//! These tests sweep the whole byte space through the public API and check
//! every outcome against the hardware table, then drive decoded events
//! through a profile to the action sequences they select.

use tourbox_core::{
    protocol::{CODE_MASK, FLAG_BIT},
    ActionResolver, ActionSpec, AlternateTickPolicy, ButtonEvent, ControlId, Decoded, EventDecoder, EventKind,
    KeyToken, Modifier, NamedKey, Profile, TickDirection,
};

/// The hardware table, restated independently of `ControlId::code`.
const TABLE: &[(u8, ControlId)] = &[
    (0x00, ControlId::Tall),
    (0x01, ControlId::Side),
    (0x02, ControlId::Top),
    (0x03, ControlId::Short),
    (0x04, ControlId::KnobCcw),
    (0x09, ControlId::ScrollDown),
    (0x0a, ControlId::ScrollClick),
    (0x0f, ControlId::DialCcw),
    (0x10, ControlId::DpadUp),
    (0x11, ControlId::DpadDown),
    (0x12, ControlId::DpadLeft),
    (0x13, ControlId::DpadRight),
    (0x22, ControlId::C1),
    (0x23, ControlId::C2),
    (0x2a, ControlId::Tour),
    (0x37, ControlId::KnobClick),
    (0x38, ControlId::DialClick),
    (0x44, ControlId::KnobCw),
    (0x49, ControlId::ScrollUp),
    (0x4f, ControlId::DialCw),
];

fn table_entry(code: u8) -> Option<ControlId> {
    TABLE.iter().find(|(c, _)| *c == code).map(|(_, id)| *id)
}

// ── Decoding ──────────────────────────────────────────────────────────────────

#[test]
fn test_every_byte_decodes_to_exactly_one_matching_outcome() {
    let decoder = EventDecoder::new();

    for byte in 0..=u8::MAX {
        let decoded = decoder.decode(byte);
        let flagged = byte & FLAG_BIT != 0;

        match (table_entry(byte & CODE_MASK), decoded) {
            (None, Decoded::Unknown(raw)) => assert_eq!(raw, byte),
            (None, other) => panic!("byte 0x{byte:02x} should be unknown, got {other:?}"),
            (Some(coded), Decoded::Event(event)) if coded.is_rotary() => {
                if flagged {
                    assert_eq!(event, ButtonEvent::tick(coded.opposite().unwrap(), TickDirection::Alternate));
                } else {
                    assert_eq!(event, ButtonEvent::tick(coded, TickDirection::Primary));
                }
            }
            (Some(coded), Decoded::Event(event)) => {
                let expected = if flagged { ButtonEvent::release(coded) } else { ButtonEvent::press(coded) };
                assert_eq!(event, expected, "byte 0x{byte:02x}");
            }
            (Some(_), Decoded::Unknown(_)) => panic!("byte 0x{byte:02x} is in the table but decoded as unknown"),
        }
    }
}

#[test]
fn test_press_release_round_trip_for_every_stateful_control() {
    let decoder = EventDecoder::new();

    for control in ControlId::ALL.into_iter().filter(|c| !c.is_rotary()) {
        let press = ButtonEvent::press(control);
        let release = ButtonEvent::release(control);

        assert_eq!(decoder.decode(press.to_byte()), Decoded::Event(press));
        assert_eq!(decoder.decode(release.to_byte()), Decoded::Event(release));
        assert_eq!(release.to_byte(), press.to_byte() | FLAG_BIT);
    }
}

#[test]
fn test_rotary_controls_never_produce_press_or_release() {
    let decoder = EventDecoder::new();

    for byte in 0..=u8::MAX {
        if let Decoded::Event(event) = decoder.decode(byte) {
            if event.control.is_rotary() {
                assert!(matches!(event.kind, EventKind::RotaryTick(_)), "byte 0x{byte:02x} -> {event}");
            }
        }
    }
}

#[test]
fn test_exactly_twenty_controls_are_known() {
    let decoder = EventDecoder::new();
    let known = (0..=CODE_MASK).filter(|code| matches!(decoder.decode(*code), Decoded::Event(_))).count();
    assert_eq!(known, TABLE.len());
}

// ── Decode + resolve ──────────────────────────────────────────────────────────

fn profile() -> Profile {
    Profile::from_json(
        r#"{
            "name": "e2e",
            "mappings": {
                "side": { "action": "cmd+c" },
                "scroll_up": { "action": "up" },
                "scroll_down": { "action": "down" },
                "c1": { "action": ["type:/commit", "enter"] }
            }
        }"#,
    )
    .expect("profile must load")
}

fn resolve_byte(byte: u8, policy: AlternateTickPolicy) -> Vec<ActionSpec> {
    let profile = profile();
    let decoded = EventDecoder::new().decode(byte);
    ActionResolver::new(policy)
        .resolve_decoded(&decoded, &profile)
        .steps()
        .iter()
        .map(|step| step.clone().expect("step must parse"))
        .collect()
}

#[test]
fn test_side_press_resolves_to_copy_combo() {
    assert_eq!(
        resolve_byte(0x01, AlternateTickPolicy::Dispatch),
        vec![ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('c'))]
    );
    assert!(resolve_byte(0x81, AlternateTickPolicy::Dispatch).is_empty());
}

#[test]
fn test_scroll_bytes_resolve_through_their_own_controls() {
    assert_eq!(resolve_byte(0x49, AlternateTickPolicy::Dispatch), vec![ActionSpec::combo(&[], NamedKey::Up)]);
    assert_eq!(resolve_byte(0xc9, AlternateTickPolicy::Dispatch), vec![ActionSpec::combo(&[], NamedKey::Down)]);
    assert_eq!(resolve_byte(0x09, AlternateTickPolicy::Dispatch), vec![ActionSpec::combo(&[], NamedKey::Down)]);
    assert!(resolve_byte(0xc9, AlternateTickPolicy::Ignore).is_empty());
}

#[test]
fn test_unmapped_tour_resolves_to_nothing() {
    assert!(resolve_byte(0x2a, AlternateTickPolicy::Dispatch).is_empty());
}

#[test]
fn test_sequence_order_is_preserved() {
    assert_eq!(
        resolve_byte(0x22, AlternateTickPolicy::Dispatch),
        vec![ActionSpec::TypeText("/commit".to_string()), ActionSpec::combo(&[], NamedKey::Enter)]
    );
}
