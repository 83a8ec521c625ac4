//! Domain logic: what the driver does with an event, independent of any OS.
//!
//! # What is "domain" here? (for beginners)
//!
//! Everything in this module is pure data manipulation.  It never opens a
//! serial port, presses a key, or spawns a process, so it can be tested on
//! any machine without a TourBox attached.  The driver crate supplies those
//! effects and calls into this module to decide *which* effects to produce.
//!
//! - [`action`]: the action string grammar and parsed [`ActionSequence`]s.
//! - [`profile`]: JSON profiles and the immutable [`Profile`] lookup table.
//! - [`builtin`]: the profile used when none is configured.
//! - [`resolver`]: event + profile → action sequence.

pub mod action;
pub mod builtin;
pub mod profile;
pub mod resolver;

pub use action::{parse_action, ActionParseError, ActionSequence, ActionSpec, ActionStep, UnresolvedAction};
pub use builtin::{default_profile, DEFAULT_PROFILE_NAME};
pub use profile::{Binding, MappingEntry, Profile, ProfileDocument, ProfileError, RawAction};
pub use resolver::{ActionResolver, AlternateTickPolicy};
