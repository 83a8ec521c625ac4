//! Profiles: the user-editable mapping from controls to action sequences.
//!
//! # On-disk format
//!
//! ```json
//! {
//!   "name": "Developer",
//!   "description": "Shortcuts for coding",
//!   "version": "1.0",
//!   "target_apps": ["Code", "Terminal"],
//!   "mappings": {
//!     "side":  { "action": "cmd+c", "description": "Copy" },
//!     "c1":    { "action": ["type:/commit", "enter"] },
//!     "tour":  { "action": "none" }
//!   }
//! }
//! ```
//!
//! `mappings` is required and every entry for a known control needs an
//! `action` that is either a string or a list of strings.  Everything else
//! is read leniently: unknown fields are ignored, entries for unknown
//! controls are skipped whatever their shape, and metadata of the wrong type
//! is coerced where possible (`"version": 1.0` reads as `"1.0"`) or dropped.
//!
//! # Lifecycle (for beginners)
//!
//! A [`Profile`] is immutable once built.  Reloading never edits the active
//! profile; it builds a brand-new one and the driver swaps the handle it
//! reads from.  This is what lets [`Profile::lookup`] hand out plain
//! references with no locking.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::action::ActionSequence;
use crate::protocol::ControlId;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised while loading or saving a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The data is not a valid profile (bad JSON, no `mappings`, an entry
    /// without a usable `action`).
    #[error("invalid profile: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("cannot read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write profile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Serialized form ───────────────────────────────────────────────────────────

/// The `action` field: one action or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAction {
    One(String),
    Many(Vec<String>),
}

impl RawAction {
    fn as_slice(&self) -> &[String] {
        match self {
            RawAction::One(s) => std::slice::from_ref(s),
            RawAction::Many(list) => list,
        }
    }

    /// `true` for the single string `"none"` in any letter case.
    pub fn is_none(&self) -> bool {
        matches!(self, RawAction::One(s) if s.trim().eq_ignore_ascii_case("none"))
    }
}

/// One entry under `mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    pub action: RawAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A profile exactly as stored in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default = "default_profile_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_apps: Option<Vec<String>>,
    pub mappings: BTreeMap<String, MappingDocument>,
}

fn default_profile_name() -> String {
    "Unnamed".to_string()
}

// ── Lenient reading ───────────────────────────────────────────────────────────

/// The JSON as read from disk, before controls and metadata are checked.
#[derive(Debug, Deserialize)]
struct IncomingProfile {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    target_apps: Option<Value>,
    mappings: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct IncomingMapping {
    action: RawAction,
    #[serde(default)]
    description: Option<Value>,
}

/// Scalar metadata as display text; anything else is dropped.
fn metadata_text(field: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            warn!(field, "ignoring non-text profile metadata: {other}");
            None
        }
    }
}

/// `target_apps` as a list; a lone string counts as a one-app list.
fn metadata_list(value: Option<Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => {
            Some(items.into_iter().filter_map(|item| metadata_text("target_apps", Some(item))).collect())
        }
        Value::Null => None,
        single => metadata_text("target_apps", Some(single)).map(|app| vec![app]),
    }
}

impl IncomingProfile {
    /// Keeps entries for known controls, which must carry a valid `action`.
    fn into_document(self) -> Result<ProfileDocument, ProfileError> {
        let name = metadata_text("name", self.name).unwrap_or_else(default_profile_name);
        let mut mappings = BTreeMap::new();
        for (control_name, entry) in self.mappings {
            if let Err(e) = control_name.parse::<ControlId>() {
                warn!(profile = %name, "skipping mapping: {e}");
                continue;
            }
            let entry: IncomingMapping = serde_json::from_value(entry)?;
            let doc = MappingDocument {
                action: entry.action,
                description: metadata_text("description", entry.description),
            };
            mappings.insert(control_name, doc);
        }
        Ok(ProfileDocument {
            name,
            description: metadata_text("description", self.description),
            version: metadata_text("version", self.version),
            target_apps: metadata_list(self.target_apps),
            mappings,
        })
    }
}

// ── Runtime form ──────────────────────────────────────────────────────────────

/// What a mapped control does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Explicitly switched off with `"none"`.
    Disabled,
    Actions(ActionSequence),
}

/// A loaded mapping entry.  The raw action is kept for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub binding: Binding,
    pub raw: RawAction,
    pub description: Option<String>,
}

impl MappingEntry {
    fn from_document(doc: MappingDocument) -> Self {
        let binding = if doc.action.is_none() {
            Binding::Disabled
        } else {
            Binding::Actions(ActionSequence::parse(doc.action.as_slice()))
        };
        Self { binding, raw: doc.action, description: doc.description }
    }

    pub fn sequence(&self) -> &ActionSequence {
        match &self.binding {
            Binding::Disabled => ActionSequence::empty(),
            Binding::Actions(seq) => seq,
        }
    }
}

/// An immutable, fully parsed profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    description: Option<String>,
    version: Option<String>,
    target_apps: Option<Vec<String>>,
    mappings: BTreeMap<ControlId, MappingEntry>,
}

impl Profile {
    /// Builds a profile from already-deserialized JSON data.
    ///
    /// # Errors
    ///
    /// [`ProfileError::Invalid`] when the data does not have the profile
    /// shape.  Malformed action strings and unknown control names are *not*
    /// errors: the former become unresolved steps, the latter are skipped
    /// with a warning.
    pub fn load(data: Value) -> Result<Self, ProfileError> {
        let incoming: IncomingProfile = serde_json::from_value(data)?;
        Ok(Self::from_document(incoming.into_document()?))
    }

    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let incoming: IncomingProfile = serde_json::from_str(json)?;
        Ok(Self::from_document(incoming.into_document()?))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ProfileError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ProfileError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&text)
    }

    pub fn from_document(doc: ProfileDocument) -> Self {
        let mut mappings = BTreeMap::new();
        for (control_name, entry) in doc.mappings {
            match control_name.parse::<ControlId>() {
                Ok(control) => {
                    let entry = MappingEntry::from_document(entry);
                    for unresolved in entry.sequence().unresolved() {
                        warn!(%control, "{unresolved}");
                    }
                    mappings.insert(control, entry);
                }
                Err(e) => warn!(profile = %doc.name, "skipping mapping: {e}"),
            }
        }
        Self {
            name: doc.name,
            description: doc.description,
            version: doc.version,
            target_apps: doc.target_apps,
            mappings,
        }
    }

    /// Converts back to the serialized form.  Entries for unknown controls
    /// were dropped at load time and are not reproduced.
    pub fn to_document(&self) -> ProfileDocument {
        ProfileDocument {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            target_apps: self.target_apps.clone(),
            mappings: self
                .mappings
                .iter()
                .map(|(control, entry)| {
                    let doc = MappingDocument { action: entry.raw.clone(), description: entry.description.clone() };
                    (control.name().to_string(), doc)
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ProfileError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|source| ProfileError::Write { path: path.to_path_buf(), source })
    }

    /// The action sequence bound to `control`.
    ///
    /// Unmapped and disabled controls yield the empty sequence.  Never fails,
    /// and the same control always yields the same sequence.
    pub fn lookup(&self, control: ControlId) -> &ActionSequence {
        self.mappings.get(&control).map_or(ActionSequence::empty(), MappingEntry::sequence)
    }

    pub fn is_disabled(&self, control: ControlId) -> bool {
        matches!(self.mappings.get(&control), Some(MappingEntry { binding: Binding::Disabled, .. }))
    }

    pub fn entry(&self, control: ControlId) -> Option<&MappingEntry> {
        self.mappings.get(&control)
    }

    /// Mapped controls in hardware-table order.
    pub fn entries(&self) -> impl Iterator<Item = (ControlId, &MappingEntry)> {
        self.mappings.iter().map(|(control, entry)| (*control, entry))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn target_apps(&self) -> &[String] {
        self.target_apps.as_deref().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
