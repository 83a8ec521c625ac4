//! The built-in "Default Universal" profile.
//!
//! Used when no profile file is configured, or when the configured file
//! cannot be loaded at startup.  Shortcuts use the platform's primary
//! modifier: `cmd` on macOS, `ctrl` everywhere else.

use std::collections::BTreeMap;

use super::profile::{MappingDocument, Profile, ProfileDocument, RawAction};

pub const DEFAULT_PROFILE_NAME: &str = "Default Universal";

/// The modifier most application shortcuts are built on.
pub fn primary_modifier() -> &'static str {
    if cfg!(target_os = "macos") {
        "cmd"
    } else {
        "ctrl"
    }
}

/// (control, action, description); `{m}` is replaced by the primary modifier.
const DEFAULT_MAPPINGS: &[(&str, &str, &str)] = &[
    ("side", "{m}+c", "Copy"),
    ("top", "{m}+v", "Paste"),
    ("tall", "{m}+z", "Undo"),
    ("short", "{m}+shift+z", "Redo"),
    ("dpad_up", "up", "Up"),
    ("dpad_down", "down", "Down"),
    ("dpad_left", "left", "Left"),
    ("dpad_right", "right", "Right"),
    ("c1", "{m}+s", "Save"),
    ("c2", "{m}+w", "Close Tab"),
    ("scroll_up", "{m}+shift+]", "Next Tab"),
    ("scroll_down", "{m}+shift+[", "Prev Tab"),
    ("scroll_click", "{m}+t", "New Tab"),
    ("knob_cw", "{m}+=", "Zoom In"),
    ("knob_ccw", "{m}+-", "Zoom Out"),
    ("knob_click", "{m}+0", "Reset Zoom"),
    ("dial_cw", "page_down", "Page Down"),
    ("dial_ccw", "page_up", "Page Up"),
    ("dial_click", "home", "Home"),
    ("tour", "{m}+space", "Launcher"),
];

/// The document form of the default profile, for export.
pub fn default_profile_document() -> ProfileDocument {
    let modifier = primary_modifier();
    let mappings: BTreeMap<String, MappingDocument> = DEFAULT_MAPPINGS
        .iter()
        .map(|(control, action, description)| {
            let doc = MappingDocument {
                action: RawAction::One(action.replace("{m}", modifier)),
                description: Some((*description).to_string()),
            };
            ((*control).to_string(), doc)
        })
        .collect();

    ProfileDocument {
        name: DEFAULT_PROFILE_NAME.to_string(),
        description: Some("Universal shortcuts for developer workflow".to_string()),
        version: None,
        target_apps: None,
        mappings,
    }
}

pub fn default_profile() -> Profile {
    Profile::from_document(default_profile_document())
}
