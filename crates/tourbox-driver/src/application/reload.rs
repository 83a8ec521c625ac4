//! Active-profile slot: one writer, many lock-free readers.
//!
//! The active profile lives in a `tokio::sync::watch` channel of
//! `Arc<Profile>`.  The driver loop holds a receiver and clones the `Arc` at
//! each event boundary, so it always sees a complete profile and never waits
//! on the writer.  A reload builds a brand-new `Profile` first and only
//! publishes it when it parsed successfully; a bad file leaves the previous
//! snapshot in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use tourbox_core::{default_profile, Profile, ProfileError};

/// Error type for profile reloads.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The active profile is the built-in default; there is no file to re-read.
    #[error("no profile file to reload (using the built-in profile)")]
    NoSource,

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Owns the write side of the active-profile channel.
pub struct ProfileSlot {
    tx: watch::Sender<Arc<Profile>>,
    source: Option<PathBuf>,
}

impl ProfileSlot {
    /// Creates a slot holding `initial`.  `source` is the file reloads read.
    pub fn new(initial: Profile, source: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx, source }
    }

    /// A new reader of the active profile.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Profile>> {
        self.tx.subscribe()
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<Profile> {
        Arc::clone(&self.tx.borrow())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Publishes `profile` to every reader.
    pub fn replace(&self, profile: Profile) {
        info!(profile = profile.name(), mappings = profile.len(), "active profile replaced");
        self.tx.send_replace(Arc::new(profile));
    }

    /// Re-reads the source file and publishes it.
    ///
    /// On error the previous profile stays active.
    pub fn reload(&self) -> Result<(), ReloadError> {
        let path = self.source.as_deref().ok_or(ReloadError::NoSource)?;
        match Profile::load_from_file(path) {
            Ok(profile) => {
                self.replace(profile);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), "profile reload failed, keeping \"{}\": {e}", self.current().name());
                Err(e.into())
            }
        }
    }
}

/// Loads the profile used at startup.
///
/// Without a path, or when the file cannot be loaded, the built-in default
/// profile is used so the driver always starts.
pub fn load_startup_profile(path: Option<&Path>) -> Profile {
    let Some(path) = path else {
        info!("no profile configured, using the built-in profile");
        return default_profile();
    };
    match Profile::load_from_file(path) {
        Ok(profile) => {
            info!(path = %path.display(), profile = profile.name(), "profile loaded");
            profile
        }
        Err(e) => {
            warn!("{e}; falling back to the built-in profile");
            default_profile()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use tourbox_core::domain::builtin::DEFAULT_PROFILE_NAME;
    use tourbox_core::ControlId;

    use super::*;

    const EDITOR_PROFILE: &str = r#"{
        "name": "Editor",
        "mappings": { "side": { "action": "cmd+s" } }
    }"#;

    const CLIPBOARD_PROFILE: &str = r#"{
        "name": "Clipboard",
        "mappings": { "side": { "action": "cmd+v" } }
    }"#;

    #[test]
    fn test_reload_replaces_profile_from_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, EDITOR_PROFILE).unwrap();
        let slot = ProfileSlot::new(Profile::load_from_file(&path).unwrap(), Some(path.clone()));
        let rx = slot.subscribe();
        fs::write(&path, CLIPBOARD_PROFILE).unwrap();

        // Act
        slot.reload().unwrap();

        // Assert
        assert_eq!(rx.borrow().name(), "Clipboard");
        assert_eq!(rx.borrow().lookup(ControlId::Side).to_string(), "cmd+v");
    }

    #[test]
    fn test_invalid_reload_keeps_previous_profile() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, EDITOR_PROFILE).unwrap();
        let slot = ProfileSlot::new(Profile::load_from_file(&path).unwrap(), Some(path.clone()));
        fs::write(&path, "{ not json").unwrap();

        // Act
        let result = slot.reload();

        // Assert
        assert!(matches!(result, Err(ReloadError::Profile(ProfileError::Invalid(_)))));
        assert_eq!(slot.current().name(), "Editor");
    }

    #[test]
    fn test_reload_without_source_is_an_error() {
        let slot = ProfileSlot::new(default_profile(), None);
        assert!(matches!(slot.reload(), Err(ReloadError::NoSource)));
        assert_eq!(slot.current().name(), DEFAULT_PROFILE_NAME);
    }

    #[test]
    fn test_startup_profile_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        assert_eq!(load_startup_profile(None).name(), DEFAULT_PROFILE_NAME);
        assert_eq!(load_startup_profile(Some(&missing)).name(), DEFAULT_PROFILE_NAME);
    }

    #[tokio::test]
    async fn test_subscriber_is_notified_of_replacement() {
        // Arrange
        let slot = ProfileSlot::new(default_profile(), None);
        let mut rx = slot.subscribe();

        // Act
        slot.replace(Profile::from_json(CLIPBOARD_PROFILE).unwrap());
        rx.changed().await.unwrap();

        // Assert
        assert_eq!(rx.borrow_and_update().name(), "Clipboard");
    }

    #[test]
    fn test_snapshot_outlives_replacement() {
        // A snapshot taken before a reload keeps resolving against the old
        // profile until it is dropped.
        let slot = ProfileSlot::new(Profile::from_json(EDITOR_PROFILE).unwrap(), None);
        let snapshot = slot.current();

        slot.replace(Profile::from_json(CLIPBOARD_PROFILE).unwrap());

        assert_eq!(snapshot.lookup(ControlId::Side).to_string(), "cmd+s");
        assert_eq!(slot.current().lookup(ControlId::Side).to_string(), "cmd+v");
    }
}
