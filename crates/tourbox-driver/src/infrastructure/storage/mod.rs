//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory and supplies defaults when it does not
//! exist yet (first run).  Profiles are JSON and live in `tourbox_core`.

pub mod config;
