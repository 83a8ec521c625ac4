//! TourBox driver entry point.
//!
//! Wires together configuration, the active profile, the keystroke backend,
//! the shell launcher, and the serial transport, then runs the driver loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load AppConfig (TOML) + CLI overrides
//!  └─ ProfileSlot::new()          -- active profile (watch channel)
//!  └─ Ctrl-C / SIGHUP tasks       -- shutdown flag / profile reload
//!  └─ spawn_blocking(DriverLoop::run)
//!       └─ SerialConnector        -- discover, open, unlock, reconnect
//!       └─ decode → resolve → ActionExecutor
//! ```
//!
//! # Why `spawn_blocking`? (for beginners)
//!
//! Serial reads and keystroke synthesis block the calling thread.  Running
//! them on a Tokio worker would stall the runtime, so the loop gets its own
//! blocking thread while the async side only waits for signals.
//!
//! # Log level
//!
//! `RUST_LOG` wins when set.  Otherwise `--verbose` selects `debug`, and
//! without it the config file's `log_level` applies (default `info`).

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tourbox_core::domain::Binding;
use tourbox_core::{ActionResolver, Profile};
use tourbox_driver::application::driver_loop::{Backoff, DispatchMode, DriverLoop};
use tourbox_driver::application::execute_actions::{ActionExecutor, PlatformKeyboard};
use tourbox_driver::application::reload::{load_startup_profile, ProfileSlot};
use tourbox_driver::infrastructure::{
    keyboard::{logging::LoggingKeyboard, platform_keyboard},
    shell::SystemShell,
    storage::config::{load_config, load_config_from, AppConfig, ConfigError},
    transport::serial::{list_candidate_ports, select_port, SerialConnector},
};

// ── Command-line interface ────────────────────────────────────────────────────

/// Command-line arguments for the driver.
#[derive(Debug, Parser)]
#[command(
    name = "tourbox-driver",
    about = "Maps TourBox controls to keyboard shortcuts, text, and shell commands",
    version
)]
struct Cli {
    /// Configuration file.  Defaults to the platform config directory.
    #[arg(long, global = true, env = "TOURBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port of the device (skips auto-detection).
    #[arg(short = 'p', long, global = true, env = "TOURBOX_PORT")]
    port: Option<String>,

    /// Profile JSON file.  Without one the built-in profile is used.
    #[arg(short = 'f', long, global = true, env = "TOURBOX_PROFILE")]
    profile: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the driver (the default).
    Run {
        /// Log the keystrokes instead of synthesizing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print every decoded event and what it would do, without acting.
    Monitor,
    /// List serial ports; the one auto-detection would pick is starred.
    Ports,
    /// Inspect the active profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum ProfileCommand {
    /// Print the mapping table.
    Show,
    /// Write the active profile as JSON.
    Export { path: PathBuf },
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if let Some(profile) = &self.profile {
            config.driver.profile = Some(profile.clone());
        }
    }
}

/// Level used when `RUST_LOG` is not set.
fn default_level(verbose: bool, configured: &str) -> &str {
    if verbose {
        "debug"
    } else {
        configured
    }
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config_from(path),
        None => match load_config() {
            Err(ConfigError::NoPlatformConfigDir) => Ok(AppConfig::default()),
            other => other,
        },
    }
}

/// Renders the mapping table printed at startup and by `profile show`.
fn mapping_table(profile: &Profile) -> String {
    let mut out = format!("Profile: {}\n", profile.name());
    if let Some(description) = profile.description() {
        out.push_str(&format!("  {description}\n"));
    }
    if !profile.target_apps().is_empty() {
        out.push_str(&format!("  apps: {}\n", profile.target_apps().join(", ")));
    }
    for (control, entry) in profile.entries() {
        let action = match &entry.binding {
            Binding::Disabled => "(disabled)".to_string(),
            Binding::Actions(sequence) => sequence.to_string(),
        };
        let line = format!(
            "  {:<14} {:<28} {}",
            control.name(),
            action,
            entry.description.as_deref().unwrap_or("")
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_app_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);

    // Initialise structured logging.
    let fallback = default_level(cli.verbose, &config.driver.log_level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(&fallback).unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .init();

    match cli.command.clone().unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => run_driver(config, DispatchMode::Execute, dry_run).await,
        Command::Monitor => run_driver(config, DispatchMode::Monitor, true).await,
        Command::Ports => list_ports(&config),
        Command::Profile(ProfileCommand::Show) => {
            let profile = load_startup_profile(config.driver.profile.as_deref());
            print!("{}", mapping_table(&profile));
            Ok(())
        }
        Command::Profile(ProfileCommand::Export { path }) => {
            let profile = load_startup_profile(config.driver.profile.as_deref());
            profile
                .save_to_file(&path)
                .with_context(|| format!("exporting profile to {}", path.display()))?;
            info!(path = %path.display(), profile = profile.name(), "profile exported");
            Ok(())
        }
    }
}

async fn run_driver(config: AppConfig, mode: DispatchMode, dry_run: bool) -> anyhow::Result<()> {
    info!("TourBox driver starting");

    // ── Active profile ────────────────────────────────────────────────────────
    let profile = load_startup_profile(config.driver.profile.as_deref());
    for line in mapping_table(&profile).lines() {
        info!("{line}");
    }
    let slot = Arc::new(ProfileSlot::new(profile, config.driver.profile.clone()));

    // ── Action executor ───────────────────────────────────────────────────────
    let keyboard: Arc<dyn PlatformKeyboard> = if dry_run {
        Arc::new(LoggingKeyboard::new())
    } else {
        platform_keyboard().context("starting keystroke synthesis")?
    };
    let executor = ActionExecutor::new(keyboard, Arc::new(SystemShell::new()));

    // ── Shutdown flag ─────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    #[cfg(unix)]
    spawn_reload_on_hangup(Arc::clone(&slot))?;

    // ── Driver loop ───────────────────────────────────────────────────────────
    let mut driver = DriverLoop::new(
        SerialConnector::new(config.serial.clone()),
        ActionResolver::new(config.driver.alternate_ticks),
        executor,
        slot.subscribe(),
        Arc::clone(&running),
        Backoff::new(config.reconnect.initial_delay(), config.reconnect.max_delay()),
    )
    .with_mode(mode);

    let stats = tokio::task::spawn_blocking(move || driver.run())
        .await
        .context("driver loop panicked")?;

    info!("TourBox driver stopped ({stats})");
    Ok(())
}

/// Reloads the profile file whenever the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_hangup(slot: Arc<ProfileSlot>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    use tourbox_driver::application::reload::ReloadError;
    use tracing::warn;

    let mut hangups = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            info!("SIGHUP received, reloading profile");
            // Parse failures are logged by the slot; the old profile stays.
            if let Err(ReloadError::NoSource) = slot.reload() {
                warn!("{}", ReloadError::NoSource);
            }
        }
    });
    Ok(())
}

fn list_ports(config: &AppConfig) -> anyhow::Result<()> {
    let ports = list_candidate_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    let chosen = select_port(&ports, &config.serial.port_patterns);
    for port in &ports {
        let marker = if chosen.as_ref() == Some(port) { "*" } else { " " };
        println!("{marker} {port}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tourbox_core::{default_profile, AlternateTickPolicy, ControlId};

    #[test]
    fn test_no_subcommand_means_run() {
        // Arrange / Act
        let cli = Cli::parse_from(["tourbox-driver"]);

        // Assert
        assert_eq!(cli.command, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_run_dry_run_flag() {
        let cli = Cli::parse_from(["tourbox-driver", "run", "--dry-run"]);
        assert_eq!(cli.command, Some(Command::Run { dry_run: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tourbox-driver", "monitor", "-p", "/dev/ttyACM3", "-v"]);
        assert_eq!(cli.command, Some(Command::Monitor));
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyACM3"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_profile_export_takes_path() {
        let cli = Cli::parse_from(["tourbox-driver", "profile", "export", "out.json"]);
        assert_eq!(
            cli.command,
            Some(Command::Profile(ProfileCommand::Export { path: PathBuf::from("out.json") }))
        );
    }

    #[test]
    fn test_overrides_replace_config_values() {
        // Arrange
        let cli = Cli::parse_from(["tourbox-driver", "--port", "COM4", "--profile", "dev.json"]);
        let mut config = AppConfig::default();
        config.driver.alternate_ticks = AlternateTickPolicy::Ignore;

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.serial.port.as_deref(), Some("COM4"));
        assert_eq!(config.driver.profile, Some(PathBuf::from("dev.json")));
        assert_eq!(config.driver.alternate_ticks, AlternateTickPolicy::Ignore);
    }

    #[test]
    fn test_verbose_selects_debug_level() {
        assert_eq!(default_level(true, "warn"), "debug");
        assert_eq!(default_level(false, "warn"), "warn");
    }

    #[test]
    fn test_missing_config_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_mapping_table_lists_every_control() {
        let profile = default_profile();
        let table = mapping_table(&profile);

        assert!(table.starts_with("Profile: Default Universal\n"));
        for control in ControlId::ALL {
            assert!(table.contains(&format!("  {:<14} ", control.name())), "{control} missing");
        }
    }

    #[test]
    fn test_mapping_table_marks_disabled_controls() {
        let profile = Profile::from_json(r#"{"name":"X","mappings":{"tour":{"action":"none"}}}"#).unwrap();
        assert!(mapping_table(&profile).contains(&format!("{:<14} (disabled)", "tour")));
    }
}
