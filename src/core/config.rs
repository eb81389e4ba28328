//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.rulebox/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::Level;
use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::core::state::DEFAULT_QUIT_KEY;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RuleboxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    /// What loading had to say. Never read from the file.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub tick_interval_ms: Option<u64>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub quit_key: Option<char>,
    pub event_buffer: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AudioConfig {
    pub enabled: Option<bool>,
    pub asset: Option<String>,
    pub required: Option<bool>,
}

/// A message raised while loading or resolving config.
///
/// Config is settled before the file logger exists, so messages are
/// collected here and replayed once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_EVENT_BUFFER: usize = 10;
pub const DEFAULT_AUDIO_ASSET: &str = "cat.mp3";
pub const DEFAULT_LOG_FILE: &str = "rulebox.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub tick_interval: Duration,
    pub event_buffer: usize,
    pub quit_key: char,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub audio_enabled: bool,
    pub audio_asset: PathBuf,
    pub audio_required: bool,
    /// Everything loading and resolving reported, in order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedConfig {
    /// Emit the collected diagnostics through `log`. Call once the logger is
    /// installed.
    pub fn replay_diagnostics(&self) {
        for d in &self.diagnostics {
            log::log!(d.level, "{}", d.message);
        }
    }
}

/// Values taken from command-line flags. `None` / `false` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub tick_ms: Option<u64>,
    pub audio_asset: Option<String>,
    pub mute: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.rulebox/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".rulebox").join("config.toml"))
}

/// Load config from `explicit`, or from `~/.rulebox/config.toml` when `None`.
///
/// A missing default file is generated (commented out) and yields
/// `RuleboxConfig::default()`. A missing explicit file is an I/O error.
/// A malformed file returns `ConfigError::Parse`.
pub fn load_config(explicit: Option<&Path>) -> Result<RuleboxConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                let mut config = RuleboxConfig::default();
                config.diagnostics.push(Diagnostic::new(
                    Level::Warn,
                    "Could not determine home directory, using default config",
                ));
                return Ok(config);
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        let mut config = RuleboxConfig::default();
        config.diagnostics.push(Diagnostic::new(
            Level::Info,
            format!("No config file found, generating default at {}", path.display()),
        ));
        generate_default_config(&path, &mut config.diagnostics);
        return Ok(config);
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&contents)?;
    let dump = format!("Config: {:?}", config);
    config.diagnostics.push(Diagnostic::new(
        Level::Info,
        format!("Loaded config from {}", path.display()),
    ));
    config.diagnostics.push(Diagnostic::new(Level::Debug, dump));
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<RuleboxConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let default_content = r#"# Rulebox Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# tick_interval_ms = 100             # Or RULEBOX_TICK_MS, or --tick-ms
# log_file = "rulebox.log"           # Or RULEBOX_LOG_FILE
# log_level = "debug"                # "off", "error", "warn", "info", "debug", "trace"

# [input]
# quit_key = "q"
# event_buffer = 10

# [audio]
# enabled = true                     # --mute turns it off for one run
# asset = "cat.mp3"                  # Or RULEBOX_AUDIO_ASSET, or --audio
# required = false                   # true: a broken asset aborts startup
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            diagnostics.push(Diagnostic::new(
                Level::Warn,
                format!("Failed to create config directory: {e}"),
            ));
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        diagnostics.push(Diagnostic::new(
            Level::Warn,
            format!("Failed to write default config: {e}"),
        ));
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &RuleboxConfig, cli: &CliOverrides) -> ResolvedConfig {
    let mut diagnostics = config.diagnostics.clone();

    // Tick: CLI → env → config → default
    let tick_ms = cli
        .tick_ms
        .or_else(|| env_parse("RULEBOX_TICK_MS", &mut diagnostics))
        .or(config.general.tick_interval_ms)
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
    let tick_ms = if tick_ms == 0 {
        diagnostics.push(Diagnostic::new(
            Level::Warn,
            "tick interval of 0ms is not usable, using 1ms",
        ));
        1
    } else {
        tick_ms
    };

    let event_buffer = match config.input.event_buffer {
        Some(0) => {
            diagnostics.push(Diagnostic::new(
                Level::Warn,
                "event_buffer of 0 is not usable, using 1",
            ));
            1
        }
        Some(n) => n,
        None => DEFAULT_EVENT_BUFFER,
    };

    // Log file: env → config → default
    let log_file = std::env::var("RULEBOX_LOG_FILE")
        .ok()
        .or_else(|| config.general.log_file.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    // Log level: env → config → default, unknown names fall back
    let log_level = std::env::var("RULEBOX_LOG_LEVEL")
        .ok()
        .or_else(|| config.general.log_level.clone())
        .map(|name| {
            LevelFilter::from_str(&name).unwrap_or_else(|_| {
                diagnostics.push(Diagnostic::new(
                    Level::Warn,
                    format!("Unknown log level '{name}', using {DEFAULT_LOG_LEVEL}"),
                ));
                DEFAULT_LOG_LEVEL
            })
        })
        .unwrap_or(DEFAULT_LOG_LEVEL);

    // Audio asset: CLI → env → config → default
    let audio_asset = cli
        .audio_asset
        .clone()
        .or_else(|| std::env::var("RULEBOX_AUDIO_ASSET").ok())
        .or_else(|| config.audio.asset.clone())
        .unwrap_or_else(|| DEFAULT_AUDIO_ASSET.to_string());

    ResolvedConfig {
        tick_interval: Duration::from_millis(tick_ms),
        event_buffer,
        quit_key: config.input.quit_key.unwrap_or(DEFAULT_QUIT_KEY),
        log_file: PathBuf::from(log_file),
        log_level,
        audio_enabled: !cli.mute && config.audio.enabled.unwrap_or(true),
        audio_asset: PathBuf::from(audio_asset),
        audio_required: config.audio.required.unwrap_or(false),
        diagnostics,
    }
}

fn env_parse<T: FromStr>(name: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            diagnostics.push(Diagnostic::new(
                Level::Warn,
                format!("Ignoring {name}={raw:?}: not a valid value"),
            ));
            None
        }
    }
}
