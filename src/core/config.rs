//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.corpus/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub demo_mode: Option<bool>,
    pub semester: Option<u8>,
    pub subject_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DemoConfig {
    pub token_delay_ms: Option<u64>,
    pub user: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = crate::rag::providers::live::DEFAULT_BASE_URL;
pub const DEFAULT_TOKEN_DELAY_MS: u64 = 40;
/// Upper bound on the simulated per-token delay.
pub const MAX_TOKEN_DELAY_MS: u64 = 500;
pub const DEFAULT_DEMO_USER: &str = "hod@bca.edu";
pub const SEMESTERS: std::ops::RangeInclusive<u8> = 1..=6;

// ============================================================================
// Resolved Config (concrete values where a default exists)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub demo_mode: bool,
    pub semester: Option<u8>,
    pub subject_id: Option<String>,
    pub token_delay: Duration,
    pub demo_user: String,
}

/// Values given on the command line (None / false = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub demo: bool,
    pub url: Option<String>,
    pub semester: Option<u8>,
    pub subject: Option<String>,
    pub demo_user: Option<String>,
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

/// Returns the path to `~/.corpus/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".corpus").join("config.toml"))
}

/// Load config from `~/.corpus/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `CorpusConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<CorpusConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(CorpusConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<CorpusConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(CorpusConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CorpusConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Corpus Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [service]
# base_url = "http://localhost:8000/api/v1"   # Or set CORPUS_URL
# access_token = "eyJ..."                      # Or set CORPUS_ACCESS_TOKEN

# [general]
# demo_mode = false                            # Or CORPUS_DEMO=1, or --demo
# semester = 4                                 # 1-6; --semester
# subject_id = "12"                            # --subject

# [demo]
# token_delay_ms = 40                         # at most 500
# user = "student@bca.edu"                     # hod@, faculty@ or student@bca.edu
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &CorpusConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_from(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
pub fn resolve_from(
    config: &CorpusConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .url
        .clone()
        .or_else(|| env("CORPUS_URL"))
        .or_else(|| config.service.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Token: env → config
    let access_token = env("CORPUS_ACCESS_TOKEN")
        .or_else(|| config.service.access_token.clone())
        .filter(|t| !t.trim().is_empty());

    // Demo mode: --demo → env → config → off
    let demo_mode = cli.demo
        || env("CORPUS_DEMO")
            .map(|v| is_truthy(&v))
            .or(config.general.demo_mode)
            .unwrap_or(false);

    let semester = cli
        .semester
        .or(config.general.semester)
        .filter(|s| {
            let valid = SEMESTERS.contains(s);
            if !valid {
                warn!("Ignoring semester {s}: expected 1-6");
            }
            valid
        });

    let subject_id = cli
        .subject
        .clone()
        .or_else(|| config.general.subject_id.clone())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut token_delay_ms = config.demo.token_delay_ms.unwrap_or(DEFAULT_TOKEN_DELAY_MS);
    if token_delay_ms > MAX_TOKEN_DELAY_MS {
        warn!("Clamping token_delay_ms {token_delay_ms} to {MAX_TOKEN_DELAY_MS}");
        token_delay_ms = MAX_TOKEN_DELAY_MS;
    }

    let demo_user = cli
        .demo_user
        .clone()
        .or_else(|| config.demo.user.clone())
        .unwrap_or_else(|| DEFAULT_DEMO_USER.to_string());

    ResolvedConfig {
        base_url,
        access_token,
        demo_mode,
        semester,
        subject_id,
        token_delay: Duration::from_millis(token_delay_ms),
        demo_user,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
