//! Application configuration for CourseTrack.
//!
//! User config lives at `~/.coursetrack/coursetrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseTrackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursetrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursetrack";

// ---------------------------------------------------------------------------
// Config structs (matching coursetrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Backend service settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Social-sharing profile.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Calendar title used when none is given on the command line.
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            calendar_name: default_calendar_name(),
        }
    }
}

fn default_calendar_name() -> String {
    "Course Assignments".into()
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the extraction/generation backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds for backend calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask the server to regenerate study plans even when its cache holds
    /// one. The client-side cache still skips already-generated courses.
    #[serde(default)]
    pub force_regenerate: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            force_regenerate: false,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".into()
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[profile]` section — opt-in identity for social matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Social handle published against uploaded document fingerprints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,

    /// Avatar URL shown to matched users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursetrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseTrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.coursetrack/coursetrack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseTrackError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseTrackError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseTrackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseTrackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseTrackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that a social handle is configured, returning it.
pub fn require_handle(config: &AppConfig) -> Result<String> {
    match config.profile.handle.as_deref() {
        Some(h) if !h.trim().is_empty() => Ok(h.to_string()),
        _ => Err(CourseTrackError::config(
            "no social handle configured. Set [profile] handle in coursetrack.toml \
             or pass --handle.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("Course Assignments"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.backend.timeout_secs, 60);
        assert_eq!(parsed.backend.base_url, "http://localhost:5000");
        assert!(!parsed.backend.force_regenerate);
    }

    #[test]
    fn config_with_profile() {
        let toml_str = r#"
[backend]
base_url = "https://coursetrack.example.com"
force_regenerate = true

[profile]
handle = "ada"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.backend.base_url, "https://coursetrack.example.com");
        assert!(config.backend.force_regenerate);
        assert_eq!(config.profile.handle.as_deref(), Some("ada"));
        assert!(config.profile.avatar_url.is_none());
    }

    #[test]
    fn handle_required_for_matching() {
        let config = AppConfig::default();
        let result = require_handle(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no social handle"));

        let mut config = AppConfig::default();
        config.profile.handle = Some("ada".into());
        assert_eq!(require_handle(&config).unwrap(), "ada");
    }
}
