//! Application configuration for GuideVault.
//!
//! User config lives at `~/.guidevault/guidevault.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{GuideVaultError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "guidevault.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".guidevault";

// ---------------------------------------------------------------------------
// Config structs (matching guidevault.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store (table/database) settings.
    #[serde(default)]
    pub stores: StoresConfig,

    /// Fixed-offset timezone used for record creation timestamps.
    #[serde(default)]
    pub timezone: TimezoneConfig,

    /// Provider API endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Question-name → replacement-label overrides applied during extraction.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

/// `[stores]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    /// Path to the local database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Name of the question lookup table.
    #[serde(default = "default_questions_table")]
    pub questions_table: String,

    /// Name of the answer record table.
    #[serde(default = "default_records_table")]
    pub records_table: String,

    /// Key attribute name under which the origin session id is stored.
    #[serde(default = "default_record_key_attr")]
    pub record_key_attr: String,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            questions_table: default_questions_table(),
            records_table: default_records_table(),
            record_key_attr: default_record_key_attr(),
        }
    }
}

fn default_db_path() -> String {
    "~/.guidevault/guidevault.db".into()
}
fn default_questions_table() -> String {
    "questions".into()
}
fn default_records_table() -> String {
    "answer_records".into()
}
fn default_record_key_attr() -> String {
    "OriginSessionId".into()
}

/// `[timezone]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    /// Fixed UTC offset in whole hours (e.g. -5).
    #[serde(default = "default_tz_offset")]
    pub offset_hours: i32,

    /// Label appended to formatted timestamps (e.g. "EST").
    #[serde(default = "default_tz_label")]
    pub label: String,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            offset_hours: default_tz_offset(),
            label: default_tz_label(),
        }
    }
}

fn default_tz_offset() -> i32 {
    -5
}
fn default_tz_label() -> String {
    "EST".into()
}

impl TimezoneConfig {
    /// Resolve the configured offset into a `chrono::FixedOffset`.
    pub fn fixed_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.offset_hours * 3600).ok_or_else(|| {
            GuideVaultError::config(format!(
                "timezone offset out of range: {} hours",
                self.offset_hours
            ))
        })
    }
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Base URL of the session metadata / agent directory API.
    #[serde(default = "default_session_api")]
    pub session_api_url: String,

    /// Base URL of the template store API.
    #[serde(default = "default_template_api")]
    pub template_api_url: String,

    /// Base URL of the campaign API.
    #[serde(default = "default_campaign_api")]
    pub campaign_api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            session_api_url: default_session_api(),
            template_api_url: default_template_api(),
            campaign_api_url: default_campaign_api(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_session_api() -> String {
    "http://localhost:8080".into()
}
fn default_template_api() -> String {
    "http://localhost:8080".into()
}
fn default_campaign_api() -> String {
    "http://localhost:8080".into()
}
fn default_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.guidevault/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GuideVaultError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.guidevault/guidevault.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| GuideVaultError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GuideVaultError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GuideVaultError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GuideVaultError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GuideVaultError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~` in a configured path to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("questions_table"));
        assert!(toml_str.contains("offset_hours"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.timezone.offset_hours, -5);
        assert_eq!(parsed.stores.questions_table, "questions");
        assert_eq!(parsed.providers.timeout_secs, 10);
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[timezone]
offset_hours = -6
label = "CST"

[overrides]
WelcomeGuide_Q4 = "Custom label here"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.timezone.label, "CST");
        assert_eq!(
            config.overrides.get("WelcomeGuide_Q4").map(String::as_str),
            Some("Custom label here")
        );
    }

    #[test]
    fn fixed_offset_resolution() {
        let tz = TimezoneConfig {
            offset_hours: -5,
            label: "EST".into(),
        };
        let offset = tz.fixed_offset().expect("valid offset");
        assert_eq!(offset.local_minus_utc(), -5 * 3600);

        let bad = TimezoneConfig {
            offset_hours: 99,
            label: "??".into(),
        };
        assert!(bad.fixed_offset().is_err());
    }

    #[test]
    fn expand_home_passthrough() {
        assert_eq!(expand_home("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
    }
}
