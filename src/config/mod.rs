use crate::error::{Result, SilError};
use crate::logs::DisplayZone;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings loaded from an optional configuration file.
///
/// Command-line flags take precedence over every value here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Service instance logs endpoint, used when none is given on the command line
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Skip verification of the logs endpoint certificate. Not recommended!
    #[serde(default)]
    pub skip_ssl_validation: bool,

    /// Zone log timestamps are shown in: `local`, `utc`, a name such as
    /// `Europe/London` or an offset like `+05:30`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Default diagnostic log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions for serde
fn default_timezone() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            skip_ssl_validation: false,
            timezone: default_timezone(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Settings> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SilError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let settings = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(SilError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Parse TOML settings
    pub fn parse_toml(contents: &str) -> Result<Settings> {
        toml::from_str(contents)
            .map_err(|e| SilError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    /// Parse JSON settings
    pub fn parse_json(contents: &str) -> Result<Settings> {
        serde_json::from_str(contents)
            .map_err(|e| SilError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if endpoint.trim().is_empty() {
                return Err(SilError::ConfigError(
                    "endpoint cannot be empty".to_string(),
                ));
            }
        }

        self.display_zone()?;

        if self.log_level.trim().is_empty() {
            return Err(SilError::ConfigError(
                "log_level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured display zone
    pub fn display_zone(&self) -> Result<DisplayZone> {
        DisplayZone::parse(&self.timezone)
    }
}
