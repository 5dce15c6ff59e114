// Keytrap Settings Module
// Engine tuning loaded from TOML: sequence timeout and host platform

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default inactivity window between sequence steps.
pub const DEFAULT_SEQUENCE_TIMEOUT_MS: u64 = 1000;

const MAX_SEQUENCE_TIMEOUT_MS: u64 = 60_000;

/// Host platform, used once at parse time to resolve the `mod` alias
/// (meta on mac hosts, ctrl elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    /// Detect the platform from the build target.
    pub fn detect() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    pub fn is_mac(self) -> bool {
        matches!(self, Platform::Mac)
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("sequence timeout out of range (1..={MAX_SEQUENCE_TIMEOUT_MS} ms): {0}")]
    TimeoutOutOfRange(u64),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    timeouts: Option<TimeoutsToml>,

    #[serde(default)]
    host: Option<HostToml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TimeoutsToml {
    #[serde(default)]
    sequence: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HostToml {
    #[serde(default)]
    platform: Option<Platform>,
}

/// Engine-level settings.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Inactivity window between sequence steps before progress resets.
    pub sequence_timeout: Duration,

    /// Host platform for alias resolution.
    pub platform: Platform,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sequence_timeout: Duration::from_millis(DEFAULT_SEQUENCE_TIMEOUT_MS),
            platform: Platform::detect(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::default();

        if let Some(timeouts) = parsed.timeouts {
            if let Some(ms) = timeouts.sequence {
                if ms == 0 || ms > MAX_SEQUENCE_TIMEOUT_MS {
                    return Err(SettingsError::TimeoutOutOfRange(ms));
                }
                settings.sequence_timeout = Duration::from_millis(ms);
            }
        }

        if let Some(host) = parsed.host {
            if let Some(platform) = host.platform {
                settings.platform = platform;
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = EngineSettings::default();
        assert_eq!(settings.sequence_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
[timeouts]
sequence = 1500

[host]
platform = "mac"
"#;
        let settings = EngineSettings::from_toml(toml).unwrap();
        assert_eq!(settings.sequence_timeout, Duration::from_millis(1500));
        assert_eq!(settings.platform, Platform::Mac);
    }

    #[test]
    fn test_settings_empty_toml_uses_defaults() {
        let settings = EngineSettings::from_toml("").unwrap();
        assert_eq!(settings.sequence_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_settings_timeout_out_of_range() {
        assert!(matches!(
            EngineSettings::from_toml("[timeouts]\nsequence = 0"),
            Err(SettingsError::TimeoutOutOfRange(0))
        ));
        assert!(matches!(
            EngineSettings::from_toml("[timeouts]\nsequence = 600000"),
            Err(SettingsError::TimeoutOutOfRange(600000))
        ));
    }

    #[test]
    fn test_settings_invalid_platform() {
        assert!(matches!(
            EngineSettings::from_toml("[host]\nplatform = \"amiga\""),
            Err(SettingsError::TomlParse(_))
        ));
    }
}
