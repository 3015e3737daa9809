//! Reflective access configuration (`xplugin.toml`)
//!
//! ```toml
//! [reflect]
//! hidden_api_release = 28
//! exemption_prefixes = ["L"]
//! webview_fallback_package = "com.google.android.webview"
//! ```
//!
//! Every key is optional; a missing file section yields the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::targets::release;

/// Fallback package of the web-rendering subsystem
pub const DEFAULT_WEBVIEW_PACKAGE: &str = "com.google.android.webview";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    reflect: ReflectConfig,
}

/// Tunables of the reflective-access layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReflectConfig {
    /// First release on which hidden-API relaxation is attempted
    pub hidden_api_release: u32,

    /// Signature prefixes exempted from hidden-API gating
    /// (`"L"` covers every reference type)
    pub exemption_prefixes: Vec<String>,

    /// Package used when the web-rendering package can't be determined
    pub webview_fallback_package: String,
}

impl Default for ReflectConfig {
    fn default() -> Self {
        Self {
            hidden_api_release: release::PIE,
            exemption_prefixes: vec!["L".to_string()],
            webview_fallback_package: DEFAULT_WEBVIEW_PACKAGE.to_string(),
        }
    }
}

impl ReflectConfig {
    /// Parse from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.reflect.validate()?;
        Ok(file.reflect)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Write as a `[reflect]` table to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.validate()?;
        let file = ConfigFile {
            reflect: self.clone(),
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exemption_prefixes.is_empty() {
            return Err(ConfigError::ValidationError(
                "exemption_prefixes must not be empty".to_string(),
            ));
        }
        if self.exemption_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::ValidationError(
                "exemption prefixes must not be empty strings".to_string(),
            ));
        }
        if self.webview_fallback_package.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "webview_fallback_package must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_section_missing() {
        let config = ReflectConfig::from_str("").unwrap();
        assert_eq!(config, ReflectConfig::default());
        assert_eq!(config.hidden_api_release, 28);
        assert_eq!(config.exemption_prefixes, vec!["L".to_string()]);
        assert_eq!(config.webview_fallback_package, DEFAULT_WEBVIEW_PACKAGE);
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
[reflect]
exemption_prefixes = ["Landroid/", "Ldalvik/system/"]
"#;
        let config = ReflectConfig::from_str(toml).unwrap();
        assert_eq!(config.exemption_prefixes.len(), 2);
        assert_eq!(config.hidden_api_release, 28);
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        let toml = r#"
[reflect]
exemption_prefixes = []
"#;
        assert!(matches!(
            ReflectConfig::from_str(toml),
            Err(ConfigError::ValidationError(_))
        ));

        let toml = r#"
[reflect]
webview_fallback_package = " "
"#;
        assert!(matches!(
            ReflectConfig::from_str(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            ReflectConfig::from_str("[reflect]\nhidden_api_release = \"P\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reflect]").unwrap();
        writeln!(file, "webview_fallback_package = \"com.android.webview\"").unwrap();

        let config = ReflectConfig::load(file.path()).unwrap();
        assert_eq!(config.webview_fallback_package, "com.android.webview");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xplugin.toml");
        let config = ReflectConfig {
            hidden_api_release: 30,
            exemption_prefixes: vec!["Landroid/".to_string()],
            ..ReflectConfig::default()
        };

        config.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[reflect]"));
        assert_eq!(ReflectConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xplugin.toml");
        let config = ReflectConfig {
            exemption_prefixes: Vec::new(),
            ..ReflectConfig::default()
        };

        assert!(matches!(config.save(&path), Err(ConfigError::ValidationError(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReflectConfig::load(dir.path().join("xplugin.toml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
