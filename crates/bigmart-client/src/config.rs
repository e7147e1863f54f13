//! # Client Configuration
//!
//! Where the hosted services live, plus a few client-side switches.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BIGMART_DATABASE_URL=https://bigmart.example.firebaseio.com        │
//! │     BIGMART_EXPAND_BULK_SALES=true                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/bigmart-pos/client.toml (Linux)                          │
//! │     ~/Library/Application Support/com.bigmart.pos/client.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     No backend endpoints, bulk sales not expanded, filter "info"       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [backend]
//! database_url = "https://bigmart-pos-default-rtdb.firebaseio.com"
//! auth_domain = "bigmart-pos.firebaseapp.com"
//! api_key = "..."
//! project_id = "bigmart-pos"
//!
//! [dashboard]
//! expand_bulk_sales = false
//!
//! [logging]
//! filter = "info,bigmart=debug"
//! ```

use std::path::PathBuf;

use bigmart_core::dashboard::DashboardOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Backend Settings
// =============================================================================

/// Endpoints of the hosted store and auth service.
///
/// Every field is optional: the in-process adapters need none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Realtime store root URL.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub auth_domain: Option<String>,

    /// Public web API key of the project. Not a secret, but kept out of
    /// logs anyway.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,
}

impl BackendSettings {
    /// True when enough is configured to reach a hosted backend.
    pub fn is_configured(&self) -> bool {
        self.database_url.is_some() && self.api_key.is_some()
    }
}

// =============================================================================
// Dashboard Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Count bulk-sale lines in the sales charts.
    #[serde(default)]
    pub expand_bulk_sales: bool,
}

impl DashboardSettings {
    pub fn options(&self) -> DashboardOptions {
        DashboardOptions {
            expand_bulk_sales: self.expand_bulk_sales,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    crate::telemetry::DEFAULT_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Client Config
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(ref url) = self.backend.database_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ClientError::Config(format!(
                    "database_url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        for (name, value) in [
            ("auth_domain", &self.backend.auth_domain),
            ("api_key", &self.backend.api_key),
            ("project_id", &self.backend.project_id),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ClientError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ClientError::Config("logging.filter must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BIGMART_DATABASE_URL") {
            debug!(url = %url, "Overriding database URL from environment");
            self.backend.database_url = Some(url);
        }

        if let Ok(domain) = std::env::var("BIGMART_AUTH_DOMAIN") {
            self.backend.auth_domain = Some(domain);
        }

        if let Ok(key) = std::env::var("BIGMART_API_KEY") {
            debug!("Overriding API key from environment");
            self.backend.api_key = Some(key);
        }

        if let Ok(project) = std::env::var("BIGMART_PROJECT_ID") {
            self.backend.project_id = Some(project);
        }

        if let Ok(expand) = std::env::var("BIGMART_EXPAND_BULK_SALES") {
            match expand.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.dashboard.expand_bulk_sales = true,
                "0" | "false" | "no" | "off" => self.dashboard.expand_bulk_sales = false,
                _ => warn!(value = %expand, "Unknown BIGMART_EXPAND_BULK_SALES value"),
            }
        }

        if let Ok(filter) = std::env::var("BIGMART_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bigmart", "pos")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        self.dashboard.options()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("bigmart-config-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(!config.backend.is_configured());
        assert!(!config.dashboard.expand_bulk_sales);
        assert_eq!(config.logging.filter, "info,bigmart=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.backend.database_url = Some("ftp://nope".to_string());
        assert!(config.validate().is_err());

        config.backend.database_url = Some("https://bigmart.example.com".to_string());
        assert!(config.validate().is_ok());

        config.backend.api_key = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.backend.api_key = Some("key".to_string());
        assert!(config.backend.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections() {
        let config: ClientConfig = toml::from_str(
            r#"
            [backend]
            database_url = "https://bigmart.example.com"
            project_id = "bigmart"

            [dashboard]
            expand_bulk_sales = true
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.project_id.as_deref(), Some("bigmart"));
        assert!(config.dashboard_options().expand_bulk_sales);
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_path("client.toml");
        let mut config = ClientConfig::default();
        config.backend.database_url = Some("https://bigmart.example.com".to_string());
        config.dashboard.expand_bulk_sales = true;

        config.save(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[backend]"));
        assert!(contents.contains("[dashboard]"));

        let parsed: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(parsed, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let path = temp_path("broken.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[backend\nnot toml").unwrap();

        let config = ClientConfig::load_or_default(Some(path.clone()));
        assert_eq!(config.logging.filter, LoggingSettings::default().filter);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
