use std::path::PathBuf;
use std::time::Duration;

use reaper_core::{ControllerConfig, Credential, NamingConvention};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub databricks: DatabricksSettings,
    #[serde(default)]
    pub protection: ProtectionSettings,
    #[serde(default)]
    pub state: StateSettings,
    #[serde(default)]
    pub naming: NamingSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.naming.catalog_prefix.is_empty() || self.naming.warehouse_prefix.is_empty() {
            return Err("naming prefixes must not be empty".into());
        }
        if self.databricks.request_timeout_secs == Some(0) {
            return Err("databricks.request_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    /// Flags and their env fallbacks win over file and `REAPER__*` values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.databricks.host = Some(host.clone());
        }
        if let Some(token) = &cli.token {
            self.databricks.token = Some(token.clone());
        }
        if let Some(secs) = cli.timeout_secs {
            self.databricks.request_timeout_secs = Some(secs);
        }
        if let Some(path) = &cli.state_file {
            self.state.path = Some(path.clone());
        }
    }

    pub fn controller_config(&self) -> anyhow::Result<ControllerConfig> {
        let host = self
            .databricks
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No Databricks host configured. Use --host, set DATABRICKS_HOST, or set databricks.host in the config file"
                )
            })?;
        let token = self
            .databricks
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No Databricks token configured. Use --token, set DATABRICKS_TOKEN, or set databricks.token in the config file"
                )
            })?;

        let mut cfg = ControllerConfig::new(host, Credential::new(token));
        // Built-in names always stay protected; the file can only add to them.
        cfg.protected_names
            .extend(self.protection.catalogs.iter().cloned());
        cfg.naming = NamingConvention {
            catalog_prefix: self.naming.catalog_prefix.clone(),
            warehouse_prefix: self.naming.warehouse_prefix.clone(),
            catalog_kind: self.naming.catalog_kind.clone(),
            warehouse_kind: self.naming.warehouse_kind.clone(),
        };
        cfg.state_path = self.state.path.clone();
        cfg.request_timeout = self
            .databricks
            .request_timeout_secs
            .map(Duration::from_secs);
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabricksSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProtectionSettings {
    /// Catalog names never deleted, on top of
    /// [`reaper_core::DEFAULT_PROTECTED_CATALOGS`]
    #[serde(default)]
    pub catalogs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingSettings {
    #[serde(default = "default_catalog_prefix")]
    pub catalog_prefix: String,
    #[serde(default = "default_warehouse_prefix")]
    pub warehouse_prefix: String,
    #[serde(default = "default_catalog_kind")]
    pub catalog_kind: String,
    #[serde(default = "default_warehouse_kind")]
    pub warehouse_kind: String,
}
fn default_catalog_prefix() -> String {
    NamingConvention::default().catalog_prefix
}
fn default_warehouse_prefix() -> String {
    NamingConvention::default().warehouse_prefix
}
fn default_catalog_kind() -> String {
    NamingConvention::default().catalog_kind
}
fn default_warehouse_kind() -> String {
    NamingConvention::default().warehouse_kind
}
impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            catalog_prefix: default_catalog_prefix(),
            warehouse_prefix: default_warehouse_prefix(),
            catalog_kind: default_catalog_kind(),
            warehouse_kind: default_warehouse_kind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_FILE: &str = "sandbox-reaper.toml";

    pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(format!("config file not found: {}", p.display()));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., REAPER__DATABRICKS__HOST=adb-1.azuredatabricks.net
        builder = builder.add_source(
            Environment::with_prefix("REAPER")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("protection.catalogs"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use reaper_core::DEFAULT_PROTECTED_CATALOGS;

    fn with_credentials() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.databricks.host = Some("adb-1.azuredatabricks.net".into());
        cfg.databricks.token = Some("dapi-1".into());
        cfg
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.naming.catalog_prefix, "sandbox_pr_");
        assert!(cfg.protection.catalogs.is_empty());
    }

    #[test]
    fn extra_protected_catalogs_keep_builtins() {
        let mut cfg = with_credentials();
        cfg.protection.catalogs = vec!["analytics_prod".into()];

        let controller = cfg.controller_config().unwrap();
        assert!(controller.protected_names.contains("analytics_prod"));
        for name in DEFAULT_PROTECTED_CATALOGS {
            assert!(controller.protected_names.contains(*name), "{name} lost protection");
        }
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = AppConfig::default().controller_config().unwrap_err();
        assert!(err.to_string().contains("No Databricks host"));

        let mut cfg = AppConfig::default();
        cfg.databricks.host = Some("adb-1".into());
        let err = cfg.controller_config().unwrap_err();
        assert!(err.to_string().contains("No Databricks token"));
    }

    #[test]
    fn cli_flags_override_config() {
        let mut cfg = with_credentials();
        let cli = Cli::try_parse_from([
            "sandbox-reaper",
            "--host",
            "https://override.cloud.databricks.com",
            "--state-file",
            "/tmp/terraform.tfstate",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        cfg.apply_cli(&cli);

        let controller = cfg.controller_config().unwrap();
        assert_eq!(controller.host, "https://override.cloud.databricks.com");
        assert_eq!(controller.credential.expose(), "dapi-1");
        assert_eq!(
            controller.state_path.as_deref(),
            Some(std::path::Path::new("/tmp/terraform.tfstate"))
        );
        assert_eq!(controller.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_level_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn token_is_not_serialized() {
        let rendered = serde_json::to_string(&with_credentials()).unwrap();
        assert!(!rendered.contains("dapi-1"));
    }
}
