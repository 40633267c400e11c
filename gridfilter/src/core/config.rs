use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};
use crate::data::{Backend, Schema};
use crate::filters::{ComparisonOperator, DescriptorLimits, FilterConfig, InvertedIntervalPolicy};
use crate::template::TemplateConfig;

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub url: String,
    pub max_connections: u32,
}

/// Final configuration after layering defaults, file and CLI/env
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub filters: FilterConfig,
    pub template: TemplateConfig,
    pub schema: Schema,
}

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseFileConfig {
    pub backend: Option<Backend>,
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchFileConfig {
    pub tokenize: Option<bool>,
    pub default_operator: Option<ComparisonOperator>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntervalsFileConfig {
    pub inverted: Option<InvertedIntervalPolicy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitsFileConfig {
    pub max_descriptor_bytes: Option<usize>,
    pub max_columns: Option<usize>,
    pub max_entries: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateFileConfig {
    pub length_menu: Option<Vec<u32>>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub search: Option<SearchFileConfig>,
    pub intervals: Option<IntervalsFileConfig>,
    pub limits: Option<LimitsFileConfig>,
    pub template: Option<TemplateFileConfig>,
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

impl Config {
    /// Load configuration: defaults -> config file -> CLI/env overrides
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        // 1. CLI-specified path OR local directory
        let path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                FileConfig::default()
            }
        };

        Self::from_layers(cli, file_config)
    }

    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_database = file_config.database.unwrap_or_default();
        let file_search = file_config.search.unwrap_or_default();
        let file_intervals = file_config.intervals.unwrap_or_default();
        let file_limits = file_config.limits.unwrap_or_default();
        let file_template = file_config.template.unwrap_or_default();

        let url = cli
            .database
            .clone()
            .or(file_database.url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let backend = cli
            .backend
            .or(file_database.backend)
            .unwrap_or_else(|| Backend::from_url(&url));
        let max_connections = file_database
            .max_connections
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let default_limits = DescriptorLimits::default();
        let limits = DescriptorLimits {
            max_bytes: file_limits
                .max_descriptor_bytes
                .unwrap_or(default_limits.max_bytes),
            max_columns: file_limits.max_columns.unwrap_or(default_limits.max_columns),
            max_entries: file_limits.max_entries.unwrap_or(default_limits.max_entries),
        };

        let filters = FilterConfig {
            tokenize_search: file_search.tokenize.unwrap_or(false),
            default_operator: file_search.default_operator.unwrap_or_default(),
            inverted_intervals: file_intervals.inverted.unwrap_or_default(),
            limits,
        };

        let template = match file_template.length_menu {
            Some(length_menu) if length_menu.is_empty() => {
                anyhow::bail!("template.length_menu must not be empty")
            }
            Some(length_menu) => TemplateConfig { length_menu },
            None => TemplateConfig::default(),
        };

        let schema = file_config.schema.unwrap_or_default();
        schema.validate().context("Invalid schema in config")?;

        tracing::debug!(
            backend = %backend,
            entities = schema.len(),
            tokenize_search = filters.tokenize_search,
            inverted_intervals = ?filters.inverted_intervals,
            "Configuration loaded"
        );

        Ok(Self {
            database: DatabaseConfig {
                backend,
                url,
                max_connections,
            },
            filters,
            template,
            schema,
        })
    }
}
