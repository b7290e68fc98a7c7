//! # Application Configuration
//!
//! Loads the server configuration from a YAML file layered under environment
//! variables. `${VAR}` references inside the file are substituted from the
//! environment before parsing, and the well-known deployment variables
//! (`PORT`, `PROJECT_ID`, `GOOGLE_CLOUD_LOCATION`, `FIRESTORE_DATABASE`) are
//! applied as overrides after all layers.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use shelfkeep::providers::ai::RetryPolicy;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Document-store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    /// The key of the provider (from `providers`) backing the agents.
    #[serde(default = "default_agent_provider")]
    pub agent_provider: String,
    /// Transport retry policy for model calls.
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_port() -> u16 {
    9090
}

fn default_agent_provider() -> String {
    "gemini_default".to_string()
}

/// Settings for the document store backing the inventory tools.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// `firestore` for production, `memory` for local runs and tests.
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// The Google Cloud project ID. Loaded from `PROJECT_ID` env var.
    #[serde(default)]
    pub project_id: Option<String>,
    /// The Firestore database name. Loaded from `FIRESTORE_DATABASE` env var.
    #[serde(default = "default_database")]
    pub database: String,
    /// The Google Cloud location. Loaded from `GOOGLE_CLOUD_LOCATION` env var.
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            project_id: None,
            database: default_database(),
            location: None,
        }
    }
}

fn default_store_backend() -> String {
    "firestore".to_string()
}

fn default_database() -> String {
    "inventory".to_string()
}

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider (e.g. "gemini", "local").
    pub provider: String,
    /// The API URL. Optional for Gemini, where it can be derived from the
    /// model name.
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    pub api_key: Option<String>,
    pub model_name: String,
}

/// The transport retry policy, mirrored into [`RetryPolicy`].
#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_initial_delay")]
    pub initial_delay: f64,
    #[serde(default = "default_retry_exp_base")]
    pub exp_base: f64,
    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            initial_delay: default_retry_initial_delay(),
            exp_base: default_retry_exp_base(),
            retry_on: default_retry_on(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_initial_delay() -> f64 {
    1.0
}

fn default_retry_exp_base() -> f64 {
    7.0
}

fn default_retry_on() -> Vec<u16> {
    vec![429, 500, 503, 504]
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        RetryPolicy {
            attempts: settings.attempts,
            initial_delay: settings.initial_delay,
            exp_base: settings.exp_base,
            retry_on: settings.retry_on,
        }
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|_| "".to_string())
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// The file defaults to `config.yml` next to the crate manifest. Environment
/// variables are merged in two layers: top-level keys like `PORT` directly,
/// and nested keys through `SHELFKEEP_...` variables
/// (e.g. `SHELFKEEP_STORE__DATABASE`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let main_config_path = match config_path_override {
        Some(path) => path.to_string(),
        None => format!("{}/config.yml", env!("CARGO_MANIFEST_DIR")),
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists."
        ))
    })?;
    info!("Loading configuration from '{main_config_path}'.");

    let settings = ConfigBuilder::builder()
        .add_source(File::from_str(&main_content, FileFormat::Yaml))
        // Environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("SHELFKEEP")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // The well-known deployment variables win over everything, so the
    // containerized setup keeps working without touching the YAML.
    if let Ok(project_id) = env::var("PROJECT_ID") {
        if !project_id.is_empty() {
            config.store.project_id = Some(project_id);
        }
    }
    if let Ok(location) = env::var("GOOGLE_CLOUD_LOCATION") {
        if !location.is_empty() {
            config.store.location = Some(location);
        }
    }
    if let Ok(database) = env::var("FIRESTORE_DATABASE") {
        if !database.is_empty() {
            config.store.database = database;
        }
    }

    Ok(config)
}
