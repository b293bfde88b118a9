//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Report export configuration.
    #[serde(default)]
    pub exports: ExportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the backend, used to build notification action links.
    pub url: String,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Report export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Whether the PDF engine is available. When false, PDF requests fall
    /// back to JSON.
    #[serde(default = "default_true")]
    pub pdf_enabled: bool,
    /// Maximum characters per line of a PDF title.
    #[serde(default = "default_title_width")]
    pub title_width: usize,
    /// Maximum characters per line of PDF body text.
    #[serde(default = "default_body_width")]
    pub body_width: usize,
    /// Body lines per PDF page.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
    /// Currency code used for donation summaries.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pdf_enabled: true,
            title_width: default_title_width(),
            body_width: default_body_width(),
            lines_per_page: default_lines_per_page(),
            currency: default_currency(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_title_width() -> usize {
    48
}

const fn default_body_width() -> usize {
    90
}

const fn default_lines_per_page() -> usize {
    60
}

fn default_currency() -> String {
    "MZN".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MOZSOLIDARIA_ENV`)
    /// 3. Environment variables with `MOZSOLIDARIA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("MOZSOLIDARIA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MOZSOLIDARIA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MOZSOLIDARIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
