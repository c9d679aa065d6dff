//! Run configuration
//!
//! Loads the TOML configuration file, applies command line overrides and
//! validates the result into an immutable [`AppConfig`]. The validated value is
//! passed explicitly to every component that needs it.
//!
//! # File Layout
//!
//! ```toml
//! [secret]
//! phone_number = "+33600000000"
//! pin = "1234"
//!
//! [general]
//! output_format = "csv"         # json | csv
//! output_folder = "out"
//! extract_details = true
//! enrichment_failure = "abort"  # abort | skip
//!
//! [api]                         # optional
//! base_url = "https://api.traderepublic.com"
//! socket_url = "wss://api.traderepublic.com"
//!
//! [locale]                      # optional
//! locale = "fr"
//! ```

use crate::types::{ConfigError, Credentials};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Base name of the export artifact
pub const EXPORT_FILE_STEM: &str = "trade_republic_transactions";

pub const DEFAULT_BASE_URL: &str = "https://api.traderepublic.com";
pub const DEFAULT_SOCKET_URL: &str = "wss://api.traderepublic.com";

/// Export artifact format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed array of merged raw records
    Json,
    /// Semicolon-delimited accounting schema
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(ConfigError::InvalidFormat {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to do when fetching one transaction's detail fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EnrichmentFailurePolicy {
    /// Abort the whole run
    #[default]
    Abort,
    /// Log a warning and keep the record unenriched
    Skip,
}

impl FromStr for EnrichmentFailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "abort" => Ok(EnrichmentFailurePolicy::Abort),
            "skip" => Ok(EnrichmentFailurePolicy::Skip),
            _ => Err(ConfigError::InvalidPolicy {
                value: value.to_string(),
            }),
        }
    }
}

/// HTTP and socket endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub base_url: String,
    pub socket_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
        }
    }
}

/// Client metadata sent with the socket `connect` handshake
///
/// Read from the file in snake_case, sent on the wire in camelCase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"), default)]
pub struct LocaleConfig {
    pub locale: String,
    pub platform_id: String,
    pub platform_version: String,
    pub client_id: String,
    pub client_version: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            locale: "fr".to_string(),
            platform_id: "webtrading".to_string(),
            platform_version: "safari - 18.3.0".to_string(),
            client_id: "app.traderepublic.com".to_string(),
            client_version: "3.151.3".to_string(),
        }
    }
}

/// Values supplied on the command line, taking precedence over the file
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub output_dir: Option<PathBuf>,
    pub extract_details: Option<bool>,
    pub enrichment_failure: Option<EnrichmentFailurePolicy>,
}

/// Validated configuration for one export run
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub output_format: OutputFormat,
    pub output_dir: PathBuf,
    pub extract_details: bool,
    pub enrichment_failure: EnrichmentFailurePolicy,
    pub api: ApiEndpoints,
    pub locale: LocaleConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    secret: SecretSection,
    #[serde(default)]
    general: GeneralSection,
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    locale: Option<LocaleConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct SecretSection {
    phone_number: Option<String>,
    pin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeneralSection {
    output_format: Option<String>,
    output_folder: Option<String>,
    extract_details: Option<bool>,
    enrichment_failure: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    socket_url: Option<String>,
}

impl AppConfig {
    /// Load and validate the configuration file at `path`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing or unreadable, is not
    /// valid TOML, lacks a required value, or carries an invalid enum value.
    pub fn load(path: &Path, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml(&content, overrides)
    }

    /// Validate configuration from TOML text
    pub fn from_toml(content: &str, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let phone_number = required(file.secret.phone_number, "secret.phone_number")?;
        let pin = required(file.secret.pin, "secret.pin")?;

        let output_format = match overrides.output_format {
            Some(format) => format,
            None => required(file.general.output_format, "general.output_format")?.parse()?,
        };

        let output_dir = match overrides.output_dir {
            Some(dir) => dir,
            None => PathBuf::from(required(
                file.general.output_folder,
                "general.output_folder",
            )?),
        };

        let enrichment_failure = match overrides.enrichment_failure {
            Some(policy) => policy,
            None => match file.general.enrichment_failure {
                Some(value) => value.parse()?,
                None => EnrichmentFailurePolicy::default(),
            },
        };

        let defaults = ApiEndpoints::default();
        let api = ApiEndpoints {
            base_url: file
                .api
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            socket_url: file.api.socket_url.unwrap_or(defaults.socket_url),
        };

        Ok(AppConfig {
            credentials: Credentials::new(phone_number, pin),
            output_format,
            output_dir,
            extract_details: overrides
                .extract_details
                .or(file.general.extract_details)
                .unwrap_or(false),
            enrichment_failure,
            api,
            locale: file.locale.unwrap_or_default(),
        })
    }

    /// Create the output directory if it does not exist yet
    pub fn ensure_output_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| ConfigError::OutputDir {
            path: self.output_dir.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Full path of the export artifact for this run
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            EXPORT_FILE_STEM,
            self.output_format.extension()
        ))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing_field(field))
}
