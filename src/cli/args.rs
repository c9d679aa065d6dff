use crate::config::{ConfigOverrides, EnrichmentFailurePolicy, OutputFormat, DEFAULT_CONFIG_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Export the Trade Republic transaction history to JSON or CSV
#[derive(Parser, Debug)]
#[command(name = "tr-export")]
#[command(about = "Export the Trade Republic transaction history to JSON or CSV", long_about = None)]
pub struct CliArgs {
    /// Configuration file with credentials and output settings
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE,
        help = "Path to the TOML configuration file"
    )]
    pub config: PathBuf,

    /// Output format, overriding `general.output_format`
    #[arg(
        long = "format",
        value_name = "FORMAT",
        help = "Export format: 'json' for merged raw records or 'csv' for the accounting schema"
    )]
    pub format: Option<OutputFormat>,

    /// Output directory, overriding `general.output_folder`
    #[arg(long = "output-dir", value_name = "DIR", help = "Directory receiving the export file")]
    pub output_dir: Option<PathBuf>,

    /// Fetch the detail of every transaction
    #[arg(long = "details", overrides_with = "no_details")]
    pub details: bool,

    /// Skip the detail requests
    #[arg(long = "no-details", overrides_with = "details")]
    pub no_details: bool,

    /// Behaviour when a detail request fails
    #[arg(
        long = "on-enrichment-error",
        value_name = "POLICY",
        help = "'abort' stops the run, 'skip' keeps the record without details"
    )]
    pub on_enrichment_error: Option<EnrichmentFailurePolicy>,
}

impl CliArgs {
    /// Command line values that take precedence over the configuration file
    pub fn to_overrides(&self) -> ConfigOverrides {
        let extract_details = match (self.details, self.no_details) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        ConfigOverrides {
            output_format: self.format,
            output_dir: self.output_dir.clone(),
            extract_details,
            enrichment_failure: self.on_enrichment_error,
        }
    }
}
