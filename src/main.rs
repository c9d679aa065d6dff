//! tr-export CLI
//!
//! Command-line interface exporting the Trade Republic transaction history.
//!
//! # Usage
//!
//! ```bash
//! cargo run --
//! cargo run -- --config ~/tr/config.toml --format csv --output-dir out
//! cargo run -- --details --on-enrichment-error skip
//! TR_EXPORT_LOG_FORMAT=json RUST_LOG=tr_export=debug cargo run
//! ```
//!
//! The program reads the configuration file, logs in with phone number and PIN,
//! asks for the second-factor code on the terminal, then streams the timeline
//! over the socket and writes `trade_republic_transactions.<json|csv>` to the
//! output directory.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (configuration, authentication, protocol, enrichment or export)

use std::process;
use tr_export::auth::{CredentialAuthenticator, HttpAuthApi, StdinPrompt};
use tr_export::cli;
use tr_export::config::AppConfig;
use tr_export::pipeline;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the log format (`text` or `json`)
const LOG_FORMAT_VAR: &str = "TR_EXPORT_LOG_FORMAT";

/// Install the global subscriber; logs go to stderr so stdout stays interactive
fn init_tracing() {
    let log_format = std::env::var(LOG_FORMAT_VAR).unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let args = cli::parse_args();
    init_tracing();

    let config = match AppConfig::load(&args.config, args.to_overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut authenticator =
        CredentialAuthenticator::new(HttpAuthApi::new(&config.api.base_url), StdinPrompt::new());

    match pipeline::run(&config, &mut authenticator).await {
        Ok(summary) => {
            println!(
                "{} records exported to {}",
                summary.written,
                summary.path.display()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
