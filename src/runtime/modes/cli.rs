//! CLI mode
//!
//! One-shot lookups and sample configuration output. Envelopes go to
//! stdout as JSON; diagnostics go to stderr.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Resolve every IP in order through the orchestrator.
///
/// Returns the number of lookups that did not succeed.
pub async fn run_lookup(config: &StaticConfig, ips: &[String]) -> Result<usize> {
    let startup = lifetime::startup::prepare_startup(config)?;
    let mut failures = 0;

    for ip in ips {
        let client = startup.orchestrator.current_client();
        let envelope = client.get_country(ip).await;

        if !envelope.is_success() {
            failures += 1;
            eprintln!(
                "{} {} via {}: {}",
                "[FAILED]".red().bold(),
                ip,
                client.name(),
                envelope.error_message().unwrap_or_default()
            );
        }

        let json = serde_json::to_string_pretty(&envelope).context("Failed to render envelope")?;
        println!("{}", json);
    }

    Ok(failures)
}

/// Print a sample configuration, or write it to `output`.
pub fn print_sample_config(output: Option<&Path>) -> Result<()> {
    let sample = StaticConfig::generate_sample_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, sample)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Sample config written to {}", "[OK]".green().bold(), path.display());
        }
        None => print!("{}", sample),
    }

    Ok(())
}

/// Diagnostics for CLI runs go to stderr so stdout stays valid JSON.
pub fn init_cli_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
