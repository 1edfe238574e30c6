//! Command-line front-end: builds the normalized configuration from flags
//! or a pasted `firebaseConfig` blob, runs the engine, prints the report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use firebase_probe::config::{DEFAULT_TEST_EMAIL, DEFAULT_TEST_PASSWORD};
use firebase_probe::report::Outcome;
use firebase_probe::{HttpProbe, ProbeConfig, ProbeEngine, Report};

#[derive(Debug, Parser)]
#[command(
    name = "firebase-probe",
    version,
    about = "Probe a Firebase project configuration for common misconfigurations"
)]
struct Cli {
    /// Firebase web config as a JSON object, as copied from app source
    #[arg(long, value_name = "JSON")]
    firebase_config: Option<String>,

    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    auth_domain: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    project_id: Option<String>,
    #[arg(long)]
    storage_bucket: Option<String>,
    #[arg(long)]
    sender_id: Option<String>,
    #[arg(long)]
    app_id: Option<String>,
    #[arg(long)]
    measurement_id: Option<String>,

    /// Email for the registration probe
    #[arg(long, default_value = DEFAULT_TEST_EMAIL)]
    email: String,
    /// Password for the registration probe
    #[arg(long, default_value = DEFAULT_TEST_PASSWORD)]
    password: String,

    /// Print every request the probe layer sends, as curl commands
    #[arg(short, long)]
    debug: bool,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    if !config.has_any_field() {
        bail!("no Firebase configuration provided; pass --firebase-config or individual fields");
    }

    let probe = HttpProbe::new(Duration::from_secs(cli.timeout), config.debug)?;
    let engine = ProbeEngine::new(probe);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupted, finishing with the results so far");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let report = engine.run_with_cancel(&config, &cancel).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if cli.debug {
        eprintln!();
        for request in engine.debug_requests() {
            eprintln!("DEBUG: {}", request.as_curl());
        }
    }

    Ok(())
}

/// Both construction paths (blob and individual flags) converge here into
/// one normalized shape; flags win over the blob.
fn build_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = match &cli.firebase_config {
        Some(blob) => serde_json::from_str::<ProbeConfig>(blob)
            .context("failed to parse --firebase-config as a JSON object")?,
        None => ProbeConfig::default(),
    };

    if cli.api_key.is_some() {
        config.api_key = cli.api_key.clone();
    }
    if cli.auth_domain.is_some() {
        config.auth_domain = cli.auth_domain.clone();
    }
    if cli.database_url.is_some() {
        config.database_url = cli.database_url.clone();
    }
    if cli.project_id.is_some() {
        config.project_id = cli.project_id.clone();
    }
    if cli.storage_bucket.is_some() {
        config.storage_bucket = cli.storage_bucket.clone();
    }
    if cli.sender_id.is_some() {
        config.messaging_sender_id = cli.sender_id.clone();
    }
    if cli.app_id.is_some() {
        config.app_id = cli.app_id.clone();
    }
    if cli.measurement_id.is_some() {
        config.measurement_id = cli.measurement_id.clone();
    }

    config.test_email = cli.email.clone();
    config.test_password = cli.password.clone();
    config.debug = cli.debug;

    Ok(config)
}

fn print_report(report: &Report) {
    for result in report.results() {
        let marker = match result.verdict.outcome {
            Outcome::Vulnerable => "[VULNERABLE]",
            Outcome::Secure => "[secure]",
            Outcome::Skipped => "[skipped]",
            Outcome::Error => "[error]",
        };
        println!("{marker:<13} {} - {}", result.check, result.verdict.evidence);
    }

    let summary = report.summary();
    println!(
        "\n{} vulnerable, {} secure, {} skipped, {} error(s)",
        summary.vulnerable, summary.secure, summary.skipped, summary.errors
    );
}
