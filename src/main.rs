use std::io;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use d2_pvp_advisor::advisor::run_advisor;
use d2_pvp_advisor::config::AdvisorConfig;
use d2_pvp_advisor::stats_client::BungieClient;

fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    init_tracing()?;

    let config = AdvisorConfig::from_env()?;
    tracing::debug!(?config, "loaded config");
    let client = BungieClient::new(&config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = run_advisor(&mut stdin.lock(), &mut stdout.lock(), &client)
        .context("terminal i/o failed")?;

    if outcome.is_failure() && config.strict_exit {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr; stdout carries the report.
fn init_tracing() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("d2_pvp_advisor=warn")),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}
