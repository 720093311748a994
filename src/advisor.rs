use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

use crate::advice::{AdvisoryReport, advise};
use crate::error::AdvisorError;
use crate::identity::{PlayerIdentity, resolve_profile_url};
use crate::stats_client::StatsSource;

pub const PROMPT: &str = "Please enter your Bungie.net Destiny 2 profile URL:";

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Reported,
    Failed(AdvisorError),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}

/// Everything printed for a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerReport {
    pub identity: PlayerIdentity,
    pub display_name: String,
    pub advice: AdvisoryReport,
}

/// Prompts, reads one URL, runs the pipeline and writes either the report or
/// a single `Error:` line. `Err` is reserved for terminal I/O failures.
pub fn run_advisor<R, W, S>(input: &mut R, output: &mut W, source: &S) -> io::Result<RunOutcome>
where
    R: BufRead,
    W: Write,
    S: StatsSource + Sync,
{
    writeln!(output, "{PROMPT}")?;
    output.flush()?;

    let mut raw = Vec::new();
    input.read_until(b'\n', &mut raw)?;
    let result = match String::from_utf8(raw) {
        Ok(line) => build_report(line.trim(), source),
        Err(_) => Err(AdvisorError::InvalidProfileUrl(
            "input is not valid UTF-8".to_string(),
        )),
    };

    match result {
        Ok(report) => {
            write_report(output, &report)?;
            Ok(RunOutcome::Reported)
        }
        Err(err) => {
            warn!(stage = err.stage(), error = %err, "advisor run failed");
            writeln!(output, "Error: {err}")?;
            Ok(RunOutcome::Failed(err))
        }
    }
}

/// Resolves the URL and fetches name and stats in parallel.
pub fn build_report<S>(url: &str, source: &S) -> Result<PlayerReport, AdvisorError>
where
    S: StatsSource + Sync,
{
    let identity = resolve_profile_url(url)?;
    debug!(
        platform = identity.platform_type(),
        membership_id = identity.membership_id(),
        "resolved profile"
    );

    let (name, stats) = rayon::join(
        || source.fetch_display_name(&identity),
        || source.fetch_pvp_stats(&identity),
    );
    let display_name = name?;
    let snapshot = stats?;
    info!(player = %display_name, "fetched pvp stats");

    Ok(PlayerReport {
        identity,
        display_name,
        advice: advise(&snapshot),
    })
}

pub fn write_report<W: Write>(output: &mut W, report: &PlayerReport) -> io::Result<()> {
    writeln!(
        output,
        "Player: {} ({})",
        report.display_name,
        report.identity.platform_name()
    )?;
    writeln!(output, "Gameplay Statistics:")?;
    for entry in &report.advice.entries {
        writeln!(output, "{}: {:.2}", entry.metric.label(), entry.value)?;
    }
    for suggestion in report.advice.suggestions() {
        writeln!(output, "{suggestion}")?;
    }
    output.flush()
}
