//! Process driver: run each stage as its own child process, in order.
//!
//! `recipescan run` re-executes the current binary once per stage
//! (`reader`, `parser`, `export`) and waits for each. A stage that exits
//! unsuccessfully is reported and the next one still runs, since its input
//! folder may already hold usable files from earlier runs. Only failing to
//! start a child at all stops the driver.

use crate::error::RecipeScanError;
use serde::Serialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};

/// Subcommands run by the driver, in order.
pub const STAGE_COMMANDS: [&str; 3] = ["reader", "parser", "export"];

/// Exit of one child stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageExit {
    pub stage: String,
    pub success: bool,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverSummary {
    pub stages: Vec<StageExit>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl DriverSummary {
    pub fn all_succeeded(&self) -> bool {
        self.stages.iter().all(|s| s.success)
    }
}

/// Run `program <stage> <forwarded...>` for every stage in `stages`.
///
/// `envs` are set on each child in addition to the inherited environment;
/// stdout and stderr are inherited.
pub async fn run_stages(
    program: &Path,
    stages: &[&str],
    forwarded: &[OsString],
    envs: &[(String, String)],
) -> Result<DriverSummary, RecipeScanError> {
    let started = Instant::now();
    let mut exits = Vec::with_capacity(stages.len());

    for stage in stages {
        info!("Starting {}", stage);
        let status = Command::new(program)
            .arg(stage)
            .args(forwarded)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .await
            .map_err(|source| RecipeScanError::ToolSpawn {
                tool: format!("{} {}", program.display(), stage),
                source,
            })?;

        if status.success() {
            info!("Finished {}", stage);
        } else {
            warn!("{} exited with {}", stage, status);
        }
        exits.push(StageExit {
            stage: stage.to_string(),
            success: status.success(),
            status: status.to_string(),
        });
    }

    Ok(DriverSummary {
        stages: exits,
        elapsed: started.elapsed(),
    })
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
