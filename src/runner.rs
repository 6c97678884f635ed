//! Sequential stage pipeline.
//!
//! Each stage runs as its own process. The runner blocks on one stage before
//! starting the next, echoes whatever the stage printed, and stops at the first
//! stage that does not exit cleanly. There is no retry and no skip.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::artifact::HEADLESS_ENV;
use crate::log::APPEND_ENV;
use crate::{mlog, mlog_debug, mlog_warn, Error, Result};

pub const RUN_LOG_FILE: &str = "logs.json";

/// How a stage process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Process exited. `None` when it was terminated by a signal.
    Exited(Option<i32>),
    SpawnFailed(String),
    TimedOut(Duration),
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Exited(Some(code)) => write!(f, "exit status {}", code),
            StageOutcome::Exited(None) => f.write_str("terminated by signal"),
            StageOutcome::SpawnFailed(err) => write!(f, "failed to start: {}", err),
            StageOutcome::TimedOut(d) => write!(f, "{}", Error::Timeout(*d)),
        }
    }
}

/// Captured result of one stage invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub outcome: StageOutcome,
    pub stdout: String,
    pub stderr: String,
}

impl StageOutput {
    fn without_output(outcome: StageOutcome) -> Self {
        Self {
            outcome,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == StageOutcome::Exited(Some(0))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            StageOutcome::Exited(code) => code,
            _ => None,
        }
    }
}

/// Starts one stage and waits for it.
///
/// Launching never returns an error: a stage that cannot be started or does
/// not finish in time is a failed stage like any other.
#[allow(async_fn_in_trait)]
pub trait StageLauncher {
    async fn launch(&self, stage: &str) -> StageOutput;
}

/// Launches stages as child processes: `<program> <args...> <stage>`.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
    headless: bool,
    timeout: Option<Duration>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            headless: true,
            timeout: None,
        }
    }

    /// Re-invoke this executable's `stage` subcommand for every stage.
    pub fn monthend(exe: &Path, output_dir: &Path, debug: bool) -> Self {
        let mut args = Vec::new();
        if debug {
            args.push("--debug".to_string());
        }
        args.push("--output-dir".to_string());
        args.push(output_dir.display().to_string());
        args.push("stage".to_string());
        Self::new(exe).with_args(args)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Interactive stages inherit the terminal; nothing is captured.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, stage: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(stage)
            .env(APPEND_ENV, "1")
            .kill_on_drop(true);
        if self.headless {
            cmd.env(HEADLESS_ENV, "1")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        } else {
            cmd.env_remove(HEADLESS_ENV)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        cmd
    }

    async fn wait(&self, mut cmd: Command) -> std::io::Result<StageOutput> {
        if self.headless {
            let output = cmd.output().await?;
            Ok(StageOutput {
                outcome: StageOutcome::Exited(output.status.code()),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd.status().await?;
            Ok(StageOutput::without_output(StageOutcome::Exited(
                status.code(),
            )))
        }
    }
}

impl StageLauncher for ProcessLauncher {
    async fn launch(&self, stage: &str) -> StageOutput {
        mlog_debug!(
            "ProcessLauncher::launch program={} args={:?} stage={} headless={}",
            self.program.display(),
            self.args,
            stage,
            self.headless
        );
        let cmd = self.command(stage);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.wait(cmd)).await {
                Ok(result) => result,
                Err(_) => {
                    mlog_warn!("Stage {} timed out after {:?}", stage, limit);
                    return StageOutput::without_output(StageOutcome::TimedOut(limit));
                }
            },
            None => self.wait(cmd).await,
        };
        result.unwrap_or_else(|e| {
            mlog_warn!("Stage {} failed to start: {}", stage, e);
            StageOutput::without_output(StageOutcome::SpawnFailed(e.to_string()))
        })
    }
}

/// Per-stage entry in the run report and run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    /// Process exit code; `None` when the stage never produced one.
    pub exit: Option<i32>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub requested: Vec<String>,
    pub results: Vec<StageResult>,
}

impl RunReport {
    /// True only when every requested stage ran and passed.
    pub fn success(&self) -> bool {
        self.results.len() == self.requested.len() && self.results.iter().all(|r| r.success)
    }

    pub fn failed_stage(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| !r.success)
            .map(|r| r.stage.as_str())
    }

    /// Process exit code for the runner itself.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

pub struct Runner<L> {
    launcher: L,
}

impl<L: StageLauncher> Runner<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    /// Run `stages` in order, echoing each stage's captured output to `out`.
    ///
    /// Only writing to `out` can fail; stage failures are reported in the
    /// returned [`RunReport`].
    pub async fn run<W: Write>(&self, stages: &[String], out: &mut W) -> Result<RunReport> {
        mlog!("Pipeline starting: {} stage(s)", stages.len());
        let mut report = RunReport {
            requested: stages.to_vec(),
            results: Vec::with_capacity(stages.len()),
        };

        for stage in stages {
            mlog!("Running stage {}", stage);
            let output = self.launcher.launch(stage).await;
            echo_captured(out, &output)?;

            let success = output.success();
            report.results.push(StageResult {
                stage: stage.clone(),
                exit: output.exit_code(),
                success,
            });

            if success {
                mlog!("Stage {} completed", stage);
                writeln!(out, "{} completed successfully.", stage)?;
            } else {
                mlog_warn!("Stage {} failed: {}", stage, output.outcome);
                writeln!(
                    out,
                    "Error occurred while running {}: {}",
                    stage, output.outcome
                )?;
                break;
            }
        }

        out.flush()?;
        mlog!(
            "Pipeline finished: {}/{} stage(s) ran, success={}",
            report.results.len(),
            report.requested.len(),
            report.success()
        );
        Ok(report)
    }
}

fn echo_captured<W: Write>(out: &mut W, output: &StageOutput) -> Result<()> {
    for stream in [&output.stdout, &output.stderr] {
        if stream.is_empty() {
            continue;
        }
        out.write_all(stream.as_bytes())?;
        if !stream.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}

/// One record in `logs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub stages: Vec<String>,
    pub results: Vec<StageResult>,
}

impl RunLogEntry {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            timestamp: Utc::now(),
            stages: report.requested.clone(),
            results: report.results.clone(),
        }
    }
}

/// Append `entry` to the JSON array in `<dir>/logs.json`.
pub fn append_run_log(dir: &Path, entry: &RunLogEntry) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(RUN_LOG_FILE);
    let mut entries = read_run_log(&path)?;
    entries.push(entry.clone());
    std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
    mlog_debug!("Run log now has {} entries: {}", entries.len(), path.display());
    Ok(path)
}

pub fn read_run_log(path: &Path) -> Result<Vec<RunLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&text)?)
}
