use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use monthend::app;
use monthend::artifact::{headless_from_env, write_artifacts};
use monthend::config::Config;
use monthend::runner::{append_run_log, ProcessLauncher, RunLogEntry, Runner};
use monthend::{mlog, mlog_debug, mlog_error, mlog_warn, Result, Stage};

/// Monthend - month-end close checklist runner
#[derive(Parser, Debug)]
#[command(name = "monthend")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    HEADLESS=1        Write JSON/CSV summaries instead of opening the form\n    MONTHEND_DEBUG=1  Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.monthend/monthend.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Directory for JSON/CSV summaries and the run log
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the close stages in order, stopping at the first failure (default)
    Run {
        /// Run only these stages, in the given order (ids or numbers)
        #[arg(long, value_delimiter = ',', value_name = "STAGES")]
        only: Vec<String>,

        /// Open each stage's checklist form instead of writing summaries
        #[arg(long)]
        interactive: bool,
    },

    /// Run a single stage in this process
    Stage {
        /// Stage id (e.g. 2AccountsReceivable) or pipeline number (1-8)
        stage: String,

        /// Write summaries instead of opening the form (same as HEADLESS=1)
        #[arg(long)]
        headless: bool,
    },

    /// List the close stages in pipeline order
    List,
}

fn main() {
    let cli = Cli::parse();
    monthend::log::init(cli.debug);

    if let Err(e) = run(cli) {
        mlog_error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir());
    mlog_debug!(
        "monthend starting: command={:?} output_dir={}",
        cli.command,
        output_dir.display()
    );

    match cli.command {
        Some(Command::Run { only, interactive }) => {
            run_pipeline(&config, &output_dir, &only, interactive, cli.debug)
        }
        Some(Command::Stage { stage, headless }) => {
            run_stage(&stage, headless || headless_from_env(), &output_dir)
        }
        Some(Command::List) => {
            run_list();
            Ok(())
        }
        None => run_pipeline(&config, &output_dir, &[], false, cli.debug),
    }
}

/// Resolve `--only` into stage ids. Empty means every stage in pipeline order.
fn select_stages(only: &[String]) -> Result<Vec<String>> {
    if only.is_empty() {
        return Ok(Stage::all_ids());
    }
    only.iter()
        .map(|s| s.parse::<Stage>().map(|stage| stage.id().to_string()))
        .collect()
}

fn run_pipeline(
    config: &Config,
    output_dir: &Path,
    only: &[String],
    interactive: bool,
    debug: bool,
) -> Result<()> {
    let stages = select_stages(only)?;
    let exe = std::env::current_exe()?;
    mlog!(
        "Run command: stages={:?} interactive={} exe={}",
        stages,
        interactive,
        exe.display()
    );

    let launcher = ProcessLauncher::monthend(&exe, output_dir, debug)
        .with_headless(!interactive)
        .with_timeout(config.stage_timeout());
    let runner = Runner::new(launcher);

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let mut out = io::stdout().lock();
        runner.run(&stages, &mut out).await
    })?;

    if config.run_log {
        if let Err(e) = append_run_log(output_dir, &RunLogEntry::from_report(&report)) {
            mlog_warn!("Failed to append run log: {}", e);
            eprintln!("Warning: failed to write run log: {}", e);
        }
    }

    if let Some(stage) = report.failed_stage() {
        mlog_error!("Close stopped at {}", stage);
        std::process::exit(report.exit_code());
    }
    Ok(())
}

fn run_stage(stage: &str, headless: bool, output_dir: &Path) -> Result<()> {
    let stage: Stage = stage.parse()?;
    let checklist = stage.checklist();
    mlog!("Stage command: stage={} headless={}", stage, headless);

    if headless {
        let paths = write_artifacts(output_dir, &checklist)?;
        println!(
            "{}: HEADLESS summary written to {} and CSV",
            stage.id(),
            paths.json.display()
        );
        return Ok(());
    }

    app::run_form(&checklist)?;
    Ok(())
}

fn run_list() {
    for stage in Stage::ALL {
        println!(
            "{:<22} {:<26} {} tasks",
            stage.id(),
            stage.title(),
            stage.tasks().len()
        );
    }
}
