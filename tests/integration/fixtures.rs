//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - An isolated workspace (temporary HOME + output directory)
//! - Invoking the compiled binary
//! - Reading back the JSON/CSV a stage wrote
//! - Scripted `sh` stages for the runner

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use monthend::artifact::Summary;
use monthend::runner::ProcessLauncher;

/// Temporary directory acting as both `HOME` and the output root.
pub struct Workspace {
    pub temp_dir: TempDir,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("output");
        Self { temp_dir, output }
    }

    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `monthend --output-dir <output> <args...>` with HEADLESS cleared.
    pub fn monthend(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_monthend"));
        cmd.arg("--output-dir")
            .arg(&self.output)
            .args(args)
            .env("HOME", self.home())
            .env_remove("HEADLESS")
            .env_remove("MONTHEND_DEBUG")
            .env_remove("MONTHEND_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str], headless: bool) -> Output {
        let mut cmd = self.monthend(args);
        if headless {
            cmd.env("HEADLESS", "1");
        }
        cmd.output().expect("Failed to run monthend binary")
    }

    pub fn summary(&self, stage: &str) -> Summary {
        let text = std::fs::read_to_string(self.output.join(format!("{stage}.json")))
            .unwrap_or_else(|e| panic!("missing {stage}.json: {e}"));
        serde_json::from_str(&text).expect("Invalid summary JSON")
    }

    pub fn csv_rows(&self, stage: &str) -> Vec<(String, String)> {
        let text = std::fs::read_to_string(self.output.join(format!("{stage}.csv")))
            .unwrap_or_else(|e| panic!("missing {stage}.csv: {e}"));
        parse_csv(&text)
    }

    /// Stages recorded by [`scripted_launcher`], in invocation order.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.home().join("invocations.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// `sh` launcher: every stage appends its name to `invocations.log`, prints
/// `<stage> ok`, and exits with the code listed in `failures` (0 otherwise).
/// Stages also fail with 9 if `HEADLESS` did not reach them.
pub fn scripted_launcher(ws: &Workspace, failures: &[(&str, i32)]) -> ProcessLauncher {
    let log = ws.home().join("invocations.log");
    let mut cases = String::new();
    for (stage, code) in failures {
        cases.push_str(&format!(
            "{stage}) echo \"{stage} broke\" >&2; exit {code};; "
        ));
    }
    let script = format!(
        "echo \"$1\" >> '{}'; [ -n \"$HEADLESS\" ] || exit 9; case \"$1\" in {cases}*) ;; esac; echo \"$1 ok\"",
        log.display()
    );
    ProcessLauncher::new("sh").with_args(["-c".to_string(), script, "sh".to_string()])
}

pub fn names(stages: &[&str]) -> Vec<String> {
    stages.iter().map(|s| s.to_string()).collect()
}

/// Parse a stage sheet into `(item, completed)` rows, header excluded.
/// Handles quoted fields with doubled quotes and CRLF line ends.
pub fn parse_csv(text: &str) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, c) => field.push(c),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut field)),
            (false, '\r') => {}
            (false, '\n') => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            (false, c) => field.push(c),
        }
    }

    let header = rows.first().cloned().unwrap_or_default();
    assert_eq!(header, ["item", "completed"], "unexpected CSV header");
    rows.into_iter()
        .skip(1)
        .map(|r| {
            assert_eq!(r.len(), 2, "CSV row should have two fields: {r:?}");
            (r[0].clone(), r[1].clone())
        })
        .collect()
}
