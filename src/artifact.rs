//! Headless output: a JSON summary and a CSV sheet per stage.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checklist::Checklist;
use crate::{mlog_debug, Result};

/// Environment variable that switches a stage to headless mode.
pub const HEADLESS_ENV: &str = "HEADLESS";

/// Any non-empty value of `HEADLESS` selects headless mode.
pub fn headless_from_env() -> bool {
    std::env::var_os(HEADLESS_ENV).is_some_and(|v| !v.is_empty())
}

/// Contents of `<stage>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub stage: String,
    pub summary: String,
    pub items: Vec<String>,
}

impl From<&Checklist> for Summary {
    fn from(checklist: &Checklist) -> Self {
        Self {
            stage: checklist.stage.clone(),
            summary: checklist.summary(),
            items: checklist.tasks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Write `<dir>/<stage>.json` and `<dir>/<stage>.csv`, creating `dir` if needed.
pub fn write_artifacts(dir: &Path, checklist: &Checklist) -> Result<ArtifactPaths> {
    fs::create_dir_all(dir)?;
    let paths = ArtifactPaths {
        json: dir.join(format!("{}.json", checklist.stage)),
        csv: dir.join(format!("{}.csv", checklist.stage)),
    };

    let summary = Summary::from(checklist);
    fs::write(&paths.json, serde_json::to_string(&summary)?)?;
    fs::write(&paths.csv, render_csv(checklist))?;

    mlog_debug!(
        "Artifacts written for {}: {} items -> {}, {}",
        checklist.stage,
        checklist.len(),
        paths.json.display(),
        paths.csv.display()
    );
    Ok(paths)
}

/// `item,completed` header plus one row per task with a blank completion cell.
pub fn render_csv(checklist: &Checklist) -> String {
    let mut out = String::from("item,completed\r\n");
    for task in &checklist.tasks {
        out.push_str(&csv_field(task));
        out.push_str(",\r\n");
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
