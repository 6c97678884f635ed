//! Single stages in headless mode.

use monthend::Stage;

use crate::fixtures::{stderr, stdout, Workspace};

#[test]
fn test_headless_env_writes_summary_and_sheet() {
    let ws = Workspace::new();
    let output = ws.run(&["stage", "2AccountsReceivable"], true);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summary = ws.summary("2AccountsReceivable");
    assert_eq!(summary.stage, "2AccountsReceivable");
    assert_eq!(summary.summary, "5 checklist items");
    assert_eq!(summary.items[0], "Ensure all customer invoices are posted");

    let rows = ws.csv_rows("2AccountsReceivable");
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows[3],
        ("Write-off bad debts if necessary".to_string(), String::new())
    );

    let printed = stdout(&output);
    assert!(printed.contains("2AccountsReceivable: HEADLESS summary written to"));
    assert!(printed.contains("2AccountsReceivable.json and CSV"));
}

#[test]
fn test_headless_flag_without_env() {
    let ws = Workspace::new();
    let output = ws.run(&["stage", "5", "--headless"], false);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(ws.summary("5Inventory").items.len(), Stage::Inventory.tasks().len());
}

#[test]
fn test_every_stage_counts_agree() {
    let ws = Workspace::new();
    for stage in Stage::ALL {
        let output = ws.run(&["stage", stage.id()], true);
        assert!(output.status.success(), "{}: {}", stage, stderr(&output));

        let summary = ws.summary(stage.id());
        let rows = ws.csv_rows(stage.id());
        assert_eq!(summary.items.len(), stage.tasks().len(), "{}", stage);
        assert_eq!(rows.len(), summary.items.len(), "{}", stage);
        assert_eq!(summary.summary, format!("{} checklist items", rows.len()));
        assert!(rows.iter().all(|(_, completed)| completed.is_empty()));
        let items: Vec<&str> = rows.iter().map(|(item, _)| item.as_str()).collect();
        assert_eq!(items, stage.tasks());
    }
}

#[test]
fn test_unknown_stage_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["stage", "9Payroll"], true);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output).trim(), "Error: Unknown stage: 9Payroll");
    assert!(!ws.output.exists());
}

#[test]
fn test_list_shows_pipeline_order() {
    let ws = Workspace::new();
    let output = ws.run(&["list"], false);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    for (line, stage) in lines.iter().zip(Stage::ALL) {
        assert!(line.starts_with(stage.id()), "{line}");
        assert!(line.contains(stage.title()));
    }
}
