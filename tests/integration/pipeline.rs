//! The sequential runner.

use std::time::Duration;

use monthend::runner::{read_run_log, ProcessLauncher, Runner, StageOutcome, StageLauncher};
use monthend::Stage;

use crate::fixtures::{names, scripted_launcher, stderr, stdout, Workspace};

#[test]
fn test_full_pipeline_through_binary() {
    let ws = Workspace::new();
    let output = ws.run(&[], false);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    for stage in Stage::ALL {
        assert_eq!(
            text.matches(&format!("{} completed successfully.", stage.id()))
                .count(),
            1,
            "{}",
            stage
        );
        assert_eq!(
            text.matches(&format!("{}: HEADLESS summary written", stage.id()))
                .count(),
            1
        );
        assert_eq!(ws.summary(stage.id()).items.len(), stage.tasks().len());
    }

    let log = read_run_log(&ws.output.join("logs.json")).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].stages, Stage::all_ids());
    assert_eq!(log[0].results.len(), 8);
    assert!(log[0].results.iter().all(|r| r.success && r.exit == Some(0)));
}

#[test]
fn test_failing_stage_stops_the_binary() {
    let ws = Workspace::new();
    // Stages cannot create their output directory over a regular file
    std::fs::write(&ws.output, "not a directory").unwrap();

    let output = ws.run(&[], false);
    assert_eq!(output.status.code(), Some(1));

    let text = stdout(&output);
    assert!(text.contains("Error occurred while running 1preliminary: exit status 1"));
    assert!(text.contains("Error: IO error:"), "{text}");
    assert!(!text.contains("Io(Os"));
    assert!(!text.contains("completed successfully."));
    for stage in &Stage::ALL[1..] {
        assert!(!text.contains(stage.id()), "{} should not have run", stage);
    }
    assert!(stderr(&output).contains("Warning: failed to write run log"));
}

#[test]
fn test_run_only_subset_in_given_order() {
    let ws = Workspace::new();
    let output = ws.run(&["run", "--only", "3,1preliminary"], false);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let ap = text.find("3AccountsPayable completed").unwrap();
    let pre = text.find("1preliminary completed").unwrap();
    assert!(ap < pre);
    assert!(!ws.output.join("2AccountsReceivable.json").exists());

    let log = read_run_log(&ws.output.join("logs.json")).unwrap();
    assert_eq!(log[0].stages, names(&["3AccountsPayable", "1preliminary"]));
}

#[test]
fn test_run_only_unknown_stage_runs_nothing() {
    let ws = Workspace::new();
    let output = ws.run(&["run", "--only", "1,Payroll"], false);
    assert!(!output.status.success());
    assert!(!ws.output.join("1preliminary.json").exists());
}

#[test]
fn test_run_log_accumulates_across_runs() {
    let ws = Workspace::new();
    assert!(ws.run(&["run", "--only", "1"], false).status.success());
    assert!(ws.run(&["run", "--only", "8"], false).status.success());

    let log = read_run_log(&ws.output.join("logs.json")).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].stages, names(&["8LockClosePeriod"]));
}

#[tokio::test]
async fn test_scripted_pass_fail_pass_stops_at_failure() {
    let ws = Workspace::new();
    let runner = Runner::new(scripted_launcher(&ws, &[("B", 3)]));
    let mut out = Vec::new();

    let report = runner.run(&names(&["A", "B", "C"]), &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(ws.invocations(), names(&["A", "B"]));
    assert!(!report.success());
    assert_ne!(report.exit_code(), 0);
    assert_eq!(report.failed_stage(), Some("B"));
    assert!(text.contains("A ok"));
    assert!(text.contains("B broke"));
    assert!(text.contains("Error occurred while running B: exit status 3"));
    assert!(!text.contains("C ok"));
}

#[tokio::test]
async fn test_scripted_all_pass_prints_each_once() {
    let ws = Workspace::new();
    let stages = ["A", "B", "C", "D"];
    let runner = Runner::new(scripted_launcher(&ws, &[]));
    let mut out = Vec::new();

    let report = runner.run(&names(&stages), &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(report.success());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(ws.invocations(), names(&stages));
    for stage in stages {
        assert_eq!(text.matches(&format!("{stage} ok")).count(), 1);
    }
}

#[tokio::test]
async fn test_headless_flag_reaches_stage_processes() {
    let ws = Workspace::new();
    let launcher = scripted_launcher(&ws, &[]);
    let output = launcher.launch("A").await;
    assert!(output.success(), "{:?}", output);
    assert_eq!(output.stdout, "A ok\n");
}

#[tokio::test]
async fn test_timeout_kills_stage() {
    let launcher = ProcessLauncher::new("sh")
        .with_args(["-c", "sleep 5", "sh"])
        .with_timeout(Some(Duration::from_millis(200)));

    let started = std::time::Instant::now();
    let output = launcher.launch("slow").await;

    assert_eq!(
        output.outcome,
        StageOutcome::TimedOut(Duration::from_millis(200))
    );
    assert!(!output.success());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_missing_program_is_a_failed_stage() {
    let launcher = ProcessLauncher::new("/nonexistent/monthend-stage");
    let output = launcher.launch("A").await;
    assert!(matches!(output.outcome, StageOutcome::SpawnFailed(_)));
    assert_eq!(output.exit_code(), None);
}

#[tokio::test]
async fn test_signal_death_is_a_failure() {
    let launcher = ProcessLauncher::new("sh").with_args(["-c", "kill -9 $$", "sh"]);
    let output = launcher.launch("A").await;
    assert_eq!(output.outcome, StageOutcome::Exited(None));
    assert!(!output.success());
}
