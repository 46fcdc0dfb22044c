use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::tempdir;

use mimir::exec::{CommandOptions, CommandResult, CommandRunner, MockCommandRunner, SystemCommandRunner};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn system_runner_reports_success_and_failure() {
    let runner = SystemCommandRunner::new();
    assert!(runner.run_simple("true"));
    assert!(!runner.run_simple("false"));
}

#[test]
fn system_runner_surfaces_exit_codes() {
    let runner = SystemCommandRunner::new();
    let result = runner.run("exit 3", &CommandOptions::default());
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[test]
fn system_runner_captures_output() {
    let runner = SystemCommandRunner::new();
    let result = runner.run(
        "echo hello; echo oops >&2",
        &CommandOptions {
            capture_output: true,
            ..CommandOptions::default()
        },
    );

    assert!(result.success());
    assert!(result.stdout.contains("hello"));
    assert!(result.stderr.contains("oops"));
}

#[test]
fn system_runner_honours_working_dir() -> TestResult {
    let dir = tempdir()?;
    let runner = SystemCommandRunner::new();

    let result = runner.run(
        "touch created.txt",
        &CommandOptions {
            working_dir: Some(dir.path().to_path_buf()),
            ..CommandOptions::default()
        },
    );

    assert!(result.success());
    assert!(dir.path().join("created.txt").is_file());
    Ok(())
}

#[test]
fn command_result_success_requires_zero_exit_and_no_timeout() {
    let ok = CommandResult::default();
    assert!(ok.success());

    let nonzero = CommandResult {
        exit_code: 1,
        ..CommandResult::default()
    };
    assert!(!nonzero.success());

    let timed_out = CommandResult {
        timed_out: true,
        ..CommandResult::default()
    };
    assert!(!timed_out.success());
}

#[test]
fn mock_runner_defaults_to_success() {
    let runner = MockCommandRunner::new();
    assert!(runner.run_simple("anything"));
}

#[test]
fn mock_runner_uses_configured_default_result() {
    let runner = MockCommandRunner::new();
    runner.set_default_result(CommandResult {
        exit_code: 7,
        ..CommandResult::default()
    });

    assert!(!runner.run_simple("anything"));
    assert_eq!(
        runner.run("anything", &CommandOptions::default()).exit_code,
        7
    );
}

#[test]
fn mock_runner_scripts_results_per_command() {
    let runner = MockCommandRunner::new();
    runner.set_result_for(
        "make lib",
        CommandResult {
            exit_code: 1,
            ..CommandResult::default()
        },
    );

    assert!(!runner.run_simple("make lib"));
    assert!(runner.run_simple("make app"));
}

#[test]
fn mock_runner_handler_takes_precedence() {
    let runner = MockCommandRunner::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    runner.set_handler(move |command, _options| {
        seen.fetch_add(1, Ordering::SeqCst);
        CommandResult {
            exit_code: i32::from(command.contains("fail")),
            ..CommandResult::default()
        }
    });

    assert!(runner.run_simple("ok"));
    assert!(!runner.run_simple("please fail"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn mock_runner_tracks_invocations_and_resets() {
    let runner = MockCommandRunner::new();
    runner.run_simple("first");
    runner.run_simple("second");

    assert_eq!(runner.command_count(), 2);
    assert_eq!(runner.last_command(), "second");

    runner.reset();
    assert_eq!(runner.command_count(), 0);
    assert_eq!(runner.last_command(), "");
}
