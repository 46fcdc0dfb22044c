use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use mimir::cache::Cache;
use mimir::dag::Dag;
use mimir::exec::{CommandResult, Executor, ExecutorConfig, MockCommandRunner};
use mimir::signature::target_signature;
use mimir::target::Target;

mod common;
use common::{cmd_target, copy_target, write_file};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn quiet_config(jobs: usize) -> ExecutorConfig {
    ExecutorConfig {
        jobs,
        color_output: false,
        ..ExecutorConfig::default()
    }
}

fn mock_executor(jobs: usize) -> (Executor, Arc<MockCommandRunner>) {
    let runner = Arc::new(MockCommandRunner::new());
    let executor = Executor::with_runner(quiet_config(jobs), runner.clone());
    (executor, runner)
}

/// Record `(name, status)` progress events into a shared vector.
fn record_events(executor: &mut Executor) -> Arc<Mutex<Vec<(String, String)>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    executor.set_progress_callback(move |name, _current, _total, status| {
        sink.lock().unwrap().push((name.to_string(), status.to_string()));
    });
    events
}

fn event_index(events: &[(String, String)], name: &str, status: &str) -> usize {
    events
        .iter()
        .position(|(n, s)| n == name && s == status)
        .unwrap_or_else(|| panic!("no {status} event for {name} in {events:?}"))
}

#[test]
fn empty_dag_builds_successfully() {
    let dag = Dag::new();
    let cache = Cache::new("unused");

    for jobs in [1, 4] {
        let (executor, runner) = mock_executor(jobs);
        let (success, stats) = executor.execute_with_stats(&dag, &cache);
        assert!(success);
        assert_eq!(stats.total, 0);
        assert_eq!(runner.command_count(), 0);
    }
}

#[test]
fn single_target_runs_and_is_counted() {
    let mut dag = Dag::new();
    dag.add(cmd_target("hello", "echo hello"));
    let cache = Cache::new("unused");

    let (executor, runner) = mock_executor(1);
    let (success, stats) = executor.execute_with_stats(&dag, &cache);

    assert!(success);
    assert_eq!(stats.built, 1);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(runner.command_count(), 1);
    assert_eq!(runner.last_command(), "echo hello");
}

#[test]
fn successful_run_records_the_fresh_signature() -> TestResult {
    let dir = tempdir()?;
    let input = dir.path().join("in.txt");
    write_file(&input, "payload");
    let inputs = vec![input.to_string_lossy().into_owned()];

    let mut dag = Dag::new();
    dag.add(
        Target::new("sign-me")
            .with_command("true")
            .with_inputs(inputs.clone()),
    );
    let cache = Cache::new("unused");

    let (executor, _runner) = mock_executor(1);
    assert!(executor.execute(&dag, &cache));

    assert_eq!(cache.find("sign-me"), Some(target_signature("true", &inputs)));
    Ok(())
}

#[test]
fn failed_command_leaves_cache_entry_untouched() {
    let mut dag = Dag::new();
    dag.add(cmd_target("flaky", "does-not-matter"));

    let cache = Cache::new("unused");
    cache.set("flaky", "previous-signature");

    let (executor, runner) = mock_executor(1);
    runner.set_default_result(CommandResult {
        exit_code: 1,
        ..CommandResult::default()
    });

    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(!success);
    assert_eq!(stats.failed, 1);
    assert_eq!(cache.get("flaky"), "previous-signature");
}

#[test]
fn stop_on_error_prevents_later_targets() {
    // B depends on A, so the dispatch order is fixed even though tie-break
    // order among independents is not.
    let mut dag = Dag::new();
    dag.add(cmd_target("A", "first"));
    dag.add(cmd_target("B", "second").with_dependencies(vec!["A".into()]));

    for jobs in [1, 2] {
        let (executor, runner) = mock_executor(jobs);
        runner.set_result_for(
            "first",
            CommandResult {
                exit_code: 1,
                ..CommandResult::default()
            },
        );

        let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());
        assert!(!success, "jobs={jobs}");
        assert_eq!(stats.failed, 1, "jobs={jobs}");
        assert_eq!(stats.built, 0, "jobs={jobs}");
        assert_eq!(runner.command_count(), 1, "jobs={jobs}");
    }
}

#[test]
fn keep_going_runs_dependents_of_failed_targets() {
    let mut dag = Dag::new();
    dag.add(cmd_target("A", "first"));
    dag.add(cmd_target("B", "second").with_dependencies(vec!["A".into()]));

    let runner = Arc::new(MockCommandRunner::new());
    runner.set_result_for(
        "first",
        CommandResult {
            exit_code: 1,
            ..CommandResult::default()
        },
    );
    let executor = Executor::with_runner(
        ExecutorConfig {
            jobs: 1,
            stop_on_error: false,
            color_output: false,
            ..ExecutorConfig::default()
        },
        runner.clone(),
    );

    let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());

    // The failed dependency still counts as completed, so B runs anyway.
    assert!(!success);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.built, 1);
    assert_eq!(runner.command_count(), 2);
}

#[test]
fn dry_run_reports_success_without_invoking_the_runner() {
    let mut dag = Dag::new();
    dag.add(cmd_target("pretend", "echo pretend"));
    let cache = cache_for_test();

    let runner = Arc::new(MockCommandRunner::new());
    let executor = Executor::with_runner(
        ExecutorConfig {
            jobs: 1,
            dry_run: true,
            color_output: false,
            ..ExecutorConfig::default()
        },
        runner.clone(),
    );

    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!(stats.built, 1);
    assert_eq!(runner.command_count(), 0);
    // Dry-run successes record their signature like real ones.
    assert!(cache.find("pretend").is_some());
}

#[test]
fn cancellation_before_execution_fails_the_build() {
    let mut dag = Dag::new();
    dag.add(cmd_target("never", "echo never"));

    for jobs in [1, 2] {
        let (executor, runner) = mock_executor(jobs);
        executor.cancel();

        let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());
        assert!(!success, "jobs={jobs}");
        assert_eq!(stats.built, 0, "jobs={jobs}");
        assert_eq!(stats.failed, 0, "jobs={jobs}");
        assert_eq!(runner.command_count(), 0, "jobs={jobs}");

        executor.reset_cancelled();
        assert!(!executor.is_cancelled());
    }
}

#[test]
fn diamond_respects_dependency_order_under_parallelism() {
    // S2: A -> {B, C} -> D with two workers.
    let mut dag = Dag::new();
    dag.add(cmd_target("A", "a"));
    dag.add(cmd_target("B", "b").with_dependencies(vec!["A".into()]));
    dag.add(cmd_target("C", "c").with_dependencies(vec!["A".into()]));
    dag.add(cmd_target("D", "d").with_dependencies(vec!["B".into(), "C".into()]));

    let runner = Arc::new(MockCommandRunner::new());
    let mut executor = Executor::with_runner(quiet_config(2), runner.clone());
    let events = record_events(&mut executor);

    let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());
    assert!(success);
    assert_eq!(stats.built, 4);

    let events = events.lock().unwrap();
    let success_a = event_index(&events, "A", "SUCCESS");
    let success_b = event_index(&events, "B", "SUCCESS");
    let success_c = event_index(&events, "C", "SUCCESS");

    assert!(success_a < event_index(&events, "B", "BUILDING"));
    assert!(success_a < event_index(&events, "C", "BUILDING"));
    assert!(success_b < event_index(&events, "D", "BUILDING"));
    assert!(success_c < event_index(&events, "D", "BUILDING"));
}

#[test]
fn parallel_independent_targets_all_build() {
    let mut dag = Dag::new();
    for i in 0..6 {
        dag.add(cmd_target(&format!("t{i}"), &format!("cmd{i}")));
    }

    let runner = Arc::new(MockCommandRunner::new());
    let mut executor = Executor::with_runner(quiet_config(4), runner.clone());

    let currents = Arc::new(Mutex::new(Vec::new()));
    let sink = currents.clone();
    executor.set_progress_callback(move |_name, current, total, status| {
        if status == "BUILDING" {
            sink.lock().unwrap().push((current, total));
        }
    });

    let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());
    assert!(success);
    assert_eq!(stats.built, 6);
    assert_eq!(runner.command_count(), 6);

    // Dispatch numbers are 1-based and unique; totals are constant.
    let currents = currents.lock().unwrap();
    let seen: HashSet<usize> = currents.iter().map(|(current, _)| *current).collect();
    assert_eq!(seen, (1..=6).collect());
    assert!(currents.iter().all(|(_, total)| *total == 6));
}

#[test]
fn progress_events_are_sequential_in_single_threaded_mode() {
    let mut dag = Dag::new();
    dag.add(cmd_target("A", "a"));
    dag.add(cmd_target("B", "b").with_dependencies(vec!["A".into()]));
    dag.add(cmd_target("C", "c").with_dependencies(vec!["B".into()]));

    let runner = Arc::new(MockCommandRunner::new());
    let mut executor = Executor::with_runner(quiet_config(1), runner.clone());

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    executor.set_progress_callback(move |name, current, total, status| {
        sink.lock()
            .unwrap()
            .push((name.to_string(), current, total, status.to_string()));
    });

    assert!(executor.execute(&dag, &cache_for_test()));

    let events = events.lock().unwrap();
    assert_eq!(
        events
            .iter()
            .filter(|(_, _, _, status)| status == "BUILDING")
            .map(|(name, current, total, _)| (name.as_str(), *current, *total))
            .collect::<Vec<_>>(),
        vec![("A", 1, 3), ("B", 2, 3), ("C", 3, 3)]
    );
}

#[test]
fn incremental_rebuild_cycle() -> TestResult {
    // S6 with a real shell: build, skip, rebuild on input change, rebuild
    // on output deletion.
    let dir = tempdir()?;
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    write_file(&input, "v1");

    let mut dag = Dag::new();
    dag.add(copy_target("copy", &input, &output));
    let cache = cache_for_test();
    let executor = Executor::with_config(quiet_config(1));

    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!((stats.built, stats.skipped), (1, 0));
    assert_eq!(fs::read_to_string(&output)?, "v1");

    // Unchanged: skipped, and the old signature stays in place.
    let before = cache.get("copy");
    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!((stats.built, stats.skipped), (0, 1));
    assert_eq!(cache.get("copy"), before);

    // Input change: rebuilt.
    write_file(&input, "v2");
    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!((stats.built, stats.skipped), (1, 0));
    assert_eq!(fs::read_to_string(&output)?, "v2");

    // Output deleted externally: rebuilt even though the signature matches.
    fs::remove_file(&output)?;
    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!((stats.built, stats.skipped), (1, 0));
    assert!(output.is_file());
    Ok(())
}

#[test]
fn chained_targets_build_then_skip() -> TestResult {
    // S1 end-to-end: three chained copies, then a fully skipped second run.
    let dir = tempdir()?;
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    write_file(&a, "seed");

    let mut dag = Dag::new();
    dag.add(copy_target("make-b", &a, &b));
    let mut make_c = copy_target("make-c", &b, &c);
    make_c.push_dependency("make-b");
    dag.add(make_c);

    let cache = cache_for_test();
    let executor = Executor::with_config(quiet_config(1));

    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!(stats.built, 2);
    assert_eq!(fs::read_to_string(&c)?, "seed");

    let (success, stats) = executor.execute_with_stats(&dag, &cache);
    assert!(success);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.built, 0);
    Ok(())
}

#[test]
fn stats_partition_never_exceeds_total() {
    let mut dag = Dag::new();
    dag.add(cmd_target("ok", "fine"));
    dag.add(cmd_target("bad", "broken"));

    let runner = Arc::new(MockCommandRunner::new());
    runner.set_result_for(
        "broken",
        CommandResult {
            exit_code: 2,
            ..CommandResult::default()
        },
    );
    let executor = Executor::with_runner(
        ExecutorConfig {
            jobs: 2,
            stop_on_error: false,
            color_output: false,
            ..ExecutorConfig::default()
        },
        runner,
    );

    let (success, stats) = executor.execute_with_stats(&dag, &cache_for_test());
    assert!(!success);
    assert_eq!(stats.total, 2);
    assert!(stats.built + stats.skipped + stats.failed <= stats.total);
    assert_eq!(stats.failed, 1);
}

fn cache_for_test() -> Cache {
    Cache::new("unused-cache-dir")
}
