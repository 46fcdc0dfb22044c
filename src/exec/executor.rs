// src/exec/executor.rs

//! Dependency-aware build scheduling.
//!
//! The executor walks a topologically sorted [`Dag`], skips targets whose
//! outputs exist and whose signature matches the [`Cache`], and runs the
//! rest through a [`CommandRunner`] with bounded parallelism. The graph is
//! read-only during execution; the cache and the scheduler's own
//! coordination state are the only shared mutable pieces.

use std::collections::HashMap;
use std::fs::File;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::cache::Cache;
use crate::dag::Dag;
use crate::exec::runner::{CommandRunner, SystemCommandRunner};
use crate::exec::status::{Status, StatusPrinter};
use crate::signature;
use crate::target::Target;

/// Invoked as `(target_name, current, total, status)`, where `current` is a
/// 1-based sequence number among dispatched targets and `status` is one of
/// the [`Status`] strings.
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize, &str) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of parallel worker threads, at least 1.
    pub jobs: usize,
    /// Report work as successful without invoking the command runner.
    pub dry_run: bool,
    /// Include commands in status output.
    pub verbose: bool,
    /// Abort the build on the first failed target. When off, dependents of
    /// a failed target still run once their dependencies have finished and
    /// may therefore see stale or missing inputs.
    pub stop_on_error: bool,
    /// ANSI colors in status output.
    pub color_output: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            dry_run: false,
            verbose: false,
            stop_on_error: true,
            color_output: true,
        }
    }
}

/// Counters for one execution. The skipped/built/failed partition sums to
/// at most `total`; `elapsed` is measured with a monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub total: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BuildStats {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// What happened to one dispatched target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Built,
    Failed,
    /// The cancel flag was observed before the target ran. Counts neither
    /// as built nor as failed; the overall result is failure regardless.
    Cancelled,
}

/// Shared scheduler state for the multi-threaded strategy, guarded by a
/// single mutex. Status printing has its own lock and is never nested with
/// this one.
struct WorkState {
    completed: HashMap<String, bool>,
    in_progress: HashMap<String, bool>,
    built: usize,
    skipped: usize,
    failed: usize,
}

impl WorkState {
    fn new(order: &[String]) -> Self {
        Self {
            completed: order.iter().map(|name| (name.clone(), false)).collect(),
            in_progress: order.iter().map(|name| (name.clone(), false)).collect(),
            built: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn all_done(&self) -> bool {
        self.completed.values().all(|done| *done)
    }

    /// First target in topological order that is neither completed nor in
    /// progress and whose every declared dependency is completed. A
    /// dependency that *failed* still counts as completed; it does not
    /// re-gate dependents.
    fn first_ready(&self, dag: &Dag, order: &[String]) -> Option<String> {
        order
            .iter()
            .find(|name| {
                !self.completed.get(name.as_str()).copied().unwrap_or(true)
                    && !self.in_progress.get(name.as_str()).copied().unwrap_or(true)
                    && dag
                        .dependencies(name)
                        .iter()
                        .all(|dep| self.completed.get(dep).copied().unwrap_or(false))
            })
            .cloned()
    }
}

pub struct Executor {
    config: ExecutorConfig,
    runner: Arc<dyn CommandRunner>,
    progress: Option<ProgressCallback>,
    cancelled: AtomicBool,
    status: StatusPrinter,
}

impl Executor {
    /// Executor with default configuration and the given worker count.
    pub fn new(jobs: usize) -> Self {
        Self::with_config(ExecutorConfig {
            jobs: jobs.max(1),
            ..ExecutorConfig::default()
        })
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemCommandRunner::new()))
    }

    pub fn with_runner(config: ExecutorConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let status = StatusPrinter::new(config.color_output, config.verbose);
        Self {
            config,
            runner,
            progress: None,
            cancelled: AtomicBool::new(false),
            status,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn set_progress_callback(
        &mut self,
        callback: impl Fn(&str, usize, usize, &str) + Send + Sync + 'static,
    ) {
        self.progress = Some(Box::new(callback));
    }

    /// Request cooperative cancellation: no new target starts, in-flight
    /// commands finish, workers drain. Callable from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reset_cancelled(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Execute the build. Returns `true` iff no target failed and the build
    /// was not cancelled.
    pub fn execute(&self, dag: &Dag, cache: &Cache) -> bool {
        self.execute_with_stats(dag, cache).0
    }

    pub fn execute_with_stats(&self, dag: &Dag, cache: &Cache) -> (bool, BuildStats) {
        let started = Instant::now();
        let mut stats = BuildStats::default();

        let success = if self.config.jobs <= 1 {
            self.execute_single_threaded(dag, cache, &mut stats)
        } else {
            self.execute_multi_threaded(dag, cache, &mut stats)
        };
        // A cancelled build fails as a whole even when no target failed.
        let success = success && !self.is_cancelled();

        stats.elapsed = started.elapsed();
        info!(
            total = stats.total,
            built = stats.built,
            skipped = stats.skipped,
            failed = stats.failed,
            success,
            "build finished"
        );
        (success, stats)
    }

    fn execute_single_threaded(&self, dag: &Dag, cache: &Cache, stats: &mut BuildStats) -> bool {
        let order = dag.topological_sort();
        stats.total = order.len();
        info!(targets = order.len(), jobs = 1, "starting build");

        for (index, name) in order.iter().enumerate() {
            let target = match dag.get(name) {
                Some(target) => target,
                None => continue,
            };

            match self.process_target(target, cache, index + 1, order.len()) {
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Built => stats.built += 1,
                Outcome::Failed => {
                    stats.failed += 1;
                    if self.config.stop_on_error {
                        return false;
                    }
                }
                Outcome::Cancelled => return false,
            }
        }

        stats.failed == 0
    }

    fn execute_multi_threaded(&self, dag: &Dag, cache: &Cache, stats: &mut BuildStats) -> bool {
        let order = dag.topological_sort();
        stats.total = order.len();
        info!(targets = order.len(), jobs = self.config.jobs, "starting build");

        let state = Mutex::new(WorkState::new(&order));
        let ready = Condvar::new();
        let failed = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..self.config.jobs {
                scope.spawn(|| {
                    self.worker(dag, cache, &order, &state, &ready, &failed, &processed);
                });
            }
        });

        let state = state.into_inner().unwrap();
        stats.built = state.built;
        stats.skipped = state.skipped;
        stats.failed = state.failed;

        !failed.load(Ordering::SeqCst)
    }

    /// Worker loop for the multi-threaded strategy: wait for a ready
    /// target, run it outside the lock, publish the outcome, notify
    /// everyone. Exits on cancellation, on failure with stop-on-error, or
    /// once every target is completed.
    #[allow(clippy::too_many_arguments)]
    fn worker(
        &self,
        dag: &Dag,
        cache: &Cache,
        order: &[String],
        state: &Mutex<WorkState>,
        ready: &Condvar,
        failed: &AtomicBool,
        processed: &AtomicUsize,
    ) {
        let total = order.len();

        loop {
            let name = {
                let mut guard = state.lock().unwrap();
                loop {
                    if self.is_cancelled() {
                        return;
                    }
                    if failed.load(Ordering::SeqCst) && self.config.stop_on_error {
                        return;
                    }
                    if guard.all_done() {
                        return;
                    }
                    if let Some(name) = guard.first_ready(dag, order) {
                        guard.in_progress.insert(name.clone(), true);
                        break name;
                    }
                    guard = ready.wait(guard).unwrap();
                }
            };

            let outcome = match dag.get(&name) {
                Some(target) => {
                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.process_target(target, cache, current, total)
                }
                // Not reachable with an order derived from the same map,
                // but a missing entry must still complete or the predicate
                // would never drain.
                None => Outcome::Skipped,
            };

            let mut guard = state.lock().unwrap();
            guard.in_progress.insert(name.clone(), false);
            guard.completed.insert(name.clone(), true);
            match outcome {
                Outcome::Skipped => guard.skipped += 1,
                Outcome::Built => guard.built += 1,
                Outcome::Failed => {
                    guard.failed += 1;
                    failed.store(true, Ordering::SeqCst);
                }
                Outcome::Cancelled => {}
            }
            drop(guard);
            ready.notify_all();
        }
    }

    /// Per-target processing, identical for both strategies. Emits the
    /// BUILDING progress event on entry and exactly one terminal status.
    /// The cache entry is written only after the command has succeeded; a
    /// failed command leaves it untouched.
    fn process_target(
        &self,
        target: &Target,
        cache: &Cache,
        current: usize,
        total: usize,
    ) -> Outcome {
        if self.is_cancelled() {
            debug!(target = %target.name(), "cancelled before dispatch");
            return Outcome::Cancelled;
        }

        self.report(target.name(), current, total, Status::Building);

        if Self::outputs_exist(target) && !self.out_of_date(target, cache) {
            self.status.print(Status::UpToDate, target.name(), None);
            self.report(target.name(), current, total, Status::UpToDate);
            return Outcome::Skipped;
        }

        self.status
            .print(Status::Build, target.name(), Some(target.command()));

        if !self.run_command(target.command()) {
            self.status.print(Status::Failed, target.name(), None);
            self.report(target.name(), current, total, Status::Failed);
            return Outcome::Failed;
        }

        let fresh = signature::target_signature(target.command(), target.inputs());
        cache.set(target.name(), fresh);

        self.status.print(Status::Success, target.name(), None);
        self.report(target.name(), current, total, Status::Success);
        Outcome::Built
    }

    /// A missing output forces a rebuild even when the signature matches;
    /// this is how externally deleted outputs are recovered.
    fn outputs_exist(target: &Target) -> bool {
        target
            .outputs()
            .iter()
            .all(|output| File::open(output).is_ok())
    }

    fn out_of_date(&self, target: &Target, cache: &Cache) -> bool {
        let current = signature::target_signature(target.command(), target.inputs());
        cache.needs_rebuild(target.name(), &current)
    }

    fn run_command(&self, command: &str) -> bool {
        if self.config.dry_run {
            return true;
        }
        self.runner.run_simple(command)
    }

    fn report(&self, name: &str, current: usize, total: usize, status: Status) {
        if let Some(callback) = &self.progress {
            callback(name, current, total, status.as_str());
        }
    }
}
