//! Stress helpers for concurrent transactions.
//!
//! Many threads share one manager and store, each running its own
//! transactions. Isolation violations are reported as failed operations.

use crate::fixtures::TestHarness;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total transactions run.
    pub total_txns: usize,
    /// Transactions whose checks all held.
    pub successful_txns: usize,
    /// Transactions that errored or saw foreign state.
    pub failed_txns: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        Self {
            total_txns: successful + failed,
            successful_txns: successful,
            failed_txns: failed,
            duration,
        }
    }

    /// Returns transactions per second.
    pub fn txns_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_txns as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Transactions per thread.
    pub txns_per_thread: usize,
    /// Children created under each root.
    pub children_per_root: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            txns_per_thread: 50,
            children_per_root: 3,
        }
    }
}

/// Runs concurrent create / get / remove transactions against `harness`.
///
/// Each transaction creates a root with children, checks that lookups
/// return the instances it created and that the children are visible,
/// then removes the root (cascading) and commits.
pub fn concurrent_lifecycle(harness: Arc<TestHarness>, config: &StressConfig) -> StressTestResult {
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|worker| {
            let harness = Arc::clone(&harness);
            let successes = Arc::clone(&successes);
            let failures = Arc::clone(&failures);
            let config = config.clone();

            thread::spawn(move || {
                for _ in 0..config.txns_per_thread {
                    if run_one(&harness, worker, config.children_per_root) {
                        successes.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            failures.fetch_add(config.txns_per_thread, Ordering::Relaxed);
        }
    }

    StressTestResult::new(
        successes.load(Ordering::Relaxed),
        failures.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

fn run_one(harness: &TestHarness, worker: usize, children: usize) -> bool {
    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, &format!("worker{worker}"));
    let created: Vec<_> = (0..children)
        .map(|_| harness.create_child(&mut txn, &root, "child"))
        .collect();

    let isolated = created.iter().all(|child| {
        harness
            .get(&mut txn, child.id())
            .is_ok_and(|found| Arc::ptr_eq(&found, child))
    });
    let visible = harness
        .children(&mut txn, root.id())
        .is_ok_and(|found| found.len() == children);
    let removed = harness.remove(&mut txn, &root, false).is_ok()
        && created.iter().all(|child| child.is_removed());

    let ok = isolated && visible && removed;
    if ok {
        harness.commit(&mut txn).is_ok()
    } else {
        tracing::warn!(worker, txn = %txn.id(), isolated, visible, removed, "stress transaction failed");
        if let Err(err) = harness.rollback(&mut txn) {
            tracing::warn!(worker, error = %err, "stress rollback failed");
        }
        false
    }
}
