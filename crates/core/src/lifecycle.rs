//! Lifecycle coordinator for concurrently launched tasks.
//!
//! A [`Lifecycle`] is a completion counter. Callers register intent with
//! [`Lifecycle::add`] *before* launching a task and the task signals
//! [`Lifecycle::done`] when it exits; [`Lifecycle::wait`] blocks until the
//! counter is back at zero. Registering inside the task would let `wait`
//! observe zero before every task had started.
//!
//! [`Lifecycle::spawn`] does both halves for a future and also records
//! failures (an `Err` result or a panic) so the owner can surface them once
//! everything has drained.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// A tracked task that did not finish cleanly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("task '{task}' failed: {message}")]
pub struct TaskFailure {
    pub task: String,
    pub message: String,
}

#[derive(Default)]
struct Inner {
    outstanding: AtomicUsize,
    notify: Notify,
    failures: Mutex<Vec<TaskFailure>>,
}

impl Inner {
    fn done(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        if previous == 0 {
            // Mirrors a negative wait-group counter: a wiring bug, not a data problem.
            panic!("Lifecycle::done called more times than Lifecycle::add");
        }
        if previous == 1 {
            self.notify.notify_waiters();
        }
    }

    fn record(&self, failure: TaskFailure) {
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
    }
}

/// Tracks outstanding tasks and lets the owner wait for all of them.
///
/// Cheaply cloneable; clones share the same counter.
#[derive(Clone, Default)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` tasks that are about to be launched.
    pub fn add(&self, n: usize) {
        self.inner.outstanding.fetch_add(n, Ordering::AcqRel);
    }

    /// Signal that one registered task has finished.
    ///
    /// # Panics
    ///
    /// Panics if called more times than [`Lifecycle::add`] registered.
    pub fn done(&self) {
        self.inner.done();
    }

    /// Number of registered tasks that have not yet finished.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Register and launch a task on the tokio runtime.
    ///
    /// The counter is incremented before the task is spawned. The returned
    /// handle completes after the task's failure (if any) has been recorded
    /// and the counter decremented.
    pub fn spawn<F, E>(&self, task: impl Into<String>, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.add(1);

        let inner = Arc::clone(&self.inner);
        let task = task.into();
        let work = tokio::spawn(fut);

        tokio::spawn(async move {
            let failure = match work.await {
                Ok(Ok(())) => {
                    debug!("Task {} finished", task);
                    None
                }
                Ok(Err(e)) => {
                    error!("Task {} failed: {}", task, e);
                    Some(e.to_string())
                }
                Err(e) if e.is_panic() => {
                    error!("Task {} panicked", task);
                    Some("task panicked".to_string())
                }
                Err(e) => {
                    error!("Task {} was aborted: {}", task, e);
                    Some(e.to_string())
                }
            };

            if let Some(message) = failure {
                inner.record(TaskFailure { task, message });
            }
            inner.done();
        })
    }

    /// Wait until every registered task has signalled completion.
    ///
    /// Returns the first recorded failure, if any task failed.
    pub async fn wait(&self) -> Result<(), TaskFailure> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register for the wakeup before checking, so a `done` racing
            // with this check cannot be missed.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                break;
            }
            notified.await;
        }

        match self.failures().into_iter().next() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// All failures recorded so far.
    pub fn failures(&self) -> Vec<TaskFailure> {
        match self.inner.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}
