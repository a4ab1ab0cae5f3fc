//! Periodic scheduling: a cancelable fixed-rate driver abstraction, the shared worker pool that
//! implements it, and the per-display animation scheduler built on top.

pub mod pool;
pub mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub use pool::TickPool;
pub use scheduler::{AnimationOpts, AnimationScheduler, TickOutcome};

/// Work item run on every firing of a fixed-rate schedule.
pub type TickTask = Arc<dyn Fn() + Send + Sync>;

/// Runs tasks at a fixed rate until their handle is cancelled.
pub trait TickDriver: Send + Sync {
    /// Run `task` after `initial_delay`, then every `interval`.
    fn schedule_fixed_rate(
        &self,
        initial_delay: Duration,
        interval: Duration,
        task: TickTask,
    ) -> TickHandle;
}

/// Driver-specific cancellation hook behind a [`TickHandle`].
pub trait Schedule: Send + Sync {
    fn cancel(&self) -> bool;
    fn is_cancelled(&self) -> bool;
}

/// Cancellation handle for one schedule.
pub struct TickHandle(Box<dyn Schedule>);

impl TickHandle {
    pub fn new(schedule: impl Schedule + 'static) -> Self {
        Self(Box::new(schedule))
    }

    /// Stop future firings. A firing already running is not interrupted.
    ///
    /// Returns `false` when the schedule was already cancelled or its driver is gone.
    pub fn cancel(&self) -> bool {
        self.0.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Driver that fires only when told to.
///
/// Delays and intervals are ignored; every [`ManualTicker::fire`] runs each live task once on the
/// calling thread. Handy for deterministic tests and offline stepping.
#[derive(Default)]
pub struct ManualTicker {
    tasks: Mutex<Vec<(Arc<AtomicBool>, TickTask)>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live task once. Returns how many ran.
    pub fn fire(&self) -> usize {
        let live: Vec<TickTask> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.retain(|(cancelled, _)| !cancelled.load(Ordering::Acquire));
            tasks.iter().map(|(_, task)| task.clone()).collect()
        };
        for task in &live {
            task();
        }
        live.len()
    }

    /// Fire `n` times in a row.
    pub fn fire_n(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }

    pub fn live(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(cancelled, _)| !cancelled.load(Ordering::Acquire))
            .count()
    }
}

impl std::fmt::Debug for ManualTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTicker")
            .field("live", &self.live())
            .finish()
    }
}

struct ManualSchedule(Arc<AtomicBool>);

impl Schedule for ManualSchedule {
    fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl TickDriver for ManualTicker {
    fn schedule_fixed_rate(
        &self,
        _initial_delay: Duration,
        _interval: Duration,
        task: TickTask,
    ) -> TickHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((cancelled.clone(), task));
        TickHandle::new(ManualSchedule(cancelled))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/mod.rs"]
mod tests;
