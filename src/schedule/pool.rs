use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::foundation::error::{TileReelError, TileReelResult};
use crate::schedule::{Schedule, TickDriver, TickHandle, TickTask};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Entry {
    task: TickTask,
    interval: Duration,
}

#[derive(Default)]
struct State {
    // (deadline, task id); ids missing from `entries` are cancelled and skipped.
    queue: BinaryHeap<Reverse<(Instant, u64)>>,
    entries: HashMap<u64, Entry>,
    next_id: u64,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Small fixed set of worker threads that run cancelable fixed-rate tasks.
///
/// Each task has at most one pending firing, so a task never overlaps with itself. A firing that
/// runs late is not followed by a burst of catch-up firings: the next deadline is
/// `max(previous deadline + interval, now)`.
///
/// When more tasks are due at once than there are workers, firings queue and pacing degrades
/// for the excess tasks.
pub struct TickPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl TickPool {
    pub fn new(workers: usize) -> TileReelResult<Self> {
        if workers == 0 {
            return Err(TileReelError::config("tick pool needs at least one worker"));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
        });

        // Workers spawned before a failure are shut down by `Drop`.
        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(workers),
        };
        for i in 0..workers {
            let shared = pool.shared.clone();
            let handle = thread::Builder::new()
                .name(format!("tilereel-tick-{i}"))
                .spawn(move || worker_loop(&shared))
                .map_err(|e| TileReelError::config(format!("failed to spawn tick worker: {e}")))?;
            pool.workers.push(handle);
        }
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of live (not cancelled) schedules.
    pub fn scheduled(&self) -> usize {
        self.shared.lock().entries.len()
    }
}

impl TickDriver for TickPool {
    fn schedule_fixed_rate(
        &self,
        initial_delay: Duration,
        interval: Duration,
        task: TickTask,
    ) -> TickHandle {
        let mut state = self.shared.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.entries.insert(
            id,
            Entry {
                task,
                interval: interval.max(MIN_INTERVAL),
            },
        );
        state
            .queue
            .push(Reverse((Instant::now() + initial_delay, id)));
        drop(state);
        self.shared.wake.notify_one();

        TickHandle::new(PoolSchedule {
            id,
            shared: Arc::downgrade(&self.shared),
        })
    }
}

impl Drop for TickPool {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();

        let me = thread::current().id();
        for handle in self.workers.drain(..) {
            // The last owner can be released from inside a tick; never join the running worker.
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("tick worker panicked during shutdown");
            }
        }
    }
}

impl std::fmt::Debug for TickPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickPool")
            .field("workers", &self.workers.len())
            .field("scheduled", &self.scheduled())
            .finish()
    }
}

struct PoolSchedule {
    id: u64,
    shared: Weak<Shared>,
}

impl Schedule for PoolSchedule {
    fn cancel(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        shared.lock().entries.remove(&self.id).is_some()
    }

    fn is_cancelled(&self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => !shared.lock().entries.contains_key(&self.id),
            None => true,
        }
    }
}

fn worker_loop(shared: &Shared) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }

        let Some(&Reverse((deadline, id))) = state.queue.peek() else {
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        };

        let Some(task) = state.entries.get(&id).map(|e| e.task.clone()) else {
            state.queue.pop();
            continue;
        };

        let now = Instant::now();
        if deadline > now {
            state = shared
                .wake
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        state.queue.pop();
        drop(state);

        if catch_unwind(AssertUnwindSafe(|| task())).is_err() {
            tracing::error!(task = id, "tick task panicked");
        }

        state = shared.lock();
        if let Some(entry) = state.entries.get(&id) {
            let next = (deadline + entry.interval).max(Instant::now());
            state.queue.push(Reverse((next, id)));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/pool.rs"]
mod tests;
