/*! Repeating tasks with cancelable handles.

Keep-alive probing only needs "run this every `period` after
`initial_delay` until canceled", so the scheduler is a trait and tests can
drive the tasks by hand.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Body of a repeating task.
pub type Task = Box<dyn FnMut() + Send + 'static>;

/// Handle of a scheduled task.
pub trait TaskHandle: Send + Sync {
    /// Prevent future invocations. An invocation that is already running
    /// completes.
    fn cancel(&self);
    /// Whether `cancel` was called.
    fn is_cancelled(&self) -> bool;
}

/// Something that can run tasks periodically.
pub trait Scheduler: Send + Sync {
    /// Run `task` first after `initial_delay` and then every `period` until
    /// the returned handle is canceled.
    fn schedule_repeating(&self, task: Task, initial_delay: Duration, period: Duration) -> Box<dyn TaskHandle>;
}

/// `Scheduler` that spawns every task on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create scheduler that spawns tasks on the runtime behind `handle`.
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Create scheduler for the runtime the caller is running in.
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(TokioScheduler::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, mut task: Task, initial_delay: Duration, period: Duration) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        // interval panics on a zero period
        let period = period.max(Duration::from_millis(1));

        let join = self.handle.spawn(async move {
            let mut wakeups = interval_at(Instant::now() + initial_delay, period);
            wakeups.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                wakeups.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                task();
            }
        });

        Box::new(TokioTaskHandle { cancelled, join })
    }
}

struct TokioTaskHandle {
    cancelled: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl TaskHandle for TokioTaskHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.join.abort();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
