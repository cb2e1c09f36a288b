//! Module-scoped recurring background jobs

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use crate::core::context::Context;
use crate::core::report::ErrorContext;
use crate::error::{AugurError, Result};

type Canceller = Box<dyn FnOnce() + Send + Sync>;

/// Cancellable handle to a running clockwork job. Dropping it cancels the job.
pub struct ClockworkHandle {
    cancelled: Arc<AtomicBool>,
    cancel: Option<Canceller>,
}

impl ClockworkHandle {
    /// Run `tick` every `period`, first firing one period from now.
    ///
    /// Tick failures are reported through the context and do not stop the job.
    /// A zero period is rejected.
    pub fn interval<F, Fut>(ctx: Context, period: Duration, tick: F) -> Result<Self>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(AugurError::ModuleLoad("Clockwork period must be non-zero".to_string()));
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = tick(ctx.clone()).await {
                    ctx.report(&e, &ErrorContext::Clockwork(ctx.origin().cloned()));
                }
            }
        });

        Ok(Self::with_flag(cancelled, Box::new(move || task.abort())))
    }

    /// Wrap an already spawned task; cancelling aborts it.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self::from_fn(move || task.abort())
    }

    /// Wrap an arbitrary canceller, run at most once.
    pub fn from_fn<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self::with_flag(Arc::new(AtomicBool::new(false)), Box::new(cancel))
    }

    fn with_flag(cancelled: Arc<AtomicBool>, cancel: Canceller) -> Self {
        Self {
            cancelled,
            cancel: Some(cancel),
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ClockworkHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ClockworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockworkHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
