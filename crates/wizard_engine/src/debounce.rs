use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::TimerKey;

/// A single restartable timer. Dropping it cancels the pending firing.
///
/// A callback already running when `cancel` is called may still complete;
/// receivers filter such late firings by generation token.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    pending: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending firing and schedules `on_fire` after `delay`.
    pub fn restart<F>(&mut self, runtime: &Handle, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        }));
    }

    /// Returns whether a firing was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Debounce timers addressed by key.
#[derive(Debug, Default)]
pub struct TimerSet {
    timers: HashMap<TimerKey, DebounceTimer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart<F>(&mut self, key: TimerKey, runtime: &Handle, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.timers
            .entry(key)
            .or_default()
            .restart(runtime, delay, on_fire);
    }

    pub fn cancel_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.cancel();
        }
        self.timers.clear();
    }
}
