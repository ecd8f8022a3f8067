//! Cancellable quiescence timer.
//!
//! A `Debouncer` forwards the most recent value pushed into it once no newer
//! value has arrived for the configured delay. Each push aborts the pending
//! timer task and arms a new one; dropping the debouncer aborts the pending
//! timer, so nothing is emitted after teardown.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer<V> {
    delay: Duration,
    output: mpsc::UnboundedSender<V>,
    pending: Option<JoinHandle<()>>,
}

impl<V: Send + 'static> Debouncer<V> {
    /// Settled values are sent to `output`. A zero `delay` forwards every
    /// push immediately.
    ///
    /// Must be used from within a tokio runtime.
    pub fn new(delay: Duration, output: mpsc::UnboundedSender<V>) -> Self {
        Self {
            delay,
            output,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the timer.
    pub fn push(&mut self, value: V) {
        self.cancel();

        if self.delay.is_zero() {
            let _ = self.output.send(value);
            return;
        }

        let output = self.output.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the consumer was torn down
            let _ = output.send(value);
        }));
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a pushed value is waiting out the delay.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<V> Drop for Debouncer<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
