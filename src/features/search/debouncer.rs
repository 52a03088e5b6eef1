//! Search debounce control
//!
//! Holds back a rapidly changing value (search text, filter panel) until it has
//! been stable for the configured delay. Built on `tokio::time` so paused-clock
//! tests can drive it.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<T>,
    last_input_time: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_input_time: None,
        }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
        self.last_input_time = Some(Instant::now());
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_input_time = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Non-blocking check; returns the value once the delay has elapsed.
    pub fn take_ready(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        if Instant::now() < deadline {
            return None;
        }
        self.last_input_time = None;
        self.pending.take()
    }

    /// Resolves with the pending value once it has been quiet for the delay.
    /// Never resolves while nothing is pending, so it is safe as a `select!`
    /// arm; the value is only taken after the sleep completes.
    pub async fn ready(&mut self) -> T {
        loop {
            let Some(deadline) = self.deadline() else {
                return std::future::pending().await;
            };
            sleep_until(deadline).await;
            if let Some(value) = self.take_ready() {
                return value;
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(self.last_input_time? + self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn collapses_a_burst_into_the_last_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(600));

        for text in ["c", "ca", "cam", "came", "camer", "camera"] {
            debouncer.push(text.to_string());
            advance(Duration::from_millis(100)).await;
        }

        let started = Instant::now();
        assert_eq!(debouncer.ready().await, "camera");
        assert_eq!(started.elapsed(), Duration::from_millis(500));

        // Exactly one emission per burst.
        assert!(!debouncer.has_pending());
        let second = timeout(Duration::from_secs(5), debouncer.ready()).await;
        assert!(second.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(600));
        debouncer.push("camera");
        debouncer.cancel();

        let emitted = timeout(Duration::from_secs(2), debouncer.ready()).await;
        assert!(emitted.is_err());
        assert!(!debouncer.has_pending());
        assert!(debouncer.take_ready().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn take_ready_waits_for_the_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.take_ready().is_none());

        debouncer.push(1);
        assert!(debouncer.take_ready().is_none());

        advance(Duration::from_millis(299)).await;
        assert!(debouncer.take_ready().is_none());
        assert!(debouncer.has_pending());

        advance(Duration::from_millis(1)).await;
        assert_eq!(debouncer.take_ready(), Some(1));
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_ready_future_keeps_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(600));
        debouncer.push("tent");

        let early = timeout(Duration::from_millis(100), debouncer.ready()).await;
        assert!(early.is_err());
        assert!(debouncer.has_pending());

        assert_eq!(debouncer.ready().await, "tent");
    }
}
