//! Trailing-edge debounce for compile requests.
//!
//! The scheduler owns at most one pending value. Scheduling replaces it and
//! restarts the quiet window; the single consumer of [`next_ready`] receives
//! a value only after the window elapses with no replacement.
//!
//! [`next_ready`]: DebounceScheduler::next_ready

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

struct Slot<T> {
    pending: Option<T>,
    generation: u64,
    deadline: Instant,
}

/// Longest quiet window accepted; longer ones are clamped.
pub const MAX_WINDOW: Duration = Duration::from_secs(60 * 60);

pub struct DebounceScheduler<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
    window: Duration,
}

impl<T: Send> DebounceScheduler<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                generation: 0,
                deadline: Instant::now(),
            }),
            notify: Notify::new(),
            window: window.min(MAX_WINDOW),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Queue `value`, replacing whatever was pending. Returns true when a
    /// pending value was coalesced away.
    pub fn schedule(&self, value: T) -> bool {
        let replaced = {
            let mut slot = self.slot.lock();
            slot.generation = slot.generation.wrapping_add(1);
            slot.deadline = Instant::now() + self.window;
            slot.pending.replace(value).is_some()
        };
        if replaced {
            debug!("coalesced pending request");
        }
        self.notify.notify_one();
        replaced
    }

    /// Take the pending value now, ignoring the window.
    pub fn flush(&self) -> Option<T> {
        self.slot.lock().pending.take()
    }

    /// Drop the pending value, if any.
    pub fn cancel_pending(&self) -> bool {
        self.slot.lock().pending.take().is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }

    /// Wait until a value has been pending for a full quiet window, then
    /// take it. Meant for a single consumer.
    pub async fn next_ready(&self) -> T {
        loop {
            let seen = {
                let slot = self.slot.lock();
                slot.pending.as_ref().map(|_| (slot.generation, slot.deadline))
            };
            let Some((generation, deadline)) = seen else {
                self.notify.notified().await;
                continue;
            };

            tokio::time::sleep_until(deadline).await;

            let mut slot = self.slot.lock();
            if slot.generation == generation {
                if let Some(value) = slot.pending.take() {
                    return value;
                }
            }
            // replaced or cancelled during the window: start over
        }
    }
}
