//! Trailing-edge debounce for rapid user-driven triggers.
//!
//! A coordinator holds at most one pending invocation. Every `trigger`
//! replaces the pending one and restarts the quiet period; the action runs
//! only once the period elapses with no further trigger.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Opaque handle identifying one scheduled invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceTicket(u64);

#[derive(Default)]
struct Slot {
    /// Ticket counter; only ever increases.
    issued: u64,
    pending: Option<(DebounceTicket, JoinHandle<()>)>,
    /// Fired actions that have not completed yet.
    running: usize,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.running == 0
    }
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    /// Signalled whenever the slot becomes idle.
    idle: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify_if_idle(&self, slot: &Slot) {
        if slot.is_idle() {
            self.idle.notify_waiters();
        }
    }
}

/// Decrements the running count when a fired action ends, even by panic.
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut slot = self.0.lock();
        slot.running = slot.running.saturating_sub(1);
        self.0.notify_if_idle(&slot);
    }
}

/// Debounces triggers from a single source.
///
/// Dropping the coordinator cancels any pending invocation.
#[derive(Default)]
pub struct DebounceCoordinator {
    shared: Arc<Shared>,
}

impl DebounceCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run after `quiet_period` with no further trigger.
    ///
    /// Any previously scheduled invocation is cancelled and will not run.
    /// Once an action starts running it is no longer pending, and later
    /// triggers do not interrupt it. Must be called inside a Tokio runtime.
    pub fn trigger<F, Fut>(&self, quiet_period: Duration, action: F) -> DebounceTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.shared.lock();
        slot.issued += 1;
        let ticket = DebounceTicket(slot.issued);
        if let Some((superseded, handle)) = slot.pending.take() {
            handle.abort();
            tracing::trace!(ticket = superseded.0, "debounced trigger superseded");
        }

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let _running = {
                let mut slot = shared.lock();
                let still_current =
                    matches!(&slot.pending, Some((current, _)) if *current == ticket);
                if !still_current {
                    return;
                }
                // Pending hands over to running under one lock, so the
                // coordinator is never observed idle in between.
                slot.pending = None;
                slot.running += 1;
                RunningGuard(Arc::clone(&shared))
            };
            tracing::trace!(ticket = ticket.0, "debounced trigger fired");
            action().await;
        });
        slot.pending = Some((ticket, handle));
        ticket
    }

    /// Cancel the pending invocation without running it.
    ///
    /// Returns whether anything was pending. Owners call this on teardown.
    pub fn cancel_pending(&self) -> bool {
        let mut slot = self.shared.lock();
        match slot.pending.take() {
            Some((ticket, handle)) => {
                handle.abort();
                tracing::trace!(ticket = ticket.0, "debounced trigger cancelled");
                self.shared.notify_if_idle(&slot);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    /// Ticket of the pending invocation, if any.
    pub fn pending_ticket(&self) -> Option<DebounceTicket> {
        self.shared
            .lock()
            .pending
            .as_ref()
            .map(|(ticket, _)| *ticket)
    }

    /// True when nothing is pending and no fired action is still running.
    pub fn is_idle(&self) -> bool {
        self.shared.lock().is_idle()
    }

    /// Wait until nothing is pending and every fired action has completed.
    ///
    /// Returns immediately when already idle. A trigger issued while
    /// waiting extends the wait.
    pub async fn idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for DebounceCoordinator {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
