/*!
 * Dispatcher
 * Wait, drain, and hand control to the application callback
 */

use crate::channel::NotificationChannel;
use crate::core::BridgeResult;
use crate::waiter::{EventWaiter, WaitResult};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What one dispatch cycle observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// At least one bridged signal arrived and the callback ran
    Notified,
    /// The wait elapsed with nothing pending; the callback did not run
    Idle,
}

impl DispatchOutcome {
    /// Check if the callback was invoked this cycle
    pub fn notified(&self) -> bool {
        matches!(self, DispatchOutcome::Notified)
    }
}

/// Glue between the waiter and the application callback
///
/// The callback runs in ordinary code, once per wait cycle, however many
/// physical deliveries the cycle coalesced. Beyond draining the channel,
/// the dispatcher itself has no side effects; whatever the application
/// does about a signal lives in the callback.
pub struct Dispatcher<'bridge, F: FnMut()> {
    channel: &'bridge NotificationChannel,
    waiter: EventWaiter,
    callback: F,
    timeout: Option<Duration>,
}

impl<'bridge, F: FnMut()> Dispatcher<'bridge, F> {
    pub fn new(channel: &'bridge NotificationChannel, callback: F) -> Self {
        Self {
            channel,
            waiter: EventWaiter::new(),
            callback,
            timeout: None,
        }
    }

    /// Bound each wait; this also bounds how stale a cancellation check
    /// in `run_forever` can get
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// One wait, then drain and callback if a notification was pending
    ///
    /// Returns `Idle` on timeout without touching the callback, so the
    /// caller can tell "nothing happened" from "signal observed".
    pub fn run_once(&mut self) -> BridgeResult<DispatchOutcome> {
        let source = self.channel.as_wait_source();
        match self.waiter.wait(&[source], self.timeout)? {
            WaitResult::TimedOut => Ok(DispatchOutcome::Idle),
            WaitResult::Ready(_) => {
                if self.channel.drain()? {
                    (self.callback)();
                    Ok(DispatchOutcome::Notified)
                } else {
                    // Readiness with nothing buffered means another
                    // reader raced the drain; nothing to hand over.
                    Ok(DispatchOutcome::Idle)
                }
            }
        }
    }

    /// Loop `run_once` until the cancellation flag is observed
    ///
    /// The flag is checked once per iteration, after each wait returns;
    /// an in-progress wait is never interrupted early. Callers needing
    /// prompt cancellation should set a bounded timeout.
    pub fn run_forever(&mut self, cancel: &AtomicBool) -> BridgeResult<()> {
        loop {
            self.run_once()?;
            if cancel.load(Ordering::Acquire) {
                debug!("Dispatch loop cancelled");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd;
    use std::cell::Cell;
    use std::os::fd::BorrowedFd;

    fn post(channel: &NotificationChannel) {
        let fd = unsafe { BorrowedFd::borrow_raw(channel.write_raw()) };
        unistd::write(fd, &[1]).unwrap();
    }

    #[test]
    fn test_run_once_invokes_callback_on_notification() {
        let channel = NotificationChannel::open().unwrap();
        post(&channel);

        let hits = Cell::new(0);
        let mut dispatcher = Dispatcher::new(&channel, || hits.set(hits.get() + 1));

        let outcome = dispatcher.run_once().unwrap();
        assert_eq!(outcome, DispatchOutcome::Notified);
        assert!(outcome.notified());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_burst_collapses_to_one_callback() {
        let channel = NotificationChannel::open().unwrap();
        for _ in 0..5 {
            post(&channel);
        }

        let hits = Cell::new(0);
        let mut dispatcher = Dispatcher::new(&channel, || hits.set(hits.get() + 1))
            .with_timeout(Duration::from_millis(50));

        assert_eq!(dispatcher.run_once().unwrap(), DispatchOutcome::Notified);
        assert_eq!(dispatcher.run_once().unwrap(), DispatchOutcome::Idle);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_timeout_skips_callback() {
        let channel = NotificationChannel::open().unwrap();

        let hits = Cell::new(0);
        let mut dispatcher = Dispatcher::new(&channel, || hits.set(hits.get() + 1))
            .with_timeout(Duration::from_millis(20));

        let outcome = dispatcher.run_once().unwrap();
        assert_eq!(outcome, DispatchOutcome::Idle);
        assert!(!outcome.notified());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_run_forever_stops_when_callback_cancels() {
        let channel = NotificationChannel::open().unwrap();
        post(&channel);

        let cancel = AtomicBool::new(false);
        let hits = Cell::new(0);
        let mut dispatcher = Dispatcher::new(&channel, || {
            hits.set(hits.get() + 1);
            cancel.store(true, Ordering::Release);
        });

        dispatcher.run_forever(&cancel).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_run_forever_observes_external_cancellation() {
        let channel = NotificationChannel::open().unwrap();

        let cancel = AtomicBool::new(true);
        let mut dispatcher =
            Dispatcher::new(&channel, || {}).with_timeout(Duration::from_millis(10));

        // Pre-set flag: one idle cycle runs, then the loop exits.
        dispatcher.run_forever(&cancel).unwrap();
    }
}
