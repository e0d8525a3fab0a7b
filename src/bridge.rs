/*!
 * Signal Bridge
 * All-or-nothing assembly of channel, registrar, and waiter
 */

use crate::channel::NotificationChannel;
use crate::core::{BridgeResult, SignalSet};
use crate::dispatch::Dispatcher;
use crate::registrar::Registrar;
use crate::waiter::{EventWaiter, WaitResult};
use log::{info, warn};
use std::time::Duration;

/// Scoped bridge from OS signal delivery to ordinary code
///
/// Owns the channel endpoints and the installed dispositions for its
/// lifetime. `open` either yields a fully wired bridge or nothing: an
/// install failure closes the freshly created channel on the way out.
/// Dropping the bridge restores dispositions before the endpoints close,
/// so a late delivery never writes to a recycled descriptor.
///
/// Disposition is process-wide, so a second `open` while one bridge is
/// live fails with a configuration error rather than silently stealing
/// delivery.
#[derive(Debug)]
pub struct SignalBridge {
    channel: NotificationChannel,
    registrar: Registrar,
    waiter: EventWaiter,
    signals: SignalSet,
}

impl SignalBridge {
    /// Create the channel and install handlers for the set
    pub fn open(signals: SignalSet) -> BridgeResult<Self> {
        let channel = NotificationChannel::open()?;
        let mut registrar = Registrar::new();
        // An error here drops `channel`, closing both endpoints.
        registrar.install(&signals, &channel)?;
        info!("Signal bridge open for {}", signals);
        Ok(Self {
            channel,
            registrar,
            waiter: EventWaiter::new(),
            signals,
        })
    }

    /// The set this bridge observes
    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// The underlying channel, for embedders multiplexing extra sources
    /// through their own waiter
    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Block until a bridged signal is pending or the timeout elapses
    pub fn wait(&self, timeout: Option<Duration>) -> BridgeResult<WaitResult> {
        self.waiter
            .wait(&[self.channel.as_wait_source()], timeout)
    }

    /// Discard pending markers, reporting whether any were present
    pub fn drain(&self) -> BridgeResult<bool> {
        self.channel.drain()
    }

    /// Dispatcher bound to this bridge's channel
    pub fn dispatcher<F: FnMut()>(&self, callback: F) -> Dispatcher<'_, F> {
        Dispatcher::new(&self.channel, callback)
    }

    /// Restore dispositions, then release the channel endpoints
    ///
    /// Deliveries landing after restore are lost; that is the teardown
    /// contract. The endpoints stay open until the handler can no longer
    /// be entered through this bridge.
    pub fn close(mut self) -> BridgeResult<()> {
        let result = self.registrar.restore();
        info!("Signal bridge closed");
        result
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        // After close() this is a no-op; restore is idempotent. The
        // channel fields drop afterwards, closing both endpoints.
        if let Err(err) = self.registrar.restore() {
            warn!("Signal bridge drop failed to restore dispositions: {}", err);
        }
    }
}
