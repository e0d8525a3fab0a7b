/*!
 * Signal Bridge Library
 * Moves OS signal delivery out of handler context into ordinary code
 *
 * A signal handler may only call a narrow set of async-signal-safe
 * operations, so the bridge reduces delivery to a one-byte message on a
 * kernel pipe: the handler posts the byte, an ordinary thread multiplexes
 * on the read end and runs the real handling logic with no restrictions.
 */

pub mod bridge;
pub mod channel;
pub mod core;
pub mod dispatch;
pub mod registrar;
pub mod waiter;

// Re-export public API
pub use bridge::SignalBridge;
pub use channel::NotificationChannel;
pub use crate::core::{BridgeError, BridgeResult, SignalSet};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use registrar::Registrar;
pub use waiter::{EventWaiter, WaitResult, WaitSource};

// Signal numbers come straight from nix so embedders can name them
// without a direct dependency.
pub use nix::sys::signal::Signal;
