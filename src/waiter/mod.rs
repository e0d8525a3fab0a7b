/*!
 * Waiter Module
 * Blocking readiness multiplexing over channel and embedder sources
 */

pub mod types;
pub mod waiter;

// Re-export public API
pub use types::{WaitResult, WaitSource};
pub use waiter::EventWaiter;
