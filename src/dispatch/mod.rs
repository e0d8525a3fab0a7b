/*!
 * Dispatch Module
 * Runs application logic once per observed notification burst
 */

pub mod dispatcher;

// Re-export public API
pub use dispatcher::{DispatchOutcome, Dispatcher};
