/*!
 * Error Types
 * Bridge error taxonomy
 */

use nix::errno::Errno;
use thiserror::Error;

/// Bridge operation result
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge errors
///
/// Setup-time failures propagate to the caller of setup; steady-state
/// failures propagate out of `wait`/`drain` and the dispatch loop. Whether
/// a loop continues after a steady-state error is the embedder's call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Invalid input or an operation issued in the wrong state. Raised
    /// synchronously at call time, never from handler context.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The OS refused to create the channel. Fatal to setup; nothing is
    /// left partially constructed.
    #[error("Resource exhaustion: {0}")]
    ResourceExhaustion(Errno),

    /// The read end saw end-of-file, meaning the write end was closed
    /// while the bridge still owned it. Not recovered locally.
    #[error("Notification channel closed unexpectedly")]
    UnexpectedClosure,

    /// Any other OS-level failure from install, restore, wait, or drain.
    #[error("Operation failed: {0}")]
    OperationFailed(Errno),
}
