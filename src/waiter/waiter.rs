/*!
 * Event Waiter
 * Multiplexed blocking wait with transparent interrupt retry
 */

use super::types::{WaitResult, WaitSource};
use crate::core::{BridgeError, BridgeResult};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::time::{Duration, Instant};

/// Blocking readiness multiplexer
///
/// Suspends the calling thread until a source is readable or the timeout
/// elapses. An unrelated signal interrupting the underlying poll is not a
/// readiness event; the wait resumes with the remaining time, so callers
/// only ever see `Ready` or `TimedOut`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventWaiter;

impl EventWaiter {
    pub fn new() -> Self {
        Self
    }

    /// Wait until a source is ready or the timeout elapses
    ///
    /// `None` waits indefinitely. A marker already buffered in a watched
    /// channel makes the call return `Ready` immediately, so a post that
    /// happened before the wait is never lost. `Ready` carries positions
    /// within `sources`.
    pub fn wait(
        &self,
        sources: &[WaitSource<'_>],
        timeout: Option<Duration>,
    ) -> BridgeResult<WaitResult> {
        if sources.is_empty() {
            return Err(BridgeError::Configuration(
                "wait source set is empty".to_string(),
            ));
        }

        let mut fds: Vec<PollFd> = sources
            .iter()
            .map(|source| PollFd::new(source.fd(), PollFlags::POLLIN))
            .collect();

        // A timeout that overflows Instant degenerates to an unbounded
        // wait.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let mut polled = false;
        loop {
            let chunk = match deadline {
                None => PollTimeout::NONE,
                Some(at) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() && polled {
                        return Ok(WaitResult::TimedOut);
                    }
                    PollTimeout::from(chunk_millis(remaining))
                }
            };
            polled = true;

            match poll(&mut fds, chunk) {
                // Interrupted by some signal; re-poll with what is left
                // of the timeout rather than surfacing a spurious wakeup.
                Err(Errno::EINTR) => continue,
                Err(err) => return Err(BridgeError::OperationFailed(err)),
                // One timeout chunk elapsed; the deadline check above
                // decides between re-polling and reporting TimedOut.
                Ok(0) => continue,
                Ok(_) => {
                    let ready = collect_ready(&fds)?;
                    if ready.is_empty() {
                        continue;
                    }
                    return Ok(WaitResult::Ready(ready));
                }
            }
        }
    }
}

/// Clamp one poll invocation's timeout into poll's millisecond domain
///
/// Rounds up so poll never returns before the deadline; longer waits are
/// split into successive polls by the caller's loop.
fn chunk_millis(remaining: Duration) -> u16 {
    let millis = remaining.as_millis();
    let millis = if remaining.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    };
    millis.min(u128::from(u16::MAX)) as u16
}

fn collect_ready(fds: &[PollFd]) -> BridgeResult<Vec<usize>> {
    let mut ready = Vec::new();
    for (index, fd) in fds.iter().enumerate() {
        let revents = fd.revents().unwrap_or(PollFlags::empty());
        if revents.contains(PollFlags::POLLNVAL) {
            return Err(BridgeError::Configuration(
                "wait source is not an open descriptor".to_string(),
            ));
        }
        // Hangup and error conditions count as readiness; the subsequent
        // drain turns them into a concrete error.
        if revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
            ready.push(index);
        }
    }
    Ok(ready)
}
