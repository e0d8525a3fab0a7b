/*!
 * Notification Channel
 * Non-blocking pipe pair carrying the "something happened" marker
 */

use crate::core::{BridgeError, BridgeResult};
use crate::waiter::WaitSource;
use log::debug;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};

/// Unidirectional byte conduit between handler context and ordinary code
///
/// The write end is only ever touched through the notification slot, from
/// handler context; the read end only from ordinary code. Kernel pipe
/// atomicity is the sole synchronization between the two, which is what
/// lets a handler post without taking a lock. Both ends close when the
/// channel is dropped, on every exit path.
#[derive(Debug)]
pub struct NotificationChannel {
    read: File,
    write: OwnedFd,
}

impl NotificationChannel {
    /// Create the pipe pair, non-blocking on both ends
    ///
    /// Non-blocking on the write end keeps a handler from ever suspending
    /// the thread it interrupted; on the read end it makes `drain` safe
    /// regardless of fill state. Close-on-exec keeps the endpoints out of
    /// spawned children, which inherit dispositions but not the wiring.
    pub fn open() -> BridgeResult<Self> {
        let (read, write) = unistd::pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)
            .map_err(BridgeError::ResourceExhaustion)?;
        debug!(
            "Notification channel open: read fd {}, write fd {}",
            read.as_raw_fd(),
            write.as_raw_fd()
        );
        Ok(Self {
            read: File::from(read),
            write,
        })
    }

    /// Read and discard everything currently buffered
    ///
    /// Returns whether at least one marker was present. Never blocks. Any
    /// number of buffered markers collapse into one `true`: callers learn
    /// "at least one signal arrived since the last drain", nothing finer.
    pub fn drain(&self) -> BridgeResult<bool> {
        drain_pipe(&self.read)
    }

    /// Handle for the event waiter
    pub fn as_wait_source(&self) -> WaitSource<'_> {
        WaitSource::new(self.read.as_fd())
    }

    /// Raw write end, for publication in the notification slot
    pub(crate) fn write_raw(&self) -> RawFd {
        self.write.as_raw_fd()
    }
}

/// Non-blocking read-until-would-block on the channel's read end
fn drain_pipe(mut read: &File) -> BridgeResult<bool> {
    let mut buf = [0u8; 64];
    let mut observed = false;
    loop {
        match read.read(&mut buf) {
            // End-of-file on a pipe means no write end remains.
            Ok(0) => return Err(BridgeError::UnexpectedClosure),
            Ok(_) => observed = true,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(observed),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(BridgeError::OperationFailed(errno_of(&err))),
        }
    }
}

fn errno_of(err: &io::Error) -> Errno {
    Errno::from_raw(err.raw_os_error().unwrap_or(0))
}
