/*!
 * Notification Slot
 * Process-global write end the signal handler posts through
 *
 * A C signal handler cannot carry state, so the write end of the live
 * channel is published here as a raw descriptor. The handler-context path
 * is limited to an atomic load, write(2), and errno save/restore, all on
 * the async-signal-safe list.
 */

use nix::errno::Errno;
use nix::unistd;
use std::os::fd::{BorrowedFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};

/// Marker posted per notification; the value is never inspected
const MARKER: [u8; 1] = [1];

/// No channel published
const VACANT: RawFd = -1;

static NOTIFY_FD: AtomicI32 = AtomicI32::new(VACANT);

/// Publish the write end for the handler to use
///
/// Returns false if another bridge already occupies the slot. Signal
/// disposition is process-wide, so at most one bridge may be live.
pub(crate) fn publish(fd: RawFd) -> bool {
    NOTIFY_FD
        .compare_exchange(VACANT, fd, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// Withdraw the write end
///
/// Called during restore, before the descriptor is closed, so the handler
/// stops posting while the target is still an open pipe.
pub(crate) fn withdraw(fd: RawFd) {
    let _ = NOTIFY_FD.compare_exchange(fd, VACANT, Ordering::AcqRel, Ordering::Acquire);
}

/// Post one marker byte; handler context only
///
/// Every error is dropped: a full pipe means a notification is already
/// pending, and no other outcome can be acted on from inside a handler.
/// The interrupted thread's errno is saved and restored around the write.
pub(crate) fn notify() {
    let saved = Errno::last();
    let fd = NOTIFY_FD.load(Ordering::Acquire);
    if fd != VACANT {
        // Borrowing the raw descriptor does not take ownership; nothing
        // here can close it.
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        let _ = unistd::write(fd, &MARKER);
    }
    saved.set();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::NotificationChannel;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_slot_occupancy() {
        let channel = NotificationChannel::open().unwrap();
        let other = NotificationChannel::open().unwrap();

        assert!(publish(channel.write_raw()));
        assert!(!publish(other.write_raw()));

        // Withdraw with the wrong descriptor leaves the slot occupied
        withdraw(other.write_raw());
        assert!(!publish(other.write_raw()));

        withdraw(channel.write_raw());
        assert!(publish(other.write_raw()));
        withdraw(other.write_raw());
    }

    #[test]
    #[serial]
    fn test_notify_posts_marker() {
        let channel = NotificationChannel::open().unwrap();
        assert!(publish(channel.write_raw()));

        notify();
        assert!(channel.drain().unwrap());
        assert!(!channel.drain().unwrap());

        withdraw(channel.write_raw());
    }

    #[test]
    #[serial]
    fn test_notify_with_vacant_slot_is_a_no_op() {
        assert_eq!(NOTIFY_FD.load(Ordering::Acquire), VACANT);
        notify();
    }

    #[test]
    #[serial]
    fn test_notify_preserves_errno() {
        let channel = NotificationChannel::open().unwrap();
        assert!(publish(channel.write_raw()));

        Errno::ENOENT.set();
        notify();
        assert_eq!(Errno::last(), Errno::ENOENT);

        withdraw(channel.write_raw());
        let _ = channel.drain();
    }

    #[test]
    #[serial]
    fn test_notify_drops_overflow_silently() {
        let channel = NotificationChannel::open().unwrap();
        assert!(publish(channel.write_raw()));

        // Far more posts than a pipe buffers; the surplus must vanish
        // without an error surfacing anywhere.
        for _ in 0..100_000 {
            notify();
        }
        assert!(channel.drain().unwrap());
        assert!(!channel.drain().unwrap());

        withdraw(channel.write_raw());
    }

    #[test]
    fn test_marker_is_one_byte() {
        assert_eq!(MARKER.len(), 1);
    }
}
