/*!
 * Bridge Handler
 * The function installed as the OS-level signal handler
 */

use crate::channel::slot;
use libc::c_int;

/// Installed for every signal in the bridged set
///
/// Posts one marker byte through the notification slot and returns.
/// Nothing reachable from here may allocate, lock, buffer output, or
/// raise; the slot's post path is an atomic load, write(2), and errno
/// save/restore.
pub(crate) extern "C" fn notify_on_signal(_signum: c_int) {
    slot::notify();
}
