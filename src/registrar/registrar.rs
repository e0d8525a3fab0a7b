/*!
 * Signal Registrar
 * Installs and restores OS-level dispositions for the bridged set
 */

use super::handler;
use crate::channel::{slot, NotificationChannel};
use crate::core::{BridgeError, BridgeResult, SignalSet};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::os::fd::RawFd;

/// Registrar lifecycle; install and restore move between the two states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistrarState {
    Uninstalled,
    Installed,
}

/// Scoped owner of process-wide signal dispositions
///
/// Disposition is inherently process-global mutable state. The registrar
/// pairs every install with the record needed to put the previous
/// dispositions back, so embedders reason about it as a scoped resource.
///
/// Children spawned while handlers are installed inherit the dispositions
/// and signal mask but not the channel wiring; resetting those before
/// exec is the spawning code's responsibility, not the bridge's.
pub struct Registrar {
    state: RegistrarState,
    saved: Vec<(Signal, SigAction)>,
    published: Option<RawFd>,
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("state", &self.state)
            .field("saved", &self.saved.iter().map(|(s, _)| *s).collect::<Vec<_>>())
            .field("published", &self.published)
            .finish()
    }
}

impl Registrar {
    pub fn new() -> Self {
        Self {
            state: RegistrarState::Uninstalled,
            saved: Vec::new(),
            published: None,
        }
    }

    /// Install the bridge handler for every signal in the set
    ///
    /// Uses the sigaction form with SA_RESTART, so syscalls interrupted
    /// in the embedding application resume instead of failing with EINTR;
    /// the legacy signal(2) form guarantees neither that nor re-entrancy
    /// behavior across platforms. The previous disposition of each signal
    /// is recorded for restore. All-or-nothing: a failure part way
    /// through puts back what was already replaced.
    ///
    /// Installing while already installed is an error; silently
    /// reinstalling would lose the only record of the prior dispositions.
    pub fn install(
        &mut self,
        signals: &SignalSet,
        channel: &NotificationChannel,
    ) -> BridgeResult<()> {
        if self.state == RegistrarState::Installed {
            return Err(BridgeError::Configuration(
                "handlers already installed".to_string(),
            ));
        }

        let write_fd = channel.write_raw();
        if !slot::publish(write_fd) {
            return Err(BridgeError::Configuration(
                "another bridge is already live in this process".to_string(),
            ));
        }

        let action = SigAction::new(
            SigHandler::Handler(handler::notify_on_signal),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        for signal in signals.iter() {
            // SAFETY: the installed handler is restricted to an atomic
            // load, write(2), and errno save/restore.
            match unsafe { sigaction(signal, &action) } {
                Ok(previous) => {
                    debug!("Installed bridge handler for {}", signal);
                    self.saved.push((signal, previous));
                }
                Err(err) => {
                    warn!("sigaction failed for {}: {}", signal, err);
                    self.unwind();
                    slot::withdraw(write_fd);
                    return Err(match err {
                        Errno::EINVAL => BridgeError::Configuration(format!(
                            "{} cannot be bridged",
                            signal
                        )),
                        other => BridgeError::OperationFailed(other),
                    });
                }
            }
        }

        self.published = Some(write_fd);
        self.state = RegistrarState::Installed;
        Ok(())
    }

    /// Put back the dispositions recorded at install time
    ///
    /// Idempotent: a second call finds nothing recorded and returns. The
    /// slot is withdrawn only after every disposition is back, so a
    /// delivery racing the restore still lands on an open descriptor.
    /// Deliveries after restore returns are lost, per the teardown
    /// contract.
    pub fn restore(&mut self) -> BridgeResult<()> {
        if self.state == RegistrarState::Uninstalled {
            return Ok(());
        }

        let mut first_err = None;
        for (signal, previous) in self.saved.drain(..).rev() {
            // SAFETY: reinstating a disposition that was live before
            // install introduces nothing new.
            if let Err(err) = unsafe { sigaction(signal, &previous) } {
                warn!("Failed to restore disposition for {}: {}", signal, err);
                first_err.get_or_insert(err);
            } else {
                debug!("Restored previous disposition for {}", signal);
            }
        }

        if let Some(fd) = self.published.take() {
            slot::withdraw(fd);
        }
        self.state = RegistrarState::Uninstalled;

        first_err.map_or(Ok(()), |err| Err(BridgeError::OperationFailed(err)))
    }

    /// Check whether handlers are currently installed
    pub fn is_installed(&self) -> bool {
        self.state == RegistrarState::Installed
    }

    /// Undo a partial install, newest replacement first
    fn unwind(&mut self) {
        for (signal, previous) in self.saved.drain(..).rev() {
            // SAFETY: same as restore.
            if let Err(err) = unsafe { sigaction(signal, &previous) } {
                warn!("Failed to unwind handler for {}: {}", signal, err);
            }
        }
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registrar {
    fn drop(&mut self) {
        if self.state == RegistrarState::Installed {
            if let Err(err) = self.restore() {
                warn!("Registrar dropped without restore; cleanup failed: {}", err);
            }
        }
    }
}
