/*!
 * Signal Set
 * The set of signal numbers one bridge is responsible for
 */

use super::errors::{BridgeError, BridgeResult};
use nix::sys::signal::Signal;
use std::fmt;

/// Check if a signal's disposition can be replaced at all
pub fn catchable(signal: Signal) -> bool {
    !matches!(signal, Signal::SIGKILL | Signal::SIGSTOP)
}

/// Set of signals routed through one bridge
///
/// Configured once at setup and immutable for the bridge's lifetime;
/// changing it means a restore/install cycle. Construction rejects
/// signals whose disposition the OS refuses to replace, so installation
/// cannot half-succeed on bad input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSet {
    signals: Vec<Signal>,
}

impl SignalSet {
    /// Build a set from signal numbers, deduplicating as it goes
    pub fn new(signals: impl IntoIterator<Item = Signal>) -> BridgeResult<Self> {
        let mut accepted = Vec::new();
        for signal in signals {
            if !catchable(signal) {
                return Err(BridgeError::Configuration(format!(
                    "{} cannot be caught",
                    signal
                )));
            }
            if !accepted.contains(&signal) {
                accepted.push(signal);
            }
        }
        if accepted.is_empty() {
            return Err(BridgeError::Configuration(
                "signal set is empty".to_string(),
            ));
        }
        Ok(Self { signals: accepted })
    }

    /// SIGINT + SIGTERM, the usual shutdown pair
    pub fn termination() -> Self {
        Self {
            signals: vec![Signal::SIGINT, Signal::SIGTERM],
        }
    }

    /// Check set membership
    pub fn contains(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }

    /// Number of distinct signals in the set
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Always false for a constructed set; here for completeness
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterate the signals in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.iter().copied()
    }
}

impl fmt::Display for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, signal) in self.signals.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", signal)?;
        }
        Ok(())
    }
}
