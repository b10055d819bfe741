//! One-shot "your order is ready" alert.
//!
//! Playing the alert is a side effect the host may refuse (muted terminal,
//! closed stdout, denied permission). Such failures are never surfaced.

use std::fmt::Debug;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

/// Errors an alert can report. Callers swallow them via [`ring`].
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert playback denied: {0}")]
    Denied(String),

    #[error("Alert output failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Alert: Send + Sync + Debug {
    fn play(&self) -> Result<(), AlertError>;
}

/// Rings the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Alert for TerminalBell {
    fn play(&self) -> Result<(), AlertError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlert;

impl Alert for SilentAlert {
    fn play(&self) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Counts plays. Optionally refuses every play, like a host that blocks sound.
#[derive(Debug, Default)]
pub struct CountingAlert {
    plays: AtomicUsize,
    deny: bool,
}

impl CountingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self {
            plays: AtomicUsize::new(0),
            deny: true,
        }
    }

    /// Number of attempted plays, refused ones included.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl Alert for CountingAlert {
    fn play(&self) -> Result<(), AlertError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(AlertError::Denied("blocked by host".to_string()));
        }
        Ok(())
    }
}

/// Plays `alert`, swallowing any failure.
pub fn ring(alert: &dyn Alert) {
    if let Err(e) = alert.play() {
        debug!(error = %e, "Alert playback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_swallows_denial() {
        let alert = CountingAlert::denying();
        ring(&alert);
        ring(&alert);
        assert_eq!(alert.plays(), 2);
    }

    #[test]
    fn test_silent_alert() {
        assert!(SilentAlert.play().is_ok());
    }
}
