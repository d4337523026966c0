//! Termination signal handling
//!
//! SIGINT and SIGTERM both mean "stop accepting and clean up". The
//! signal is consumed cooperatively through tokio's signal streams —
//! nothing runs in the hardware signal context — and once cleanup is
//! done the original signal is re-raised with its default disposition
//! so the process exit status matches platform convention.

use crate::error::{DoormanError, Result};
use std::fmt;
use tokio::signal::unix::{signal, SignalKind};

/// Which termination signal was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl TerminationSignal {
    /// The OS signal number.
    pub fn signum(self) -> i32 {
        match self {
            TerminationSignal::Interrupt => libc::SIGINT,
            TerminationSignal::Terminate => libc::SIGTERM,
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => write!(f, "SIGINT"),
            TerminationSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait until the process receives SIGINT or SIGTERM and report which
/// one arrived first.
pub async fn wait_for_termination() -> Result<TerminationSignal> {
    let mut interrupt = signal(SignalKind::interrupt()).map_err(DoormanError::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(DoormanError::Signal)?;

    tokio::select! {
        _ = interrupt.recv() => Ok(TerminationSignal::Interrupt),
        _ = terminate.recv() => Ok(TerminationSignal::Terminate),
    }
}

/// Re-raise `sig` with its default disposition.
///
/// Called after cleanup has finished; the default disposition for both
/// SIGINT and SIGTERM terminates the process, so the exit status seen
/// by the parent is the standard one for that signal.
pub fn reraise(sig: TerminationSignal) -> ! {
    let signum = sig.signum();
    unsafe {
        libc::signal(signum, libc::SIG_DFL);
        libc::raise(signum);
    }
    // Unreachable in practice; the raise above terminates the process.
    std::process::exit(128 + signum);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    #[test]
    fn test_signum_mapping() {
        assert_eq!(TerminationSignal::Interrupt.signum(), libc::SIGINT);
        assert_eq!(TerminationSignal::Terminate.signum(), libc::SIGTERM);
        assert_eq!(TerminationSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
    }

    #[tokio::test]
    async fn test_sigterm_is_observed() {
        let watcher = tokio::spawn(wait_for_termination());
        // Give the watcher time to install its signal streams before
        // the raise; the stream registration is what keeps SIGTERM
        // from killing the test process.
        sleep(Duration::from_millis(200)).await;

        unsafe {
            libc::raise(libc::SIGTERM);
        }

        let sig = timeout(Duration::from_secs(5), watcher)
            .await
            .expect("signal watcher timed out")
            .unwrap()
            .unwrap();
        assert_eq!(sig, TerminationSignal::Terminate);
    }
}
