// ABOUTME: Forwards termination signals received by the wrapper to its child.
// ABOUTME: Handlers are installed before spawn so no signal can orphan the child.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::signal::unix::{Signal as SignalStream, SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Installed signal handlers, not yet bound to a child.
pub struct SignalForwarder {
    interrupt: SignalStream,
    terminate: SignalStream,
    hangup: SignalStream,
    quit: SignalStream,
}

impl SignalForwarder {
    /// Take over SIGINT, SIGTERM, SIGHUP and SIGQUIT for this process.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Relay every received signal to `pid` while the child runs.
    ///
    /// The task finishes with the first signal that arrives once `exited`
    /// is `true` (or once the child is gone), so the caller can stop
    /// waiting on its own behalf.
    pub fn spawn(
        self,
        pid: Option<u32>,
        exited: watch::Receiver<bool>,
    ) -> JoinHandle<Option<Signal>> {
        tokio::spawn(self.forward(pid, exited))
    }

    async fn forward(
        mut self,
        pid: Option<u32>,
        exited: watch::Receiver<bool>,
    ) -> Option<Signal> {
        loop {
            let sig = tokio::select! {
                Some(()) = self.interrupt.recv() => Signal::SIGINT,
                Some(()) = self.terminate.recv() => Signal::SIGTERM,
                Some(()) = self.hangup.recv() => Signal::SIGHUP,
                Some(()) = self.quit.recv() => Signal::SIGQUIT,
                else => return None,
            };

            let Some(pid) = pid.filter(|_| !*exited.borrow()) else {
                tracing::debug!(signal = sig.as_str(), "signal received after child exit");
                return Some(sig);
            };

            tracing::debug!(pid, signal = sig.as_str(), "forwarding signal to child");
            match kill(Pid::from_raw(pid as i32), sig) {
                Ok(()) => {}
                Err(Errno::ESRCH) => return Some(sig),
                Err(e) => {
                    tracing::warn!(pid, signal = sig.as_str(), error = %e, "signal forwarding failed");
                }
            }
        }
    }
}
