// ABOUTME: Spawns the wrapped command with stdin/stdout inherited and stderr relayed.
// ABOUTME: Waits for the child, drains the relay, and reports the child's final state.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::SuppressionFilter;
use crate::relay::{Drain, RelayStats, relay_with_drain};
use crate::signals::SignalForwarder;
use std::ffi::OsStr;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinError;

/// Lifecycle of the wrapped process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// Spawned; the relay is copying stderr.
    Running,
    /// Exited normally.
    Exited { code: i32 },
    /// Killed by a signal.
    Signalled { signal: i32 },
    /// Exited, but the wrapper itself was signalled before stderr drained.
    Interrupted { signal: i32 },
}

impl ChildState {
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => ChildState::Exited { code },
            (None, Some(signal)) => ChildState::Signalled { signal },
            (None, None) => ChildState::Exited { code: -1 },
        }
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self, ChildState::Running)
    }

    /// Exit code the wrapper reports: the child's own code, or `128 + signal`.
    pub fn exit_code(&self) -> Option<u8> {
        match *self {
            ChildState::Running => None,
            ChildState::Exited { code } => Some((code & 0xff) as u8),
            ChildState::Signalled { signal } | ChildState::Interrupted { signal } => {
                Some((128 + signal).clamp(0, 255) as u8)
            }
        }
    }
}

/// Runs one command with a filtered stderr.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: PathBuf,
    filter: SuppressionFilter,
    /// How long a pipe may stay silent after the child exits.
    drain_timeout: Duration,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            filter: SuppressionFilter::fips(),
            drain_timeout: Duration::from_secs(2),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.program.clone())
            .filter(config.filter())
            .drain_timeout(config.drain_timeout)
    }

    pub fn filter(mut self, filter: SuppressionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Run the command, relaying filtered stderr to this process's stderr.
    pub async fn run<I, S>(&self, args: I) -> Result<ChildState>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run_with_stderr(args, tokio::io::stderr()).await
    }

    /// Run the command, relaying filtered stderr to `stderr`.
    pub async fn run_with_stderr<I, S, W>(&self, args: I, mut stderr: W) -> Result<ChildState>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let program = self.program.display().to_string();
        let forwarder = SignalForwarder::install()?;

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::from_spawn(&program, e))?;

        let pid = child.id();
        tracing::debug!(program, ?pid, state = ?ChildState::Running, "child spawned");

        let Some(child_stderr) = child.stderr.take() else {
            // Never run the child unfiltered.
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(Error::RelayUnavailable(program));
        };

        let (exited_tx, exited_rx) = watch::channel(false);
        let drain = Drain {
            exited: exited_rx.clone(),
            idle: self.drain_timeout,
        };
        let filter = self.filter.clone();
        let mut relay = tokio::spawn(async move {
            relay_with_drain(child_stderr, &mut stderr, &filter, drain).await
        });
        let mut signals = forwarder.spawn(pid, exited_rx);

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                relay.abort();
                signals.abort();
                return Err(e.into());
            }
        };
        let _ = exited_tx.send(true);
        let state = ChildState::from_status(status);
        tracing::debug!(program, ?state, "child terminated");

        // Writes to our stderr are never cut short; only a silent pipe or a
        // signal aimed at the wrapper ends the drain early.
        let state = tokio::select! {
            joined = &mut relay => {
                log_relay_outcome(joined, self.drain_timeout);
                state
            }
            Ok(Some(sig)) = &mut signals => {
                tracing::warn!(signal = sig.as_str(), "signalled while draining stderr; stopping relay");
                relay.abort();
                ChildState::Interrupted { signal: sig as i32 }
            }
        };
        signals.abort();

        Ok(state)
    }
}

fn log_relay_outcome(
    joined: std::result::Result<std::io::Result<RelayStats>, JoinError>,
    idle: Duration,
) {
    match joined {
        Ok(Ok(stats)) if stats.abandoned => {
            tracing::warn!(
                forwarded = stats.forwarded,
                suppressed = stats.suppressed,
                idle = ?idle,
                "stderr still held open after child exit; stopped relaying"
            );
        }
        Ok(Ok(stats)) => {
            tracing::debug!(
                forwarded = stats.forwarded,
                suppressed = stats.suppressed,
                "stderr relay finished"
            );
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "stderr relay stopped early");
        }
        Err(e) => {
            tracing::error!(error = %e, "stderr relay task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// AsyncWrite sink shared with the test after the relay task owns it.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl AsyncWrite for Capture {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    async fn run_sh(script: &str) -> (ChildState, Vec<u8>) {
        let capture = Capture::default();
        let state = Launcher::new("sh")
            .run_with_stderr(["-c", script], capture.clone())
            .await
            .unwrap();
        let out = capture.0.lock().unwrap().clone();
        (state, out)
    }

    #[test]
    fn exit_codes_follow_shell_convention() {
        assert_eq!(ChildState::Exited { code: 0 }.exit_code(), Some(0));
        assert_eq!(ChildState::Exited { code: 255 }.exit_code(), Some(255));
        assert_eq!(ChildState::Signalled { signal: 15 }.exit_code(), Some(143));
        assert_eq!(ChildState::Interrupted { signal: 2 }.exit_code(), Some(130));
        assert_eq!(ChildState::Running.exit_code(), None);
        assert!(!ChildState::Running.is_terminated());
        assert!(ChildState::Signalled { signal: 9 }.is_terminated());
    }

    #[tokio::test]
    async fn filters_banner_and_keeps_order() {
        let (state, out) = run_sh(
            "echo 'FIPS mode initialized' >&2; echo one >&2; \
             echo 'FIPS mode initialized: foo' >&2; echo two >&2",
        )
        .await;
        assert_eq!(state, ChildState::Exited { code: 0 });
        assert_eq!(out, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn propagates_exit_code_and_relays_stderr() {
        let (state, out) = run_sh("echo 'Permission denied (publickey).' >&2; exit 255").await;
        assert_eq!(state, ChildState::Exited { code: 255 });
        assert_eq!(out, b"Permission denied (publickey).\n");
    }

    #[tokio::test]
    async fn reports_signal_death() {
        let (state, _) = run_sh("kill -KILL $$").await;
        assert_eq!(state, ChildState::Signalled { signal: 9 });
        assert_eq!(state.exit_code(), Some(137));
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = Launcher::new("/nonexistent/ssh-wrapper-test-binary")
            .run_with_stderr(Vec::<&str>::new(), tokio::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[tokio::test]
    async fn lingering_writer_does_not_block_exit() {
        let capture = Capture::default();
        let started = std::time::Instant::now();
        let state = Launcher::new("sh")
            .drain_timeout(Duration::from_millis(200))
            .run_with_stderr(["-c", "echo early >&2; (sleep 5 >&2 &) ; exit 0"], capture.clone())
            .await
            .unwrap();
        assert_eq!(state, ChildState::Exited { code: 0 });
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(capture.0.lock().unwrap().as_slice(), b"early\n");
    }
}
