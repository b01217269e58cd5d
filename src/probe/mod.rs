// ABOUTME: Connection self-test for reconstruction hosts.
// ABOUTME: Runs a fixed set of remote commands through the wrapper and times round trips.

mod error;
mod invocation;
mod target;

pub use error::{ProbeError, Result};
pub use invocation::SshInvocation;
pub use target::{DEFAULT_PORT, Target};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Name of the wrapper binary the probe drives by default.
pub const WRAPPER_BIN: &str = "ssh-wrapper";

/// Exit code the `exit` check asks the remote shell for.
pub const EXPECTED_EXIT_CODE: i32 = 42;

/// Output from one remote command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// `None` if the client was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Remote `true` succeeds.
    Connect,
    /// Remote `exit 42` comes back as 42.
    ExitCode,
    /// Remote `echo PASS` output is returned.
    Output,
}

impl CheckKind {
    pub fn remote_command(&self) -> String {
        match self {
            CheckKind::Connect => "true".to_string(),
            CheckKind::ExitCode => format!("exit {EXPECTED_EXIT_CODE}"),
            CheckKind::Output => "echo PASS".to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Connect => "remote 'true'",
            CheckKind::ExitCode => "remote 'exit 42'",
            CheckKind::Output => "remote 'echo PASS'",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: CheckKind,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timing {
    pub reps: u32,
    pub latency_secs: f64,
    pub calls_per_sec: f64,
}

impl Timing {
    fn from_elapsed(reps: u32, elapsed: Duration) -> Self {
        let total = elapsed.as_secs_f64();
        Self {
            reps,
            latency_secs: total / f64::from(reps),
            calls_per_sec: if total > 0.0 { f64::from(reps) / total } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub target: String,
    pub checks: Vec<CheckResult>,
    /// Round trips through the probed executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    /// The same round trips with the bare SSH client, for comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_timing: Option<Timing>,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }

    /// Extra latency per call added by the wrapper, when both were timed.
    pub fn overhead_secs(&self) -> Option<f64> {
        match (&self.timing, &self.direct_timing) {
            (Some(wrapped), Some(direct)) => Some(wrapped.latency_secs - direct.latency_secs),
            _ => None,
        }
    }
}

/// Runs probe commands against one target.
#[derive(Debug, Clone)]
pub struct Probe {
    executable: PathBuf,
    /// Bare client timed alongside `executable`.
    direct: Option<PathBuf>,
    invocation: SshInvocation,
    command_timeout: Duration,
}

impl Probe {
    pub fn new(executable: impl Into<PathBuf>, invocation: SshInvocation) -> Self {
        Self {
            executable: executable.into(),
            direct: None,
            invocation,
            command_timeout: Duration::from_secs(60),
        }
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Also time `client` (normally the SSH client the wrapper runs) so the
    /// report shows the wrapper's overhead.
    pub fn compare_with(mut self, client: impl Into<PathBuf>) -> Self {
        self.direct = Some(client.into());
        self
    }

    /// Run `remote_command` on the target and collect its output.
    pub async fn exec(&self, remote_command: &str) -> Result<CommandOutput> {
        self.exec_with(&self.executable, remote_command).await
    }

    async fn exec_with(&self, executable: &Path, remote_command: &str) -> Result<CommandOutput> {
        let args = self.invocation.args(remote_command);
        tracing::debug!(
            executable = %executable.display(),
            ?args,
            "running probe command"
        );

        let child = Command::new(executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Launch {
                program: executable.display().to_string(),
                source,
            })?;

        let output = tokio::time::timeout(self.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::CommandTimeout(self.command_timeout))??;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn check(&self, kind: CheckKind) -> Result<CheckResult> {
        let output = self.exec(&kind.remote_command()).await?;
        let (passed, detail) = match kind {
            CheckKind::Connect => (output.success(), describe_exit(&output)),
            CheckKind::ExitCode => (
                output.exit_code == Some(EXPECTED_EXIT_CODE),
                describe_exit(&output),
            ),
            CheckKind::Output => {
                let stdout = output.stdout.trim();
                (stdout == "PASS", format!("stdout: {stdout:?}"))
            }
        };
        let stderr = output.stderr.trim();
        let detail = if !passed && !stderr.is_empty() {
            format!("{detail}; stderr: {stderr}")
        } else {
            detail
        };
        Ok(CheckResult {
            check: kind,
            passed,
            detail,
        })
    }

    /// Run every check, then time `reps` round trips of `true`, first with
    /// the bare client (if one was given) and then through the executable.
    ///
    /// If the connect check fails the remaining checks and timing are skipped.
    pub async fn run(&self, reps: u32) -> Result<ProbeReport> {
        let mut report = ProbeReport {
            target: self.invocation.target.to_string(),
            checks: Vec::new(),
            timing: None,
            direct_timing: None,
        };

        let connect = self.check(CheckKind::Connect).await?;
        let connected = connect.passed;
        report.checks.push(connect);
        if !connected {
            tracing::warn!(host = %report.target, "connect check failed; skipping the rest");
            return Ok(report);
        }

        for kind in [CheckKind::ExitCode, CheckKind::Output] {
            report.checks.push(self.check(kind).await?);
        }

        if reps > 0 {
            if let Some(direct) = &self.direct {
                report.direct_timing = Some(self.time(direct, reps).await?);
            }
            report.timing = Some(self.time(&self.executable, reps).await?);
        }

        Ok(report)
    }

    async fn time(&self, executable: &Path, reps: u32) -> Result<Timing> {
        let remote = CheckKind::Connect.remote_command();
        let started = Instant::now();
        for _ in 0..reps {
            self.exec_with(executable, &remote).await?;
        }
        let timing = Timing::from_elapsed(reps, started.elapsed());
        tracing::debug!(
            executable = %executable.display(),
            latency_secs = timing.latency_secs,
            "timed round trips"
        );
        Ok(timing)
    }
}

fn describe_exit(output: &CommandOutput) -> String {
    match output.exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// The wrapper binary installed next to `exe`, falling back to a PATH lookup.
pub fn default_executable(exe: Option<&Path>) -> PathBuf {
    exe.and_then(Path::parent)
        .map(|dir| dir.join(WRAPPER_BIN))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(WRAPPER_BIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_commands() {
        assert_eq!(CheckKind::Connect.remote_command(), "true");
        assert_eq!(CheckKind::ExitCode.remote_command(), "exit 42");
        assert_eq!(CheckKind::Output.remote_command(), "echo PASS");
    }

    #[test]
    fn timing_math() {
        let timing = Timing::from_elapsed(10, Duration::from_secs(2));
        assert!((timing.latency_secs - 0.2).abs() < 1e-9);
        assert!((timing.calls_per_sec - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_report_does_not_pass() {
        let report = ProbeReport {
            target: "recon1".to_string(),
            checks: vec![],
            timing: None,
            direct_timing: None,
        };
        assert!(!report.passed());
        assert!(report.overhead_secs().is_none());
    }

    #[test]
    fn overhead_is_latency_difference() {
        let report = ProbeReport {
            target: "recon1".to_string(),
            checks: vec![],
            timing: Some(Timing::from_elapsed(10, Duration::from_millis(1500))),
            direct_timing: Some(Timing::from_elapsed(10, Duration::from_millis(1200))),
        };
        let overhead = report.overhead_secs().unwrap();
        assert!((overhead - 0.03).abs() < 1e-9);
    }

    #[test]
    fn default_executable_falls_back_to_path_lookup() {
        let path = default_executable(Some(Path::new("/nonexistent/dir/ssh-probe")));
        assert_eq!(path, PathBuf::from(WRAPPER_BIN));
        assert_eq!(default_executable(None), PathBuf::from(WRAPPER_BIN));
    }

    #[test]
    fn check_kind_serializes_snake_case() {
        let json = serde_json::to_string(&CheckKind::ExitCode).unwrap();
        assert_eq!(json, "\"exit_code\"");
    }
}
