// ABOUTME: Output formatting for the connection probe.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::probe::{CheckResult, ProbeReport, Timing};
use serde::Serialize;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print one check line (normal mode only).
    pub fn check(&self, result: &CheckResult) {
        if self.mode == OutputMode::Normal {
            let verdict = if result.passed { "PASS" } else { "FAIL" };
            println!("  {}: {verdict} ({})", result.check.label(), result.detail);
        }
    }

    /// Print the full report for one target.
    pub fn report(&self, report: &ProbeReport) {
        match self.mode {
            OutputMode::Normal => {
                for result in &report.checks {
                    self.check(result);
                }
                if let Some(timing) = &report.direct_timing {
                    print_timing("ssh client", timing);
                }
                if let Some(timing) = &report.timing {
                    print_timing("with wrapper", timing);
                }
                if let Some(overhead) = report.overhead_secs() {
                    println!("  wrapper overhead per call: {overhead:+.3}s");
                }
                let verdict = if report.passed() { "✓" } else { "✗" };
                println!("  {verdict} {}", report.target);
            }
            OutputMode::Quiet => {
                let verdict = if report.passed() { "ok" } else { "FAILED" };
                println!("{} {verdict}", report.target);
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "report",
                    message: None,
                    report: Some(report),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message: Some(message),
                    report: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

fn print_timing(label: &str, timing: &Timing) {
    println!(
        "  latency per call ({label}): {:.3}s, calls per second: {:.1} ({} reps)",
        timing.latency_secs, timing.calls_per_sec, timing.reps
    );
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ProbeReport>,
}
