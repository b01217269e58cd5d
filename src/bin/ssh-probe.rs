// ABOUTME: Entry point for ssh-probe: connection self-test through ssh-wrapper.
// ABOUTME: Probes every target independently and exits non-zero if any check fails.

use clap::Parser;
use ssh_wrapper::cli::Cli;
use ssh_wrapper::config::Config;
use ssh_wrapper::logging;
use ssh_wrapper::output::Output;
use ssh_wrapper::probe::{self, Probe, SshInvocation, Target};
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    let output = Output::new(cli.output_mode());
    match run(cli, &output).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Probe all targets; `Ok(false)` if any check failed.
async fn run(cli: Cli, output: &Output) -> probe::Result<bool> {
    let config = Config::from_env()?;
    let executable = cli
        .ssh
        .clone()
        .unwrap_or_else(|| probe::default_executable(env::current_exe().ok().as_deref()));

    let targets = cli
        .targets
        .iter()
        .map(|t| Target::parse(t))
        .collect::<probe::Result<Vec<_>>>()?;

    let mut all_passed = true;
    for target in targets {
        output.progress(&format!("→ Probing {target} via {}...", executable.display()));

        let mut invocation = SshInvocation::from_defaults(target, &config.probe);
        if let Some(user) = &cli.user {
            invocation = invocation.user(user);
        }
        if let Some(key) = &cli.identity {
            invocation = invocation.identity_file(key);
        }
        if let Some(ssh_config) = &cli.ssh_config {
            invocation = invocation.ssh_config(ssh_config);
        }
        if let Some(timeout) = cli.connect_timeout {
            invocation = invocation.connect_timeout(timeout);
        }

        let mut probe = Probe::new(&executable, invocation).command_timeout(cli.command_timeout);
        if !cli.no_compare {
            probe = probe.compare_with(&config.program);
        }
        let report = probe.run(cli.reps).await?;
        all_passed &= report.passed();
        output.report(&report);
    }

    Ok(all_passed)
}
