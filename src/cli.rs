// ABOUTME: Command-line interface for ssh-probe using clap derive macros.
// ABOUTME: ssh-wrapper itself has no CLI; it forwards argv untouched.

use crate::output::OutputMode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ssh-probe")]
#[command(about = "Check SSH connectivity to reconstruction hosts through ssh-wrapper")]
#[command(version)]
pub struct Cli {
    /// Hosts to probe, as [user@]host[:port]
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Login user for targets that do not name one
    #[arg(short = 'l', long)]
    pub user: Option<String>,

    /// Private key file
    #[arg(short, long)]
    pub identity: Option<PathBuf>,

    /// SSH client config file (use /dev/null to ignore ~/.ssh/config)
    #[arg(short = 'F', long)]
    pub ssh_config: Option<PathBuf>,

    /// SSH executable to run (defaults to ssh-wrapper next to this binary)
    #[arg(long)]
    pub ssh: Option<PathBuf>,

    /// Round trips to time after the checks pass
    #[arg(long, default_value_t = 10)]
    pub reps: u32,

    /// Skip timing the SSH client without the wrapper
    #[arg(long)]
    pub no_compare: bool,

    /// SSH connect timeout, e.g. "5s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// Upper bound for a single remote command, e.g. "1m"
    #[arg(long, value_parser = humantime::parse_duration, default_value = "60s")]
    pub command_timeout: Duration,

    /// Print only the final result per target
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn defaults() {
        let cli = parse(&["ssh-probe", "recon1"]).unwrap();
        assert_eq!(cli.targets, vec!["recon1"]);
        assert_eq!(cli.reps, 10);
        assert_eq!(cli.command_timeout, Duration::from_secs(60));
        assert!(cli.connect_timeout.is_none());
        assert!(!cli.no_compare);
        assert_eq!(cli.output_mode(), OutputMode::Normal);
    }

    #[test]
    fn all_options() {
        let cli = parse(&[
            "ssh-probe",
            "-l",
            "autorec",
            "-i",
            "/opt/autorec/id_recon",
            "-F",
            "/dev/null",
            "--ssh",
            "/usr/local/bin/ssh-wrapper",
            "--reps",
            "3",
            "--connect-timeout",
            "2s",
            "--no-compare",
            "--json",
            "recon1",
            "recon2:2222",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("autorec"));
        assert_eq!(cli.identity, Some(PathBuf::from("/opt/autorec/id_recon")));
        assert_eq!(cli.ssh_config, Some(PathBuf::from("/dev/null")));
        assert_eq!(cli.reps, 3);
        assert_eq!(cli.connect_timeout, Some(Duration::from_secs(2)));
        assert!(cli.no_compare);
        assert_eq!(cli.targets.len(), 2);
        assert_eq!(cli.output_mode(), OutputMode::Json);
    }

    #[test]
    fn target_is_required() {
        assert!(parse(&["ssh-probe"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_json() {
        assert!(parse(&["ssh-probe", "--quiet", "--json", "recon1"]).is_err());
    }

    #[test]
    fn bad_duration_is_rejected() {
        assert!(parse(&["ssh-probe", "--connect-timeout", "soon", "recon1"]).is_err());
    }
}
