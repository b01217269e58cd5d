// ABOUTME: Entry point for ssh-wrapper: runs the wrapped SSH client with filtered stderr.
// ABOUTME: Takes no flags of its own; every argument is passed through verbatim.

use ssh_wrapper::config::Config;
use ssh_wrapper::error::EXIT_WRAPPER_FAILURE;
use ssh_wrapper::launcher::Launcher;
use ssh_wrapper::logging;
use std::env;
use std::ffi::OsString;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<OsString> = env::args_os().skip(1).collect();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ssh-wrapper: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    logging::init_wrapper(&config.log);

    let launcher = Launcher::from_config(&config);
    match launcher.run(&args).await {
        Ok(state) => ExitCode::from(state.exit_code().unwrap_or(EXIT_WRAPPER_FAILURE)),
        Err(e) => {
            tracing::error!(error = %e, "launch failed");
            eprintln!("ssh-wrapper: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
