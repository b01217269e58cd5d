// ABOUTME: Test support utilities.
// ABOUTME: Writes executable stand-in scripts and builds wrapper commands with a clean environment.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write `body` to `dir/name` and make it executable.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Stand-in SSH client: prints the FIPS banner, then runs the last argument
/// (the remote command) with `sh -c`, ignoring every option before it.
pub fn fake_ssh(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-ssh",
        r#"#!/bin/sh
echo "FIPS mode initialized" >&2
for last; do :; done
exec sh -c "$last"
"#,
    )
}

/// ssh-wrapper with config discovery and logging neutralized.
pub fn wrapper_cmd(program: impl AsRef<std::ffi::OsStr>) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ssh-wrapper"));
    cmd.env("SSH_WRAPPER_PROGRAM", program)
        .env_remove("SSH_WRAPPER_CONFIG")
        .env_remove("SSH_WRAPPER_LOG");
    cmd
}

/// The wrapper running `sh -c script`.
pub fn wrapper_sh(script: &str) -> Command {
    let mut cmd = wrapper_cmd("sh");
    cmd.arg("-c").arg(script);
    cmd
}
