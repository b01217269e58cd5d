// ABOUTME: Library root for ssh-wrapper - exposes public types for testing.
// ABOUTME: The binaries are in main.rs (ssh-wrapper) and bin/ssh-probe.rs.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod launcher;
pub mod logging;
pub mod output;
pub mod probe;
pub mod relay;
pub mod signals;
