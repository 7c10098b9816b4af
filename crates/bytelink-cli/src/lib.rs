//! bytelink command line
//!
//! - `bytelink plan`: validate a plan and print its execution order
//! - `bytelink link`: link one artifact against library addresses
//! - `bytelink simulate`: dry-run a plan against the simulated client

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Command};

/// Run a parsed command, writing its report to `out`
///
/// # Errors
/// Whatever the command fails with
pub async fn run(command: &Command, out: &mut impl std::io::Write) -> anyhow::Result<()> {
    match command {
        Command::Plan(args) => commands::plan(args, out),
        Command::Link(args) => commands::link(args, out),
        Command::Simulate(args) => commands::simulate(args, out).await,
    }
}
