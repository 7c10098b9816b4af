//! Command line arguments

use bytelink_artifact::Address;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bytelink", version, about = "Link and deploy interdependent contracts")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a plan and print its execution order
    Plan(PlanArgs),
    /// Link one artifact against the given library addresses
    Link(LinkArgs),
    /// Dry-run a plan against an in-process client
    Simulate(SimulateArgs),
}

/// Where the plan comes from
#[derive(Debug, Clone, Args)]
pub struct PlanSource {
    /// Directory of compiler artifacts (Hardhat or Foundry JSON)
    #[arg(long)]
    pub artifacts: PathBuf,

    /// TOML plan manifest
    #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
    pub manifest: Option<PathBuf>,

    /// Built-in plan
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    UniswapV3,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: PlanSource,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Directory of compiler artifacts
    #[arg(long)]
    pub artifacts: PathBuf,

    /// Artifact to link
    #[arg(long)]
    pub artifact: String,

    /// Library address, `NAME=0xADDRESS`; repeat for several libraries
    #[arg(long = "library", value_parser = parse_library)]
    pub libraries: Vec<(String, Address)>,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub source: PlanSource,

    /// Deployer address the simulated addresses derive from
    #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
    pub sender: Address,

    /// Per-step timeout in seconds, off unless given
    #[arg(long)]
    pub step_timeout: Option<u64>,

    /// Print the deployment as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_library(s: &str) -> Result<(String, Address), String> {
    let (name, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ADDRESS, got {s:?}"))?;
    if name.is_empty() {
        return Err("library name is empty".into());
    }
    let address = address.parse::<Address>().map_err(|e| e.to_string())?;
    Ok((name.to_string(), address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_link_libraries() {
        let cli = Cli::try_parse_from([
            "bytelink",
            "link",
            "--artifacts",
            "out",
            "--artifact",
            "User",
            "--library",
            "Math=0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        ])
        .unwrap();
        let Command::Link(args) = cli.command else {
            panic!("expected link");
        };
        assert_eq!(args.libraries.len(), 1);
        assert_eq!(args.libraries[0].0, "Math");
        assert_eq!(args.libraries[0].1, Address::repeat_byte(0xaa, 20));
    }

    #[test]
    fn manifest_and_preset_conflict() {
        let result = Cli::try_parse_from([
            "bytelink",
            "plan",
            "--artifacts",
            "out",
            "--manifest",
            "plan.toml",
            "--preset",
            "uniswap-v3",
        ]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["bytelink", "plan", "--artifacts", "out"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["bytelink", "-vv", "plan", "--artifacts", "out", "--preset", "uniswap-v3"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn bad_library_rejected() {
        assert!(parse_library("Math").is_err());
        assert!(parse_library("=0x01").is_err());
        assert!(parse_library("Math=0xzz").is_err());
    }
}
