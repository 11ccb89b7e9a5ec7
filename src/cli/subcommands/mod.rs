// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod bench_cmd;
mod cache_cmd;
mod config_cmd;
mod head_cmd;

use std::path::PathBuf;

use clap::Parser;

pub(super) use self::{
    bench_cmd::BenchCommand, cache_cmd::CacheCommands, config_cmd::ConfigCommand,
    head_cmd::HeadCommand,
};
use crate::utils::misc::LoggingColor;

/// Command line interface of the chain index tooling
#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"), author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(flatten)]
    pub opts: CliOpts,
    #[command(subcommand)]
    pub cmd: Subcommand,
}

#[derive(Debug, clap::Args)]
pub struct CliOpts {
    /// A TOML file containing relevant configurations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable or disable colored logging
    #[arg(long, global = true, default_value = "auto")]
    pub color: LoggingColor,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Sub-commands available.
#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Print the effective configuration
    Config(ConfigCommand),

    /// Print the estimated chain head height
    Head(HeadCommand),

    /// Inspect or modify the shared chain index cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Measure lookups on a synthetic chain
    Bench(BenchCommand),
}
