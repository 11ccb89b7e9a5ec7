// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::ffi::OsString;

use clap::Parser;

use super::subcommands::{Cli, Subcommand};
use crate::cli_shared::{logger, read_config};

pub fn main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    ArgT: Into<OsString> + Clone,
{
    // Capture Cli inputs
    let Cli { opts, cmd } = Cli::parse_from(args);

    logger::setup_logger(logger::LoggerOpts {
        color: opts.color,
        json: opts.log_json,
    });
    let config = read_config(opts.config.as_deref())?;

    // Run command
    match cmd {
        Subcommand::Config(cmd) => cmd.run(&config, &mut std::io::stdout()),
        Subcommand::Head(cmd) => cmd.run(&config),
        Subcommand::Cache(cmd) => cmd.run(&config),
        Subcommand::Bench(cmd) => cmd.run(&config),
    }
}
