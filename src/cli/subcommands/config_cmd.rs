// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::Write;

use anyhow::Context as _;

use crate::cli_shared::cli::Config;

#[derive(Debug, clap::Args)]
pub struct ConfigCommand {}

impl ConfigCommand {
    pub fn run(self, config: &Config, sink: &mut impl Write) -> anyhow::Result<()> {
        writeln!(
            sink,
            "{}",
            toml::to_string_pretty(config).context("could not serialize the configuration")?
        )?;
        Ok(())
    }
}
