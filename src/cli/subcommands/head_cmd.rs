// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::cli_shared::cli::Config;
use crate::networks::HeadHeightEstimator as _;

#[derive(Debug, clap::Args)]
pub struct HeadCommand {
    /// Estimate the head at this unix timestamp instead of now
    #[arg(long)]
    at: Option<u64>,
}

impl HeadCommand {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let clock = config.chain.clock()?;
        let epoch = match self.at {
            Some(timestamp) => clock.expected_epoch_at(timestamp),
            None => clock.estimate_head_height(),
        };
        println!("{epoch}");
        Ok(())
    }
}
