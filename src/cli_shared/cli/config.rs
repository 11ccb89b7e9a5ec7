// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::chain::IndexConfig;
use crate::db::secondary::SecondaryCacheConfig;
use crate::networks::ChainConfig;

#[derive(Serialize, Deserialize, PartialEq, Eq, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub chain: ChainConfig,
    pub index: IndexConfig,
    pub secondary_cache: SecondaryCacheConfig,
}

impl Config {
    /// Rejects settings the index cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.index.validate()?;
        self.chain.clock()?;
        Ok(())
    }
}
