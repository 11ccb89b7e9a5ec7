// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{fmt::Display, str::FromStr};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::shim::clock::{ChainEpoch, EPOCH_DURATION_SECONDS};

pub mod calibnet;
pub mod mainnet;

/// Forest builtin `filecoin` network chains. In general only `mainnet` and its
/// chain information should be considered stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NetworkChain {
    #[default]
    Mainnet,
    Calibnet,
    Devnet(String),
}

impl FromStr for NetworkChain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(NetworkChain::Mainnet),
            "calibnet" => Ok(NetworkChain::Calibnet),
            "" => anyhow::bail!("network name must not be empty"),
            name => Ok(NetworkChain::Devnet(name.to_owned())),
        }
    }
}

impl Display for NetworkChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkChain::Mainnet => write!(f, "mainnet"),
            NetworkChain::Calibnet => write!(f, "calibnet"),
            NetworkChain::Devnet(name) => write!(f, "{name}"),
        }
    }
}

impl NetworkChain {
    /// Genesis timestamp of the builtin networks. Devnets have none.
    pub fn builtin_genesis_timestamp(&self) -> Option<u64> {
        match self {
            NetworkChain::Mainnet => Some(mainnet::GENESIS_TIMESTAMP),
            NetworkChain::Calibnet => Some(calibnet::GENESIS_TIMESTAMP),
            NetworkChain::Devnet(_) => None,
        }
    }
}

/// Network parameters needed to estimate the chain head from the wall clock.
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct ChainConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub network: NetworkChain,
    /// Overrides the builtin genesis timestamp. Required for devnets.
    pub genesis_timestamp: Option<u64>,
    pub block_delay_secs: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: NetworkChain::Mainnet,
            genesis_timestamp: None,
            block_delay_secs: EPOCH_DURATION_SECONDS as u32,
        }
    }
}

impl ChainConfig {
    pub fn calibnet() -> Self {
        Self {
            network: NetworkChain::Calibnet,
            ..Default::default()
        }
    }

    pub fn genesis_timestamp(&self) -> anyhow::Result<u64> {
        self.genesis_timestamp
            .or_else(|| self.network.builtin_genesis_timestamp())
            .with_context(|| format!("no genesis timestamp known for network {}", self.network))
    }

    /// Builds the head estimator for this network.
    pub fn clock(&self) -> anyhow::Result<ChainClock> {
        anyhow::ensure!(self.block_delay_secs > 0, "block delay must be positive");
        Ok(ChainClock::new(
            self.genesis_timestamp()?,
            self.block_delay_secs,
        ))
    }
}

/// Returns the epoch a fully synced node is expected to be at, given the
/// current time.
pub fn calculate_expected_epoch(
    now_timestamp: u64,
    genesis_timestamp: u64,
    block_delay: u32,
) -> ChainEpoch {
    (now_timestamp.saturating_sub(genesis_timestamp) / u64::from(block_delay)) as ChainEpoch
}

/// Estimates the current chain head height without touching the chain. The
/// estimate is only used to tell recent tipsets from historical ones, so it
/// may be off by a fair margin.
pub trait HeadHeightEstimator: Send + Sync {
    fn estimate_head_height(&self) -> ChainEpoch;
}

impl<F> HeadHeightEstimator for F
where
    F: Fn() -> ChainEpoch + Send + Sync,
{
    fn estimate_head_height(&self) -> ChainEpoch {
        self()
    }
}

/// Wall clock based [`HeadHeightEstimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Constructor)]
pub struct ChainClock {
    genesis_timestamp: u64,
    block_delay_secs: u32,
}

impl ChainClock {
    pub fn expected_epoch_at(&self, now_timestamp: u64) -> ChainEpoch {
        calculate_expected_epoch(now_timestamp, self.genesis_timestamp, self.block_delay_secs)
    }
}

impl HeadHeightEstimator for ChainClock {
    fn estimate_head_height(&self) -> ChainEpoch {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.expected_epoch_at(now)
    }
}
