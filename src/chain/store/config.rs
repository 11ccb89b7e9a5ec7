// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::num::NonZeroUsize;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::db::secondary::KeyScheme;
use crate::shim::clock::{ChainEpochDelta, EPOCHS_IN_DAY};

const DEFAULT_CHAIN_INDEX_CACHE_SIZE: NonZeroUsize = nonzero!(32_768usize);

/// Configuration which sets the length of tipsets to skip in between each cached entry.
const DEFAULT_SKIP_LENGTH: ChainEpochDelta = 20;

/// Tipsets younger than this are still subject to reorgs.
const DEFAULT_RECENCY_THRESHOLD: ChainEpochDelta = 7 * EPOCHS_IN_DAY;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of look-back entries kept in memory.
    pub hot_cache_size: NonZeroUsize,
    /// Distance between skip pointers, and the longest lookup that is served
    /// by a plain walk.
    pub skip_length: ChainEpochDelta,
    /// Age, in epochs relative to the estimated head, below which a tipset is
    /// considered recent.
    pub recency_threshold: ChainEpochDelta,
    /// Also keep historical entries in memory, not only in the shared cache.
    pub cache_historical_in_memory: bool,
    /// How historical entries are keyed in the shared cache.
    pub key_scheme: KeyScheme,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            hot_cache_size: DEFAULT_CHAIN_INDEX_CACHE_SIZE,
            skip_length: DEFAULT_SKIP_LENGTH,
            recency_threshold: DEFAULT_RECENCY_THRESHOLD,
            cache_historical_in_memory: true,
            key_scheme: KeyScheme::default(),
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.skip_length > 0,
            "skip_length must be positive, got {}",
            self.skip_length
        );
        anyhow::ensure!(
            self.recency_threshold >= 0,
            "recency_threshold must not be negative, got {}",
            self.recency_threshold
        );
        Ok(())
    }
}
