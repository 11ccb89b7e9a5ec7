// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod blocks;
mod chain;
mod cli;
mod cli_shared;
mod db;
mod lotus_json;
mod metrics;
mod networks;
mod shim;
#[cfg(test)]
mod test_utils;
mod utils;

/// These items are semver-exempt, and exist for forest author use only
// We want to have doctests, but don't want our internals to be public because:
// - We don't want to be concerned with library compat
//   (We want our cargo semver to be _for the command line_).
// - We don't want to mistakenly export items which we never actually use.
//
// So we re-export the relevant items.
#[doc(hidden)]
pub mod doctest_private {
    pub use crate::utils::io::read_toml;
}

pub use blocks::{Tipset, TipsetKey};
pub use chain::index::walk_back;
pub use chain::{
    ChainIndex, Error, IndexConfig, LookbackBuilder, LookbackEntry, ResolveNullTipset, SkipCache,
    TipsetLoader,
};
pub use cli::main::main as forest_chain_index_main;
pub use cli_shared::cli::Config;
pub use cli_shared::read_config;
pub use db::MemoryTipsetStore;
pub use db::secondary::{
    CacheKey, KeyScheme, MemoryCache, NoopCache, RedisCache, RedisConfig, SecondaryCache,
    SecondaryCacheConfig, SecondaryCacheExt, SsdbCache, SsdbConfig,
};
pub use metrics::encode_default_registry;
pub use networks::{
    ChainClock, ChainConfig, HeadHeightEstimator, NetworkChain, calculate_expected_epoch,
};
pub use shim::clock::{ChainEpoch, ChainEpochDelta};
pub use utils::cache::ArcCache;
