// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Optional cache shared between processes. Historical look-back entries never
//! change, so any number of nodes can fill and read the same instance.
//!
//! Every operation is best effort: the chain index logs failures and carries
//! on as if the entry was missing.

mod memory;
mod redis;
mod ssdb;

use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::info;

use crate::blocks::TipsetKey;
use crate::shim::clock::ChainEpoch;

pub use self::memory::MemoryCache;
pub use self::redis::{RedisCache, RedisConfig};
pub use self::ssdb::{SsdbCache, SsdbConfig};

/// Prefix of height keyed entries.
pub const HEIGHT_KEY_PREFIX: &str = "lotus.height";

/// Key of an entry in the shared cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Keyed by the canonical string form of a tipset key.
    Tipset(TipsetKey),
    /// Keyed by epoch, as `lotus.height.{epoch}`.
    Height(ChainEpoch),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Tipset(tsk) => write!(f, "{tsk}"),
            CacheKey::Height(epoch) => write!(f, "{HEIGHT_KEY_PREFIX}.{epoch}"),
        }
    }
}

/// Selects how look-back entries are keyed in the shared cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// One entry per tipset key. Safe across forks.
    #[default]
    Tipset,
    /// One entry per epoch. Allows resolving a historical height without
    /// walking the skip chain at all.
    Height,
}

impl KeyScheme {
    pub fn cache_key(&self, tsk: &TipsetKey, epoch: ChainEpoch) -> CacheKey {
        match self {
            KeyScheme::Tipset => CacheKey::Tipset(tsk.clone()),
            KeyScheme::Height => CacheKey::Height(epoch),
        }
    }
}

/// Raw byte interface to a shared cache backend.
pub trait SecondaryCache: Send + Sync {
    /// Reads a binary value. Missing keys are `Ok(None)`.
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>>;

    /// Writes a binary value. `None` means the value never expires.
    fn write_bin(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>)
    -> anyhow::Result<()>;

    /// Deletes a key. Deleting a missing key is not an error.
    fn delete(&self, key: &CacheKey) -> anyhow::Result<()>;

    /// `false` for the placeholder used when no backend is configured.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Extension trait for the [`SecondaryCache`] trait, storing serializable
/// objects as JSON.
pub trait SecondaryCacheExt {
    fn read_obj<V: DeserializeOwned>(&self, key: &CacheKey) -> anyhow::Result<Option<V>>;
    fn write_obj<V: Serialize>(
        &self,
        key: &CacheKey,
        value: &V,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()>;
}

impl<T: ?Sized + SecondaryCache> SecondaryCacheExt for T {
    fn read_obj<V: DeserializeOwned>(&self, key: &CacheKey) -> anyhow::Result<Option<V>> {
        match self.read_bin(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_obj<V: Serialize>(
        &self,
        key: &CacheKey,
        value: &V,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        self.write_bin(key, &serde_json::to_vec(value)?, ttl)
    }
}

/// Stands in for the shared cache when none is configured: every read misses
/// and every write succeeds without doing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl SecondaryCache for NoopCache {
    fn read_bin(&self, _: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn write_bin(&self, _: &CacheKey, _: &[u8], _: Option<Duration>) -> anyhow::Result<()> {
        Ok(())
    }

    fn delete(&self, _: &CacheKey) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Shared cache backend selection.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SecondaryCacheConfig {
    #[default]
    Disabled,
    /// Generic key/value store with expiration support.
    Redis(RedisConfig),
    /// Hashed key/value store without expiration support.
    Ssdb(SsdbConfig),
}

impl SecondaryCacheConfig {
    /// Connects to the configured backend. Connections are established lazily,
    /// so an unreachable server does not fail here.
    pub fn open(&self) -> anyhow::Result<Arc<dyn SecondaryCache>> {
        Ok(match self {
            SecondaryCacheConfig::Disabled => {
                info!("shared chain index cache disabled");
                Arc::new(NoopCache)
            }
            SecondaryCacheConfig::Redis(config) => {
                info!("using redis at {} as shared chain index cache", config.address);
                Arc::new(RedisCache::new(config)?)
            }
            SecondaryCacheConfig::Ssdb(config) => {
                info!("using ssdb at {} as shared chain index cache", config.address);
                Arc::new(SsdbCache::new(config)?)
            }
        })
    }
}
