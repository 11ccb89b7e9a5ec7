// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::blocks::Tipset;
use crate::db::secondary::{CacheKey, MemoryCache, SecondaryCache};
use crate::shim::clock::ChainEpoch;

/// The tipset at `epoch`, or the closest one above it when `epoch` is a null
/// round. `chain` must be sorted by epoch.
pub fn epoch_of(chain: &[Arc<Tipset>], epoch: ChainEpoch) -> Arc<Tipset> {
    let idx = chain.partition_point(|ts| ts.epoch() < epoch);
    chain[idx].clone()
}

/// A shared cache whose every operation fails, as an unreachable server would.
#[derive(Debug, Default)]
pub struct FailingCache {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl FailingCache {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl SecondaryCache for FailingCache {
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        anyhow::bail!("connection refused reading {key}")
    }

    fn write_bin(&self, key: &CacheKey, _: &[u8], _: Option<Duration>) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        anyhow::bail!("connection refused writing {key}")
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        anyhow::bail!("connection refused deleting {key}")
    }
}

/// A shared cache that mangles what it stores: look-back entries come back
/// with a parent height above their own height, anything else as garbage.
#[derive(Debug, Default)]
pub struct CorruptCache {
    inner: MemoryCache,
}

impl SecondaryCache for CorruptCache {
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        self.inner.read_bin(key)
    }

    fn write_bin(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let mangled = match serde_json::from_slice::<serde_json::Value>(value) {
            Ok(mut entry) => {
                let height = entry["Ts"]["Height"].as_i64().unwrap_or_default();
                entry["ParentHeight"] = serde_json::json!(height + 1);
                serde_json::to_vec(&entry)?
            }
            Err(_) => b"\xff".to_vec(),
        };
        self.inner.write_bin(key, &mangled, ttl)
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.inner.delete(key)
    }
}

#[test]
fn epoch_of_skips_null_rounds() {
    let store = crate::db::MemoryTipsetStore::default();
    let chain = store.build_chain(10, |epoch| epoch == 4 || epoch == 5);
    assert_eq!(epoch_of(&chain, 3).epoch(), 3);
    assert_eq!(epoch_of(&chain, 4).epoch(), 6);
    assert_eq!(epoch_of(&chain, 10).epoch(), 10);
}
