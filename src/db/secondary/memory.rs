// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::{Duration, Instant};

use ahash::HashMap;
use parking_lot::RwLock;

use super::{CacheKey, SecondaryCache};

#[derive(Debug, Clone)]
struct Slot {
    value: Vec<u8>,
    ttl: Option<Duration>,
    written_at: Instant,
}

impl Slot {
    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.written_at.elapsed() >= ttl)
    }
}

/// In-process [`SecondaryCache`], honouring expirations. Can be shared by
/// several chain indexes through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Slot>>,
}

impl MemoryCache {
    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .get(&key.to_string())
            .is_some_and(|slot| !slot.is_expired())
    }

    /// The expiration a key was written with, if the key exists.
    pub fn ttl(&self, key: &CacheKey) -> Option<Option<Duration>> {
        self.entries.read().get(&key.to_string()).map(|slot| slot.ttl)
    }
}

impl SecondaryCache for MemoryCache {
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        let key = key.to_string();
        let mut expired = false;
        if let Some(slot) = self.entries.read().get(&key) {
            if !slot.is_expired() {
                return Ok(Some(slot.value.clone()));
            }
            expired = true;
        }
        if expired {
            self.entries.write().remove(&key);
        }
        Ok(None)
    }

    fn write_bin(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        self.entries.write().insert(
            key.to_string(),
            Slot {
                value: value.to_vec(),
                ttl,
                written_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.entries.write().remove(&key.to_string());
        Ok(())
    }
}
