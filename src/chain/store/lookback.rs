// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::index::walk_back;
use super::{Error, IndexConfig, TipsetLoader};
use crate::blocks::{Tipset, TipsetKey};
use crate::db::secondary::{KeyScheme, SecondaryCache, SecondaryCacheExt as _};
use crate::metrics;
use crate::shim::clock::{ChainEpoch, ChainEpochDelta};
use crate::utils::cache::ArcCache;

/// In-memory look-back entries, keyed by the tipset they describe.
pub type SkipCache = ArcCache<TipsetKey, Arc<LookbackEntry>>;

/// A skip pointer: from `tipset` straight to an ancestor roughly one stride
/// below it. Entries are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LookbackEntry {
    #[serde(rename = "Ts")]
    tipset: Arc<Tipset>,
    parent_height: ChainEpoch,
    target_height: ChainEpoch,
    target: TipsetKey,
}

impl LookbackEntry {
    pub fn new(tipset: Arc<Tipset>, parent: &Tipset, target: &Tipset) -> Self {
        Self {
            tipset,
            parent_height: parent.epoch(),
            target_height: target.epoch(),
            target: target.key().clone(),
        }
    }

    /// The terminal entry. It has nowhere to skip to.
    pub fn genesis(tipset: Arc<Tipset>) -> Self {
        Self {
            tipset,
            parent_height: 0,
            target_height: 0,
            target: TipsetKey::default(),
        }
    }

    pub fn tipset(&self) -> &Arc<Tipset> {
        &self.tipset
    }

    pub fn parent_height(&self) -> ChainEpoch {
        self.parent_height
    }

    pub fn target_height(&self) -> ChainEpoch {
        self.target_height
    }

    pub fn target(&self) -> &TipsetKey {
        &self.target
    }

    /// Checks the height ordering every well-formed entry satisfies. Entries
    /// coming from outside the process are only trusted when this holds.
    pub fn is_consistent(&self) -> bool {
        if self.tipset.is_genesis() {
            return self.parent_height == 0 && self.target_height == 0 && self.target.is_empty();
        }
        0 <= self.target_height
            && self.target_height <= self.parent_height
            && self.parent_height < self.tipset.epoch()
            && !self.target.is_empty()
    }
}

/// Builds look-back entries and places them in the cache tier matching their
/// age.
pub struct LookbackBuilder<L: ?Sized> {
    loader: Arc<L>,
    skip_cache: Arc<SkipCache>,
    secondary: Arc<dyn SecondaryCache>,
    skip_length: ChainEpochDelta,
    recency_threshold: ChainEpochDelta,
    cache_historical_in_memory: bool,
    key_scheme: KeyScheme,
}

impl<L: TipsetLoader + ?Sized> LookbackBuilder<L> {
    pub fn new(
        loader: Arc<L>,
        skip_cache: Arc<SkipCache>,
        secondary: Arc<dyn SecondaryCache>,
        config: &IndexConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            loader,
            skip_cache,
            secondary,
            skip_length: config.skip_length,
            recency_threshold: config.recency_threshold,
            cache_historical_in_memory: config.cache_historical_in_memory,
            key_scheme: config.key_scheme,
        })
    }

    /// Tipsets above `head - recency_threshold` may still be reorged away.
    pub fn is_recent(&self, epoch: ChainEpoch, head: ChainEpoch) -> bool {
        epoch > head.saturating_sub(self.recency_threshold)
    }

    /// Computes the entry of `tsk` without touching any cache.
    pub fn build(&self, tsk: &TipsetKey, head: ChainEpoch) -> Result<LookbackEntry, Error> {
        let ts = self.loader.load_tipset(tsk)?;
        if ts.is_genesis() {
            return Ok(LookbackEntry::genesis(ts));
        }
        let parent = self.loader.load_tipset(ts.parents())?;

        // Recent entries skip twice as far, so that their targets are more
        // likely to be historical already.
        let mut target_height = (ts.epoch() / self.skip_length) * self.skip_length - 1;
        if self.is_recent(ts.epoch(), head) {
            target_height -= self.skip_length;
        }
        let target_height = target_height.max(0);

        let target = if parent.epoch() < target_height {
            parent.clone()
        } else {
            walk_back(self.loader.as_ref(), parent.clone(), target_height)?
        };
        Ok(LookbackEntry::new(ts, &parent, &target))
    }

    /// Builds the entry of `tsk` and stores it. Recent entries stay in
    /// memory. Historical ones go to the shared cache without expiration, and
    /// to memory too unless disabled.
    pub fn fill_cache(
        &self,
        tsk: &TipsetKey,
        head: ChainEpoch,
    ) -> Result<Arc<LookbackEntry>, Error> {
        let entry = Arc::new(self.build(tsk, head)?);
        let epoch = entry.tipset().epoch();
        if self.is_recent(epoch, head) {
            debug!("caching recent look-back entry at epoch {epoch} in memory");
            self.skip_cache.insert(tsk.clone(), entry.clone());
            return Ok(entry);
        }

        if self.secondary.is_enabled() {
            let key = self.key_scheme.cache_key(tsk, epoch);
            match self.secondary.write_obj(&key, entry.as_ref(), None) {
                Ok(()) => debug!("stored look-back entry {key} in shared cache"),
                Err(e) => {
                    metrics::SECONDARY_CACHE_ERROR
                        .get_or_create(&metrics::values::WRITE)
                        .inc();
                    warn!("failed to store look-back entry {key} in shared cache: {e:#}");
                }
            }
        }
        if self.cache_historical_in_memory {
            self.skip_cache.insert(tsk.clone(), entry.clone());
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTipsetStore;
    use crate::db::secondary::{CacheKey, MemoryCache, NoopCache, SecondaryCacheExt as _};
    use crate::test_utils::epoch_of;
    use nonzero_ext::nonzero;
    use serde_json::json;

    fn builder(
        store: &Arc<MemoryTipsetStore>,
        secondary: Arc<dyn SecondaryCache>,
        config: &IndexConfig,
    ) -> LookbackBuilder<MemoryTipsetStore> {
        LookbackBuilder::new(
            store.clone(),
            Arc::new(SkipCache::new(nonzero!(1024usize))),
            secondary,
            config,
        )
        .unwrap()
    }

    fn config(recency_threshold: ChainEpochDelta) -> IndexConfig {
        IndexConfig {
            recency_threshold,
            ..Default::default()
        }
    }

    #[test]
    fn genesis_entry() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(5, |_| false);
        let entry = builder(&store, Arc::new(NoopCache), &config(0))
            .build(chain[0].key(), 1000)
            .unwrap();
        assert_eq!(entry.parent_height(), 0);
        assert_eq!(entry.target_height(), 0);
        assert!(entry.target().is_empty());
        assert!(entry.is_consistent());
    }

    #[test]
    fn historical_targets() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(100, |_| false);
        let builder = builder(&store, Arc::new(NoopCache), &config(10));
        // head is far ahead, nothing is recent
        let entry = builder.build(chain[60].key(), 1000).unwrap();
        assert_eq!(entry.parent_height(), 59);
        assert_eq!(entry.target_height(), 59);
        let entry = builder.build(chain[59].key(), 1000).unwrap();
        assert_eq!(entry.target_height(), 39);
        assert_eq!(entry.target(), chain[39].key());
        // below the first stride the target is genesis
        let entry = builder.build(chain[19].key(), 1000).unwrap();
        assert_eq!(entry.target_height(), 0);
        assert!(entry.is_consistent());
    }

    #[test]
    fn recent_targets_skip_further() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(100, |_| false);
        let builder = builder(&store, Arc::new(NoopCache), &config(10));
        assert!(builder.is_recent(95, 100));
        assert!(!builder.is_recent(90, 100));
        let entry = builder.build(chain[95].key(), 100).unwrap();
        assert_eq!(entry.target_height(), 59);
        let entry = builder.build(chain[85].key(), 100).unwrap();
        assert_eq!(entry.target_height(), 79);
    }

    #[test]
    fn null_rounds_below_target() {
        let store = Arc::new(MemoryTipsetStore::default());
        // 36..=39 are null rounds
        let chain = store.build_chain(50, |epoch| (36..40).contains(&epoch));
        let builder = builder(&store, Arc::new(NoopCache), &config(0));
        let at = |epoch| chain.iter().find(|ts| ts.epoch() == epoch).unwrap();
        let entry = builder.build(at(45).key(), 1000).unwrap();
        assert_eq!(entry.target_height(), 40);
        let entry = builder.build(at(40).key(), 1000).unwrap();
        assert_eq!(entry.parent_height(), 35);
        assert_eq!(entry.target_height(), 35);
        assert!(entry.is_consistent());
    }

    #[test]
    fn placement_by_age() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(1000, |_| false);
        let secondary = Arc::new(MemoryCache::default());
        let builder = builder(&store, secondary.clone(), &config(100));

        let recent = chain[999].key();
        builder.fill_cache(recent, 1000).unwrap();
        assert!(builder.skip_cache.contains(recent));
        assert!(!secondary.contains(&CacheKey::Tipset(recent.clone())));

        let historical = chain[899].key();
        builder.fill_cache(historical, 1000).unwrap();
        assert!(builder.skip_cache.contains(historical));
        assert_eq!(
            secondary.ttl(&CacheKey::Tipset(historical.clone())),
            Some(None)
        );
    }

    #[test]
    fn historical_stays_out_of_memory_when_disabled() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(200, |_| false);
        let secondary = Arc::new(MemoryCache::default());
        let config = IndexConfig {
            recency_threshold: 10,
            cache_historical_in_memory: false,
            key_scheme: KeyScheme::Height,
            ..Default::default()
        };
        let builder = builder(&store, secondary.clone(), &config);
        builder.fill_cache(chain[150].key(), 200).unwrap();
        assert!(builder.skip_cache.is_empty());
        assert!(secondary.contains(&CacheKey::Height(150)));
    }

    #[test]
    fn concurrent_builds_agree() {
        let store = Arc::new(MemoryTipsetStore::default());
        // the target of the historical key falls into null rounds
        let chain = store.build_chain(1000, |epoch| (830..=845).contains(&epoch));
        let secondary = Arc::new(MemoryCache::default());
        let builder = builder(&store, secondary.clone(), &config(100));
        let historical = epoch_of(&chain, 850);
        let keys = [chain.last().unwrap().key(), historical.key()];

        let built: Vec<Vec<Arc<LookbackEntry>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let builder = &builder;
                    s.spawn(move || {
                        keys.iter()
                            .map(|key| {
                                if t % 2 == 0 {
                                    builder.fill_cache(key, 1000).unwrap()
                                } else {
                                    Arc::new(builder.build(key, 1000).unwrap())
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (i, key) in keys.iter().enumerate() {
            let expected = builder.build(key, 1000).unwrap();
            for entries in &built {
                assert_eq!(entries[i].target_height(), expected.target_height());
                assert_eq!(entries[i].target(), expected.target());
                assert_eq!(*entries[i], expected);
            }
            assert_eq!(
                builder.skip_cache.get(key).as_deref(),
                Some(&expected)
            );
        }
        let shared = secondary
            .read_obj::<LookbackEntry>(&CacheKey::Tipset(keys[1].clone()))
            .unwrap()
            .unwrap();
        assert_eq!(shared.target_height(), 846);
        assert_eq!(shared, builder.build(keys[1], 1000).unwrap());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let store = Arc::new(MemoryTipsetStore::default());
        let config = IndexConfig {
            skip_length: 0,
            ..Default::default()
        };
        assert!(
            LookbackBuilder::new(
                store,
                Arc::new(SkipCache::new(nonzero!(8usize))),
                Arc::new(NoopCache),
                &config,
            )
            .is_err()
        );
    }

    #[test]
    fn json_payload() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(30, |_| false);
        let entry = LookbackEntry::new(chain[25].clone(), &chain[24], &chain[19]);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["ParentHeight"], json!(24));
        assert_eq!(value["TargetHeight"], json!(19));
        assert_eq!(value["Ts"]["Height"], json!(25));
        assert_eq!(
            value["Target"],
            serde_json::to_value(chain[19].key()).unwrap()
        );
        assert_eq!(
            serde_json::from_value::<LookbackEntry>(value).unwrap(),
            entry
        );
    }

    #[test]
    fn inconsistent_entries() {
        let store = Arc::new(MemoryTipsetStore::default());
        let chain = store.build_chain(30, |_| false);
        // target above parent
        let entry = LookbackEntry::new(chain[25].clone(), &chain[20], &chain[24]);
        assert!(!entry.is_consistent());
        // parent not below the tipset
        let entry = LookbackEntry::new(chain[25].clone(), &chain[25], &chain[19]);
        assert!(!entry.is_consistent());
        let entry = LookbackEntry::genesis(chain[3].clone());
        assert!(!entry.is_consistent());
    }
}
