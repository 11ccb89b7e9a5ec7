// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use tracing::{debug, warn};

use super::lookback::{LookbackBuilder, LookbackEntry, SkipCache};
use super::{Error, IndexConfig, TipsetLoader};
use crate::blocks::{Tipset, TipsetKey};
use crate::db::secondary::{
    CacheKey, KeyScheme, NoopCache, SecondaryCache, SecondaryCacheExt as _,
};
use crate::metrics;
use crate::networks::HeadHeightEstimator;
use crate::shim::clock::{ChainEpoch, ChainEpochDelta};

/// Keeps look-back tipsets in cache at a given interval `skip_length` and can
/// be used to look-back at the chain to retrieve an old tipset.
pub struct ChainIndex<L: ?Sized> {
    /// Look-back entries of this process.
    skip_cache: Arc<SkipCache>,
    /// Look-back entries shared with other processes.
    secondary: Arc<dyn SecondaryCache>,
    head: Arc<dyn HeadHeightEstimator>,
    builder: LookbackBuilder<L>,
    /// Source of tipsets, needed to walk the chain.
    loader: Arc<L>,
    skip_length: ChainEpochDelta,
    key_scheme: KeyScheme,
    cache_historical_in_memory: bool,
}

#[derive(Debug, Clone, Copy)]
/// Methods for resolving fetches of null tipsets.
/// Imagine epoch 10 is null but epoch 9 and 11 exist. If epoch we request epoch
/// 10, should 9 or 11 be returned?
pub enum ResolveNullTipset {
    TakeNewer,
    TakeOlder,
}

/// Head estimate of an index without a clock. Every tipset counts as recent.
fn genesis_head() -> ChainEpoch {
    0
}

impl<L: TipsetLoader + ?Sized> ChainIndex<L> {
    pub fn new(
        loader: Arc<L>,
        secondary: Arc<dyn SecondaryCache>,
        head: Arc<dyn HeadHeightEstimator>,
        config: &IndexConfig,
    ) -> anyhow::Result<Self> {
        let skip_cache = Arc::new(SkipCache::new(config.hot_cache_size));
        let builder = LookbackBuilder::new(
            loader.clone(),
            skip_cache.clone(),
            secondary.clone(),
            config,
        )?;
        Ok(Self {
            skip_cache,
            secondary,
            head,
            builder,
            loader,
            skip_length: config.skip_length,
            key_scheme: config.key_scheme,
            cache_historical_in_memory: config.cache_historical_in_memory,
        })
    }

    /// An index that keeps every entry in memory and shares nothing.
    pub fn local_only(loader: Arc<L>, config: &IndexConfig) -> anyhow::Result<Self> {
        Self::new(loader, Arc::new(NoopCache), Arc::new(genesis_head), config)
    }

    pub fn load_tipset(&self, tsk: &TipsetKey) -> Result<Arc<Tipset>, Error> {
        self.loader.load_tipset(tsk)
    }

    /// Number of look-back entries held in memory.
    pub fn skip_cache_len(&self) -> usize {
        self.skip_cache.len()
    }

    /// Find tipset at epoch `to` in the chain of ancestors starting at `from`.
    /// If `to` is a null round, the closest tipset above it is returned. If
    /// `to` is not in the range `[0, from.epoch()]` an error is returned.
    ///
    /// Lookups longer than one stride follow the skip pointers of the
    /// look-back entries, building missing ones on the way.
    pub fn get_tipset_by_height(
        &self,
        from: Arc<Tipset>,
        to: ChainEpoch,
    ) -> Result<Arc<Tipset>, Error> {
        self.skip_walk(from, to).map(|(ts, _)| ts)
    }

    /// Same as [`ChainIndex::get_tipset_by_height`], walking parent by parent.
    pub fn get_tipset_by_height_without_cache(
        &self,
        from: Arc<Tipset>,
        to: ChainEpoch,
    ) -> Result<Arc<Tipset>, Error> {
        walk_back(self.loader.as_ref(), from, to)
    }

    /// Find tipset at epoch `to` in the chain of ancestors starting at `from`.
    /// If the tipset is _not_ in the chain of ancestors (i.e., if the `to`
    /// epoch is higher than `from.epoch()`), an error will be returned.
    ///
    /// # Why pass in the `from` argument?
    ///
    /// Imagine the database contains five tipsets and a genesis block in this
    /// configuration:
    ///
    /// ```text
    ///           ┌───────┐  ┌────────┐  ┌────────┐
    /// Genesis◄──┤Epoch 1◄──┤Epoch 2A◄──┤Epoch 3A│
    ///           └───▲───┘  └────────┘  └────────┘
    ///               │      ┌────────┐  ┌────────┐
    ///               └──────┤Epoch 2B◄──┤Epoch 3B│
    ///                      └────────┘  └────────┘
    /// ```
    ///
    /// Here we have a fork in the chain and it is ambiguous which tipset to
    /// load when epoch 2 is requested. The ambiguity is solved by passing in a
    /// younger tipset (higher epoch) from which has the desired tipset as an
    /// ancestor.
    /// Calling `tipset_by_height(2, epoch_3a, _)` will return `Epoch 2A`.
    /// Calling `tipset_by_height(2, epoch_3b, _)` will return `Epoch 2B`.
    ///
    /// # What happens when a null tipset is requested?
    ///
    /// ```text
    ///           ┌───────┐          ┌───────┐  ┌───────┐
    /// Genesis◄──┤Epoch 1│   Null   │Epoch 3◄──┤Epoch 4│
    ///           └───▲───┘          └───┬───┘  └───────┘
    ///               │                  │
    ///               └──────────────────┘
    /// ```
    /// If the requested epoch points to a null tipset, there are two options:
    /// Pick the nearest older tipset or pick the nearest younger tipset.
    /// Requesting epoch 2 with [`ResolveNullTipset::TakeNewer`] will return
    /// epoch 3. Requesting with [`ResolveNullTipset::TakeOlder`] will return
    /// epoch 1.
    pub fn tipset_by_height(
        &self,
        to: ChainEpoch,
        from: Arc<Tipset>,
        resolve: ResolveNullTipset,
    ) -> Result<Arc<Tipset>, Error> {
        let ts = self.get_tipset_by_height(from, to)?;
        match resolve {
            ResolveNullTipset::TakeOlder if ts.epoch() > to => self.load_tipset(ts.parents()),
            _ => Ok(ts),
        }
    }

    /// Iterate from the given tipset to genesis. Missing tipsets cut the chain
    /// short.
    pub fn chain(&self, from: Arc<Tipset>) -> impl Iterator<Item = Arc<Tipset>> + '_ {
        std::iter::successors(Some(from), move |child| {
            if child.is_genesis() {
                None
            } else {
                self.load_tipset(child.parents()).ok()
            }
        })
    }

    /// Walks back to the closest epoch that is a multiple of the stride.
    fn round_down(&self, ts: Arc<Tipset>) -> Result<Arc<Tipset>, Error> {
        let target = (ts.epoch() / self.skip_length) * self.skip_length;
        walk_back(self.loader.as_ref(), ts, target)
    }

    /// Resolves `to` from `from`, also returning how many look-back entries
    /// were visited.
    fn skip_walk(
        &self,
        from: Arc<Tipset>,
        to: ChainEpoch,
    ) -> Result<(Arc<Tipset>, usize), Error> {
        if to < 0 || to > from.epoch() {
            return Err(Error::InvalidRange {
                from: from.epoch(),
                to,
            });
        }
        if from.epoch() - to <= self.skip_length {
            return Ok((walk_back(self.loader.as_ref(), from, to)?, 0));
        }

        let rounded = self.round_down(from)?;
        let head = self.head.estimate_head_height();

        let mut cursor = rounded.key().clone();
        let mut cursor_epoch = rounded.epoch();
        let mut hops = 0;
        loop {
            let entry = self.entry(&cursor, cursor_epoch, head)?;
            hops += 1;
            if entry.tipset().epoch() == to || entry.parent_height() < to {
                return Ok((entry.tipset().clone(), hops));
            }
            if to > entry.target_height() {
                return Ok((
                    walk_back(self.loader.as_ref(), entry.tipset().clone(), to)?,
                    hops,
                ));
            }
            cursor = entry.target().clone();
            cursor_epoch = entry.target_height();
        }
    }

    /// Finds the look-back entry of a tipset, trying memory, then the shared
    /// cache, and finally building it.
    fn entry(
        &self,
        tsk: &TipsetKey,
        epoch: ChainEpoch,
        head: ChainEpoch,
    ) -> Result<Arc<LookbackEntry>, Error> {
        if let Some(entry) = self.skip_cache.get(tsk) {
            metrics::LRU_CACHE_HIT
                .get_or_create(&metrics::values::SKIP_HOT)
                .inc();
            return Ok(entry);
        }
        metrics::LRU_CACHE_MISS
            .get_or_create(&metrics::values::SKIP_HOT)
            .inc();

        // Recent entries are never shared.
        if self.secondary.is_enabled() && !self.builder.is_recent(epoch, head) {
            let key = self.key_scheme.cache_key(tsk, epoch);
            match self.read_secondary(&key) {
                Some(entry) if entry.tipset().key() == tsk => {
                    metrics::LRU_CACHE_HIT
                        .get_or_create(&metrics::values::SKIP_SECONDARY)
                        .inc();
                    let entry = Arc::new(entry);
                    if self.cache_historical_in_memory {
                        self.skip_cache.insert(tsk.clone(), entry.clone());
                    }
                    return Ok(entry);
                }
                Some(_) => debug!("shared cache entry {key} belongs to another fork"),
                None => {}
            }
            metrics::LRU_CACHE_MISS
                .get_or_create(&metrics::values::SKIP_SECONDARY)
                .inc();
        }

        self.builder.fill_cache(tsk, head)
    }

    /// Reads an entry from the shared cache. Failures and malformed entries
    /// count as misses.
    fn read_secondary(&self, key: &CacheKey) -> Option<LookbackEntry> {
        match self.secondary.read_obj::<LookbackEntry>(key) {
            Ok(Some(entry)) if entry.is_consistent() => Some(entry),
            Ok(Some(_)) => {
                warn!("ignoring malformed look-back entry {key} in shared cache");
                None
            }
            Ok(None) => None,
            Err(e) => {
                metrics::SECONDARY_CACHE_ERROR
                    .get_or_create(&metrics::values::READ)
                    .inc();
                warn!("failed to read look-back entry {key} from shared cache: {e:#}");
                None
            }
        }
    }
}

/// Walks back parent by parent from `from` to the tipset at epoch `to`. When
/// `to` is a null round, the closest tipset above it is returned.
pub fn walk_back<L: TipsetLoader + ?Sized>(
    loader: &L,
    from: Arc<Tipset>,
    to: ChainEpoch,
) -> Result<Arc<Tipset>, Error> {
    if to < 0 || to > from.epoch() {
        return Err(Error::InvalidRange {
            from: from.epoch(),
            to,
        });
    }

    let mut ts = from;
    while to < ts.epoch() {
        let parent = loader.load_tipset(ts.parents())?;
        if to > parent.epoch() {
            // the epochs between the two are null rounds
            break;
        }
        ts = parent;
    }
    Ok(ts)
}
