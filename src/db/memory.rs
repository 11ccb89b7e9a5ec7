// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use ahash::HashMap;
use cid::Cid;
use parking_lot::RwLock;

use crate::blocks::{Tipset, TipsetKey};
use crate::chain::{Error, TipsetLoader};
use crate::shim::clock::ChainEpoch;
use crate::utils::cid::CidCborExt as _;

/// Thread-safe in-memory tipset store. Counts how many tipsets were loaded
/// through it, which is how cache effectiveness is measured.
#[derive(Debug, Default)]
pub struct MemoryTipsetStore {
    tipsets: RwLock<HashMap<TipsetKey, Arc<Tipset>>>,
    loads: AtomicUsize,
}

impl MemoryTipsetStore {
    pub fn put(&self, ts: Tipset) -> Arc<Tipset> {
        let ts = Arc::new(ts);
        self.tipsets.write().insert(ts.key().clone(), ts.clone());
        ts
    }

    /// Stores a genesis tipset. Different salts yield different chains.
    pub fn genesis(&self, salt: u64) -> Arc<Tipset> {
        self.put(Tipset::new(
            synthetic_key(&TipsetKey::default(), 0, salt),
            TipsetKey::default(),
            0,
        ))
    }

    /// Stores a child of `parent` at `epoch`. Epochs skipped between the two
    /// are null rounds. The salt distinguishes siblings on competing forks.
    pub fn extend(&self, parent: &Tipset, epoch: ChainEpoch, salt: u64) -> Arc<Tipset> {
        debug_assert!(epoch > parent.epoch());
        self.put(Tipset::new(
            synthetic_key(parent.key(), epoch, salt),
            parent.key().clone(),
            epoch,
        ))
    }

    /// Builds a chain from a fresh genesis up to `head_epoch`, skipping the
    /// epochs for which `is_null` holds. The head itself is never null.
    /// Returns the stored tipsets, genesis first.
    pub fn build_chain(
        &self,
        head_epoch: ChainEpoch,
        is_null: impl Fn(ChainEpoch) -> bool,
    ) -> Vec<Arc<Tipset>> {
        let mut head = self.genesis(0);
        let mut chain = vec![head.clone()];
        for epoch in 1..=head_epoch {
            if epoch < head_epoch && is_null(epoch) {
                continue;
            }
            head = self.extend(&head, epoch, 0);
            chain.push(head.clone());
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.tipsets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful and failed loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn reset_load_count(&self) {
        self.loads.store(0, Ordering::Relaxed);
    }
}

fn synthetic_key(parents: &TipsetKey, epoch: ChainEpoch, salt: u64) -> TipsetKey {
    let mut bytes = parents.to_string().into_bytes();
    bytes.extend_from_slice(&epoch.to_be_bytes());
    bytes.extend_from_slice(&salt.to_be_bytes());
    TipsetKey::new(vec![Cid::from_cbor_bytes_blake2b256(&bytes)])
}

impl TipsetLoader for MemoryTipsetStore {
    fn load_tipset(&self, tsk: &TipsetKey) -> Result<Arc<Tipset>, Error> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.tipsets
            .read()
            .get(tsk)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("tipset {tsk}")))
    }
}
