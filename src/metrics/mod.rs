// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
};
use std::sync::LazyLock;

static DEFAULT_REGISTRY: LazyLock<RwLock<prometheus_client::registry::Registry>> =
    LazyLock::new(Default::default);

pub fn default_registry<'a>() -> RwLockWriteGuard<'a, prometheus_client::registry::Registry> {
    DEFAULT_REGISTRY.write()
}

fn read_registry<'a>() -> RwLockReadGuard<'a, prometheus_client::registry::Registry> {
    DEFAULT_REGISTRY.read()
}

pub static LRU_CACHE_HIT: LazyLock<Family<KindLabel, Counter>> = LazyLock::new(|| {
    let metric = Family::default();
    default_registry().register("lru_cache_hit", "Stats of lru cache hit", metric.clone());
    metric
});
pub static LRU_CACHE_MISS: LazyLock<Family<KindLabel, Counter>> = LazyLock::new(|| {
    let metric = Family::default();
    default_registry().register("lru_cache_miss", "Stats of lru cache miss", metric.clone());
    metric
});
pub static SECONDARY_CACHE_ERROR: LazyLock<Family<OperationLabel, Counter>> =
    LazyLock::new(|| {
        let metric = Family::default();
        default_registry().register(
            "secondary_cache_error",
            "Number of failed shared cache operations",
            metric.clone(),
        );
        metric
    });

/// Renders the registry in the prometheus text exposition format.
pub fn encode_default_registry() -> anyhow::Result<String> {
    let mut metrics = String::new();
    prometheus_client::encoding::text::encode(&mut metrics, &read_registry())?;
    Ok(metrics)
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet, derive_more::Constructor)]
pub struct KindLabel {
    kind: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet, derive_more::Constructor)]
pub struct OperationLabel {
    operation: &'static str,
}

pub mod values {
    use super::{KindLabel, OperationLabel};

    /// In-process skip entry cache.
    pub const SKIP_HOT: KindLabel = KindLabel::new("skip_hot");
    /// Shared skip entry cache.
    pub const SKIP_SECONDARY: KindLabel = KindLabel::new("skip_secondary");

    pub const READ: OperationLabel = OperationLabel::new("read");
    pub const WRITE: OperationLabel = OperationLabel::new("write");
}
