// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use tracing::info;

use crate::chain::ChainIndex;
use crate::cli_shared::cli::Config;
use crate::db::MemoryTipsetStore;
use crate::db::secondary::{MemoryCache, SecondaryCache};
use crate::shim::clock::ChainEpoch;

#[derive(Debug, clap::Args)]
pub struct BenchCommand {
    /// Height of the synthetic chain
    #[arg(long, default_value_t = 100_000)]
    length: ChainEpoch,
    /// Probability of an epoch being a null round
    #[arg(long, default_value_t = 0.05)]
    null_rate: f64,
    /// Number of random lookups
    #[arg(long, default_value_t = 1_000)]
    lookups: usize,
    /// Seed of the random generator
    #[arg(long)]
    seed: Option<u64>,
    /// Use the configured shared cache instead of an in-process one
    #[arg(long)]
    shared: bool,
    /// Skip checking every result against a plain walk
    #[arg(long)]
    no_verify: bool,
}

/// Outcome of a benchmark run.
#[derive(Debug, Default)]
pub struct BenchReport {
    pub lookups: usize,
    pub cached: Duration,
    pub uncached: Duration,
    pub cached_loads: usize,
    pub uncached_loads: usize,
    pub mismatches: usize,
}

impl BenchCommand {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        anyhow::ensure!(self.length > 0, "chain length must be positive");
        anyhow::ensure!(
            (0.0..1.0).contains(&self.null_rate),
            "null rate must be in [0, 1)"
        );
        let secondary: Arc<dyn SecondaryCache> = if self.shared {
            config.secondary_cache.open()?
        } else {
            Arc::new(MemoryCache::default())
        };
        let report = self.execute(config, secondary)?;
        println!(
            "{} lookups: cached {} ({} loads), uncached {} ({} loads)",
            report.lookups,
            humantime::format_duration(report.cached),
            report.cached_loads,
            humantime::format_duration(report.uncached),
            report.uncached_loads,
        );
        print!("{}", crate::metrics::encode_default_registry()?);
        anyhow::ensure!(
            report.mismatches == 0,
            "{} lookups differ from a plain walk",
            report.mismatches
        );
        Ok(())
    }

    fn execute(
        &self,
        config: &Config,
        secondary: Arc<dyn SecondaryCache>,
    ) -> anyhow::Result<BenchReport> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let start = Instant::now();
        let store = Arc::new(MemoryTipsetStore::default());
        let nulls: Vec<bool> = (0..=self.length)
            .map(|_| rng.gen_bool(self.null_rate))
            .collect();
        let chain = store.build_chain(self.length, |epoch| nulls[epoch as usize]);
        info!(
            "built a chain of {} tipsets in {}",
            chain.len(),
            humantime::format_duration(start.elapsed())
        );

        // Recency is judged against the synthetic head, not the wall clock.
        let head = self.length;
        let index = ChainIndex::new(
            store.clone(),
            secondary,
            Arc::new(move || head),
            &config.index,
        )?;

        let queries: Vec<_> = (0..self.lookups)
            .map(|_| {
                let from = chain[rng.gen_range(0..chain.len())].clone();
                let to = rng.gen_range(0..=from.epoch());
                (from, to)
            })
            .collect();

        let mut report = BenchReport {
            lookups: queries.len(),
            ..Default::default()
        };
        store.reset_load_count();
        let start = Instant::now();
        let found = queries
            .iter()
            .map(|(from, to)| index.get_tipset_by_height(from.clone(), *to))
            .collect::<Result<Vec<_>, _>>()?;
        report.cached = start.elapsed();
        report.cached_loads = store.load_count();

        if !self.no_verify {
            store.reset_load_count();
            let start = Instant::now();
            for ((from, to), found) in queries.iter().zip(&found) {
                let expected = index.get_tipset_by_height_without_cache(from.clone(), *to)?;
                if expected != *found {
                    report.mismatches += 1;
                }
            }
            report.uncached = start.elapsed();
            report.uncached_loads = store.load_count();
        }
        Ok(report)
    }
}
