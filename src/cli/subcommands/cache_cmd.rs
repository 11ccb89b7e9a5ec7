// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use anyhow::Context as _;
use clap::Subcommand;

use crate::blocks::TipsetKey;
use crate::chain::LookbackEntry;
use crate::cli_shared::cli::Config;
use crate::db::secondary::{CacheKey, SecondaryCache, SecondaryCacheExt as _};
use crate::shim::clock::ChainEpoch;

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct KeyArgs {
    /// Entry stored under `lotus.height.<HEIGHT>`
    #[arg(long)]
    height: Option<ChainEpoch>,
    /// Entry stored under a tipset key, e.g. `{bafy2bz...,bafy2bz...}`
    #[arg(long)]
    key: Option<TipsetKey>,
}

impl KeyArgs {
    fn cache_key(self) -> anyhow::Result<CacheKey> {
        match (self.height, self.key) {
            (Some(height), None) => Ok(CacheKey::Height(height)),
            (None, Some(key)) => Ok(CacheKey::Tipset(key)),
            _ => anyhow::bail!("exactly one of --height and --key is required"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Print a look-back entry
    Get(KeyArgs),
    /// Remove a look-back entry
    Delete(KeyArgs),
}

impl CacheCommands {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let cache = config.secondary_cache.open()?;
        anyhow::ensure!(cache.is_enabled(), "no shared cache backend is configured");
        match self {
            Self::Get(args) => {
                let key = args.cache_key()?;
                match get(cache, &key)? {
                    Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                    None => println!("{key} not found"),
                }
            }
            Self::Delete(args) => {
                let key = args.cache_key()?;
                cache
                    .delete(&key)
                    .with_context(|| format!("failed to delete {key}"))?;
                println!("{key} deleted");
            }
        }
        Ok(())
    }
}

fn get(cache: Arc<dyn SecondaryCache>, key: &CacheKey) -> anyhow::Result<Option<LookbackEntry>> {
    cache
        .read_obj::<LookbackEntry>(key)
        .with_context(|| format!("failed to read {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTipsetStore;
    use crate::db::secondary::MemoryCache;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        cmd: CacheCommands,
    }

    #[test]
    fn key_arguments() {
        let cli = TestCli::parse_from(["test", "get", "--height", "42"]);
        let CacheCommands::Get(args) = cli.cmd else {
            panic!("expected get");
        };
        assert_eq!(args.cache_key().unwrap(), CacheKey::Height(42));

        assert!(TestCli::try_parse_from(["test", "delete"]).is_err());
        assert!(TestCli::try_parse_from(["test", "get", "--height", "1", "--key", "{}"]).is_err());
        assert!(TestCli::try_parse_from(["test", "get", "--key", "{garbage}"]).is_err());
    }

    #[test]
    fn get_entry() {
        let store = MemoryTipsetStore::default();
        let chain = store.build_chain(3, |_| false);
        let entry = LookbackEntry::new(chain[2].clone(), &chain[1], &chain[0]);
        let cache = Arc::new(MemoryCache::default());
        let key = CacheKey::Tipset(chain[2].key().clone());
        cache.write_obj(&key, &entry, None).unwrap();
        assert_eq!(get(cache.clone(), &key).unwrap(), Some(entry));
        assert_eq!(get(cache, &CacheKey::Height(9)).unwrap(), None);
    }
}
