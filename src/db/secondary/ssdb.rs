// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use tracing::debug;

use super::redis::{RespConnection, resp_url};
use super::{CacheKey, SecondaryCache};

pub const DEFAULT_HASH_NAME: &str = "lotus.index";

#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct SsdbConfig {
    /// `host:port` of the server.
    pub address: String,
    pub password: Option<String>,
    /// All entries live in this hash.
    pub hash_name: String,
    /// Connect, read and write timeout, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for SsdbConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8888".into(),
            password: None,
            hash_name: DEFAULT_HASH_NAME.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// [`SecondaryCache`] backed by SSDB through its redis protocol support. SSDB
/// has no per-field expiration, so TTLs are dropped.
pub struct SsdbCache {
    connection: RespConnection,
    hash_name: String,
}

impl SsdbCache {
    pub fn new(config: &SsdbConfig) -> anyhow::Result<Self> {
        let url = resp_url(&config.address, None, config.password.as_deref(), None)?;
        Ok(Self {
            connection: RespConnection::open(&url, config.timeout)?,
            hash_name: config.hash_name.clone(),
        })
    }
}

impl SecondaryCache for SsdbCache {
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        self.connection
            .query(::redis::cmd("HGET").arg(&self.hash_name).arg(key.to_string()))
            .with_context(|| format!("ssdb HGET {} {key}", self.hash_name))
    }

    fn write_bin(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        if let Some(ttl) = ttl {
            debug!("ssdb does not support expiration, ignoring ttl of {ttl:?} for {key}");
        }
        self.connection
            .query::<()>(
                ::redis::cmd("HSET")
                    .arg(&self.hash_name)
                    .arg(key.to_string())
                    .arg(value),
            )
            .with_context(|| format!("ssdb HSET {} {key}", self.hash_name))
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.connection
            .query::<()>(::redis::cmd("HDEL").arg(&self.hash_name).arg(key.to_string()))
            .with_context(|| format!("ssdb HDEL {} {key}", self.hash_name))
    }
}
