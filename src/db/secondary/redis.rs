// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

use anyhow::Context as _;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use tracing::debug;

use super::{CacheKey, SecondaryCache};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct RedisConfig {
    /// `host:port` of the server.
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Database selected after connecting.
    pub db: i64,
    /// Connect, read and write timeout, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".into(),
            username: None,
            password: None,
            db: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RedisConfig {
    fn url(&self) -> anyhow::Result<url::Url> {
        resp_url(
            &self.address,
            self.username.as_deref(),
            self.password.as_deref(),
            Some(self.db),
        )
    }
}

pub(super) fn resp_url(
    address: &str,
    username: Option<&str>,
    password: Option<&str>,
    db: Option<i64>,
) -> anyhow::Result<url::Url> {
    let mut url = url::Url::parse(&format!("redis://{address}"))
        .with_context(|| format!("invalid server address {address}"))?;
    if let Some(username) = username {
        url.set_username(username)
            .map_err(|()| anyhow::anyhow!("cannot set username on {address}"))?;
    }
    if password.is_some() {
        url.set_password(password)
            .map_err(|()| anyhow::anyhow!("cannot set password on {address}"))?;
    }
    if let Some(db) = db {
        url.set_path(&db.to_string());
    }
    Ok(url)
}

/// A single lazily established connection speaking the redis protocol. A
/// connection that hit an I/O error is dropped and re-established on next use.
pub(super) struct RespConnection {
    client: ::redis::Client,
    timeout: Duration,
    connection: Mutex<Option<::redis::Connection>>,
}

impl RespConnection {
    pub(super) fn open(url: &url::Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = ::redis::Client::open(url.as_str()).with_context(|| {
            format!(
                "invalid connection info for {}",
                url.host_str().unwrap_or_default()
            )
        })?;
        Ok(Self {
            client,
            timeout,
            connection: Mutex::new(None),
        })
    }

    fn connect(&self) -> anyhow::Result<::redis::Connection> {
        let connection = self
            .client
            .get_connection_with_timeout(self.timeout)
            .context("failed to connect")?;
        connection.set_read_timeout(Some(self.timeout))?;
        connection.set_write_timeout(Some(self.timeout))?;
        Ok(connection)
    }

    pub(super) fn query<T: ::redis::FromRedisValue>(
        &self,
        cmd: &::redis::Cmd,
    ) -> anyhow::Result<T> {
        let mut guard = self.connection.lock();
        let mut connection = match guard.take() {
            Some(connection) => connection,
            None => self.connect()?,
        };
        match cmd.query(&mut connection) {
            Ok(value) => {
                *guard = Some(connection);
                Ok(value)
            }
            Err(e) => {
                if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() {
                    debug!("dropping shared cache connection after: {e}");
                } else {
                    *guard = Some(connection);
                }
                Err(e.into())
            }
        }
    }
}

/// [`SecondaryCache`] backed by a redis server, using plain `GET`/`SET`/`DEL`.
pub struct RedisCache {
    connection: RespConnection,
}

impl RedisCache {
    pub fn new(config: &RedisConfig) -> anyhow::Result<Self> {
        Ok(Self {
            connection: RespConnection::open(&config.url()?, config.timeout)?,
        })
    }
}

impl SecondaryCache for RedisCache {
    fn read_bin(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        self.connection
            .query(::redis::cmd("GET").arg(key.to_string()))
            .with_context(|| format!("redis GET {key}"))
    }

    fn write_bin(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key.to_string()).arg(value);
        if let Some(ttl) = ttl {
            // redis rejects a zero expiration
            cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
        }
        self.connection
            .query::<()>(&cmd)
            .with_context(|| format!("redis SET {key}"))
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.connection
            .query::<()>(::redis::cmd("DEL").arg(key.to_string()))
            .with_context(|| format!("redis DEL {key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_with_credentials() {
        let config = RedisConfig {
            address: "cache:6380".into(),
            username: Some("forest".into()),
            password: Some("p@ss".into()),
            db: 4,
            ..Default::default()
        };
        let url = config.url().unwrap();
        assert_eq!(url.scheme(), "redis");
        assert_eq!(url.host_str(), Some("cache"));
        assert_eq!(url.port(), Some(6380));
        assert_eq!(url.username(), "forest");
        assert_eq!(url.path(), "/4");
        assert!(url.password().is_some());
    }

    #[test]
    fn unreachable_server_is_an_error_not_a_panic() {
        let config = RedisConfig {
            // reserved port, nothing listens there
            address: "127.0.0.1:1".into(),
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let cache = RedisCache::new(&config).unwrap();
        assert!(cache.read_bin(&CacheKey::Height(1)).is_err());
        assert!(cache.write_bin(&CacheKey::Height(1), b"x", None).is_err());
    }
}
