// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod cli;
pub mod logger;

use std::path::Path;

use anyhow::Context as _;

use crate::cli_shared::cli::Config;
use crate::utils::io::read_toml;

/// Reads the configuration file, or falls back to the defaults when no path
/// is given.
pub fn read_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    let config: Config = match config_path {
        Some(path) => {
            // Read from config file
            let toml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            // Parse and return the configuration file
            read_toml(&toml)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::NetworkChain;

    #[test]
    fn read_config_default() {
        let config = read_config(None).unwrap();
        assert_eq!(config.chain.network, NetworkChain::Mainnet);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn read_config_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut expected = Config::default();
        expected.chain.network = NetworkChain::Calibnet;
        expected.index.skip_length = 30;
        std::fs::write(&path, toml::to_string(&expected).unwrap()).unwrap();

        assert_eq!(read_config(Some(&path)).unwrap(), expected);
    }

    #[test]
    fn read_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(read_config(Some(&missing)).is_err());

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "[index]\nskip_length = 0\n").unwrap();
        assert!(read_config(Some(&invalid)).is_err());
    }
}
