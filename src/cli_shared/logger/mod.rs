// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use tracing_subscriber::{EnvFilter, Registry, prelude::*};

use crate::utils::misc::LoggingColor;

/// Logging options shared by the binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerOpts {
    pub color: LoggingColor,
    /// One JSON object per line instead of human readable output.
    pub json: bool,
}

pub fn setup_logger(opts: LoggerOpts) {
    let layer: Box<dyn tracing_subscriber::layer::Layer<Registry> + Send + Sync> = if opts.json {
        Box::new(
            tracing_subscriber::fmt::Layer::new()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(get_env_filter(default_env_filter())),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::Layer::new()
                .with_ansi(opts.color.coloring_enabled())
                .with_writer(std::io::stderr)
                .with_filter(get_env_filter(default_env_filter())),
        )
    };
    tracing_subscriber::registry().with(layer).init();
}

/// Returns an [`EnvFilter`] according to the `RUST_LOG` environment variable, or a default
/// - see [`default_env_filter`]
///
/// Note that [`tracing_subscriber::filter::Builder`] only allows a single default directive,
/// whereas we want to provide multiple.
fn get_env_filter(def: EnvFilter) -> EnvFilter {
    use std::env::{
        self,
        VarError::{NotPresent, NotUnicode},
    };
    match env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV) {
        Ok(s) => EnvFilter::new(s),
        Err(NotPresent) => def,
        Err(NotUnicode(_)) => EnvFilter::default(),
    }
}

fn default_env_filter() -> EnvFilter {
    let default_directives = ["info", "redis=warn"];
    EnvFilter::new(default_directives.join(","))
}

#[test]
fn test_default_env_filter() {
    let _did_not_panic = default_env_filter();
}
