// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod config;
mod errors;
pub mod index;
mod loader;
mod lookback;

pub use config::IndexConfig;
pub use errors::Error;
pub use index::{ChainIndex, ResolveNullTipset};
pub use loader::TipsetLoader;
pub use lookback::{LookbackBuilder, LookbackEntry, SkipCache};
