// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use super::Error;
use crate::blocks::{Tipset, TipsetKey};

/// Source of tipsets for the chain index. Implementations must be safe to call
/// concurrently and must always return the same tipset for a given key.
pub trait TipsetLoader: Send + Sync {
    fn load_tipset(&self, tsk: &TipsetKey) -> Result<Arc<Tipset>, Error>;
}

impl<F> TipsetLoader for F
where
    F: Fn(&TipsetKey) -> Result<Arc<Tipset>, Error> + Send + Sync,
{
    fn load_tipset(&self, tsk: &TipsetKey) -> Result<Arc<Tipset>, Error> {
        self(tsk)
    }
}
