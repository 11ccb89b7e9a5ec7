// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::shim::clock::ChainEpoch;

/// Chain error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Key was not found
    #[error("{0} not found")]
    NotFound(String),
    /// The requested epoch is not an ancestor epoch of the start point
    #[error("Looking for tipset with height {to} outside of the range [0, {from}]")]
    InvalidRange { from: ChainEpoch, to: ChainEpoch },
    /// Other chain error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(format!("{e:#}"))
    }
}
