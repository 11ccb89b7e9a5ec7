// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Epoch number of a tipset. Null rounds leave gaps in the sequence.
pub type ChainEpoch = i64;

/// Disambiguate the type to signify that we are expecting a delta and not an actual epoch/height
/// while maintaining the same type.
pub type ChainEpochDelta = ChainEpoch;

/// Duration of each tipset epoch.
pub const EPOCH_DURATION_SECONDS: i64 = 30;

pub const SECONDS_IN_DAY: i64 = 86400;

pub const EPOCHS_IN_DAY: ChainEpochDelta = SECONDS_IN_DAY / EPOCH_DURATION_SECONDS;
