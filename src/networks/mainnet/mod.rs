// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Unix timestamp of the mainnet genesis block.
pub const GENESIS_TIMESTAMP: u64 = 1598306400;
