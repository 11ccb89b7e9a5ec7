// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;

use crate::utils::multihash::prelude::*;

/// Multicodec code of `dag-cbor`, the codec of Filecoin block headers.
pub const DAG_CBOR: u64 = 0x71;

/// Extension methods for constructing `dag-cbor` [Cid]
pub trait CidCborExt {
    /// Builds a CID from already encoded bytes.
    ///
    /// - The codec is [`DAG_CBOR`]
    /// - The hash function is 256 bit BLAKE2b
    ///
    /// This matches [`abi.CidBuilder`](https://github.com/filecoin-project/go-state-types/blob/master/abi/cid.go#L49) in go
    fn from_cbor_bytes_blake2b256(bytes: &[u8]) -> Cid {
        Cid::new_v1(DAG_CBOR, MultihashCode::Blake2b256.digest(bytes))
    }
}

impl CidCborExt for Cid {}
