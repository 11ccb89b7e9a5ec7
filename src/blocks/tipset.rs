// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{fmt, str::FromStr};

use cid::Cid;
use itertools::Itertools as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lotus_json::CidLotusJson;
use crate::shim::clock::ChainEpoch;

/// A set of CIDs forming a unique key for a Tipset.
/// Equal keys will have equivalent iteration order, but note that the CIDs are
/// *not* maintained in the same order as the canonical iteration order of
/// blocks in a tipset (which is by ticket).
///
/// The key of the genesis parent is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self(cids)
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Cid>> for TipsetKey {
    fn from(cids: Vec<Cid>) -> Self {
        Self(cids)
    }
}

/// Lotus' canonical string form, `{cid1,cid2}`.
impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

impl FromStr for TipsetKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let inner = s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(s);
        let cids = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Cid::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(cids))
    }
}

impl Serialize for TipsetKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().copied().map(CidLotusJson::from))
    }
}

impl<'de> Deserialize<'de> for TipsetKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let cids = Vec::<CidLotusJson>::deserialize(deserializer)?;
        Ok(Self(cids.into_iter().map(Cid::from).collect()))
    }
}

/// An immutable set of blocks at the same height with the same parent set.
/// Only the parts of a tipset needed to navigate the chain are kept here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tipset {
    #[serde(rename = "Cids")]
    key: TipsetKey,
    parents: TipsetKey,
    height: ChainEpoch,
}

impl Tipset {
    pub fn new(key: TipsetKey, parents: TipsetKey, height: ChainEpoch) -> Self {
        Self {
            key,
            parents,
            height,
        }
    }

    /// Returns the key that uniquely identifies this tipset.
    pub fn key(&self) -> &TipsetKey {
        &self.key
    }

    /// Returns the key of the parent tipset. Empty for genesis.
    pub fn parents(&self) -> &TipsetKey {
        &self.parents
    }

    /// Returns epoch of the tipset.
    pub fn epoch(&self) -> ChainEpoch {
        self.height
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::multihash::prelude::*;
    use serde_json::json;

    fn cid(data: &[u8]) -> Cid {
        Cid::new_v1(crate::utils::cid::DAG_CBOR, MultihashCode::Blake2b256.digest(data))
    }

    #[test]
    fn tipset_key_display_round_trips() {
        let key = TipsetKey::new(vec![cid(b"a"), cid(b"b")]);
        let s = key.to_string();
        assert!(s.starts_with('{') && s.ends_with('}'));
        assert_eq!(s.matches(',').count(), 1);
        assert_eq!(s.parse::<TipsetKey>().unwrap(), key);
    }

    #[test]
    fn empty_tipset_key() {
        assert_eq!(TipsetKey::default().to_string(), "{}");
        assert_eq!("{}".parse::<TipsetKey>().unwrap(), TipsetKey::default());
    }

    #[test]
    fn tipset_key_parse_rejects_garbage() {
        assert!("{not-a-cid}".parse::<TipsetKey>().is_err());
    }

    #[test]
    fn tipset_json_shape() {
        let key = TipsetKey::new(vec![cid(b"child")]);
        let parents = TipsetKey::new(vec![cid(b"parent")]);
        let ts = Tipset::new(key.clone(), parents.clone(), 42);
        let value = serde_json::to_value(&ts).unwrap();
        assert_eq!(
            value,
            json!({
                "Cids": [{"/": key.cids()[0].to_string()}],
                "Parents": [{"/": parents.cids()[0].to_string()}],
                "Height": 42,
            })
        );
        assert_eq!(serde_json::from_value::<Tipset>(value).unwrap(), ts);
    }
}
