//! Type tags and construction
//!
//! [`OkvsType`] names every supported encoder. [`create_okvs`] builds one
//! from a tag, `n`, `l` and the tag's hash keys; [`AnyOkvs`] dispatches the
//! [`Okvs`] contract over whichever encoder was built.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use okvs_core::STAT_SEC_PARAM;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{OkvsError, Result};
use crate::gbf::GbfOkvs;
use crate::gct::GctOkvs;
use crate::hypergraph::Arity;
use crate::key::OkvsKey;
use crate::megabin::MegaBinOkvs;
use crate::params;
use crate::polynomial::PolynomialOkvs;
use crate::reducer::ReducerKind;
use crate::Okvs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OkvsType {
    Polynomial,
    MegaBin,
    Gbf,
    H2SingletonGct,
    H2TwoCoreGct,
    H2DfsGct,
    H3SingletonGct,
    H3TwoCoreGct,
}

impl OkvsType {
    pub const ALL: [OkvsType; 8] = [
        OkvsType::Polynomial,
        OkvsType::MegaBin,
        OkvsType::Gbf,
        OkvsType::H2SingletonGct,
        OkvsType::H2TwoCoreGct,
        OkvsType::H2DfsGct,
        OkvsType::H3SingletonGct,
        OkvsType::H3TwoCoreGct,
    ];

    /// Number of hash keys the encoder needs
    pub fn hash_key_num(self) -> usize {
        match self.gct_shape() {
            Some((arity, _)) => arity.hash_num() + 1,
            None if self == OkvsType::Polynomial => 0,
            None => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OkvsType::Polynomial => "polynomial",
            OkvsType::MegaBin => "mega-bin",
            OkvsType::Gbf => "gbf",
            OkvsType::H2SingletonGct => "h2-singleton-gct",
            OkvsType::H2TwoCoreGct => "h2-two-core-gct",
            OkvsType::H2DfsGct => "h2-dfs-gct",
            OkvsType::H3SingletonGct => "h3-singleton-gct",
            OkvsType::H3TwoCoreGct => "h3-two-core-gct",
        }
    }

    fn gct_shape(self) -> Option<(Arity, ReducerKind)> {
        match self {
            OkvsType::H2SingletonGct => Some((Arity::Two, ReducerKind::Singleton)),
            OkvsType::H2TwoCoreGct => Some((Arity::Two, ReducerKind::TwoCore)),
            OkvsType::H2DfsGct => Some((Arity::Two, ReducerKind::Dfs)),
            OkvsType::H3SingletonGct => Some((Arity::Three, ReducerKind::Singleton)),
            OkvsType::H3TwoCoreGct => Some((Arity::Three, ReducerKind::TwoCore)),
            _ => None,
        }
    }
}

impl fmt::Display for OkvsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OkvsType {
    type Err = OkvsError;

    fn from_str(s: &str) -> Result<Self> {
        OkvsType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| OkvsError::Config(format!("unknown OKVS type: {}", s)))
    }
}

/// Storage size of `okvs_type` for `n` keys, without building it
pub fn okvs_size(okvs_type: OkvsType, n: usize) -> usize {
    match okvs_type {
        OkvsType::Polynomial => n,
        OkvsType::MegaBin => params::mega_bin_size(n),
        OkvsType::Gbf => params::gbf_size(n, STAT_SEC_PARAM),
        OkvsType::H2SingletonGct | OkvsType::H2TwoCoreGct | OkvsType::H2DfsGct => {
            params::h2_left_size(n) + params::h2_right_size(n)
        }
        OkvsType::H3SingletonGct | OkvsType::H3TwoCoreGct => {
            params::h3_left_size(n) + params::h3_right_size(n)
        }
    }
}

/// Build an encoder. `keys.len()` must equal `okvs_type.hash_key_num()`.
pub fn create_okvs(okvs_type: OkvsType, n: usize, l: usize, keys: &[Vec<u8>]) -> Result<AnyOkvs> {
    if keys.len() != okvs_type.hash_key_num() {
        return Err(OkvsError::PreconditionViolation(format!(
            "{} needs {} hash keys, got {}",
            okvs_type,
            okvs_type.hash_key_num(),
            keys.len()
        )));
    }

    if let Some((arity, reducer)) = okvs_type.gct_shape() {
        return Ok(AnyOkvs::Gct(GctOkvs::new(n, l, arity, reducer, keys)?));
    }
    let okvs = match okvs_type {
        OkvsType::Polynomial => AnyOkvs::Polynomial(PolynomialOkvs::new(n, l)?),
        OkvsType::MegaBin => AnyOkvs::MegaBin(MegaBinOkvs::new(n, l, &keys[0])?),
        // only the Bloom filter is left once GCT shapes are out
        _ => AnyOkvs::Gbf(GbfOkvs::new(n, l, &keys[0])?),
    };
    tracing::debug!(okvs_type = %okvs_type, n, l, m = okvs.m(), "Created OKVS");
    Ok(okvs)
}

/// Any encoder behind one concrete type
#[derive(Debug, Clone)]
pub enum AnyOkvs {
    Polynomial(PolynomialOkvs),
    MegaBin(MegaBinOkvs),
    Gbf(GbfOkvs),
    Gct(GctOkvs),
}

macro_rules! dispatch {
    ($self:ident, $okvs:ident => $body:expr) => {
        match $self {
            AnyOkvs::Polynomial($okvs) => $body,
            AnyOkvs::MegaBin($okvs) => $body,
            AnyOkvs::Gbf($okvs) => $body,
            AnyOkvs::Gct($okvs) => $body,
        }
    };
}

impl AnyOkvs {
    /// Enable rayon for the random fill and per-bin work. The polynomial
    /// encoder has no parallel stage and ignores this.
    pub fn with_parallel(self, parallel: bool) -> Self {
        match self {
            AnyOkvs::Polynomial(okvs) => AnyOkvs::Polynomial(okvs),
            AnyOkvs::MegaBin(okvs) => AnyOkvs::MegaBin(okvs.with_parallel(parallel)),
            AnyOkvs::Gbf(okvs) => AnyOkvs::Gbf(okvs.with_parallel(parallel)),
            AnyOkvs::Gct(okvs) => AnyOkvs::Gct(okvs.with_parallel(parallel)),
        }
    }
}

impl Okvs for AnyOkvs {
    fn okvs_type(&self) -> OkvsType {
        dispatch!(self, okvs => okvs.okvs_type())
    }

    fn n(&self) -> usize {
        dispatch!(self, okvs => okvs.n())
    }

    fn l(&self) -> usize {
        dispatch!(self, okvs => okvs.l())
    }

    fn m(&self) -> usize {
        dispatch!(self, okvs => okvs.m())
    }

    fn neg_log_failure_probability(&self) -> usize {
        dispatch!(self, okvs => okvs.neg_log_failure_probability())
    }

    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized,
    {
        dispatch!(self, okvs => okvs.encode(map, rng))
    }

    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8> {
        dispatch!(self, okvs => okvs.decode(storage, key))
    }
}
