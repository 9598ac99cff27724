//! OKVS configuration
//!
//! A config names the encoder, its dimensions and its hash keys, and is
//! stored as JSON so that the encoding and decoding parties can share one
//! file. Hash keys are hex strings.

use std::path::Path;

use okvs_core::prf::random_hash_keys;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{OkvsError, Result};
use crate::factory::{create_okvs, AnyOkvs, OkvsType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkvsConfig {
    pub okvs_type: OkvsType,
    /// Maximum number of keys
    pub n: usize,
    /// Value length in bits
    pub l: usize,
    /// Hex-encoded hash keys, `okvs_type.hash_key_num()` of them
    #[serde(default)]
    pub hash_keys: Vec<String>,
    #[serde(default)]
    pub parallel: bool,
}

impl OkvsConfig {
    /// A config without hash keys
    pub fn new(okvs_type: OkvsType, n: usize, l: usize) -> Self {
        Self {
            okvs_type,
            n,
            l,
            hash_keys: Vec::new(),
            parallel: false,
        }
    }

    /// Replace the hash keys with fresh random ones
    pub fn with_random_keys<R: RngCore + CryptoRng>(mut self, rng: &mut R) -> Self {
        self.hash_keys = random_hash_keys(rng, self.okvs_type.hash_key_num())
            .iter()
            .map(hex::encode)
            .collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Decoded hash keys
    pub fn decoded_keys(&self) -> Result<Vec<Vec<u8>>> {
        self.hash_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                hex::decode(key)
                    .map_err(|e| OkvsError::Config(format!("hash key {} is not hex: {}", i, e)))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.okvs_type.hash_key_num();
        if self.hash_keys.len() != expected {
            return Err(OkvsError::Config(format!(
                "{} needs {} hash keys, config has {}",
                self.okvs_type,
                expected,
                self.hash_keys.len()
            )));
        }
        if self.n == 0 || self.l == 0 || self.l % 8 != 0 {
            return Err(OkvsError::Config(format!(
                "invalid dimensions n = {}, l = {}",
                self.n, self.l
            )));
        }
        self.decoded_keys().map(|_| ())
    }

    pub fn build(&self) -> Result<AnyOkvs> {
        self.validate()?;
        let keys = self.decoded_keys()?;
        Ok(create_okvs(self.okvs_type, self.n, self.l, &keys)?.with_parallel(self.parallel))
    }
}
