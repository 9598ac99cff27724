//! MegaBin: bucketed polynomial interpolation
//!
//! Keys are hashed into `b ≈ n / ln n` bins. Each bin is padded with random
//! points to exactly `bin_size` and interpolated independently, so its slice
//! of the storage is the coefficient vector of a degree `< bin_size`
//! polynomial over GF(2^l).
//!
//! ## Layout
//!
//! ```text
//! storage = [ bin 0 coefficients | bin 1 coefficients | ... ]
//!             bin_size rows        bin_size rows
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use okvs_core::poly::{evaluate, interpolate};
use okvs_core::{CoreError, Gf2e, Prf, STAT_SEC_PARAM};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::error::{FailureReason, OkvsError, Result};
use crate::factory::OkvsType;
use crate::fill::task_seeds;
use crate::key::OkvsKey;
use crate::params::{max_bin_size, mega_bin_num};
use crate::{check_dimensions, check_field_points, sorted_entries, Okvs};

/// Bytes of PRF output used for the bin index
const BIN_INDEX_BYTES: usize = 8;

#[derive(Debug, Clone)]
pub struct MegaBinOkvs {
    n: usize,
    l: usize,
    byte_l: usize,
    bins: usize,
    bin_size: usize,
    field: Gf2e,
    prf: Prf,
    parallel: bool,
}

/// Points assigned to one bin
#[derive(Default)]
struct Bin {
    xs: Vec<Vec<u8>>,
    ys: Vec<Vec<u8>>,
}

impl MegaBinOkvs {
    pub fn new(n: usize, l: usize, key: &[u8]) -> Result<Self> {
        check_dimensions(n, l)?;
        let bins = mega_bin_num(n);
        let bin_size = max_bin_size(n, bins, STAT_SEC_PARAM);
        check_field_points(bin_size, l)?;

        tracing::debug!(n, l, bins, bin_size, "Created MegaBin");

        Ok(Self {
            n,
            l,
            byte_l: l / 8,
            bins,
            bin_size,
            field: Gf2e::new(l)?,
            prf: Prf::new(key)?,
            parallel: false,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn bin_size(&self) -> usize {
        self.bin_size
    }

    /// Bin index and evaluation point of a key, from disjoint PRF output
    fn locate(&self, key: &[u8]) -> (usize, Vec<u8>) {
        let mut out = self.prf.bytes(key, BIN_INDEX_BYTES + self.byte_l);
        let point = out.split_off(BIN_INDEX_BYTES);
        let mut index = [0u8; BIN_INDEX_BYTES];
        index.copy_from_slice(&out);
        let bin = (u64::from_le_bytes(index) % self.bins as u64) as usize;
        (bin, point)
    }

    /// Pad a bin to `bin_size` points and interpolate it
    fn encode_bin(&self, index: usize, bin: &Bin, seed: &[u8; 32]) -> Result<Vec<Vec<u8>>> {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        let mut xs = bin.xs.clone();
        let mut ys = bin.ys.clone();
        while xs.len() < self.bin_size {
            let x = self.field.random(&mut rng);
            if xs.contains(&x) {
                continue;
            }
            xs.push(x);
            ys.push(self.field.random(&mut rng));
        }

        interpolate(&self.field, &xs, &ys).map_err(|e| match e {
            CoreError::DuplicatePoint(_) => FailureReason::PointCollision { bin: index }.into(),
            other => OkvsError::Core(other),
        })
    }
}

impl Okvs for MegaBinOkvs {
    fn okvs_type(&self) -> OkvsType {
        OkvsType::MegaBin
    }

    fn n(&self) -> usize {
        self.n
    }

    fn l(&self) -> usize {
        self.l
    }

    fn m(&self) -> usize {
        self.bins * self.bin_size
    }

    fn neg_log_failure_probability(&self) -> usize {
        STAT_SEC_PARAM
    }

    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized,
    {
        let entries = sorted_entries(map, self.n, self.byte_l)?;

        let mut bins: Vec<Bin> = (0..self.bins).map(|_| Bin::default()).collect();
        for (key, value) in &entries {
            let (index, point) = self.locate(key);
            let bin = &mut bins[index];
            bin.xs.push(point);
            bin.ys.push(value.to_vec());
        }

        if let Some((bin, load)) = bins
            .iter()
            .map(|b| b.xs.len())
            .enumerate()
            .find(|&(_, load)| load > self.bin_size)
        {
            tracing::warn!(bin, load, capacity = self.bin_size, "MegaBin overflow");
            return Err(FailureReason::BucketOverflow {
                bin,
                load,
                capacity: self.bin_size,
            }
            .into());
        }

        let seeds = task_seeds(rng, self.bins);
        let coefficients: Vec<Vec<Vec<u8>>> = if self.parallel {
            bins.par_iter()
                .zip(seeds.par_iter())
                .enumerate()
                .map(|(index, (bin, seed))| self.encode_bin(index, bin, seed))
                .collect::<Result<_>>()?
        } else {
            bins.iter()
                .zip(seeds.iter())
                .enumerate()
                .map(|(index, (bin, seed))| self.encode_bin(index, bin, seed))
                .collect::<Result<_>>()?
        };

        tracing::trace!(bins = self.bins, keys = entries.len(), "Interpolated bins");
        Ok(coefficients.into_iter().flatten().collect())
    }

    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8> {
        debug_assert_eq!(storage.len(), self.m());
        let (bin, point) = self.locate(&key.key_bytes());
        let start = bin * self.bin_size;
        evaluate(&self.field, &storage[start..start + self.bin_size], &point)
    }
}
