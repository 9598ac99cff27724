//! Random fill of unassigned storage rows
//!
//! Rows are processed in fixed-size chunks, each with its own ChaCha20
//! stream seeded from the caller's RNG in chunk order. The sequential and
//! parallel paths therefore produce identical storage.

use okvs_core::xor::random_row;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

/// Rows per independently seeded chunk
pub const FILL_CHUNK: usize = 1024;

/// Draw one 32-byte seed per task, in task order
pub(crate) fn task_seeds<R>(rng: &mut R, tasks: usize) -> Vec<[u8; 32]>
where
    R: RngCore + CryptoRng + ?Sized,
{
    (0..tasks)
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect()
}

/// Replace every `None` with a fresh random row of `byte_l` bytes
pub(crate) fn fill_empty<R>(
    mut slots: Vec<Option<Vec<u8>>>,
    byte_l: usize,
    parallel: bool,
    rng: &mut R,
) -> Vec<Vec<u8>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let seeds = task_seeds(rng, slots.len().div_ceil(FILL_CHUNK));

    if parallel {
        slots
            .par_chunks_mut(FILL_CHUNK)
            .zip(seeds.par_iter())
            .for_each(|(chunk, seed)| fill_chunk(chunk, seed, byte_l));
    } else {
        slots
            .chunks_mut(FILL_CHUNK)
            .zip(seeds.iter())
            .for_each(|(chunk, seed)| fill_chunk(chunk, seed, byte_l));
    }

    slots.into_iter().map(Option::unwrap_or_default).collect()
}

fn fill_chunk(chunk: &mut [Option<Vec<u8>>], seed: &[u8; 32], byte_l: usize) {
    let mut rng = ChaCha20Rng::from_seed(*seed);
    for slot in chunk.iter_mut().filter(|slot| slot.is_none()) {
        *slot = Some(random_row(&mut rng, byte_l));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(len: usize) -> Vec<Option<Vec<u8>>> {
        (0..len)
            .map(|i| (i % 3 == 0).then(|| vec![i as u8; 4]))
            .collect()
    }

    #[test]
    fn test_keeps_assigned_rows() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let rows = fill_empty(slots(10), 4, false, &mut rng);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[3], vec![3u8; 4]);
        assert_eq!(rows[9], vec![9u8; 4]);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert_ne!(rows[1], rows[2]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let len = 3 * FILL_CHUNK + 17;
        let a = fill_empty(slots(len), 16, false, &mut ChaCha20Rng::seed_from_u64(8));
        let b = fill_empty(slots(len), 16, true, &mut ChaCha20Rng::seed_from_u64(8));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        assert!(fill_empty(Vec::new(), 4, true, &mut rng).is_empty());
    }
}
