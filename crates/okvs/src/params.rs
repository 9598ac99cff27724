//! Closed-form size formulas
//!
//! Downstream protocols size their message buffers from these numbers, so
//! they must not drift. Rational factors use integer arithmetic; only the
//! logarithmic terms go through floating point.

use okvs_core::{round_up_to_byte, STAT_SEC_PARAM};

/// 2-hash GCT left size: `lm = ceil8(ceil(2.4 * n))`
pub fn h2_left_size(n: usize) -> usize {
    round_up_to_byte((12 * n + 4) / 5)
}

/// 2-hash GCT right size: `rm = ceil8(ceil(1.4 * log2(n)) + λ)`
pub fn h2_right_size(n: usize) -> usize {
    round_up_to_byte((1.4 * log2(n)).ceil() as usize + STAT_SEC_PARAM)
}

/// 3-hash GCT left size: `lm = ceil8(ceil(1.3 * n))`
pub fn h3_left_size(n: usize) -> usize {
    round_up_to_byte((13 * n + 9) / 10)
}

/// 3-hash GCT right size: `rm = ceil8(ceil(0.5 * log2(n)) + λ)`
pub fn h3_right_size(n: usize) -> usize {
    round_up_to_byte((0.5 * log2(n)).ceil() as usize + STAT_SEC_PARAM)
}

/// Garbled Bloom filter size: `m = ceil8(ceil(n * hash_num / ln 2))`
pub fn gbf_size(n: usize, hash_num: usize) -> usize {
    round_up_to_byte((n as f64 * hash_num as f64 / std::f64::consts::LN_2).ceil() as usize)
}

/// MegaBin bin count: `b = ceil(n / ln(n))`, at least one bin
pub fn mega_bin_num(n: usize) -> usize {
    if n <= 2 {
        return 1;
    }
    ((n as f64) / (n as f64).ln()).ceil() as usize
}

/// Smallest bin capacity `k` such that throwing `n` balls into `bins` bins
/// overflows some bin with probability at most `2^-stat_sec_param`
/// (union bound over bins of the binomial upper tail).
pub fn max_bin_size(n: usize, bins: usize, stat_sec_param: usize) -> usize {
    if bins <= 1 || n == 0 {
        return n.max(1);
    }

    let p = 1.0 / bins as f64;
    let bound = 2f64.powi(-(stat_sec_param as i32)) / bins as f64;
    let log_ratio = ((1.0 - p) / p).ln();

    // Walk i = n, n-1, ... accumulating tail = P[X >= i] with ln P[X = i]
    // updated by the ratio P[X = i - 1] / P[X = i].
    let mut log_pmf = n as f64 * p.ln();
    let mut tail = 0.0f64;
    for i in (1..=n).rev() {
        tail += log_pmf.exp();
        if tail > bound {
            return i;
        }
        log_pmf += (i as f64 / (n - i + 1) as f64).ln() + log_ratio;
    }
    1
}

/// MegaBin storage size: `m = b * binSize`
pub fn mega_bin_size(n: usize) -> usize {
    let bins = mega_bin_num(n);
    bins * max_bin_size(n, bins, STAT_SEC_PARAM)
}

fn log2(n: usize) -> f64 {
    (n.max(1) as f64).log2()
}
