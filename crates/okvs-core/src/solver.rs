//! Linear systems with {0, 1} coefficients over GF(2^l)
//!
//! Garbled cuckoo table rows only ever carry 0/1 coefficients (an indicator
//! per touched vertex plus the dense right-hand bit vector), so elimination
//! is plain GF(2) row reduction with the targets carried along as XOR.
//!
//! Underdetermined systems are allowed: free variables are drawn from the
//! caller's RNG, which keeps unconstrained storage rows pseudorandom.

use rand::{CryptoRng, RngCore};

use crate::xor::{get_bit, random_row, xor_into};
use crate::{CoreError, Result};

/// One equation: XOR of the selected unknowns equals `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRow {
    bits: Vec<u64>,
    target: Vec<u8>,
}

impl BinaryRow {
    /// An all-zero row over `columns` unknowns
    pub fn new(columns: usize, target: Vec<u8>) -> Self {
        Self {
            bits: vec![0u64; (columns + 63) / 64],
            target,
        }
    }

    /// Flip the coefficient of `column`
    #[inline]
    pub fn toggle(&mut self, column: usize) {
        self.bits[column / 64] ^= 1u64 << (column % 64);
    }

    #[inline]
    pub fn get(&self, column: usize) -> bool {
        (self.bits[column / 64] >> (column % 64)) & 1 == 1
    }

    /// Toggle columns `offset + i` for every set bit `i < count` of a packed bit vector
    pub fn xor_bits(&mut self, offset: usize, bits: &[u8], count: usize) {
        for i in 0..count {
            if get_bit(bits, i) {
                self.toggle(offset + i);
            }
        }
    }

    pub fn xor_target(&mut self, value: &[u8]) {
        xor_into(&mut self.target, value);
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }

    fn xor_row(&mut self, other: &BinaryRow) {
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a ^= b;
        }
        xor_into(&mut self.target, &other.target);
    }

    fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(k, &word)| {
            (0..64)
                .filter(move |b| (word >> b) & 1 == 1)
                .map(move |b| 64 * k + b)
        })
    }
}

/// Result of solving a system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// One value per column
    Consistent(Vec<Vec<u8>>),
    Inconsistent,
}

/// A system of [`BinaryRow`]s over `columns` unknowns of `byte_l` bytes each
#[derive(Debug, Clone)]
pub struct BinarySystem {
    columns: usize,
    byte_l: usize,
    rows: Vec<BinaryRow>,
}

impl BinarySystem {
    pub fn new(columns: usize, byte_l: usize) -> Self {
        Self {
            columns,
            byte_l,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add an equation, checking it matches the system's dimensions
    pub fn push(&mut self, row: BinaryRow) -> Result<()> {
        if row.target.len() != self.byte_l {
            return Err(CoreError::ElementLength {
                expected: self.byte_l,
                actual: row.target.len(),
            });
        }
        if row.bits.len() != (self.columns + 63) / 64 {
            return Err(CoreError::Dimension(format!(
                "row has {} words, system has {} columns",
                row.bits.len(),
                self.columns
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Gauss-Jordan elimination. Free columns are filled from `rng` in column order.
    pub fn solve<R: RngCore + CryptoRng + ?Sized>(self, rng: &mut R) -> SolveOutcome {
        let Self {
            columns,
            byte_l,
            mut rows,
        } = self;

        let mut pivots = Vec::new();
        let mut rank = 0;
        for col in 0..columns {
            if rank == rows.len() {
                break;
            }
            let Some(found) = (rank..rows.len()).find(|&r| rows[r].get(col)) else {
                continue;
            };
            rows.swap(rank, found);
            let pivot_row = rows[rank].clone();
            for (r, row) in rows.iter_mut().enumerate() {
                if r != rank && row.get(col) {
                    row.xor_row(&pivot_row);
                }
            }
            pivots.push(col);
            rank += 1;
        }

        // Remaining rows are all-zero on the left; any non-zero target is a contradiction
        if rows[rank..]
            .iter()
            .any(|row| row.target.iter().any(|&b| b != 0))
        {
            tracing::trace!(rows = rows.len(), columns, rank, "Inconsistent system");
            return SolveOutcome::Inconsistent;
        }

        let mut is_pivot = vec![false; columns];
        for &col in &pivots {
            is_pivot[col] = true;
        }
        let mut solution: Vec<Vec<u8>> = (0..columns)
            .map(|col| {
                if is_pivot[col] {
                    vec![0u8; byte_l]
                } else {
                    random_row(rng, byte_l)
                }
            })
            .collect();

        for (row, &col) in rows.iter().zip(&pivots) {
            let mut value = row.target.clone();
            for other in row.ones().filter(|&c| c != col) {
                xor_into(&mut value, &solution[other]);
            }
            solution[col] = value;
        }

        tracing::trace!(rows = rows.len(), columns, rank, "Solved system");
        SolveOutcome::Consistent(solution)
    }
}
