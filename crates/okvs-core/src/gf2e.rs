//! GF(2^l) arithmetic
//!
//! Elements are big-endian byte strings of `l / 8` bytes, the same layout
//! as OKVS storage rows, so an encoded row can be fed to the field directly.
//! Addition is XOR. Multiplication is carry-less multiplication reduced by a
//! low-weight irreducible polynomial `x^l + x^a + x^b + x^c + 1`.
//!
//! ## Modulus Selection
//!
//! Every party must pick the same modulus for a given `l`. We use the
//! lexicographically smallest irreducible pentanomial `(a, b, c)`. Common
//! sizes come from a table, other sizes are found with a Ben-Or
//! irreducibility test (fields of size `2^l` with `8 | l` never have an
//! irreducible trinomial).

use rand::{CryptoRng, RngCore};

use crate::{CoreError, Result};

/// Smallest irreducible pentanomials `x^l + x^a + x^b + x^c + 1`
const KNOWN_MODULI: &[(usize, [usize; 3])] = &[
    (8, [4, 3, 1]),
    (16, [5, 3, 1]),
    (32, [7, 3, 2]),
    (64, [4, 3, 1]),
    (128, [7, 2, 1]),
    (256, [10, 5, 2]),
];

/// The finite field GF(2^l)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gf2e {
    l: usize,
    byte_l: usize,
    limbs: usize,
    /// Exponents of the modulus below `x^l`, the constant term included
    taps: Vec<usize>,
}

impl Gf2e {
    /// Create the field for `l` bits, `l` a positive multiple of 8
    pub fn new(l: usize) -> Result<Self> {
        if l == 0 || l % 8 != 0 {
            return Err(CoreError::FieldSize(l));
        }

        let middle = match KNOWN_MODULI.iter().find(|(bits, _)| *bits == l) {
            Some((_, taps)) => *taps,
            None => find_pentanomial(l).ok_or(CoreError::FieldSize(l))?,
        };
        tracing::debug!(l, ?middle, "Selected GF(2^l) modulus");

        let mut taps = middle.to_vec();
        taps.push(0);

        Ok(Self {
            l,
            byte_l: l / 8,
            limbs: (l + 63) / 64,
            taps,
        })
    }

    /// Bit length of an element
    pub fn l(&self) -> usize {
        self.l
    }

    /// Byte length of an element
    pub fn byte_l(&self) -> usize {
        self.byte_l
    }

    /// Middle exponents `[a, b, c]` of the modulus
    pub fn modulus_taps(&self) -> [usize; 3] {
        [self.taps[0], self.taps[1], self.taps[2]]
    }

    pub fn zero(&self) -> Vec<u8> {
        vec![0u8; self.byte_l]
    }

    pub fn one(&self) -> Vec<u8> {
        let mut one = self.zero();
        one[self.byte_l - 1] = 1;
        one
    }

    pub fn is_zero(&self, a: &[u8]) -> bool {
        a.iter().all(|&b| b == 0)
    }

    /// Check that `a` has the element length of this field
    pub fn validate(&self, a: &[u8]) -> Result<()> {
        if a.len() != self.byte_l {
            return Err(CoreError::ElementLength {
                expected: self.byte_l,
                actual: a.len(),
            });
        }
        Ok(())
    }

    pub fn random<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Vec<u8> {
        let mut element = self.zero();
        rng.fill_bytes(&mut element);
        element
    }

    pub fn add(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        debug_assert_eq!(a.len(), self.byte_l);
        debug_assert_eq!(b.len(), self.byte_l);
        a.iter().zip(b).map(|(x, y)| x ^ y).collect()
    }

    pub fn add_assign(&self, a: &mut [u8], b: &[u8]) {
        crate::xor::xor_into(a, b);
    }

    pub fn mul(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        let product = self.mul_limbs(&self.to_limbs(a), &self.to_limbs(b));
        self.from_limbs(&product)
    }

    /// Multiplicative inverse, computed as `a^(2^l - 2)`
    pub fn inv(&self, a: &[u8]) -> Result<Vec<u8>> {
        if self.is_zero(a) {
            return Err(CoreError::NotInvertible);
        }

        let base = self.to_limbs(a);
        let mut t = base.clone();
        // t = a^(2^k - 1) for k = 1 .. l - 1
        for _ in 1..self.l - 1 {
            t = self.mul_limbs(&t, &t);
            t = self.mul_limbs(&t, &base);
        }
        t = self.mul_limbs(&t, &t);

        Ok(self.from_limbs(&t))
    }

    pub fn div(&self, a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
        let inverse = self.inv(b)?;
        Ok(self.mul(a, &inverse))
    }

    fn to_limbs(&self, a: &[u8]) -> Vec<u64> {
        debug_assert_eq!(a.len(), self.byte_l);
        let mut limbs = vec![0u64; self.limbs];
        for (j, &byte) in a.iter().rev().enumerate() {
            limbs[j / 8] |= (byte as u64) << (8 * (j % 8));
        }
        limbs
    }

    fn from_limbs(&self, limbs: &[u64]) -> Vec<u8> {
        let mut out = vec![0u8; self.byte_l];
        for j in 0..self.byte_l {
            out[self.byte_l - 1 - j] = (limbs[j / 8] >> (8 * (j % 8))) as u8;
        }
        out
    }

    fn mul_limbs(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut product = vec![0u64; 2 * self.limbs + 1];
        for i in 0..self.l {
            if bit(a, i) {
                xor_shifted(&mut product, b, i);
            }
        }
        self.reduce(&mut product);
        product.truncate(self.limbs);
        product
    }

    fn reduce(&self, p: &mut [u64]) {
        for degree in (self.l..2 * self.l).rev() {
            if bit(p, degree) {
                flip(p, degree);
                for &t in &self.taps {
                    flip(p, degree - self.l + t);
                }
            }
        }
    }
}

#[inline]
fn bit(p: &[u64], i: usize) -> bool {
    p.get(i / 64).map_or(false, |w| (w >> (i % 64)) & 1 == 1)
}

#[inline]
fn flip(p: &mut [u64], i: usize) {
    p[i / 64] ^= 1u64 << (i % 64);
}

/// dst ^= src << shift, truncated to dst's length
fn xor_shifted(dst: &mut [u64], src: &[u64], shift: usize) {
    let word = shift / 64;
    let offset = shift % 64;
    for (k, &w) in src.iter().enumerate() {
        if w == 0 {
            continue;
        }
        let idx = k + word;
        if idx < dst.len() {
            dst[idx] ^= w << offset;
        }
        if offset != 0 && idx + 1 < dst.len() {
            dst[idx + 1] ^= w >> (64 - offset);
        }
    }
}

fn degree(p: &[u64]) -> Option<usize> {
    p.iter()
        .enumerate()
        .rev()
        .find(|(_, w)| **w != 0)
        .map(|(k, w)| 64 * k + 63 - w.leading_zeros() as usize)
}

fn clmul(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut result = vec![0u64; a.len() + b.len()];
    for i in 0..a.len() * 64 {
        if bit(a, i) {
            xor_shifted(&mut result, b, i);
        }
    }
    result
}

fn poly_mod(a: &[u64], f: &[u64]) -> Vec<u64> {
    let mut r = a.to_vec();
    let Some(df) = degree(f) else {
        return r;
    };
    while let Some(dr) = degree(&r) {
        if dr < df {
            break;
        }
        xor_shifted(&mut r, f, dr - df);
    }
    r.truncate(f.len());
    r
}

fn poly_gcd(mut a: Vec<u64>, mut b: Vec<u64>) -> Vec<u64> {
    while degree(&b).is_some() {
        let r = poly_mod(&a, &b);
        a = b;
        b = r;
    }
    a
}

/// Ben-Or test: `f` is irreducible iff `gcd(f, x^(2^i) - x) = 1` for `i <= deg(f) / 2`
fn is_irreducible(f: &[u64]) -> bool {
    let n = match degree(f) {
        Some(n) if n > 0 => n,
        _ => return false,
    };

    let mut h = vec![2u64];
    for _ in 0..n / 2 {
        h = poly_mod(&clmul(&h, &h), f);
        let mut diff = h.clone();
        diff[0] ^= 2;
        if degree(&poly_gcd(f.to_vec(), diff)) != Some(0) {
            return false;
        }
    }
    true
}

fn pentanomial(l: usize, middle: [usize; 3]) -> Vec<u64> {
    let mut f = vec![0u64; l / 64 + 1];
    for e in [l, middle[0], middle[1], middle[2], 0] {
        flip(&mut f, e);
    }
    f
}

fn find_pentanomial(l: usize) -> Option<[usize; 3]> {
    for a in 3..l {
        for b in 2..a {
            for c in 1..b {
                if is_irreducible(&pentanomial(l, [a, b, c])) {
                    return Some([a, b, c]);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(Gf2e::new(0), Err(CoreError::FieldSize(0)));
        assert_eq!(Gf2e::new(12), Err(CoreError::FieldSize(12)));
    }

    #[test]
    fn test_aes_field_vector() {
        // FIPS-197 section 4.2: {57} * {83} = {c1}
        let field = Gf2e::new(8).unwrap();
        assert_eq!(field.mul(&[0x57], &[0x83]), vec![0xc1]);
        assert_eq!(field.mul(&[0x57], &[0x13]), vec![0xfe]);
    }

    #[test]
    fn test_known_moduli_are_irreducible() {
        for &(l, middle) in KNOWN_MODULI {
            assert!(is_irreducible(&pentanomial(l, middle)), "l = {}", l);
        }
    }

    #[test]
    fn test_search_matches_table() {
        for &(l, middle) in KNOWN_MODULI.iter().filter(|(l, _)| *l <= 64) {
            assert_eq!(find_pentanomial(l), Some(middle), "l = {}", l);
        }
    }

    #[test]
    fn test_reducible_detected() {
        // x^8 + x^3 + x^2 + x + 1 and x^8 + x^4 + x^2 + x + 1 both factor
        assert!(!is_irreducible(&pentanomial(8, [3, 2, 1])));
        assert!(!is_irreducible(&pentanomial(8, [4, 2, 1])));
    }

    #[test]
    fn test_searched_field_sizes() {
        assert_eq!(Gf2e::new(40).unwrap().modulus_taps(), [5, 4, 3]);
        assert_eq!(Gf2e::new(48).unwrap().modulus_taps(), [5, 3, 2]);
    }

    #[test]
    fn test_field_axioms() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for l in [8, 40, 64, 128] {
            let field = Gf2e::new(l).unwrap();
            for _ in 0..10 {
                let a = field.random(&mut rng);
                let b = field.random(&mut rng);
                let c = field.random(&mut rng);

                assert_eq!(field.mul(&a, &b), field.mul(&b, &a));
                assert_eq!(field.mul(&a, &field.one()), a);
                assert!(field.is_zero(&field.mul(&a, &field.zero())));

                // distributivity
                let left = field.mul(&a, &field.add(&b, &c));
                let right = field.add(&field.mul(&a, &b), &field.mul(&a, &c));
                assert_eq!(left, right);

                if !field.is_zero(&a) {
                    let inverse = field.inv(&a).unwrap();
                    assert_eq!(field.mul(&a, &inverse), field.one(), "l = {}", l);
                }
            }
        }
    }

    #[test]
    fn test_zero_not_invertible() {
        let field = Gf2e::new(64).unwrap();
        assert_eq!(field.inv(&field.zero()), Err(CoreError::NotInvertible));
    }

    #[test]
    fn test_validate_length() {
        let field = Gf2e::new(16).unwrap();
        assert!(field.validate(&[0, 1]).is_ok());
        assert_eq!(
            field.validate(&[0, 1, 2]),
            Err(CoreError::ElementLength { expected: 2, actual: 3 })
        );
    }
}
