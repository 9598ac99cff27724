//! Polynomial interpolation and evaluation over GF(2^l)
//!
//! Coefficients are stored lowest degree first.

use std::collections::HashSet;

use crate::{CoreError, Gf2e, Result};

/// Evaluate `coefficients` at `x` (Horner)
pub fn evaluate(field: &Gf2e, coefficients: &[Vec<u8>], x: &[u8]) -> Vec<u8> {
    let mut acc = field.zero();
    for c in coefficients.iter().rev() {
        acc = field.mul(&acc, x);
        field.add_assign(&mut acc, c);
    }
    acc
}

/// Interpolate the unique polynomial of degree `< xs.len()` through `(xs[i], ys[i])`.
///
/// Lagrange form through the master polynomial `M(x) = prod (x - x_i)`:
/// each basis polynomial is `M(x) / (x - x_i)`, obtained by synthetic
/// division, scaled by `y_i / (M / (x - x_i))(x_i)`. Quadratic in the
/// number of points.
pub fn interpolate(field: &Gf2e, xs: &[Vec<u8>], ys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
    if xs.len() != ys.len() {
        return Err(CoreError::Dimension(format!(
            "{} x-coordinates but {} y-coordinates",
            xs.len(),
            ys.len()
        )));
    }
    let mut seen = HashSet::with_capacity(xs.len());
    for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
        field.validate(x)?;
        field.validate(y)?;
        if !seen.insert(x.as_slice()) {
            return Err(CoreError::DuplicatePoint(i));
        }
    }

    let k = xs.len();
    if k == 0 {
        return Ok(Vec::new());
    }

    // master polynomial, degree k
    let mut master = vec![field.one()];
    for x in xs {
        let mut next = vec![field.zero(); master.len() + 1];
        for (j, c) in master.iter().enumerate() {
            field.add_assign(&mut next[j + 1], c);
            let scaled = field.mul(c, x);
            field.add_assign(&mut next[j], &scaled);
        }
        master = next;
    }

    let mut result = vec![field.zero(); k];
    for (x, y) in xs.iter().zip(ys) {
        // quotient = master / (x - x_i), degree k - 1
        let mut quotient = vec![field.zero(); k];
        quotient[k - 1] = master[k].clone();
        for j in (1..k).rev() {
            let carried = field.mul(x, &quotient[j]);
            quotient[j - 1] = field.add(&master[j], &carried);
        }

        let denominator = evaluate(field, &quotient, x);
        let scale = field.div(y, &denominator)?;
        for (r, q) in result.iter_mut().zip(&quotient) {
            let term = field.mul(&scale, q);
            field.add_assign(r, &term);
        }
    }

    Ok(result)
}
