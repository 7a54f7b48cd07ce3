//! Math workload: dense square matrix multiplication
//!
//! One operation multiplies two `n x n` matrices of `f64` into a
//! pre-allocated result matrix using the cache-friendly i-k-j loop order.

use std::hint::black_box;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::io::buffer::{try_filled, try_with_capacity};
use crate::{BenchError, Result};

/// Multiply row-major `a` by `b` into `out`, all `n x n`
pub fn multiply_into(a: &[f64], b: &[f64], out: &mut [f64], n: usize) {
    out.fill(0.0);

    for i in 0..n {
        let row = &mut out[i * n..(i + 1) * n];
        for k in 0..n {
            let aik = a[i * n + k];
            let b_row = &b[k * n..(k + 1) * n];
            for (acc, &bkj) in row.iter_mut().zip(b_row) {
                *acc += aik * bkj;
            }
        }
    }
}

/// Pre-allocated operands for one math worker
pub struct MathWorkload {
    n: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    out: Vec<f64>,
}

impl MathWorkload {
    /// Prepare two seeded `n x n` operands
    pub fn new(n: usize, seed: u64) -> Result<Self> {
        let len = n.checked_mul(n).ok_or_else(|| {
            BenchError::InvalidConfig(format!("matrix dimension too large: {}", n))
        })?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut random_matrix = || -> Result<Vec<f64>> {
            let mut matrix = try_with_capacity(len)?;
            matrix.extend((0..len).map(|_| rng.gen_range(-1.0..1.0)));
            Ok(matrix)
        };

        Ok(Self {
            n,
            a: random_matrix()?,
            b: random_matrix()?,
            out: try_filled(len, 0.0)?,
        })
    }

    pub fn run_once(&mut self) {
        multiply_into(&self.a, &self.b, &mut self.out, self.n);
        black_box(&self.out);
    }

    /// Run once and check the product has the expected shape and is finite
    pub fn verify(&mut self) -> Result<()> {
        self.run_once();

        if self.out.is_empty() || self.out.len() != self.n * self.n {
            return Err(BenchError::Verification("matrix product is empty".to_string()));
        }

        if !self.out.iter().all(|v| v.is_finite()) {
            return Err(BenchError::Verification(
                "matrix product contains non-finite values".to_string(),
            ));
        }

        Ok(())
    }
}
