//! Fallible workload buffers
//!
//! Every buffer a workload touches is allocated here, before its timer
//! starts, with `try_reserve_exact` so running out of memory surfaces as
//! [`BenchError::AllocationFailure`] instead of aborting the process.

use std::mem;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{BenchError, Result};

/// Allocate a vector of `len` copies of `value`
pub fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buffer = try_with_capacity(len)?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Allocate an empty vector with room for exactly `len` elements
pub fn try_with_capacity<T>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| BenchError::AllocationFailure {
            bytes: len.saturating_mul(mem::size_of::<T>()),
        })?;
    Ok(buffer)
}

/// Allocate `len` bytes of seeded pseudo-random data
pub fn random_bytes(len: usize, seed: u64) -> Result<Vec<u8>> {
    let mut buffer = try_filled(len, 0u8)?;
    SmallRng::seed_from_u64(seed).fill(buffer.as_mut_slice());
    Ok(buffer)
}
