//! Memory access workloads
//!
//! Every operation writes a position-derived byte pattern over the whole
//! region and reads it back, failing on the first mismatch. The pattern is
//! shifted on every operation so a read can never be satisfied by a
//! previous write.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::io::buffer::{try_filled, try_with_capacity};
use crate::{BenchError, Result};

#[inline]
fn pattern(index: usize, round: u8) -> u8 {
    (index % 256) as u8 ^ round
}

fn mismatch(index: usize, expected: u8, found: u8) -> BenchError {
    BenchError::Verification(format!(
        "memory readback at offset {}: expected {:#04x}, found {:#04x}",
        index, expected, found
    ))
}

/// Write then read `data` in ascending address order
pub fn touch_sequential(data: &mut [u8], round: u8) -> Result<()> {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = pattern(i, round);
    }

    for (i, &byte) in data.iter().enumerate() {
        let expected = pattern(i, round);
        if byte != expected {
            return Err(mismatch(i, expected, byte));
        }
    }

    Ok(())
}

/// Write in `write_order`, then read back in `read_order`
pub fn touch_random(
    data: &mut [u8],
    write_order: &[usize],
    read_order: &[usize],
    round: u8,
) -> Result<()> {
    for &i in write_order {
        data[i] = pattern(i, round);
    }

    for &i in read_order {
        let expected = pattern(i, round);
        if data[i] != expected {
            return Err(mismatch(i, expected, data[i]));
        }
    }

    Ok(())
}

/// Single buffer accessed front to back
pub struct SequentialAccess {
    data: Vec<u8>,
    round: u8,
}

impl SequentialAccess {
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            data: try_filled(size, 0)?,
            round: 0,
        })
    }

    pub fn run_once(&mut self) -> Result<()> {
        self.round = self.round.wrapping_add(1);
        touch_sequential(&mut self.data, self.round)
    }
}

/// Single buffer accessed through precomputed shuffled offsets
pub struct RandomAccess {
    data: Vec<u8>,
    write_order: Vec<usize>,
    read_order: Vec<usize>,
    round: u8,
}

impl RandomAccess {
    pub fn new(size: usize, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut shuffled = || -> Result<Vec<usize>> {
            let mut order = try_with_capacity(size)?;
            order.extend(0..size);
            order.shuffle(&mut rng);
            Ok(order)
        };

        Ok(Self {
            data: try_filled(size, 0)?,
            write_order: shuffled()?,
            read_order: shuffled()?,
            round: 0,
        })
    }

    pub fn run_once(&mut self) -> Result<()> {
        self.round = self.round.wrapping_add(1);
        touch_random(&mut self.data, &self.write_order, &self.read_order, self.round)
    }
}

/// Split `data` into at most `workers` disjoint regions of near-equal size
pub fn partition(data: &mut [u8], workers: usize) -> Vec<&mut [u8]> {
    let chunk = data.len().div_ceil(workers.max(1)).max(1);
    data.chunks_mut(chunk).collect()
}
