//! Sort workload
//!
//! The input sequence is generated once per worker. Each operation copies
//! it into a pre-allocated work buffer and sorts that copy, so every sort
//! starts from the same unsorted data. The copy is part of the timed
//! operation.

use std::hint::black_box;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::io::buffer::{try_filled, try_with_capacity};
use crate::{BenchError, Result};

/// Pre-generated input and work buffer for one sort worker
pub struct SortWorkload {
    input: Vec<u64>,
    work: Vec<u64>,
}

impl SortWorkload {
    /// Generate `len` seeded pseudo-random values
    pub fn new(len: usize, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut input = try_with_capacity(len)?;
        input.extend((0..len).map(|_| rng.gen::<u64>()));

        Ok(Self {
            input,
            work: try_filled(len, 0)?,
        })
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn run_once(&mut self) {
        self.work.copy_from_slice(&self.input);
        self.work.sort_unstable();
        black_box(&self.work);
    }

    /// Run once and check the output is a sorted permutation of the input
    pub fn verify(&mut self) -> Result<()> {
        self.run_once();

        if !self.work.windows(2).all(|pair| pair[0] <= pair[1]) {
            return Err(BenchError::Verification("sort output is not ordered".to_string()));
        }

        let mut expected = try_filled(self.input.len(), 0)?;
        expected.copy_from_slice(&self.input);
        expected.sort();
        if expected != self.work {
            return Err(BenchError::Verification(
                "sort output is not a permutation of its input".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_sorted_permutation() {
        let mut workload = SortWorkload::new(10_000, 11).unwrap();
        workload.verify().unwrap();

        let mut input = workload.input.clone();
        input.sort();
        assert_eq!(workload.work, input);
    }

    #[test]
    fn test_input_is_untouched_between_runs() {
        let mut workload = SortWorkload::new(512, 5).unwrap();
        let before = workload.input.clone();
        workload.run_once();
        workload.run_once();

        assert_eq!(workload.input, before);
        assert!(!before.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_same_seed_same_input() {
        let a = SortWorkload::new(64, 9).unwrap();
        let b = SortWorkload::new(64, 9).unwrap();
        assert_eq!(a.input, b.input);
        assert_eq!(a.len(), 64);
    }
}
