//! Allocation workload
//!
//! One operation allocates a zero-filled buffer, checks its length and
//! releases it again.

use std::hint::black_box;

use crate::io::buffer::try_filled;
use crate::{BenchError, Result};

/// Allocate, fill and release `size` bytes
pub fn alloc_release(size: usize) -> Result<()> {
    let buffer = try_filled(size, 0u8)?;
    if buffer.len() != size {
        return Err(BenchError::Verification(format!(
            "allocated {} bytes instead of {}",
            buffer.len(),
            size
        )));
    }

    drop(black_box(buffer));
    Ok(())
}
