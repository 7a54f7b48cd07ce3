//! File access workloads
//!
//! Data moves in 1 MiB blocks. Every block written is synced to the
//! device, the file's cached pages are evicted before reading, and every
//! block read back is compared against what was written. Each block
//! carries its index and the operation number in its first eight bytes,
//! so a misplaced or stale block fails verification.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::io::buffer::{random_bytes, try_filled, try_with_capacity};
use crate::io::{evict_cache, TempFile};
use crate::{BenchError, Result, MB};

/// Unit of every read and write
pub const BLOCK_SIZE: usize = MB;

const STAMP_LEN: usize = 8;

fn stamp_value(block: usize, round: u64) -> [u8; STAMP_LEN] {
    (((block as u64) << 32) ^ round).to_le_bytes()
}

fn stamp(buf: &mut [u8], block: usize, round: u64) {
    buf[..STAMP_LEN].copy_from_slice(&stamp_value(block, round));
}

fn verify_block(read: &[u8], pattern: &[u8], block: usize, round: u64) -> Result<()> {
    if read[..STAMP_LEN] != stamp_value(block, round) || read[STAMP_LEN..] != pattern[STAMP_LEN..] {
        return Err(BenchError::Verification(format!(
            "block {} read back different data than was written",
            block
        )));
    }
    Ok(())
}

fn block_offset(block: usize) -> u64 {
    block as u64 * BLOCK_SIZE as u64
}

/// Block buffers shared by both access patterns
struct Blocks {
    pattern: Vec<u8>,
    read_buf: Vec<u8>,
    round: u64,
}

impl Blocks {
    fn new(seed: u64) -> Result<Self> {
        Ok(Self {
            pattern: random_bytes(BLOCK_SIZE, seed)?,
            read_buf: try_filled(BLOCK_SIZE, 0)?,
            round: 0,
        })
    }

    fn write(&mut self, file: &mut std::fs::File, block: usize) -> Result<()> {
        stamp(&mut self.pattern, block, self.round);
        file.write_all(&self.pattern)?;
        file.sync_all()?;
        Ok(())
    }

    fn read(&mut self, file: &mut std::fs::File, block: usize) -> Result<()> {
        file.read_exact(&mut self.read_buf)?;
        verify_block(&self.read_buf, &self.pattern, block, self.round)
    }
}

/// A storage workload bound to one scratch file.
///
/// Dropping the workload deletes the file without reporting errors;
/// [`FileWorkload::remove`] deletes it and reports them.
pub trait FileWorkload {
    /// One timed operation
    fn run_once(&mut self) -> Result<()>;

    /// Delete the scratch file
    fn remove(self) -> Result<()>;
}

/// Whole-file write then read in address order
pub struct SequentialFileAccess {
    file: TempFile,
    blocks: usize,
    buffers: Blocks,
}

impl SequentialFileAccess {
    /// Create the scratch file in `dir`; `size_mb` blocks per operation
    pub fn new(dir: &Path, size_mb: usize, seed: u64) -> Result<Self> {
        Ok(Self {
            file: TempFile::create(dir)?,
            blocks: size_mb,
            buffers: Blocks::new(seed)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl FileWorkload for SequentialFileAccess {
    fn run_once(&mut self) -> Result<()> {
        self.buffers.round += 1;
        let file = self.file.file();

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        for block in 0..self.blocks {
            self.buffers.write(file, block)?;
        }

        evict_cache(file)?;
        file.seek(SeekFrom::Start(0))?;
        for block in 0..self.blocks {
            self.buffers.read(file, block)?;
        }

        Ok(())
    }

    fn remove(self) -> Result<()> {
        self.file.remove()?;
        Ok(())
    }
}

/// Same volume as [`SequentialFileAccess`], visited in shuffled block order
pub struct RandomFileAccess {
    file: TempFile,
    write_order: Vec<usize>,
    read_order: Vec<usize>,
    buffers: Blocks,
}

impl RandomFileAccess {
    /// Create and size the scratch file, precompute both visiting orders
    pub fn new(dir: &Path, size_mb: usize, seed: u64) -> Result<Self> {
        let mut file = TempFile::create(dir)?;
        file.file().set_len(block_offset(size_mb))?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut shuffled = || -> Result<Vec<usize>> {
            let mut order = try_with_capacity(size_mb)?;
            order.extend(0..size_mb);
            order.shuffle(&mut rng);
            Ok(order)
        };

        Ok(Self {
            write_order: shuffled()?,
            read_order: shuffled()?,
            file,
            buffers: Blocks::new(seed)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl FileWorkload for RandomFileAccess {
    fn run_once(&mut self) -> Result<()> {
        self.buffers.round += 1;
        let file = self.file.file();

        for &block in &self.write_order {
            file.seek(SeekFrom::Start(block_offset(block)))?;
            self.buffers.write(file, block)?;
        }

        evict_cache(file)?;
        for &block in &self.read_order {
            file.seek(SeekFrom::Start(block_offset(block)))?;
            self.buffers.read(file, block)?;
        }

        Ok(())
    }

    fn remove(self) -> Result<()> {
        self.file.remove()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::{WorkBudget, WorkerPool};
    use tempfile::tempdir;

    fn residual_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_sequential_round_trip() {
        let dir = tempdir().unwrap();
        let mut access = SequentialFileAccess::new(dir.path(), 2, 1).unwrap();

        access.run_once().unwrap();
        access.run_once().unwrap();
        assert_eq!(
            std::fs::metadata(access.path()).unwrap().len(),
            2 * BLOCK_SIZE as u64
        );

        drop(access);
        assert_eq!(residual_files(dir.path()), 0);
    }

    #[test]
    fn test_random_round_trip() {
        let dir = tempdir().unwrap();
        let mut access = RandomFileAccess::new(dir.path(), 3, 5).unwrap();

        let mut order = access.write_order.clone();
        order.sort();
        assert_eq!(order, vec![0, 1, 2]);

        access.run_once().unwrap();
        assert_eq!(
            std::fs::metadata(access.path()).unwrap().len(),
            3 * BLOCK_SIZE as u64
        );

        drop(access);
        assert_eq!(residual_files(dir.path()), 0);
    }

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempdir().unwrap();
        let mut access = SequentialFileAccess::new(dir.path(), 1, 1).unwrap();
        access.run_once().unwrap();

        access.remove().unwrap();
        assert_eq!(residual_files(dir.path()), 0);
    }

    #[test]
    fn test_file_removed_when_operation_fails() {
        let dir = tempdir().unwrap();
        let result = WorkerPool::new(1).run(WorkBudget::Iterations(4), |_| {
            let mut access = SequentialFileAccess::new(dir.path(), 1, 3)?;
            let mut ops = 0;
            Ok(move || {
                ops += 1;
                if ops == 2 {
                    let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device gone");
                    return Err(BenchError::Io(err));
                }
                access.run_once()
            })
        });

        assert!(matches!(result, Err(BenchError::Io(_))));
        assert_eq!(residual_files(dir.path()), 0);
    }

    #[test]
    fn test_random_file_removed_when_operation_fails() {
        let dir = tempdir().unwrap();
        let result = WorkerPool::new(1).run(WorkBudget::Iterations(4), |_| {
            let mut access = RandomFileAccess::new(dir.path(), 2, 3)?;
            let mut ops = 0;
            Ok(move || {
                ops += 1;
                if ops == 2 {
                    return Err(BenchError::Verification("block 1 mismatch".to_string()));
                }
                access.run_once()
            })
        });

        assert!(matches!(result, Err(BenchError::Verification(_))));
        assert_eq!(residual_files(dir.path()), 0);
    }

    #[test]
    fn test_stale_block_is_detected() {
        let mut pattern = vec![7u8; 32];
        stamp(&mut pattern, 4, 2);
        let read = pattern.clone();

        assert!(verify_block(&read, &pattern, 4, 2).is_ok());
        assert!(verify_block(&read, &pattern, 4, 3).is_err());
        assert!(verify_block(&read, &pattern, 5, 2).is_err());
    }
}
