//! Storage benchmark suite
//!
//! Sequential then random file access inside a caller-supplied
//! directory. An I/O failure aborts the whole suite, while a buffer that
//! cannot be allocated only marks its own sub-workload unavailable.
//! Scratch files are removed on every exit path.

pub mod access;

use tracing::debug;

use crate::bench::{measured, settle, try_measure, Aggregate, WorkBudget};
use crate::config::StorageConfig;
use crate::models::{Metric, StorageReport};
use crate::{BenchError, Result};

pub use access::{FileWorkload, RandomFileAccess, SequentialFileAccess};

/// Run the suite against `config.dir`
pub fn run(
    config: &StorageConfig,
    seed: u64,
    available_storage_bytes: u64,
) -> Result<StorageReport> {
    config.validate()?;
    debug!(dir = %config.dir.display(), "starting storage suite");

    let access_sequential_avg_time = bench_file(
        "sequential file access",
        config.sequential.budget,
        SequentialFileAccess::new(&config.dir, config.sequential.data_size, seed),
    )?;

    let access_random_avg_time = bench_file(
        "random file access",
        config.random.budget,
        RandomFileAccess::new(&config.dir, config.random.data_size, seed),
    )?;

    Ok(StorageReport {
        available_storage_bytes,
        access_sequential_avg_time,
        access_random_avg_time,
    })
}

/// Time one file workload on the calling thread, then delete its file.
///
/// Only an allocation failure is settled into an unavailable metric. On
/// every error path the workload is dropped, which removes the file.
fn bench_file<W: FileWorkload>(
    workload: &str,
    budget: WorkBudget,
    access: Result<W>,
) -> Result<Metric> {
    let mut access = match access {
        Ok(access) => access,
        Err(err @ BenchError::AllocationFailure { .. }) => {
            return Ok(settle(workload, Err(err), Aggregate::avg_time));
        }
        Err(err) => return Err(err),
    };

    let sample = try_measure(budget, || access.run_once())?;
    access.remove()?;

    let aggregate = Aggregate::from_samples(vec![sample]);
    Ok(measured(workload, &aggregate, Aggregate::avg_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_small_run_leaves_no_files() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::uniform(dir.path(), 2, 2);

        let report = run(&config, 1, 42).unwrap();

        assert_eq!(report.available_storage_bytes, 42);
        assert!(report.access_sequential_avg_time.value().unwrap() > 0.0);
        assert!(report.access_random_avg_time.value().unwrap() > 0.0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_allocation_failure_is_unavailable() {
        let metric = bench_file::<SequentialFileAccess>(
            "sequential file access",
            WorkBudget::Iterations(1),
            Err(BenchError::AllocationFailure { bytes: 1 << 20 }),
        )
        .unwrap();

        assert!(!metric.is_available());
    }

    #[test]
    fn test_io_failure_aborts() {
        let result = bench_file::<RandomFileAccess>(
            "random file access",
            WorkBudget::Iterations(1),
            Err(BenchError::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            ))),
        );

        assert!(matches!(result, Err(BenchError::Io(_))));
    }

    #[test]
    fn test_verification_failure_aborts_and_cleans_up() {
        struct Corrupt(SequentialFileAccess);

        impl FileWorkload for Corrupt {
            fn run_once(&mut self) -> Result<()> {
                self.0.run_once()?;
                Err(BenchError::Verification("block 0 mismatch".to_string()))
            }

            fn remove(self) -> Result<()> {
                self.0.remove()
            }
        }

        let dir = tempdir().unwrap();
        let access = SequentialFileAccess::new(dir.path(), 1, 1).map(Corrupt);
        let result = bench_file("sequential file access", WorkBudget::Iterations(3), access);

        assert!(matches!(result, Err(BenchError::Verification(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_cleanup_is_reported() {
        let dir = tempdir().unwrap();
        let access = SequentialFileAccess::new(dir.path(), 1, 1).unwrap();
        std::fs::remove_file(access.path()).unwrap();

        let result = bench_file(
            "sequential file access",
            WorkBudget::Iterations(1),
            Ok(access),
        );

        assert!(matches!(result, Err(BenchError::Io(_))));
    }

    #[test]
    fn test_missing_dir_is_invalid_config() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::uniform(dir.path().join("nope"), 1, 1);
        assert!(matches!(run(&config, 1, 0), Err(BenchError::InvalidConfig(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_dir_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // root ignores directory permissions
        if std::fs::write(locked.join("canary"), b"x").is_ok() {
            return;
        }

        let config = StorageConfig::uniform(&locked, 1, 1);
        assert!(matches!(run(&config, 1, 0), Err(BenchError::Io(_))));
        assert_eq!(std::fs::read_dir(&locked).unwrap().count(), 0);
    }
}
