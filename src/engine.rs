//! Engine handle
//!
//! An [`Engine`] snapshots the device environment once when it is created
//! and then runs any number of suite calls against that snapshot. Each
//! call is synchronous and independent of the others.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bench::worker::{available_cores, WorkerPool};
use crate::config::{CpuConfig, EngineOptions, RamConfig, StorageConfig};
use crate::models::{CpuReport, RamReport, StorageReport};
use crate::{cpu, ram, storage, Result};

/// Device facts captured when the engine is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Total physical memory, `None` when it could not be determined
    pub total_ram_bytes: Option<u64>,
    /// Free space available to unprivileged users, `0` when unknown
    pub available_storage_bytes: u64,
    /// Logical cores visible to the process
    pub num_cores: usize,
    pub captured_at: DateTime<Utc>,
}

impl Environment {
    /// Environment from caller-supplied figures
    pub fn new(total_ram_bytes: Option<u64>, available_storage_bytes: u64) -> Self {
        Self {
            total_ram_bytes,
            available_storage_bytes,
            num_cores: available_cores(),
            captured_at: Utc::now(),
        }
    }

    /// Query the running system; failed queries degrade to `None` / `0`
    pub fn detect(storage_dir: &Path) -> Self {
        let total_ram_bytes = match system::total_ram() {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(error = %err, "total RAM unknown");
                None
            }
        };

        let available_storage_bytes = match system::available_storage(storage_dir) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, dir = %storage_dir.display(), "available storage unknown");
                0
            }
        };

        Self::new(total_ram_bytes, available_storage_bytes)
    }
}

/// Benchmark engine handle
#[derive(Debug)]
pub struct Engine {
    environment: Environment,
    options: EngineOptions,
}

impl Engine {
    /// Create an engine from caller-supplied environment figures
    pub fn new(total_ram_bytes: Option<u64>, available_storage_bytes: u64) -> Self {
        Self::from_environment(Environment::new(total_ram_bytes, available_storage_bytes))
    }

    /// Create an engine from the running system, probing free space in `storage_dir`
    pub fn detect(storage_dir: &Path) -> Self {
        Self::from_environment(Environment::detect(storage_dir))
    }

    pub fn from_environment(environment: Environment) -> Self {
        info!(
            total_ram = ?environment.total_ram_bytes,
            available_storage = environment.available_storage_bytes,
            cores = environment.num_cores,
            "engine created"
        );

        Self {
            environment,
            options: EngineOptions::default(),
        }
    }

    /// Replace the engine options
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Worker pool for multi-threaded workloads
    pub fn pool(&self) -> WorkerPool {
        WorkerPool::new(
            self.options
                .worker_threads
                .unwrap_or(self.environment.num_cores),
        )
    }

    /// CPU suite on the calling thread
    pub fn cpu(&self, config: &CpuConfig) -> Result<CpuReport> {
        cpu::run(config, self.options.seed)
    }

    /// CPU suite on every worker of the pool
    pub fn cpu_multithread(&self, config: &CpuConfig) -> Result<CpuReport> {
        cpu::run_multithread(config, &self.pool(), self.options.seed)
    }

    /// RAM suite, reporting the total RAM captured at creation
    pub fn ram(&self, config: &RamConfig) -> Result<RamReport> {
        ram::run(
            config,
            &self.pool(),
            self.options.seed,
            self.environment.total_ram_bytes,
        )
    }

    /// Storage suite, reporting the free space captured at creation
    pub fn storage(&self, config: &StorageConfig) -> Result<StorageReport> {
        storage::run(
            config,
            self.options.seed,
            self.environment.available_storage_bytes,
        )
    }

    /// Release the engine. Consumes the handle, so it cannot be used again.
    pub fn destroy(self) {
        debug!("engine destroyed");
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "macos", target_os = "ios"))]
mod system {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use crate::{BenchError, Result};

    pub fn total_ram() -> Result<u64> {
        // SAFETY: sysconf has no memory-safety preconditions
        let (pages, page_size) =
            unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };

        if pages <= 0 || page_size <= 0 {
            return Err(BenchError::ResourceUnavailable(
                "sysconf could not report physical memory".to_string(),
            ));
        }

        Ok((pages as u64).saturating_mul(page_size as u64))
    }

    #[allow(clippy::unnecessary_cast)]
    pub fn available_storage(dir: &Path) -> Result<u64> {
        let path = CString::new(dir.as_os_str().as_bytes()).map_err(|_| {
            BenchError::ResourceUnavailable(format!("path contains a NUL byte: {}", dir.display()))
        })?;

        // SAFETY: statvfs is plain old data, fully written by a successful call
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        // SAFETY: `path` is NUL-terminated and `stat` is a valid out-pointer
        let ret = unsafe { libc::statvfs(path.as_ptr(), &mut stat) };
        if ret != 0 {
            return Err(BenchError::ResourceUnavailable(format!(
                "statvfs {}: {}",
                dir.display(),
                std::io::Error::last_os_error()
            )));
        }

        Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos", target_os = "ios")))]
mod system {
    use std::path::Path;

    use crate::{BenchError, Result};

    pub fn total_ram() -> Result<u64> {
        Err(BenchError::ResourceUnavailable(
            "total RAM query not supported on this platform".to_string(),
        ))
    }

    pub fn available_storage(_dir: &Path) -> Result<u64> {
        Err(BenchError::ResourceUnavailable(
            "storage query not supported on this platform".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::WorkBudget;
    use crate::config::WorkloadConfig;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_is_reported_verbatim() {
        let engine = Engine::new(Some(8_000_000_000), 50_000_000_000);
        let dir = tempdir().unwrap();

        let ram = engine.ram(&RamConfig::uniform(1, 1024, 1024)).unwrap();
        assert_eq!(ram.total_memory_bytes, Some(8_000_000_000));

        let storage = engine.storage(&StorageConfig::uniform(dir.path(), 1, 1)).unwrap();
        assert_eq!(storage.available_storage_bytes, 50_000_000_000);

        engine.destroy();
    }

    #[test]
    fn test_unknown_ram_stays_unknown() {
        let engine = Engine::new(None, 0);
        let report = engine.ram(&RamConfig::uniform(1, 64, 64)).unwrap();
        assert_eq!(report.total_memory_bytes, None);
    }

    #[test]
    fn test_storage_failure_does_not_affect_other_suites() {
        let engine = Engine::new(None, 0);
        let dir = tempdir().unwrap();

        let bad = StorageConfig::uniform(dir.path().join("missing"), 1, 1);
        assert!(engine.storage(&bad).is_err());

        let cpu = CpuConfig {
            crypto: WorkloadConfig::iterations(2, 64),
            math: WorkloadConfig::iterations(2, 4),
            sort: WorkloadConfig::iterations(2, 64),
        };
        let report = engine.cpu(&cpu).unwrap();
        assert!(report.crypto_tps.is_available());
        assert!(engine.ram(&RamConfig::uniform(1, 64, 64)).is_ok());
    }

    #[test]
    fn test_worker_threads_option() {
        let engine = Engine::new(None, 0).with_options(EngineOptions {
            worker_threads: Some(3),
            seed: 1,
        });
        assert_eq!(engine.pool().threads(), 3);

        let engine = Engine::new(None, 0);
        assert_eq!(engine.pool().threads(), engine.environment().num_cores);
    }

    #[test]
    fn test_multithread_uses_pool() {
        let engine = Engine::new(None, 0).with_options(EngineOptions {
            worker_threads: Some(2),
            seed: 1,
        });
        let budget = WorkBudget::Iterations(2);
        let config = CpuConfig {
            crypto: WorkloadConfig::new(budget, 64),
            math: WorkloadConfig::new(budget, 4),
            sort: WorkloadConfig::new(budget, 64),
        };

        let report = engine.cpu_multithread(&config).unwrap();
        assert!(report.math_tps.value().unwrap() > 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_detect_on_linux() {
        let dir = tempdir().unwrap();
        let env = Environment::detect(dir.path());
        assert!(env.total_ram_bytes.unwrap() > 0);
        assert!(env.num_cores >= 1);
    }

    #[test]
    fn test_detect_degrades_on_missing_dir() {
        let dir = tempdir().unwrap();
        let env = Environment::detect(&dir.path().join("missing"));
        assert_eq!(env.available_storage_bytes, 0);
    }
}
