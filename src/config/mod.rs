//! Configuration management module
//!
//! One canonical configuration struct per suite, shorthand constructors
//! that expand a few values into the canonical form, validation, and
//! TOML persistence of a whole run configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bench::WorkBudget;
use crate::{BenchError, Result, APP_NAME, CONFIG_FILE, KB, MB};

const DEFAULT_CPU_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_CRYPTO_DATA_SIZE: usize = 10 * KB;
const DEFAULT_MATH_DATA_SIZE: usize = 200;
const DEFAULT_SORT_DATA_SIZE: usize = 100_000;

const DEFAULT_RAM_ITERS: u64 = 10;
const DEFAULT_ALLOC_DATA_SIZE: usize = 64 * MB;
const DEFAULT_ACCESS_DATA_SIZE: usize = 64 * KB;

const DEFAULT_STORAGE_ITERS: u64 = 1;
const DEFAULT_STORAGE_DATA_SIZE_MB: usize = 50;

/// Budget and data size of a single sub-workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Stopping condition
    pub budget: WorkBudget,
    /// Workload-specific size: bytes, elements, matrix dimension or megabytes
    pub data_size: usize,
}

impl WorkloadConfig {
    pub fn new(budget: WorkBudget, data_size: usize) -> Self {
        Self { budget, data_size }
    }

    /// Duration-budgeted workload
    pub fn timed(duration: Duration, data_size: usize) -> Self {
        Self::new(WorkBudget::Duration(duration), data_size)
    }

    /// Iteration-budgeted workload
    pub fn iterations(iters: u64, data_size: usize) -> Self {
        Self::new(WorkBudget::Iterations(iters), data_size)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.data_size == 0 {
            return Err(BenchError::InvalidConfig(format!(
                "{} data size must be greater than 0",
                name
            )));
        }

        Ok(())
    }
}

/// CPU suite configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Buffer length in bytes
    pub crypto: WorkloadConfig,
    /// Matrix dimension `n` (one operation is an `n x n` multiply)
    pub math: WorkloadConfig,
    /// Number of elements sorted per operation
    pub sort: WorkloadConfig,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self::uniform(
            DEFAULT_CPU_DURATION,
            DEFAULT_CRYPTO_DATA_SIZE,
            DEFAULT_MATH_DATA_SIZE,
            DEFAULT_SORT_DATA_SIZE,
        )
    }
}

impl CpuConfig {
    /// Same duration for every sub-workload
    pub fn uniform(
        duration: Duration,
        crypto_size: usize,
        math_size: usize,
        sort_size: usize,
    ) -> Self {
        Self {
            crypto: WorkloadConfig::timed(duration, crypto_size),
            math: WorkloadConfig::timed(duration, math_size),
            sort: WorkloadConfig::timed(duration, sort_size),
        }
    }

    /// Per-sub-workload durations in milliseconds, as passed across the boundary
    pub fn from_millis(
        crypto_duration_ms: u64,
        crypto_size: usize,
        math_duration_ms: u64,
        math_size: usize,
        sort_duration_ms: u64,
        sort_size: usize,
    ) -> Self {
        Self {
            crypto: WorkloadConfig::new(WorkBudget::from_millis(crypto_duration_ms), crypto_size),
            math: WorkloadConfig::new(WorkBudget::from_millis(math_duration_ms), math_size),
            sort: WorkloadConfig::new(WorkBudget::from_millis(sort_duration_ms), sort_size),
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.crypto.validate("crypto")?;
        self.math.validate("math")?;
        self.sort.validate("sort")?;

        if self.math.data_size.checked_mul(self.math.data_size).is_none() {
            return Err(BenchError::InvalidConfig(format!(
                "math matrix dimension too large: {}",
                self.math.data_size
            )));
        }

        Ok(())
    }
}

/// RAM suite configuration, all sizes in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamConfig {
    pub alloc: WorkloadConfig,
    pub sequential: WorkloadConfig,
    pub random: WorkloadConfig,
    pub concurrent: WorkloadConfig,
}

impl Default for RamConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_RAM_ITERS, DEFAULT_ALLOC_DATA_SIZE, DEFAULT_ACCESS_DATA_SIZE)
    }
}

impl RamConfig {
    /// Same iteration count everywhere, one size for allocation and one for access
    pub fn uniform(iters: u64, alloc_size: usize, access_size: usize) -> Self {
        Self::split(iters, alloc_size, iters, access_size)
    }

    /// Separate allocation settings, shared settings for the three access workloads
    pub fn split(
        alloc_iters: u64,
        alloc_size: usize,
        access_iters: u64,
        access_size: usize,
    ) -> Self {
        Self {
            alloc: WorkloadConfig::iterations(alloc_iters, alloc_size),
            sequential: WorkloadConfig::iterations(access_iters, access_size),
            random: WorkloadConfig::iterations(access_iters, access_size),
            concurrent: WorkloadConfig::iterations(access_iters, access_size),
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.alloc.validate("allocation")?;
        self.sequential.validate("sequential access")?;
        self.random.validate("random access")?;
        self.concurrent.validate("concurrent access")?;

        Ok(())
    }
}

/// Storage suite configuration, data sizes in megabytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Existing, writable directory that receives the temporary files
    pub dir: PathBuf,
    pub sequential: WorkloadConfig,
    pub random: WorkloadConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl StorageConfig {
    /// Default workloads against `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::uniform(dir, DEFAULT_STORAGE_ITERS, DEFAULT_STORAGE_DATA_SIZE_MB)
    }

    /// Same iteration count and size for both workloads
    pub fn uniform(dir: impl Into<PathBuf>, iters: u64, size_mb: usize) -> Self {
        Self {
            dir: dir.into(),
            sequential: WorkloadConfig::iterations(iters, size_mb),
            random: WorkloadConfig::iterations(iters, size_mb),
        }
    }

    /// Set the target directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.sequential.validate("sequential access")?;
        self.random.validate("random access")?;

        for (name, workload) in [("sequential", &self.sequential), ("random", &self.random)] {
            if workload.data_size.checked_mul(MB).is_none() {
                return Err(BenchError::InvalidConfig(format!(
                    "{} access data size too large: {} MB",
                    name, workload.data_size
                )));
            }
        }

        if !self.dir.exists() {
            return Err(BenchError::InvalidConfig(format!(
                "Storage directory does not exist: {}",
                self.dir.display()
            )));
        }

        if !self.dir.is_dir() {
            return Err(BenchError::InvalidConfig(format!(
                "Storage path is not a directory: {}",
                self.dir.display()
            )));
        }

        Ok(())
    }
}

/// Engine-wide options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Worker count for multi-threaded workloads, `None` = one per logical core
    pub worker_threads: Option<usize>,
    /// Seed for every pseudo-random input the workloads generate
    pub seed: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            worker_threads: None,
            seed: 0x5eed_acbe,
        }
    }
}

/// Everything a full benchmark run needs, persisted as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    pub options: EngineOptions,
    pub cpu: CpuConfig,
    pub ram: RamConfig,
    pub storage: StorageConfig,
}

impl RunConfig {
    /// Validate every suite configuration
    pub fn validate(&self) -> Result<()> {
        self.cpu.validate()?;
        self.ram.validate()?;
        self.storage.validate()?;

        Ok(())
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from `path`, defaults if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            BenchError::InvalidConfig(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/acubench/acubench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            BenchError::InvalidConfig("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
