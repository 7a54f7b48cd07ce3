//! ACUBENCH - device performance benchmark engine
//!
//! Measures CPU throughput, RAM access/allocation latency and storage I/O
//! latency on the current device and returns structured reports. The
//! [`engine::Engine`] handle is the entry point for Rust callers; the
//! [`ffi`] module exposes the same operations to foreign hosts.

use thiserror::Error;

pub mod bench;
pub mod config;
pub mod cpu;
pub mod engine;
pub mod ffi;
pub mod io;
pub mod models;
pub mod ram;
pub mod storage;
pub mod util;

pub use bench::{Sample, WorkBudget};
pub use config::{CpuConfig, EngineOptions, RamConfig, RunConfig, StorageConfig, WorkloadConfig};
pub use engine::{Engine, Environment};
pub use models::{CpuReport, Metric, RamReport, StorageReport};

/// Common error type for every engine operation
#[derive(Debug, Error)]
pub enum BenchError {
    /// Configuration rejected before any timing started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Environment query (RAM size, free storage) failed
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
    /// A workload buffer could not be allocated
    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },
    /// Storage I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawnFailure(String),
    /// A workload produced a wrong result
    #[error("verification failed: {0}")]
    Verification(String),
    /// A worker thread panicked while running a workload
    #[error("worker thread panicked")]
    WorkerPanicked,
    /// Handle id was never issued or has been destroyed
    #[error("invalid engine handle: {0}")]
    InvalidHandle(u64),
    /// Boundary argument could not be converted (bad path bytes, size overflow)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Config or report (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fieldless classification of [`BenchError`], stable across the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfig,
    ResourceUnavailable,
    AllocationFailure,
    IoFailure,
    ThreadSpawnFailure,
    Verification,
    WorkerPanicked,
    InvalidHandle,
    InvalidArgument,
    Serialization,
}

impl BenchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            BenchError::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
            BenchError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            BenchError::Io(_) => ErrorKind::IoFailure,
            BenchError::ThreadSpawnFailure(_) => ErrorKind::ThreadSpawnFailure,
            BenchError::Verification(_) => ErrorKind::Verification,
            BenchError::WorkerPanicked => ErrorKind::WorkerPanicked,
            BenchError::InvalidHandle(_) => ErrorKind::InvalidHandle,
            BenchError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BenchError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl From<toml::de::Error> for BenchError {
    fn from(err: toml::de::Error) -> Self {
        BenchError::Serialization(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for BenchError {
    fn from(err: toml::ser::Error) -> Self {
        BenchError::Serialization(format!("TOML serialization error: {}", err))
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(format!("JSON serialization error: {}", err))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BenchError>;

pub const APP_NAME: &str = "acubench";
pub const CONFIG_FILE: &str = "acubench.toml";
pub const TEMP_FILE_PREFIX: &str = "ACUBENCH_TMP_";

pub const KB: usize = 1024;
pub const MB: usize = KB * KB;
pub const GB: usize = KB * MB;
