//! C-compatible boundary
//!
//! Engines live in a process-wide table and are addressed by integer
//! handles, so a stale or repeated handle is detected and reported
//! instead of dereferenced. Every entry point takes plain values, returns
//! a `#[repr(C)]` struct by value with a `status` field, and never lets a
//! panic unwind into the caller. Nothing returned needs to be freed.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{error, warn};

use crate::config::{CpuConfig, RamConfig, StorageConfig, WorkloadConfig};
use crate::engine::Engine;
use crate::models::{CpuReport, Metric, RamReport, StorageReport};
use crate::{BenchError, ErrorKind, Result};

pub const ACUBENCH_OK: i32 = 0;
pub const ACUBENCH_INVALID_HANDLE: i32 = 1;
pub const ACUBENCH_INVALID_CONFIG: i32 = 2;
pub const ACUBENCH_IO_FAILURE: i32 = 3;
pub const ACUBENCH_PANIC: i32 = 4;
pub const ACUBENCH_INVALID_ARGUMENT: i32 = 5;
/// Any other failure: verification, allocation, worker errors
pub const ACUBENCH_INTERNAL_ERROR: i32 = 6;

/// Status code for an error
pub fn status_of(err: &BenchError) -> i32 {
    match err.kind() {
        ErrorKind::InvalidHandle => ACUBENCH_INVALID_HANDLE,
        ErrorKind::InvalidConfig => ACUBENCH_INVALID_CONFIG,
        ErrorKind::IoFailure => ACUBENCH_IO_FAILURE,
        ErrorKind::InvalidArgument => ACUBENCH_INVALID_ARGUMENT,
        ErrorKind::ResourceUnavailable
        | ErrorKind::AllocationFailure
        | ErrorKind::ThreadSpawnFailure
        | ErrorKind::Verification
        | ErrorKind::WorkerPanicked
        | ErrorKind::Serialization => ACUBENCH_INTERNAL_ERROR,
    }
}

/// Metric as a value plus availability flag (`1` measured, `0` unavailable)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcubenchMetric {
    pub value: f64,
    pub available: u8,
}

impl From<&Metric> for AcubenchMetric {
    fn from(metric: &Metric) -> Self {
        let (value, available) = metric.to_pair();
        Self {
            value,
            available: available as u8,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcubenchCpuReport {
    pub status: i32,
    pub crypto_tps: AcubenchMetric,
    pub math_tps: AcubenchMetric,
    pub sort_tps: AcubenchMetric,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcubenchRamReport {
    pub status: i32,
    pub total_memory: u64,
    pub total_memory_available: u8,
    pub alloc_avg_time: AcubenchMetric,
    pub access_sequential_avg_time: AcubenchMetric,
    pub access_random_avg_time: AcubenchMetric,
    pub access_concurrent_avg_time: AcubenchMetric,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcubenchStorageReport {
    pub status: i32,
    pub available_storage: u64,
    pub access_sequential_avg_time: AcubenchMetric,
    pub access_random_avg_time: AcubenchMetric,
}

impl From<&CpuReport> for AcubenchCpuReport {
    fn from(report: &CpuReport) -> Self {
        Self {
            status: ACUBENCH_OK,
            crypto_tps: (&report.crypto_tps).into(),
            math_tps: (&report.math_tps).into(),
            sort_tps: (&report.sort_tps).into(),
        }
    }
}

impl From<&RamReport> for AcubenchRamReport {
    fn from(report: &RamReport) -> Self {
        Self {
            status: ACUBENCH_OK,
            total_memory: report.total_memory_bytes.unwrap_or(0),
            total_memory_available: report.total_memory_bytes.is_some() as u8,
            alloc_avg_time: (&report.alloc_avg_time).into(),
            access_sequential_avg_time: (&report.access_sequential_avg_time).into(),
            access_random_avg_time: (&report.access_random_avg_time).into(),
            access_concurrent_avg_time: (&report.access_concurrent_avg_time).into(),
        }
    }
}

impl From<&StorageReport> for AcubenchStorageReport {
    fn from(report: &StorageReport) -> Self {
        Self {
            status: ACUBENCH_OK,
            available_storage: report.available_storage_bytes,
            access_sequential_avg_time: (&report.access_sequential_avg_time).into(),
            access_random_avg_time: (&report.access_random_avg_time).into(),
        }
    }
}

/// Boundary report that can carry a failure status and nothing else
trait Failed {
    fn failed(status: i32) -> Self;
}

macro_rules! impl_failed {
    ($($report:ty),*) => {
        $(impl Failed for $report {
            fn failed(status: i32) -> Self {
                Self {
                    status,
                    ..Default::default()
                }
            }
        })*
    };
}

impl_failed!(AcubenchCpuReport, AcubenchRamReport, AcubenchStorageReport);

/// Run `call` with panics contained and errors turned into a status
fn guarded<R, F>(operation: &str, call: F) -> R
where
    R: Failed,
    F: FnOnce() -> Result<R>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            warn!(operation, error = %err, "boundary call failed");
            R::failed(status_of(&err))
        }
        Err(_) => {
            error!(operation, "panic contained at the boundary");
            R::failed(ACUBENCH_PANIC)
        }
    }
}

struct Registry {
    next_id: u64,
    engines: HashMap<u64, Arc<Engine>>,
}

fn registry() -> MutexGuard<'static, Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();

    REGISTRY
        .get_or_init(|| {
            Mutex::new(Registry {
                next_id: 1,
                engines: HashMap::new(),
            })
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Register an engine and return its handle; `0` is never issued
pub fn register(engine: Engine) -> u64 {
    let mut registry = registry();
    let id = registry.next_id;
    registry.next_id += 1;
    registry.engines.insert(id, Arc::new(engine));
    id
}

/// Remove an engine from the table; a second call for the same id fails
pub fn unregister(handle: u64) -> Result<()> {
    let engine = registry()
        .engines
        .remove(&handle)
        .ok_or(BenchError::InvalidHandle(handle))?;

    // a suite call still holding a clone finishes before the engine drops
    if let Ok(engine) = Arc::try_unwrap(engine) {
        engine.destroy();
    }
    Ok(())
}

/// Look up a live engine; the table lock is released before returning
pub fn lookup(handle: u64) -> Result<Arc<Engine>> {
    registry()
        .engines
        .get(&handle)
        .cloned()
        .ok_or(BenchError::InvalidHandle(handle))
}

fn size(value: u64, name: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        BenchError::InvalidArgument(format!("{} does not fit in usize: {}", name, value))
    })
}

fn cpu_config(
    crypto_duration_ms: u64,
    crypto_data_size: u64,
    math_duration_ms: u64,
    math_data_size: u64,
    sort_duration_ms: u64,
    sort_data_size: u64,
) -> Result<CpuConfig> {
    Ok(CpuConfig::from_millis(
        crypto_duration_ms,
        size(crypto_data_size, "crypto_data_size")?,
        math_duration_ms,
        size(math_data_size, "math_data_size")?,
        sort_duration_ms,
        size(sort_data_size, "sort_data_size")?,
    ))
}

/// Create an engine. Pass `total_ram_known = 0` when total RAM is unknown.
/// Returns `0` only if creation panicked.
#[no_mangle]
pub extern "C" fn acubench_create(
    total_ram: u64,
    total_ram_known: u8,
    available_storage: u64,
) -> u64 {
    let total_ram = (total_ram_known != 0).then_some(total_ram);
    panic::catch_unwind(|| register(Engine::new(total_ram, available_storage))).unwrap_or_else(|_| {
        error!("panic contained in acubench_create");
        0
    })
}

/// Destroy an engine. Returns `ACUBENCH_INVALID_HANDLE` if already destroyed.
#[no_mangle]
pub extern "C" fn acubench_destroy(handle: u64) -> i32 {
    match panic::catch_unwind(|| unregister(handle)) {
        Ok(Ok(())) => ACUBENCH_OK,
        Ok(Err(err)) => status_of(&err),
        Err(_) => ACUBENCH_PANIC,
    }
}

#[no_mangle]
pub extern "C" fn acubench_cpu(
    handle: u64,
    crypto_duration_ms: u64,
    crypto_data_size: u64,
    math_duration_ms: u64,
    math_data_size: u64,
    sort_duration_ms: u64,
    sort_data_size: u64,
) -> AcubenchCpuReport {
    guarded("cpu", || {
        let config = cpu_config(
            crypto_duration_ms,
            crypto_data_size,
            math_duration_ms,
            math_data_size,
            sort_duration_ms,
            sort_data_size,
        )?;
        let report = lookup(handle)?.cpu(&config)?;
        Ok((&report).into())
    })
}

#[no_mangle]
pub extern "C" fn acubench_cpu_multithread(
    handle: u64,
    crypto_duration_ms: u64,
    crypto_data_size: u64,
    math_duration_ms: u64,
    math_data_size: u64,
    sort_duration_ms: u64,
    sort_data_size: u64,
) -> AcubenchCpuReport {
    guarded("cpu_multithread", || {
        let config = cpu_config(
            crypto_duration_ms,
            crypto_data_size,
            math_duration_ms,
            math_data_size,
            sort_duration_ms,
            sort_data_size,
        )?;
        let report = lookup(handle)?.cpu_multithread(&config)?;
        Ok((&report).into())
    })
}

#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn acubench_ram(
    handle: u64,
    alloc_iters: u64,
    alloc_data_size: u64,
    seq_iters: u64,
    seq_data_size: u64,
    rand_iters: u64,
    rand_data_size: u64,
    concurrent_iters: u64,
    concurrent_data_size: u64,
) -> AcubenchRamReport {
    guarded("ram", || {
        let config = RamConfig {
            alloc: WorkloadConfig::iterations(
                alloc_iters,
                size(alloc_data_size, "alloc_data_size")?,
            ),
            sequential: WorkloadConfig::iterations(
                seq_iters,
                size(seq_data_size, "seq_data_size")?,
            ),
            random: WorkloadConfig::iterations(
                rand_iters,
                size(rand_data_size, "rand_data_size")?,
            ),
            concurrent: WorkloadConfig::iterations(
                concurrent_iters,
                size(concurrent_data_size, "concurrent_data_size")?,
            ),
        };
        let report = lookup(handle)?.ram(&config)?;
        Ok((&report).into())
    })
}

/// Run the storage suite in the directory named by `dir_len` UTF-8 bytes at `dir_ptr`.
///
/// # Safety
///
/// `dir_ptr` must be null with `dir_len == 0`, or point to `dir_len`
/// readable bytes that stay valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn acubench_storage(
    handle: u64,
    dir_ptr: *const u8,
    dir_len: usize,
    seq_iters: u64,
    seq_data_size_mb: u64,
    rand_iters: u64,
    rand_data_size_mb: u64,
) -> AcubenchStorageReport {
    let bytes: &[u8] = if dir_ptr.is_null() {
        if dir_len != 0 {
            return AcubenchStorageReport::failed(ACUBENCH_INVALID_ARGUMENT);
        }
        &[]
    } else {
        // SAFETY: guaranteed by the caller per the contract above
        unsafe { std::slice::from_raw_parts(dir_ptr, dir_len) }
    };

    guarded("storage", || {
        let dir = std::str::from_utf8(bytes)
            .map(PathBuf::from)
            .map_err(|_| {
                BenchError::InvalidArgument("storage path is not valid UTF-8".to_string())
            })?;

        let config = StorageConfig {
            dir,
            sequential: WorkloadConfig::iterations(
                seq_iters,
                size(seq_data_size_mb, "seq_data_size_mb")?,
            ),
            random: WorkloadConfig::iterations(
                rand_iters,
                size(rand_data_size_mb, "rand_data_size_mb")?,
            ),
        };
        let report = lookup(handle)?.storage(&config)?;
        Ok((&report).into())
    })
}
