use acubench::ffi::{
    acubench_cpu, acubench_create, acubench_destroy, acubench_ram, acubench_storage,
    ACUBENCH_INVALID_CONFIG, ACUBENCH_INVALID_HANDLE, ACUBENCH_OK,
};
use acubench::{
    BenchError, CpuConfig, Engine, Metric, RamConfig, StorageConfig, WorkBudget, WorkloadConfig,
};
use tempfile::tempdir;

#[test]
fn test_invalid_config_is_rejected_before_timing() {
    let engine = Engine::new(None, 0);
    let mut config = CpuConfig::from_millis(60_000, 1024, 60_000, 16, 60_000, 1000);
    config.math.data_size = 0;

    // would take three minutes if timing started
    let start = std::time::Instant::now();
    assert!(matches!(engine.cpu(&config), Err(BenchError::InvalidConfig(_))));
    assert!(start.elapsed().as_secs() < 1);
}

#[test]
fn test_storage_failure_is_isolated() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(Some(1), 1);

    let missing = StorageConfig::uniform(dir.path().join("gone"), 1, 1);
    assert!(engine.storage(&missing).is_err());

    let report = engine.ram(&RamConfig::uniform(2, 4096, 4096)).unwrap();
    assert!(report.alloc_avg_time.is_available());
    assert!(engine.storage(&StorageConfig::uniform(dir.path(), 1, 1)).is_ok());
}

#[test]
fn test_unavailable_is_distinct_from_zero() {
    let engine = Engine::new(None, 0);
    let config = RamConfig {
        alloc: WorkloadConfig::iterations(1, usize::MAX),
        sequential: WorkloadConfig::new(WorkBudget::Iterations(0), 64),
        ..RamConfig::uniform(1, 64, 64)
    };

    let report = engine.ram(&config).unwrap();
    assert!(matches!(report.alloc_avg_time, Metric::Unavailable { .. }));
    assert_eq!(report.access_sequential_avg_time, Metric::Measured(0.0));
    assert!(report.access_random_avg_time.value().unwrap() > 0.0);
}

#[test]
fn test_boundary_handle_lifecycle() {
    let handle = acubench_create(8_000_000_000, 1, 50_000_000_000);

    let report = acubench_ram(handle, 1, 1024, 1, 1024, 1, 1024, 1, 1024);
    assert_eq!(report.status, ACUBENCH_OK);
    assert_eq!(report.total_memory, 8_000_000_000);

    assert_eq!(acubench_destroy(handle), ACUBENCH_OK);
    assert_eq!(acubench_destroy(handle), ACUBENCH_INVALID_HANDLE);
    assert_eq!(acubench_cpu(handle, 1, 16, 1, 2, 1, 16).status, ACUBENCH_INVALID_HANDLE);
    assert_eq!(acubench_destroy(0), ACUBENCH_INVALID_HANDLE);
}

#[test]
fn test_boundary_storage_with_missing_dir() {
    let handle = acubench_create(0, 0, 0);
    let dir = b"/nonexistent/acubench/target";

    let report = unsafe { acubench_storage(handle, dir.as_ptr(), dir.len(), 1, 1, 1, 1) };
    assert_eq!(report.status, ACUBENCH_INVALID_CONFIG);
    assert_eq!(report.access_sequential_avg_time.available, 0);

    // the handle stays usable after a failed storage call
    assert_eq!(acubench_cpu(handle, 1, 16, 1, 2, 1, 16).status, ACUBENCH_OK);
    acubench_destroy(handle);
}
