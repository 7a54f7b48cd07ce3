//! CPU benchmark suite
//!
//! Runs the crypto, math and sort workloads one after another, either on
//! the calling thread or on every worker of a [`WorkerPool`]. Each worker
//! builds its own workload state and verifies it once before timing.

pub mod crypto;
pub mod math;
pub mod sort;

use tracing::debug;

use crate::bench::{settle, Aggregate, WorkerPool};
use crate::config::{CpuConfig, WorkloadConfig};
use crate::models::{CpuReport, Metric};
use crate::Result;

pub use crypto::CryptoWorkload;
pub use math::MathWorkload;
pub use sort::SortWorkload;

/// State a CPU worker times, one call = one operation
pub trait CpuWorkload {
    fn run_once(&mut self);

    /// Run once and check the result, outside the timed region
    fn verify(&mut self) -> Result<()>;
}

impl CpuWorkload for CryptoWorkload {
    fn run_once(&mut self) {
        CryptoWorkload::run_once(self)
    }

    fn verify(&mut self) -> Result<()> {
        CryptoWorkload::verify(self)
    }
}

impl CpuWorkload for MathWorkload {
    fn run_once(&mut self) {
        MathWorkload::run_once(self)
    }

    fn verify(&mut self) -> Result<()> {
        MathWorkload::verify(self)
    }
}

impl CpuWorkload for SortWorkload {
    fn run_once(&mut self) {
        SortWorkload::run_once(self)
    }

    fn verify(&mut self) -> Result<()> {
        SortWorkload::verify(self)
    }
}

/// Run the suite on the calling thread
pub fn run(config: &CpuConfig, seed: u64) -> Result<CpuReport> {
    run_on(config, &WorkerPool::new(1), seed)
}

/// Run the suite on every worker of `pool`
pub fn run_multithread(config: &CpuConfig, pool: &WorkerPool, seed: u64) -> Result<CpuReport> {
    run_on(config, pool, seed)
}

fn run_on(config: &CpuConfig, pool: &WorkerPool, seed: u64) -> Result<CpuReport> {
    config.validate()?;
    debug!(workers = pool.threads(), "starting cpu suite");

    let crypto_tps = bench_workload("crypto", &config.crypto, pool, |index| {
        CryptoWorkload::new(config.crypto.data_size, worker_seed(seed, index))
    });
    let math_tps = bench_workload("math", &config.math, pool, |index| {
        MathWorkload::new(config.math.data_size, worker_seed(seed, index))
    });
    let sort_tps = bench_workload("sort", &config.sort, pool, |index| {
        SortWorkload::new(config.sort.data_size, worker_seed(seed, index))
    });

    Ok(CpuReport {
        crypto_tps,
        math_tps,
        sort_tps,
    })
}

fn bench_workload<W, S>(
    name: &str,
    workload: &WorkloadConfig,
    pool: &WorkerPool,
    setup: S,
) -> Metric
where
    W: CpuWorkload,
    S: Fn(usize) -> Result<W> + Sync,
{
    debug!(workload = name, data_size = workload.data_size, "starting sub-workload");

    let result = pool.run(workload.budget, |index| {
        let mut state = setup(index)?;
        state.verify()?;
        Ok(move || {
            state.run_once();
            Ok(())
        })
    });

    settle(name, result, Aggregate::throughput)
}

fn worker_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
}
