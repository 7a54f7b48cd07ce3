//! RAM benchmark suite
//!
//! Allocation, sequential, random and concurrent access, run in that
//! order. Each sub-workload reports the average time of one operation in
//! seconds. For concurrent access one operation is one pass over the whole
//! buffer, with every worker covering its own region in parallel.

pub mod access;
pub mod alloc;

use tracing::debug;

use crate::bench::{settle, Aggregate, WorkerPool};
use crate::config::RamConfig;
use crate::io::buffer::try_filled;
use crate::models::RamReport;
use crate::Result;

pub use access::{RandomAccess, SequentialAccess};

/// Run the suite; `pool` is only used by the concurrent sub-workload
pub fn run(
    config: &RamConfig,
    pool: &WorkerPool,
    seed: u64,
    total_memory_bytes: Option<u64>,
) -> Result<RamReport> {
    config.validate()?;
    debug!(workers = pool.threads(), "starting ram suite");

    let single = WorkerPool::new(1);

    let alloc_size = config.alloc.data_size;
    let alloc = single.run(config.alloc.budget, |_| Ok(move || alloc::alloc_release(alloc_size)));
    let alloc_avg_time = settle("alloc", alloc, Aggregate::avg_time);

    let sequential = single.run(config.sequential.budget, |_| {
        let mut access = SequentialAccess::new(config.sequential.data_size)?;
        Ok(move || access.run_once())
    });
    let access_sequential_avg_time = settle("sequential access", sequential, Aggregate::avg_time);

    let random = single.run(config.random.budget, |_| {
        let mut access = RandomAccess::new(config.random.data_size, seed)?;
        Ok(move || access.run_once())
    });
    let access_random_avg_time = settle("random access", random, Aggregate::avg_time);

    let concurrent = run_concurrent(config, pool);
    let access_concurrent_avg_time = settle("concurrent access", concurrent, Aggregate::pass_time);

    Ok(RamReport {
        total_memory_bytes,
        alloc_avg_time,
        access_sequential_avg_time,
        access_random_avg_time,
        access_concurrent_avg_time,
    })
}

/// One shared buffer, one disjoint region per worker
fn run_concurrent(config: &RamConfig, pool: &WorkerPool) -> Result<Aggregate> {
    let mut data = try_filled(config.concurrent.data_size, 0u8)?;
    let regions = access::partition(&mut data, pool.threads());

    pool.run_each(config.concurrent.budget, regions, |region, _| {
        let mut round = 0u8;
        Ok(move || {
            round = round.wrapping_add(1);
            access::touch_sequential(region, round)
        })
    })
}
