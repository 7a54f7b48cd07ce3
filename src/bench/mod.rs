//! Benchmark driver module
//!
//! Contains the work budget, the single-threaded timing loop and the
//! multi-threaded worker pool every suite runs its workloads through.

pub mod budget;
pub mod timing;
pub mod worker;

use tracing::{debug, warn};

use crate::models::Metric;
use crate::Result;

// Re-export commonly used types
pub use budget::WorkBudget;
pub use timing::{try_measure, Sample};
pub use worker::{Aggregate, WorkerPool};

/// Report a finished sub-workload as a measured figure
pub(crate) fn measured<F>(workload: &str, aggregate: &Aggregate, figure: F) -> Metric
where
    F: FnOnce(&Aggregate) -> f64,
{
    debug!(
        workload,
        workers = aggregate.workers(),
        ops = aggregate.total_ops,
        elapsed_ms = aggregate.max_elapsed.as_millis() as u64,
        "sub-workload finished"
    );
    Metric::Measured(figure(aggregate))
}

/// Turn a sub-workload outcome into a reported metric.
///
/// A failed sub-workload is reported as unavailable so the rest of the
/// suite can still run.
pub(crate) fn settle<F>(workload: &str, result: Result<Aggregate>, figure: F) -> Metric
where
    F: FnOnce(&Aggregate) -> f64,
{
    match result {
        Ok(aggregate) => measured(workload, &aggregate, figure),
        Err(err) => {
            warn!(workload, error = %err, "sub-workload unavailable");
            Metric::unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BenchError;

    #[test]
    fn test_settle_keeps_measured_zero() {
        let aggregate = Aggregate::from_samples(vec![Sample::default()]);
        let metric = settle("noop", Ok(aggregate), Aggregate::throughput);
        assert_eq!(metric, Metric::Measured(0.0));
    }

    #[test]
    fn test_settle_marks_failures_unavailable() {
        let metric = settle(
            "alloc",
            Err(BenchError::AllocationFailure { bytes: 8 }),
            Aggregate::avg_time,
        );
        assert_eq!(metric, Metric::unavailable("failed to allocate 8 bytes"));
    }
}
