//! Single-threaded timing loop
//!
//! The clock is read at loop entry and at loop exit. Under a duration
//! budget the deadline is also compared once per operation, but the
//! reported elapsed time is always the entry-to-exit span.

use std::time::{Duration, Instant};

use crate::bench::WorkBudget;
use crate::util::units::{average_latency, throughput};
use crate::Result;

/// Raw outcome of one timed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    /// Wall time between loop entry and loop exit
    pub elapsed: Duration,
    /// Number of workload invocations that completed
    pub completed_ops: u64,
}

impl Sample {
    /// Operations per second, `0.0` when nothing was measured
    pub fn throughput(&self) -> f64 {
        throughput(self.completed_ops, self.elapsed)
    }

    /// Seconds per operation, `0.0` when nothing was measured
    pub fn avg_time(&self) -> f64 {
        average_latency(self.elapsed, self.completed_ops)
    }
}

/// Run a fallible workload under `budget`, stopping at the first error.
pub fn try_measure<F>(budget: WorkBudget, mut workload: F) -> Result<Sample>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    let mut completed_ops = 0u64;

    match budget {
        WorkBudget::Duration(limit) => {
            while start.elapsed() < limit {
                workload()?;
                completed_ops += 1;
            }
        }
        WorkBudget::Iterations(n) => {
            while completed_ops < n {
                workload()?;
                completed_ops += 1;
            }
        }
    }

    Ok(Sample {
        elapsed: start.elapsed(),
        completed_ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BenchError;

    #[test]
    fn test_iterations_run_exactly() {
        let mut calls = 0u64;
        let sample = try_measure(WorkBudget::Iterations(37), || {
            calls += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(calls, 37);
        assert_eq!(sample.completed_ops, 37);
    }

    #[test]
    fn test_zero_iterations_reports_zero() {
        let sample = try_measure(WorkBudget::Iterations(0), || unreachable!()).unwrap();

        assert_eq!(sample.completed_ops, 0);
        assert_eq!(sample.throughput(), 0.0);
        assert_eq!(sample.avg_time(), 0.0);
    }

    #[test]
    fn test_duration_budget_is_respected() {
        let limit = Duration::from_millis(200);
        let op_cost = Duration::from_millis(5);
        let start = Instant::now();
        let sample = try_measure(WorkBudget::Duration(limit), || {
            std::thread::sleep(op_cost);
            Ok(())
        })
        .unwrap();
        let wall = start.elapsed();

        assert!(sample.completed_ops > 0);
        assert!(sample.elapsed >= limit);
        // one operation of slack plus scheduler noise
        assert!(wall <= limit + op_cost + Duration::from_millis(50));
        assert!(sample.throughput() > 0.0 && sample.throughput().is_finite());
    }

    #[test]
    fn test_zero_duration_runs_nothing() {
        let sample = try_measure(WorkBudget::Duration(Duration::ZERO), || unreachable!()).unwrap();
        assert_eq!(sample.completed_ops, 0);
        assert_eq!(sample.throughput(), 0.0);
    }

    #[test]
    fn test_try_measure_stops_on_error() {
        let mut calls = 0;
        let result = try_measure(WorkBudget::Iterations(10), || {
            calls += 1;
            if calls == 3 {
                Err(BenchError::Verification("boom".to_string()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(BenchError::Verification(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_try_measure_counts_iterations() {
        let mut calls = 0u64;
        let sample = try_measure(WorkBudget::Iterations(12), || {
            calls += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(calls, 12);
        assert_eq!(sample.completed_ops, 12);
        assert!(sample.avg_time() >= 0.0);
    }
}
