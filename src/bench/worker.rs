//! Multi-threaded benchmark driver
//!
//! Every worker builds its own workload state, runs its own copy of the
//! budget and hands its [`Sample`] back through its join handle. Nothing
//! is shared between workers while they are timed, and results are only
//! combined after all of them have joined.

use std::io;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bench::timing::{try_measure, Sample};
use crate::bench::WorkBudget;
use crate::util::units::{average_latency, throughput};
use crate::{BenchError, Result};

/// Combined outcome of a multi-threaded run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Per-worker samples, worker 0 first
    pub samples: Vec<Sample>,
    /// Sum of completed operations across workers
    pub total_ops: u64,
    /// Wall time of the slowest worker
    pub max_elapsed: Duration,
}

impl Aggregate {
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let total_ops = samples.iter().map(|s| s.completed_ops).sum();
        let max_elapsed = samples
            .iter()
            .map(|s| s.elapsed)
            .max()
            .unwrap_or(Duration::ZERO);

        Self {
            samples,
            total_ops,
            max_elapsed,
        }
    }

    /// Number of workers that actually ran
    pub fn workers(&self) -> usize {
        self.samples.len()
    }

    /// Parallel throughput: total operations over the slowest worker's time
    pub fn throughput(&self) -> f64 {
        throughput(self.total_ops, self.max_elapsed)
    }

    /// Inverse of [`Aggregate::throughput`], in seconds per operation
    pub fn avg_time(&self) -> f64 {
        average_latency(self.max_elapsed, self.total_ops)
    }

    /// Seconds per parallel pass, where one pass is one operation by every worker.
    ///
    /// Used when the workers split one piece of work between them, so the
    /// number of passes is the fewest operations any worker completed.
    pub fn pass_time(&self) -> f64 {
        let passes = self
            .samples
            .iter()
            .map(|s| s.completed_ops)
            .min()
            .unwrap_or(0);
        average_latency(self.max_elapsed, passes)
    }
}

/// Bounded pool of benchmark workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    threads: usize,
    #[cfg(test)]
    refuse_spawn_at: Option<usize>,
}

impl WorkerPool {
    /// Create a pool of `threads` workers (at least one)
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            #[cfg(test)]
            refuse_spawn_at: None,
        }
    }

    /// Make the spawn of worker `index` fail as if the OS refused a thread
    #[cfg(test)]
    pub(crate) fn refuse_spawn_at(mut self, index: usize) -> Self {
        self.refuse_spawn_at = Some(index);
        self
    }

    /// Create a pool with one worker per logical core
    pub fn available() -> Self {
        Self::new(available_cores())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run the same workload on every worker.
    ///
    /// `setup` runs on the worker thread before its timer starts, so any
    /// buffers it allocates are excluded from the measurement.
    pub fn run<S, F>(&self, budget: WorkBudget, setup: S) -> Result<Aggregate>
    where
        S: Fn(usize) -> Result<F> + Sync,
        F: FnMut() -> Result<()>,
    {
        let inputs = (0..self.threads).collect::<Vec<_>>();
        self.run_each(budget, inputs, |_, index| setup(index))
    }

    /// Run one worker per input, handing each worker ownership of its input.
    ///
    /// Used for partitioned data: every worker receives its own disjoint
    /// `&mut` region, so no two workers can touch the same byte. Worker 0
    /// runs on the calling thread. If a thread cannot be spawned the run
    /// continues with the workers that did start; the inputs of workers
    /// that never started are left untouched.
    pub fn run_each<T, S, F>(
        &self,
        budget: WorkBudget,
        inputs: Vec<T>,
        setup: S,
    ) -> Result<Aggregate>
    where
        T: Send,
        S: Fn(T, usize) -> Result<F> + Sync,
        F: FnMut() -> Result<()>,
    {
        let mut inputs = inputs.into_iter();
        let first = inputs.next().ok_or_else(|| {
            BenchError::InvalidConfig("worker pool needs at least one input".to_string())
        })?;

        let results = thread::scope(|scope| {
            let setup = &setup;
            let mut handles = Vec::with_capacity(inputs.len());

            for (offset, input) in inputs.enumerate() {
                let index = offset + 1;
                let spawned = self.spawn(scope, index, move || {
                    run_worker(setup, input, index, budget)
                });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        let err = BenchError::ThreadSpawnFailure(err.to_string());
                        warn!(error = %err, workers = index, "continuing with fewer workers");
                        break;
                    }
                }
            }

            let mut results = Vec::with_capacity(handles.len() + 1);
            results.push(run_worker(setup, first, 0, budget));
            for handle in handles {
                results.push(handle.join().unwrap_or(Err(BenchError::WorkerPanicked)));
            }

            results
        });

        let samples = results.into_iter().collect::<Result<Vec<_>>>()?;
        let aggregate = Aggregate::from_samples(samples);
        debug!(
            workers = aggregate.workers(),
            ops = aggregate.total_ops,
            elapsed_ms = aggregate.max_elapsed.as_millis() as u64,
            "workers joined"
        );

        Ok(aggregate)
    }
}

impl WorkerPool {
    fn spawn<'scope, 'env, R, W>(
        &self,
        scope: &'scope thread::Scope<'scope, 'env>,
        index: usize,
        work: W,
    ) -> io::Result<thread::ScopedJoinHandle<'scope, R>>
    where
        R: Send + 'scope,
        W: FnOnce() -> R + Send + 'scope,
    {
        if self.spawn_refused(index) {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "thread limit reached",
            ));
        }

        thread::Builder::new()
            .name(format!("acubench-worker-{index}"))
            .spawn_scoped(scope, work)
    }

    #[cfg(test)]
    fn spawn_refused(&self, index: usize) -> bool {
        self.refuse_spawn_at == Some(index)
    }

    #[cfg(not(test))]
    fn spawn_refused(&self, _index: usize) -> bool {
        false
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::available()
    }
}

fn run_worker<T, S, F>(setup: &S, input: T, index: usize, budget: WorkBudget) -> Result<Sample>
where
    S: Fn(T, usize) -> Result<F>,
    F: FnMut() -> Result<()>,
{
    let workload = setup(input, index)?;
    try_measure(budget, workload)
}

/// Number of logical cores, `1` when the platform cannot tell
pub fn available_cores() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
