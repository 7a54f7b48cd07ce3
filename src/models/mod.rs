//! Data models module
//!
//! Report types returned by the suites and the metric representation that
//! keeps a measured zero apart from a measurement that never happened.

pub mod report;

pub use report::{CpuReport, Metric, RamReport, StorageReport};
