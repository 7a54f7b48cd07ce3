//! Utility functions module
//!
//! Contains the throughput/latency arithmetic shared by every suite and
//! human-readable formatting for reports.

pub mod units;

// Re-export commonly used functions
pub use units::{average_latency, format_bytes, format_latency, format_rate, throughput};
