//! Units formatting and conversion utilities
//!
//! Provides the throughput/latency formulas used by every report and
//! functions for human-readable formatting of sizes, rates and latencies.

use std::time::Duration;

use byte_unit::{Byte, UnitType};

/// Operations per second; `0.0` instead of NaN/Inf when nothing elapsed
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use acubench::util::units::throughput;
///
/// assert_eq!(throughput(1000, Duration::from_secs(2)), 500.0);
/// assert_eq!(throughput(1000, Duration::ZERO), 0.0);
/// ```
pub fn throughput(operations: u64, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        return 0.0;
    }

    operations as f64 / elapsed.as_secs_f64()
}

/// Seconds per operation; `0.0` when no operation completed
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use acubench::util::units::average_latency;
///
/// assert_eq!(average_latency(Duration::from_secs(1), 4), 0.25);
/// assert_eq!(average_latency(Duration::from_secs(1), 0), 0.0);
/// ```
pub fn average_latency(elapsed: Duration, operations: u64) -> f64 {
    if operations == 0 {
        return 0.0;
    }

    elapsed.as_secs_f64() / operations as f64
}

/// Format bytes into human-readable size with binary units
///
/// # Examples
/// ```
/// use acubench::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.00 KiB");
/// assert_eq!(format_bytes(1073741824), "1.00 GiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.2}", adjusted)
}

/// Format a per-second rate with a metric suffix
///
/// # Examples
/// ```
/// use acubench::util::units::format_rate;
///
/// assert_eq!(format_rate(1500.0, "ops/s"), "1.50K ops/s");
/// assert_eq!(format_rate(12.0, "ops/s"), "12.00 ops/s");
/// ```
pub fn format_rate(rate: f64, unit: &str) -> String {
    if rate >= 1_000_000_000.0 {
        format!("{:.2}G {}", rate / 1_000_000_000.0, unit)
    } else if rate >= 1_000_000.0 {
        format!("{:.2}M {}", rate / 1_000_000.0, unit)
    } else if rate >= 1_000.0 {
        format!("{:.2}K {}", rate / 1_000.0, unit)
    } else {
        format!("{:.2} {}", rate, unit)
    }
}

/// Format a latency given in seconds with appropriate precision
pub fn format_latency(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{:.3}s", seconds)
    } else if seconds >= 1e-3 {
        format!("{:.3}ms", seconds * 1e3)
    } else if seconds >= 1e-6 {
        format!("{:.3}μs", seconds * 1e6)
    } else {
        format!("{:.0}ns", seconds * 1e9)
    }
}
