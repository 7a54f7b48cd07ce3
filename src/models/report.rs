//! Benchmark report data models
//!
//! Every figure a suite produces is a [`Metric`]: either a measured value or
//! an explicit marker that the sub-workload could not be measured. Reports
//! serialize to JSON and render as plain text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::units::{format_bytes, format_latency, format_rate};

/// One reported figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Value produced by a completed sub-workload, `0.0` included
    Measured(f64),
    /// Sub-workload aborted before it could be measured
    Unavailable { reason: String },
}

impl Metric {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Metric::Unavailable {
            reason: reason.into(),
        }
    }

    /// Measured value, `None` when unavailable
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Measured(value) => Some(*value),
            Metric::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Measured(_))
    }

    /// Boundary form: `(value, available)`, value is `0.0` when unavailable
    pub fn to_pair(&self) -> (f64, bool) {
        match self {
            Metric::Measured(value) => (*value, true),
            Metric::Unavailable { .. } => (0.0, false),
        }
    }

    fn render(&self, format: fn(f64) -> String) -> String {
        match self {
            Metric::Measured(value) => format(*value),
            Metric::Unavailable { reason } => format!("unavailable ({})", reason),
        }
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::Measured(value)
    }
}

fn ops_per_sec(rate: f64) -> String {
    format_rate(rate, "ops/s")
}

/// CPU suite result, throughput in operations per second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReport {
    pub crypto_tps: Metric,
    pub math_tps: Metric,
    pub sort_tps: Metric,
}

impl fmt::Display for CpuReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU")?;
        writeln!(f, "  Crypto: {}", self.crypto_tps.render(ops_per_sec))?;
        writeln!(f, "  Math:   {}", self.math_tps.render(ops_per_sec))?;
        write!(f, "  Sort:   {}", self.sort_tps.render(ops_per_sec))
    }
}

/// RAM suite result, latencies in seconds per operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamReport {
    /// Total system RAM from the handle's environment snapshot
    pub total_memory_bytes: Option<u64>,
    pub alloc_avg_time: Metric,
    pub access_sequential_avg_time: Metric,
    pub access_random_avg_time: Metric,
    pub access_concurrent_avg_time: Metric,
}

impl fmt::Display for RamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self
            .total_memory_bytes
            .map(format_bytes)
            .unwrap_or_else(|| "unknown".to_string());

        writeln!(f, "RAM ({})", total)?;
        writeln!(f, "  Allocation:        {}", self.alloc_avg_time.render(format_latency))?;
        writeln!(
            f,
            "  Sequential access: {}",
            self.access_sequential_avg_time.render(format_latency)
        )?;
        writeln!(
            f,
            "  Random access:     {}",
            self.access_random_avg_time.render(format_latency)
        )?;
        write!(
            f,
            "  Concurrent access: {}",
            self.access_concurrent_avg_time.render(format_latency)
        )
    }
}

/// Storage suite result, latencies in seconds per operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageReport {
    /// Free space from the handle's environment snapshot
    pub available_storage_bytes: u64,
    pub access_sequential_avg_time: Metric,
    pub access_random_avg_time: Metric,
}

impl fmt::Display for StorageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Storage ({} free)", format_bytes(self.available_storage_bytes))?;
        writeln!(
            f,
            "  Sequential access: {}",
            self.access_sequential_avg_time.render(format_latency)
        )?;
        write!(
            f,
            "  Random access:     {}",
            self.access_random_avg_time.render(format_latency)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_zero_is_not_unavailable() {
        let zero = Metric::Measured(0.0);
        let missing = Metric::unavailable("allocation failed");

        assert_ne!(zero, missing);
        assert_eq!(zero.value(), Some(0.0));
        assert_eq!(missing.value(), None);
        assert_eq!(zero.to_pair(), (0.0, true));
        assert_eq!(missing.to_pair(), (0.0, false));
    }

    #[test]
    fn test_metric_json_shape() {
        let json = serde_json::to_string(&Metric::Measured(2.5)).unwrap();
        assert_eq!(json, r#"{"measured":2.5}"#);

        let json = serde_json::to_string(&Metric::unavailable("oom")).unwrap();
        assert_eq!(json, r#"{"unavailable":{"reason":"oom"}}"#);
    }

    #[test]
    fn test_ram_report_round_trips_through_json() {
        let report = RamReport {
            total_memory_bytes: None,
            alloc_avg_time: Metric::unavailable("failed to allocate 64 bytes"),
            access_sequential_avg_time: 0.001.into(),
            access_random_avg_time: 0.002.into(),
            access_concurrent_avg_time: 0.0005.into(),
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: RamReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_cpu_report_display() {
        let report = CpuReport {
            crypto_tps: 1500.0.into(),
            math_tps: 12.0.into(),
            sort_tps: Metric::unavailable("verification failed"),
        };

        let text = report.to_string();
        assert!(text.contains("Crypto: 1.50K ops/s"));
        assert!(text.contains("Math:   12.00 ops/s"));
        assert!(text.contains("unavailable (verification failed)"));
    }

    #[test]
    fn test_storage_report_display() {
        let report = StorageReport {
            available_storage_bytes: 1024,
            access_sequential_avg_time: 0.5.into(),
            access_random_avg_time: 0.005.into(),
        };

        let text = report.to_string();
        assert!(text.contains("1.00 KiB free"));
        assert!(text.contains("500.000ms"));
        assert!(text.contains("5.000ms"));
    }
}
