//! Host CPU and memory sampling.
//!
//! A fresh sample is taken on every reporting cycle; nothing is cached
//! between cycles.

use std::sync::{Mutex, PoisonError};

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::error::MetricsError;

/// Raw host readings the resource percentages are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostUsage {
    /// 1-minute load average.
    pub load_average: f64,
    pub logical_cores: usize,
    pub total_memory: u64,
    pub free_memory: u64,
}

/// Source of host readings. Implemented by [`SysinfoHost`] in production and by
/// fixed fakes in tests.
pub trait HostSampler: Send + Sync {
    fn sample(&self) -> Result<HostUsage, MetricsError>;
}

/// Reads the host through `sysinfo`.
pub struct SysinfoHost {
    system: Mutex<System>,
}

impl SysinfoHost {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSampler for SysinfoHost {
    fn sample(&self) -> Result<HostUsage, MetricsError> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        Ok(HostUsage {
            load_average: System::load_average().one,
            logical_cores: system.cpus().len(),
            total_memory: system.total_memory(),
            free_memory: system.available_memory(),
        })
    }
}

/// Rounds to two decimals, breaking exact ties away from zero.
fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Load average per logical core as a percentage.
///
/// The ratio is rounded to two decimals and then multiplied by 100, so a 0.45
/// ratio is reported as `45` rather than `45.00`. Values above 100 are kept.
pub fn cpu_usage_percentage(usage: &HostUsage) -> Result<f64, MetricsError> {
    if usage.logical_cores == 0 {
        return Err(MetricsError::Host("no logical cores reported".to_string()));
    }
    let ratio = usage.load_average / usage.logical_cores as f64;
    if !ratio.is_finite() {
        return Err(MetricsError::Format {
            metric: "cpu",
            reason: format!("load ratio is {}", ratio),
        });
    }
    Ok(round_to_hundredths(ratio) * 100.0)
}

/// Used memory as a percentage of total, already formatted with two decimals.
pub fn memory_usage_percentage(usage: &HostUsage) -> Result<String, MetricsError> {
    if usage.total_memory == 0 {
        return Err(MetricsError::Host("total memory reported as zero".to_string()));
    }
    let total = usage.total_memory as f64;
    let used = total - usage.free_memory as f64;
    Ok(format!("{:.2}", round_to_hundredths((used / total) * 100.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(load_average: f64, logical_cores: usize) -> HostUsage {
        HostUsage {
            load_average,
            logical_cores,
            total_memory: 1000,
            free_memory: 250,
        }
    }

    #[test]
    fn cpu_percentage_rounds_then_rescales() {
        assert_eq!(cpu_usage_percentage(&usage(2.0, 4)).unwrap(), 50.0);
        assert_eq!(cpu_usage_percentage(&usage(1.8, 4)).unwrap().to_string(), "45");
        assert_eq!(cpu_usage_percentage(&usage(0.0, 8)).unwrap(), 0.0);
    }

    #[test]
    fn cpu_percentage_rounds_ties_up() {
        assert_eq!(cpu_usage_percentage(&usage(0.5, 4)).unwrap().to_string(), "13");
        assert_eq!(cpu_usage_percentage(&usage(2.5, 4)).unwrap().to_string(), "63");
    }

    #[test]
    fn cpu_percentage_rejects_non_finite_load() {
        assert!(matches!(
            cpu_usage_percentage(&usage(f64::NAN, 4)),
            Err(MetricsError::Format { metric: "cpu", .. })
        ));
    }

    #[test]
    fn cpu_percentage_is_not_clamped() {
        assert_eq!(cpu_usage_percentage(&usage(6.0, 4)).unwrap(), 150.0);
    }

    #[test]
    fn cpu_percentage_without_cores_is_an_error() {
        assert!(matches!(
            cpu_usage_percentage(&usage(1.0, 0)),
            Err(MetricsError::Host(_))
        ));
    }

    #[test]
    fn memory_percentage_is_two_decimal_text() {
        assert_eq!(memory_usage_percentage(&usage(0.0, 1)).unwrap(), "75.00");

        let idle = HostUsage {
            free_memory: 1000,
            ..usage(0.0, 1)
        };
        assert_eq!(memory_usage_percentage(&idle).unwrap(), "0.00");

        let thirds = HostUsage {
            total_memory: 3,
            free_memory: 2,
            ..usage(0.0, 1)
        };
        assert_eq!(memory_usage_percentage(&thirds).unwrap(), "33.33");

        // 1/16 used is exactly 6.25%, 1/32 exactly 3.125%.
        let sixteenth = HostUsage {
            total_memory: 16,
            free_memory: 15,
            ..usage(0.0, 1)
        };
        assert_eq!(memory_usage_percentage(&sixteenth).unwrap(), "6.25");
        let tie = HostUsage {
            total_memory: 32,
            free_memory: 31,
            ..usage(0.0, 1)
        };
        assert_eq!(memory_usage_percentage(&tie).unwrap(), "3.13");
    }

    #[test]
    fn sysinfo_host_reports_sane_values() {
        let host = SysinfoHost::new();
        let usage = host.sample().expect("host sampling should succeed");
        assert!(usage.logical_cores > 0);
        assert!(usage.total_memory >= usage.free_memory);

        let memory: f64 = memory_usage_percentage(&usage)
            .unwrap()
            .parse()
            .unwrap();
        assert!((0.0..=100.0).contains(&memory));
        assert!(cpu_usage_percentage(&usage).unwrap() >= 0.0);
    }
}
