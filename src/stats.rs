use serde::{Deserialize, Serialize};

use crate::types::ProbeOutcome;

/// Running per-host counters. Only aggregates are kept; individual latency
/// samples are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStats {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub latency_sum_ms: f64,
    pub latency_min_ms: f64,
    pub latency_max_ms: f64,
}

impl Default for HostStats {
    fn default() -> Self {
        Self {
            total: 0,
            success: 0,
            failure: 0,
            latency_sum_ms: 0.0,
            latency_min_ms: f64::INFINITY,
            latency_max_ms: 0.0,
        }
    }
}

/// Derived view of a [`HostStats`]. Latency fields are `None` until the
/// host has answered at least once.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub uptime_pct: f64,
    pub avg_latency_ms: Option<f64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
}

impl HostStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one probe. Timeouts count as failures.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.total += 1;
        match outcome {
            ProbeOutcome::Success { latency_ms } => {
                self.success += 1;
                self.latency_sum_ms += latency_ms;
                self.latency_min_ms = self.latency_min_ms.min(*latency_ms);
                self.latency_max_ms = self.latency_max_ms.max(*latency_ms);
            }
            ProbeOutcome::Failure | ProbeOutcome::Timeout => {
                self.failure += 1;
            }
        }
    }

    /// Percentage of successful probes; 0 before the first probe.
    pub fn uptime_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 / self.total as f64 * 100.0
    }

    pub fn avg_latency_ms(&self) -> Option<f64> {
        if self.success == 0 {
            return None;
        }
        Some(self.latency_sum_ms / self.success as f64)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let answered = self.success > 0;
        StatsSnapshot {
            total: self.total,
            success: self.success,
            failure: self.failure,
            uptime_pct: self.uptime_pct(),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: answered.then_some(self.latency_min_ms),
            max_latency_ms: answered.then_some(self.latency_max_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ms: f64) -> ProbeOutcome {
        ProbeOutcome::Success { latency_ms: ms }
    }

    #[test]
    fn empty_stats_do_not_divide_by_zero() {
        let s = HostStats::new().snapshot();
        assert_eq!(s.uptime_pct, 0.0);
        assert_eq!(s.avg_latency_ms, None);
        assert_eq!(s.min_latency_ms, None);
        assert_eq!(s.max_latency_ms, None);
    }

    #[test]
    fn only_failures_reports_zero_uptime_and_no_latency() {
        let mut s = HostStats::new();
        s.record(&ProbeOutcome::Failure);
        s.record(&ProbeOutcome::Timeout);
        let snap = s.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.failure, 2);
        assert_eq!(snap.uptime_pct, 0.0);
        assert_eq!(snap.avg_latency_ms, None);
    }

    #[test]
    fn latency_aggregates_track_min_avg_max() {
        let mut s = HostStats::new();
        for o in [ok(10.0), ProbeOutcome::Failure, ok(30.0), ok(20.0)] {
            s.record(&o);
        }
        let snap = s.snapshot();
        assert_eq!(snap.total, 4);
        assert_eq!(snap.success, 3);
        assert_eq!(snap.failure, 1);
        assert_eq!(snap.uptime_pct, 75.0);
        assert_eq!(snap.min_latency_ms, Some(10.0));
        assert_eq!(snap.max_latency_ms, Some(30.0));
        assert_eq!(snap.avg_latency_ms, Some(20.0));
    }

    #[test]
    fn counters_always_add_up() {
        let mut s = HostStats::new();
        let pattern = [ok(1.5), ProbeOutcome::Timeout, ProbeOutcome::Failure, ok(9.0)];
        for i in 0..40 {
            s.record(&pattern[i % pattern.len()]);
            assert_eq!(s.success + s.failure, s.total);
            let expected = 100.0 * s.success as f64 / s.total as f64;
            assert!((s.uptime_pct() - expected).abs() < 1e-9);
            let snap = s.snapshot();
            if let (Some(min), Some(avg), Some(max)) =
                (snap.min_latency_ms, snap.avg_latency_ms, snap.max_latency_ms)
            {
                assert!(min <= avg && avg <= max);
            }
        }
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut s = HostStats::new();
        s.record(&ok(12.0));
        s.record(&ProbeOutcome::Failure);
        assert_eq!(s.snapshot(), s.snapshot());
    }
}
