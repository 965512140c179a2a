use serde::Serialize;
use time::OffsetDateTime;

use crate::hosts::{HostRegistry, Target};
use crate::outage::{OutageEvent, OutageTracker};
use crate::stats::{HostStats, StatsSnapshot};
use crate::types::{Outage, ProbeResult};

/// A monitored target together with its running counters.
#[derive(Debug, Clone)]
pub struct Host {
    pub target: Target,
    pub stats: HostStats,
}

/// What one cycle did to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub at: OffsetDateTime,
    pub all_failed: bool,
    pub event: Option<OutageEvent>,
}

/// Per-host row of a [`SummarySnapshot`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HostSummary {
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

/// Point-in-time view of the whole session, used to render the summary
/// files. Recomputable at any time; taking it never changes the session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub cycles: u64,
    pub hosts: Vec<HostSummary>,
    /// Closed outages, oldest first.
    pub outages: Vec<Outage>,
    pub ongoing: Option<Outage>,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl SummarySnapshot {
    pub fn elapsed(&self) -> time::Duration {
        (self.generated_at - self.started_at).max(time::Duration::ZERO)
    }

    /// Closed outages plus the open one, if any.
    pub fn total_outages(&self) -> usize {
        self.outages.len() + usize::from(self.ongoing.is_some())
    }
}

/// Process-wide monitoring state. Owns every host counter and the outage
/// history; nothing else keeps a copy.
#[derive(Debug, Clone)]
pub struct MonitorSession {
    hosts: Vec<Host>,
    tracker: OutageTracker,
    started_at: OffsetDateTime,
    cycles: u64,
}

impl MonitorSession {
    pub fn new(registry: &HostRegistry, started_at: OffsetDateTime) -> Self {
        Self {
            hosts: registry
                .targets()
                .iter()
                .cloned()
                .map(|target| Host {
                    target,
                    stats: HostStats::new(),
                })
                .collect(),
            tracker: OutageTracker::new(),
            started_at,
            cycles: 0,
        }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn targets(&self) -> Vec<Target> {
        self.hosts.iter().map(|h| h.target.clone()).collect()
    }

    pub fn tracker(&self) -> &OutageTracker {
        &self.tracker
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    /// Record one complete cycle.
    ///
    /// `results` must hold exactly one entry per host, in registry order. The
    /// all-failed decision is taken only after every result is recorded.
    pub fn apply_cycle(&mut self, at: OffsetDateTime, results: &[ProbeResult]) -> CycleReport {
        debug_assert_eq!(results.len(), self.hosts.len());
        for (host, result) in self.hosts.iter_mut().zip(results) {
            host.stats.record(&result.outcome);
        }
        let all_failed = !results.is_empty() && results.iter().all(ProbeResult::failed);
        let event = self.tracker.observe(all_failed, at);
        self.cycles += 1;
        CycleReport {
            cycle: self.cycles,
            at,
            all_failed,
            event,
        }
    }

    pub fn snapshot(&self, now: OffsetDateTime) -> SummarySnapshot {
        SummarySnapshot {
            cycles: self.cycles,
            hosts: self
                .hosts
                .iter()
                .map(|h| HostSummary {
                    target: h.target.clone(),
                    stats: h.stats.snapshot(),
                })
                .collect(),
            outages: self.tracker.history().to_vec(),
            ongoing: self.tracker.ongoing(),
            started_at: self.started_at,
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outage::TrackerState;
    use crate::types::ProbeOutcome;
    use time::macros::datetime;

    fn registry() -> HostRegistry {
        HostRegistry::from_targets(vec![Target::new("a", "A"), Target::new("b", "B")])
    }

    #[test]
    fn partial_failure_never_opens_an_outage() {
        let mut s = MonitorSession::new(&registry(), datetime!(2024-05-01 00:00:00 UTC));
        let report = s.apply_cycle(
            datetime!(2024-05-01 00:00:03 UTC),
            &[
                ProbeResult::new("a", ProbeOutcome::Failure),
                ProbeResult::new("b", ProbeOutcome::Success { latency_ms: 4.0 }),
            ],
        );
        assert!(!report.all_failed);
        assert_eq!(report.event, None);
        assert_eq!(s.tracker().state(), TrackerState::Normal);
        assert!(s.tracker().history().is_empty());
    }

    #[test]
    fn timeouts_count_towards_all_failed() {
        let mut s = MonitorSession::new(&registry(), datetime!(2024-05-01 00:00:00 UTC));
        let at = datetime!(2024-05-01 00:00:03 UTC);
        let report = s.apply_cycle(
            at,
            &[
                ProbeResult::new("a", ProbeOutcome::Timeout),
                ProbeResult::new("b", ProbeOutcome::Failure),
            ],
        );
        assert!(report.all_failed);
        assert_eq!(report.event, Some(OutageEvent::Started(at)));
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut s = MonitorSession::new(&registry(), datetime!(2024-05-01 00:00:00 UTC));
        s.apply_cycle(
            datetime!(2024-05-01 00:00:03 UTC),
            &[
                ProbeResult::new("a", ProbeOutcome::Success { latency_ms: 1.0 }),
                ProbeResult::new("b", ProbeOutcome::Timeout),
            ],
        );
        let now = datetime!(2024-05-01 00:01:00 UTC);
        let first = s.snapshot(now);
        let second = s.snapshot(now);
        assert_eq!(first, second);
        assert_eq!(first.elapsed(), time::Duration::minutes(1));
    }
}
