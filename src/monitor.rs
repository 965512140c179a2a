use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::{format_elapsed, format_timestamp, LocalClock};
use crate::hosts::HostRegistry;
use crate::outage::OutageEvent;
use crate::persistence::LogStore;
use crate::prober::{probe_fan_out, probe_sequential, Probe};
use crate::report;
use crate::session::{CycleReport, MonitorSession, SummarySnapshot};
use crate::types::{Markers, ProbeResult};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(7);
pub const DEFAULT_SUMMARY_EVERY: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// One host at a time, in registry order.
    Sequential,
    /// All hosts at once, joined before the cycle is recorded.
    Parallel,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
    /// Rewrite the summary every this many cycles. Must be at least 1.
    pub summary_every: u64,
    pub mode: ProbeMode,
    pub markers: Markers,
    pub json_summary: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            summary_every: DEFAULT_SUMMARY_EVERY,
            mode: ProbeMode::Sequential,
            markers: Markers::default(),
            json_summary: false,
        }
    }
}

/// The monitoring loop: probe, record, log, and periodically summarize until
/// cancelled, then write the final summary once.
pub struct Monitor {
    config: MonitorConfig,
    session: MonitorSession,
    store: LogStore,
    probe: Arc<dyn Probe>,
    clock: LocalClock,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        registry: &HostRegistry,
        store: LogStore,
        probe: Arc<dyn Probe>,
        clock: LocalClock,
    ) -> Self {
        let session = MonitorSession::new(registry, clock.now());
        Self {
            config,
            session,
            store,
            probe,
            clock,
        }
    }

    /// Run until `cancel` fires. Cancellation is observed while probing and
    /// while sleeping; a cycle interrupted mid-probe is discarded. Consumes
    /// the monitor, so the final summary is written exactly once.
    pub async fn run(mut self, cancel: CancellationToken) -> SummarySnapshot {
        info!(
            hosts = self.session.hosts().len(),
            interval_secs = self.config.interval.as_secs_f64(),
            timeout_secs = self.config.probe_timeout.as_secs_f64(),
            log_dir = %self.store.dir().display(),
            "monitoring started"
        );
        let header = report::session_header(&self.session.targets());
        let started = self.session.started_at();
        self.emit(started, &header);

        loop {
            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                results = self.probe_cycle() => results,
            };
            self.complete_cycle(&results);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        self.finish()
    }

    async fn probe_cycle(&self) -> Vec<ProbeResult> {
        let targets = self.session.targets();
        match self.config.mode {
            ProbeMode::Sequential => {
                probe_sequential(self.probe.as_ref(), &targets, self.config.probe_timeout).await
            }
            ProbeMode::Parallel => {
                probe_fan_out(Arc::clone(&self.probe), &targets, self.config.probe_timeout).await
            }
        }
    }

    fn complete_cycle(&mut self, results: &[ProbeResult]) -> CycleReport {
        let at = self.clock.now();
        let outcome = self.session.apply_cycle(at, results);

        let line = if outcome.all_failed {
            report::outage_line(at)
        } else {
            report::results_line(at, results, &self.config.markers)
        };
        self.emit(at, &line);

        match outcome.event {
            Some(OutageEvent::Started(since)) => {
                warn!(since = %format_timestamp(since), "all hosts unreachable, outage started");
            }
            Some(OutageEvent::Ended(outage)) => {
                let lasted = outage.duration().map(format_elapsed).unwrap_or_default();
                warn!(lasted = %lasted, "connectivity restored, outage ended");
            }
            None => {}
        }

        if outcome.cycle % self.config.summary_every.max(1) == 0 {
            self.write_periodic_summary();
        }
        outcome
    }

    /// Print to the console and append to today's log. A failed append is
    /// reported and otherwise ignored.
    fn emit(&mut self, at: time::OffsetDateTime, line: &str) {
        println!("{line}");
        if let Err(e) = self.store.append(at, line) {
            warn!(
                path = %self.store.current_log_path().display(),
                error = %e,
                "failed to append to daily log"
            );
        }
    }

    fn write_periodic_summary(&self) {
        let snapshot = self.session.snapshot(self.clock.now());
        let text = report::render_periodic(&snapshot);
        self.persist_summary(&text, &snapshot);
        info!(
            cycles = snapshot.cycles,
            outages = snapshot.outages.len(),
            "summary updated"
        );

        println!("\n{text}");
        println!("{}", report::host_names_line(&self.session.targets()));
    }

    fn persist_summary(&self, text: &str, snapshot: &SummarySnapshot) {
        if let Err(e) = self.store.write_summary(text) {
            warn!(path = %self.store.summary_path().display(), error = %e, "failed to write summary");
        }
        if self.config.json_summary {
            if let Err(e) = self.store.write_summary_json(snapshot) {
                warn!(
                    path = %self.store.summary_json_path().display(),
                    error = %e,
                    "failed to write JSON summary"
                );
            }
        }
    }

    fn finish(self) -> SummarySnapshot {
        let snapshot = self.session.snapshot(self.clock.now());
        let text = report::render_final(&snapshot);
        self.persist_summary(&text, &snapshot);
        println!("\n{text}");
        info!(
            cycles = snapshot.cycles,
            outages = snapshot.total_outages(),
            ran_for = %format_elapsed(snapshot.elapsed()),
            "monitoring stopped, final summary written"
        );
        snapshot
    }
}
