use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::warn;

use crate::hosts::Target;
use crate::types::{ProbeOutcome, ProbeResult};

/// A single reachability check.
///
/// Implementations only decide success or failure; the deadline is imposed
/// by [`probe_with_deadline`], which drops the check future when it fires.
/// Anything holding an external resource (a child process, a socket) must
/// release it on drop.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, target: &Target) -> ProbeOutcome;
}

/// Runs the system `ping` utility once per check. Latency is the wall time of
/// the whole invocation.
#[derive(Debug, Clone, Default)]
pub struct PingProbe;

impl PingProbe {
    fn count_flag() -> &'static str {
        if cfg!(windows) {
            "-n"
        } else {
            "-c"
        }
    }
}

#[async_trait]
impl Probe for PingProbe {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();
        let status = Command::new("ping")
            .arg(Self::count_flag())
            .arg("1")
            .arg(&target.address)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;
        match status {
            Ok(s) if s.success() => ProbeOutcome::Success {
                latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
            Ok(_) => ProbeOutcome::Failure,
            Err(e) => {
                warn!(address = %target.address, error = %e, "failed to run ping");
                ProbeOutcome::Failure
            }
        }
    }
}

/// TCP connect check against `address:port`. Useful where ICMP is filtered.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    pub port: u16,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();
        match TcpStream::connect((target.address.as_str(), self.port)).await {
            Ok(_stream) => ProbeOutcome::Success {
                latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
            Err(_) => ProbeOutcome::Failure,
        }
    }
}

/// Probe one target, classifying anything slower than `timeout` as
/// [`ProbeOutcome::Timeout`].
pub async fn probe_with_deadline(probe: &dyn Probe, target: &Target, timeout: Duration) -> ProbeResult {
    let outcome = match time::timeout(timeout, probe.check(target)).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::Timeout,
    };
    ProbeResult::new(target.address.clone(), outcome)
}

/// Probe every target one after another, in registry order.
pub async fn probe_sequential(
    probe: &dyn Probe,
    targets: &[Target],
    timeout: Duration,
) -> Vec<ProbeResult> {
    let mut out = Vec::with_capacity(targets.len());
    for target in targets {
        out.push(probe_with_deadline(probe, target, timeout).await);
    }
    out
}

/// Probe every target concurrently and wait for all of them. Results come
/// back in registry order regardless of completion order.
pub async fn probe_fan_out(
    probe: Arc<dyn Probe>,
    targets: &[Target],
    timeout: Duration,
) -> Vec<ProbeResult> {
    let mut set = JoinSet::new();
    for (idx, target) in targets.iter().enumerate() {
        let probe = Arc::clone(&probe);
        let target = target.clone();
        set.spawn(async move { (idx, probe_with_deadline(probe.as_ref(), &target, timeout).await) });
    }

    let mut slots: Vec<Option<ProbeResult>> = vec![None; targets.len()];
    while let Some(res) = set.join_next().await {
        match res {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(e) => warn!(error = %e, "probe task failed"),
        }
    }

    slots
        .into_iter()
        .zip(targets)
        .map(|(slot, target)| {
            slot.unwrap_or_else(|| ProbeResult::new(target.address.clone(), ProbeOutcome::Failure))
        })
        .collect()
}
