use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How a single probe ended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { latency_ms: f64 },
    Failure,
    Timeout,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Success { latency_ms } => Some(*latency_ms),
            _ => None,
        }
    }
}

/// One host's result for one cycle. Lives only until the cycle is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub address: String,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn new(address: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            address: address.into(),
            outcome,
        }
    }

    pub fn failed(&self) -> bool {
        !self.outcome.is_success()
    }
}

/// A contiguous interval in which every monitored host failed.
/// `end == None` means the outage is still ongoing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outage {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl Outage {
    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    /// Length of a closed outage. Never negative, even if the wall clock
    /// stepped backwards between open and close.
    pub fn duration(&self) -> Option<time::Duration> {
        self.end
            .map(|end| (end - self.start).max(time::Duration::ZERO))
    }
}

/// Glyphs used in log lines. The emoji set is the default; the ASCII set is
/// for consoles that cannot render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub ok: &'static str,
    pub fail: &'static str,
    pub timeout: &'static str,
}

impl Markers {
    pub const EMOJI: Markers = Markers {
        ok: "✅",
        fail: "❌",
        timeout: "⏱️",
    };

    pub const PLAIN: Markers = Markers {
        ok: "[√]",
        fail: "[X]",
        timeout: "[T]",
    };
}

impl Default for Markers {
    fn default() -> Self {
        Markers::EMOJI
    }
}
