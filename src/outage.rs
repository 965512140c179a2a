use time::OffsetDateTime;

use crate::types::Outage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Normal,
    InOutage { since: OffsetDateTime },
}

/// Transition emitted by [`OutageTracker::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutageEvent {
    Started(OffsetDateTime),
    Ended(Outage),
}

/// Two-state machine fed once per cycle with "did every host fail?".
///
/// Closed outages are appended in start order and never touched again.
#[derive(Debug, Clone)]
pub struct OutageTracker {
    state: TrackerState,
    history: Vec<Outage>,
}

impl Default for OutageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OutageTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Normal,
            history: Vec::new(),
        }
    }

    pub fn observe(&mut self, all_failed: bool, at: OffsetDateTime) -> Option<OutageEvent> {
        match (self.state, all_failed) {
            (TrackerState::Normal, true) => {
                self.state = TrackerState::InOutage { since: at };
                Some(OutageEvent::Started(at))
            }
            (TrackerState::InOutage { since }, false) => {
                let outage = Outage {
                    start: since,
                    end: Some(at.max(since)),
                };
                self.history.push(outage);
                self.state = TrackerState::Normal;
                Some(OutageEvent::Ended(outage))
            }
            _ => None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Closed outages, oldest first.
    pub fn history(&self) -> &[Outage] {
        &self.history
    }

    /// The open outage, if any. It has no end and is never force-closed.
    pub fn ongoing(&self) -> Option<Outage> {
        match self.state {
            TrackerState::InOutage { since } => Some(Outage {
                start: since,
                end: None,
            }),
            TrackerState::Normal => None,
        }
    }
}
