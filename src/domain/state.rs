use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-session admission queue states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueState {
    /// Session has not attempted queue entry
    NotQueued,
    /// Queue entry confirmed, not yet polling
    Queued,
    /// Polling for admission
    Waiting,
    /// Admitted to the acquisition surface
    Granted,
    /// Position lost or session expired
    Lost,
    /// Poll budget exhausted without resolution
    TimedOut,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::NotQueued => "NOT_QUEUED",
            QueueState::Queued => "QUEUED",
            QueueState::Waiting => "WAITING",
            QueueState::Granted => "GRANTED",
            QueueState::Lost => "LOST",
            QueueState::TimedOut => "TIMED_OUT",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: QueueState) -> bool {
        use QueueState::*;

        match (self, target) {
            // From NotQueued
            (NotQueued, Queued) => true,  // Entry confirmed
            (NotQueued, Granted) => true, // No queue affordance, direct access

            // From Queued
            (Queued, Waiting) => true,

            // From Waiting
            (Waiting, Granted) => true,
            (Waiting, Lost) => true,
            (Waiting, TimedOut) => true,

            // Terminal states
            _ => false,
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueState::Granted | QueueState::Lost | QueueState::TimedOut
        )
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
