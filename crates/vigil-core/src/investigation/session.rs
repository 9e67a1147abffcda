//! Investigation session domain model and state machine.
//!
//! A session owns the life cycle of exactly one dispatched investigation:
//! the ordered step log and the liveness state. All message classification
//! goes through [`InvestigationSession::apply_message`], which is a pure,
//! synchronous transition — ordering and idempotence are decided here, not
//! in transport callbacks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{AgentMessage, StepRecord};

/// Terminal/non-terminal status of an investigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// Stream open, steps still arriving
    Active,
    /// Terminated by the sentinel or by the conclusion stage
    Completed,
    /// Terminated by a transport fault; partial steps retained
    Failed,
    /// Logically cancelled because a newer investigation was started
    Superseded,
}

impl Liveness {
    /// True for every state except `Active`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Outcome of applying one message to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A step was appended; the session remains active
    Appended(StepRecord),
    /// The sentinel arrived; nothing appended, session completed
    CompletedBySentinel,
    /// The conclusion stage arrived; it was appended and the session completed
    CompletedByConclusion(StepRecord),
    /// The session was already terminal; the message was dropped
    Ignored,
}

/// The lifecycle of one dispatched investigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// The event description that triggered it, fixed at creation
    pub subject_description: String,
    /// Timestamp when the investigation was dispatched (ISO 8601 format)
    pub started_at: String,
    /// Append-only step log; insertion order = arrival order
    pub steps: Vec<StepRecord>,
    /// Current liveness state
    pub liveness: Liveness,
}

impl InvestigationSession {
    /// Creates a fresh active session for the given subject.
    pub fn new(subject_description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject_description: subject_description.into(),
            started_at: chrono::Utc::now().to_rfc3339(),
            steps: Vec::new(),
            liveness: Liveness::Active,
        }
    }

    /// Classifies one arriving message and transitions the session.
    ///
    /// Two independent completion signals exist in the protocol: the explicit
    /// sentinel, and arrival of the conclusion stage. Whichever comes first
    /// wins; once the session is terminal every later message is dropped, so
    /// the other signal arriving afterwards is a no-op.
    pub fn apply_message(&mut self, message: AgentMessage) -> Applied {
        if self.liveness.is_terminal() {
            return Applied::Ignored;
        }
        match message {
            AgentMessage::Sentinel => {
                self.liveness = Liveness::Completed;
                Applied::CompletedBySentinel
            }
            AgentMessage::Step(record) => {
                self.steps.push(record.clone());
                if record.is_conclusion() {
                    self.liveness = Liveness::Completed;
                    Applied::CompletedByConclusion(record)
                } else {
                    Applied::Appended(record)
                }
            }
        }
    }

    /// Marks the session failed after a transport fault.
    ///
    /// The step log is frozen as-is; partial results remain visible and no
    /// steps are rolled back. A no-op on an already-terminal session.
    pub fn fail(&mut self) {
        if !self.liveness.is_terminal() {
            self.liveness = Liveness::Failed;
        }
    }

    /// Marks the session logically cancelled by a newer investigation.
    ///
    /// A no-op on an already-terminal session.
    pub fn supersede(&mut self) {
        if !self.liveness.is_terminal() {
            self.liveness = Liveness::Superseded;
        }
    }
}
