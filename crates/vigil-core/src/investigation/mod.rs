//! Investigation domain module.
//!
//! Everything that makes up the investigation stream controller:
//!
//! - `message`: wire frames decoded into tagged variants (`AgentMessage`)
//! - `session`: the session state machine (`InvestigationSession`)
//! - `stream`: the stream transport port (`InvestigationStream`)
//! - `controller`: the single-owner lifecycle handle (`InvestigationController`)
//! - `projection`: the pure renderer-facing projection (`project`)

mod controller;
mod message;
mod projection;
mod session;
mod stream;

// Re-export public API
pub use controller::{InvestigationController, InvestigationUpdate};
pub use message::{
    AgentMessage, CONCLUSION_FIELD, CONCLUSION_NODE, END_MARKER, FieldValue, StepPayload,
    StepRecord,
};
pub use projection::{PENDING_BODY, ViewStep, prettify_label, project, step_body};
pub use session::{Applied, InvestigationSession, Liveness};
pub use stream::{
    InvestigationStream, SIGNAL_CHANNEL_CAPACITY, StepStream, StreamHandle, StreamSignal,
};
