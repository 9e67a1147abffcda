//! Event-feed domain model.
//!
//! Detected events arrive from the backend's anomaly feed; selecting one is
//! what dispatches an investigation agent against its description.

use serde::{Deserialize, Serialize};

/// One detected operational event from the backend feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsEvent {
    /// Feed-assigned identifier
    pub id: u64,
    /// Free-form event category (e.g. "Grid Anomaly")
    #[serde(rename = "type")]
    pub event_type: String,
    /// One-line summary for list display
    pub short_desc: String,
    /// Full description; becomes the investigation subject when dispatched
    pub description: String,
}

/// Display classification of an event category.
///
/// The backend emits free-form category strings; the console only
/// distinguishes the known ones for styling and falls back for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PerformanceDegradation,
    GridAnomaly,
    SystemHealthAlert,
    Other,
}

impl EventKind {
    /// Classifies a raw category string from the feed.
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "Performance Degradation" => Self::PerformanceDegradation,
            "Grid Anomaly" => Self::GridAnomaly,
            "System Health Alert" => Self::SystemHealthAlert,
            _ => Self::Other,
        }
    }
}

impl OpsEvent {
    /// Display classification of this event's category.
    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event_type)
    }
}
