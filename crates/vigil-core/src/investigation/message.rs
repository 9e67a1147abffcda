//! Wire messages pushed by the investigation agent.
//!
//! Every frame on the stream is a JSON mapping with exactly one top-level
//! key: either a reasoning-stage name mapped to that stage's output, or the
//! reserved terminal marker. Frames are decoded into [`AgentMessage`] at the
//! transport boundary so nothing downstream inspects raw key shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Reserved top-level key marking the end of the stream.
pub const END_MARKER: &str = "__end__";

/// Stage name whose arrival is itself a terminal signal for the session.
pub const CONCLUSION_NODE: &str = "formulate_conclusion";

/// Reserved payload field carrying the human-readable final answer.
pub const CONCLUSION_FIELD: &str = "final_conclusion";

/// One field value in a stage payload.
///
/// Stage output fields are strings, ordered sequences of strings, or nested
/// mappings of the same shape. Anything else in a frame is a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Nested(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// True when the value carries nothing worth rendering.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Nested(fields) => fields.is_empty(),
        }
    }
}

/// Structured output of one reasoning stage, keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPayload(pub BTreeMap<String, FieldValue>);

impl StepPayload {
    /// The human-readable final answer, when this stage carries one.
    pub fn final_conclusion(&self) -> Option<&str> {
        match self.0.get(CONCLUSION_FIELD) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Iterates fields in deterministic (sorted-name) order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// One unit of agent reasoning emitted by the backend.
///
/// Immutable once appended to a session's step log; the log never rewrites
/// a prior entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Identifier of the reasoning stage (e.g. "gather_telemetry")
    pub node_name: String,
    /// Structured output of that stage
    pub payload: StepPayload,
}

impl StepRecord {
    /// True when this step is the designated final reasoning stage.
    pub fn is_conclusion(&self) -> bool {
        self.node_name == CONCLUSION_NODE
    }
}

/// A decoded stream frame: either a reasoning step or the terminal marker.
///
/// The sentinel is a control signal, never appended to the step log.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    /// Stream finished; no further messages will arrive
    Sentinel,
    /// One reasoning step
    Step(StepRecord),
}

impl AgentMessage {
    /// Decodes one frame payload from its wire text form.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::MalformedMessage`] when the payload is not a
    /// JSON mapping, does not have exactly one top-level key, or carries a
    /// stage payload outside the supported field shapes.
    pub fn parse(data: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|err| VigilError::malformed(format!("frame is not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    /// Decodes one frame from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(VigilError::malformed("frame is not a JSON mapping"));
        };
        if map.len() != 1 {
            return Err(VigilError::malformed(format!(
                "frame must have exactly one top-level key, got {}",
                map.len()
            )));
        }
        let Some((key, payload)) = map.into_iter().next() else {
            return Err(VigilError::malformed("frame mapping is empty"));
        };

        // The sentinel's value is arbitrary and ignored.
        if key == END_MARKER {
            return Ok(Self::Sentinel);
        }

        let payload: StepPayload = serde_json::from_value(payload).map_err(|err| {
            VigilError::malformed(format!("unsupported payload for stage '{key}': {err}"))
        })?;
        Ok(Self::Step(StepRecord {
            node_name: key,
            payload,
        }))
    }

    /// True iff this message is the reserved terminal marker.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_frame() {
        let message = AgentMessage::parse(r#"{"gather_telemetry": {"sources": ["grid-7"]}}"#)
            .unwrap();
        let AgentMessage::Step(step) = message else {
            panic!("expected a step");
        };
        assert_eq!(step.node_name, "gather_telemetry");
        assert_eq!(
            step.payload.0.get("sources"),
            Some(&FieldValue::List(vec!["grid-7".to_string()]))
        );
        assert!(!step.is_conclusion());
    }

    #[test]
    fn parses_sentinel_with_arbitrary_value() {
        assert!(AgentMessage::parse(r#"{"__end__": null}"#).unwrap().is_sentinel());
        assert!(AgentMessage::parse(r#"{"__end__": {"reason": "done"}}"#)
            .unwrap()
            .is_sentinel());
    }

    #[test]
    fn parses_nested_payload_fields() {
        let message = AgentMessage::parse(
            r#"{"calculator": {"deviation": {"actual": "312", "predicted": "480"}}}"#,
        )
        .unwrap();
        let AgentMessage::Step(step) = message else {
            panic!("expected a step");
        };
        let Some(FieldValue::Nested(fields)) = step.payload.0.get("deviation") else {
            panic!("expected nested field");
        };
        assert_eq!(fields.get("actual"), Some(&FieldValue::Text("312".to_string())));
    }

    #[test]
    fn rejects_multi_key_frame() {
        let err = AgentMessage::parse(r#"{"a": {}, "b": {}}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_empty_and_non_mapping_frames() {
        assert!(AgentMessage::parse("{}").unwrap_err().is_malformed());
        assert!(AgentMessage::parse("[1, 2]").unwrap_err().is_malformed());
        assert!(AgentMessage::parse("not json at all").unwrap_err().is_malformed());
    }

    #[test]
    fn rejects_unsupported_payload_value() {
        let err = AgentMessage::parse(r#"{"calculator": {"deviation": 42}}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn conclusion_accessor_reads_reserved_field() {
        let message = AgentMessage::parse(
            r#"{"formulate_conclusion": {"final_conclusion": "Root cause: sensor drift."}}"#,
        )
        .unwrap();
        let AgentMessage::Step(step) = message else {
            panic!("expected a step");
        };
        assert!(step.is_conclusion());
        assert_eq!(
            step.payload.final_conclusion(),
            Some("Root cause: sensor drift.")
        );
    }

    #[test]
    fn conclusion_accessor_ignores_non_text_values() {
        let payload: StepPayload =
            serde_json::from_str(r#"{"final_conclusion": ["not", "text"]}"#).unwrap();
        assert_eq!(payload.final_conclusion(), None);
    }
}
