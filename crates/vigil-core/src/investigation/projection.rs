//! Presentation projection.
//!
//! A pure function from the ordered step log plus liveness to renderable
//! view state. Deterministic given its two inputs, which is what makes the
//! console output snapshot-testable; no hidden state.

use serde::{Deserialize, Serialize};

use super::message::{FieldValue, StepRecord};
use super::session::Liveness;

/// Fixed body line shown while a stage has produced no renderable fields yet.
pub const PENDING_BODY: &str = "Working on it...";

/// One renderable step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStep {
    /// Prettified stage name ("gather_telemetry" -> "Gather Telemetry")
    pub title: String,
    /// Formatted body lines
    pub body: Vec<String>,
    /// False only for the last step of a still-active session
    pub is_complete: bool,
}

/// Projects the step log into renderable view state.
///
/// The last step shows a pending indicator only while the session is still
/// active; every terminal liveness marks all steps complete, including after
/// a fault that froze a partial log.
pub fn project(steps: &[StepRecord], liveness: Liveness) -> Vec<ViewStep> {
    let last = steps.len().saturating_sub(1);
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| ViewStep {
            title: prettify_label(&step.node_name),
            body: step_body(step),
            is_complete: index < last || liveness != Liveness::Active,
        })
        .collect()
}

/// Formats one step's payload into body lines.
///
/// A conclusion-bearing payload renders as its paragraphs; otherwise each
/// populated field renders as a `Label: value` line, and a payload with no
/// populated fields renders the fixed placeholder.
pub fn step_body(step: &StepRecord) -> Vec<String> {
    if let Some(conclusion) = step.payload.final_conclusion() {
        return conclusion
            .lines()
            .map(|line| line.replace("**", ""))
            .filter(|line| !line.trim().is_empty())
            .collect();
    }

    let mut lines = Vec::new();
    for (name, value) in step.payload.fields() {
        if value.is_empty() {
            continue;
        }
        let rendered = match value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(", "),
            // Nested mappings are carried in the model but not rendered
            FieldValue::Nested(_) => continue,
        };
        lines.push(format!("{}: {}", prettify_label(name), rendered));
    }

    if lines.is_empty() {
        lines.push(PENDING_BODY.to_string());
    }
    lines
}

/// Turns a snake_case identifier into a display label.
pub fn prettify_label(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
