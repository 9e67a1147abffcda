//! Console use case implementation.
//!
//! This module provides the `ConsoleUseCase` which orchestrates the
//! collaborator clients and the investigation controller behind the
//! operator-facing operations of the console.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use vigil_core::Result;
use vigil_core::event::OpsEvent;
use vigil_core::investigation::{InvestigationController, Liveness, ViewStep, project};
use vigil_core::ports::{OpsBackend, WeatherProvider};
use vigil_core::weather::WeatherSnapshot;

/// Renderable snapshot of the current investigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestigationView {
    /// The event description the agent was dispatched against
    pub subject_description: String,
    /// Terminal/non-terminal status
    pub liveness: Liveness,
    /// Projected steps, arrival order
    pub steps: Vec<ViewStep>,
}

/// Use case for the operator console.
///
/// `ConsoleUseCase` coordinates the request/response collaborators (event
/// feed, log store, weather) with the single investigation controller.
///
/// # Responsibilities
///
/// - Loading the initial event feed and log list, each side degrading
///   independently on failure
/// - Caching the event feed so events can be dispatched by list position
/// - The submit-then-refresh field report flow
/// - Dispatching investigations and exposing the projected view
pub struct ConsoleUseCase {
    /// Request/response backend operations
    backend: Arc<dyn OpsBackend>,
    /// Third-party weather lookup
    weather: Arc<dyn WeatherProvider>,
    /// The single-owner investigation controller
    controller: Arc<InvestigationController>,
    /// Last fetched event feed, for dispatch by list position
    events: RwLock<Vec<OpsEvent>>,
}

impl ConsoleUseCase {
    /// Creates a new `ConsoleUseCase` over the given collaborators.
    pub fn new(
        backend: Arc<dyn OpsBackend>,
        weather: Arc<dyn WeatherProvider>,
        controller: Arc<InvestigationController>,
    ) -> Self {
        Self {
            backend,
            weather,
            controller,
            events: RwLock::new(Vec::new()),
        }
    }

    /// Fetches the event feed and log list concurrently for startup.
    ///
    /// Each side degrades independently: a failure is logged and that side
    /// comes back empty, so a dead collaborator never blocks the console.
    pub async fn initial_data(&self) -> (Vec<OpsEvent>, Vec<String>) {
        let (events, logs) = tokio::join!(self.backend.fetch_events(), self.backend.fetch_logs());
        let events = match events {
            Ok(events) => {
                *self.events.write().await = events.clone();
                events
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch event feed");
                Vec::new()
            }
        };
        let logs = match logs {
            Ok(logs) => logs,
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch log list");
                Vec::new()
            }
        };
        (events, logs)
    }

    /// Re-fetches the event feed and refreshes the dispatch cache.
    pub async fn refresh_events(&self) -> Result<Vec<OpsEvent>> {
        let events = self.backend.fetch_events().await?;
        *self.events.write().await = events.clone();
        Ok(events)
    }

    /// Looks up a cached event by its 1-based list position.
    pub async fn event_by_number(&self, number: usize) -> Option<OpsEvent> {
        if number == 0 {
            return None;
        }
        self.events.read().await.get(number - 1).cloned()
    }

    /// Fetches the submitted field-report log, oldest first.
    pub async fn recent_logs(&self) -> Result<Vec<String>> {
        self.backend.fetch_logs().await
    }

    /// Submits one field report and returns the refreshed log list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty message (nothing is submitted),
    /// or the submission/refresh error otherwise.
    pub async fn submit_log(&self, message: &str) -> Result<Vec<String>> {
        self.backend.submit_log(message).await?;
        self.backend.fetch_logs().await
    }

    /// Fetches the current weather snapshot for the monitored site.
    pub async fn weather(&self) -> Result<WeatherSnapshot> {
        self.weather.current().await
    }

    /// Dispatches the investigation agent against a detected event.
    ///
    /// Supersedes any investigation already in flight.
    pub async fn investigate(&self, event: &OpsEvent) -> Result<()> {
        self.investigate_subject(&event.description).await
    }

    /// Dispatches the investigation agent against a free-form subject.
    pub async fn investigate_subject(&self, subject_description: &str) -> Result<()> {
        self.controller.start_investigation(subject_description).await
    }

    /// Projects the current investigation into renderable view state.
    ///
    /// `None` before the first dispatch.
    pub async fn investigation_view(&self) -> Option<InvestigationView> {
        let session = self.controller.snapshot().await?;
        Some(InvestigationView {
            subject_description: session.subject_description,
            liveness: session.liveness,
            steps: project(&session.steps, session.liveness),
        })
    }

    /// True while a dispatched investigation is still consuming its stream.
    pub async fn is_investigating(&self) -> bool {
        self.controller.is_active().await
    }
}
