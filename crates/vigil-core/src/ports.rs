//! Collaborator boundary traits.
//!
//! The event feed, log store and weather lookup are plain request/response
//! exchanges with no state machine of their own. These traits decouple the
//! console's logic from the concrete HTTP clients in the gateway crate and
//! are what tests mock.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::OpsEvent;
use crate::weather::WeatherSnapshot;

/// Request/response operations against the operations backend.
#[async_trait]
pub trait OpsBackend: Send + Sync {
    /// Fetches the current detected-event feed.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-success response.
    async fn fetch_events(&self) -> Result<Vec<OpsEvent>>;

    /// Fetches the submitted field-report log, oldest first.
    async fn fetch_logs(&self) -> Result<Vec<String>>;

    /// Submits one field report.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VigilError::InvalidInput`] for an empty message
    /// without issuing a request; transport and HTTP errors otherwise.
    async fn submit_log(&self, message: &str) -> Result<()>;
}

/// Third-party weather lookup for the monitored site.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches the current conditions snapshot.
    async fn current(&self) -> Result<WeatherSnapshot>;
}
