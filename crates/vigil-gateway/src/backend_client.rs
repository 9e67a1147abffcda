//! Request/response client for the operations backend.
//!
//! Covers the three plain CRUD exchanges: the detected-event feed, the
//! field-report log list, and log submission. The investigation stream has
//! its own transport in `stream_transport`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use vigil_core::event::OpsEvent;
use vigil_core::ports::OpsBackend;
use vigil_core::{Result, VigilError};

use crate::http::error_from_response;

/// HTTP client for the backend's request/response endpoints.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct SubmitLogRequest<'a> {
    log_message: &'a str,
}

#[derive(Deserialize)]
struct SubmitLogResponse {
    status: String,
    #[serde(default)]
    message: String,
}

impl BackendClient {
    /// Creates a client for the given backend base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl OpsBackend for BackendClient {
    async fn fetch_events(&self) -> Result<Vec<OpsEvent>> {
        let response = self
            .client
            .get(self.url("/api/events"))
            .send()
            .await
            .map_err(|err| VigilError::transport(format!("event feed request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let events: Vec<OpsEvent> = response
            .json()
            .await
            .map_err(|err| VigilError::malformed(format!("event feed response: {err}")))?;
        tracing::debug!(count = events.len(), "fetched event feed");
        Ok(events)
    }

    async fn fetch_logs(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/api/logs"))
            .send()
            .await
            .map_err(|err| VigilError::transport(format!("log list request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response
            .json()
            .await
            .map_err(|err| VigilError::malformed(format!("log list response: {err}")))
    }

    async fn submit_log(&self, message: &str) -> Result<()> {
        // Rejected before any request goes out; the backend would answer
        // 400 for the same reason.
        if message.trim().is_empty() {
            return Err(VigilError::invalid_input("field report message is empty"));
        }

        let response = self
            .client
            .post(self.url("/api/log"))
            .json(&SubmitLogRequest {
                log_message: message,
            })
            .send()
            .await
            .map_err(|err| VigilError::transport(format!("log submission failed: {err}")))?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let ack: SubmitLogResponse = response
            .json()
            .await
            .map_err(|err| VigilError::malformed(format!("log submission response: {err}")))?;
        if ack.status != "success" {
            return Err(VigilError::internal(format!(
                "log submission rejected: {}",
                ack.message
            )));
        }
        tracing::debug!("field report submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_report_fails_without_a_request() {
        // The base URL is unroutable; an attempted request would error with
        // a transport failure, not InvalidInput.
        let client = BackendClient::new("http://127.0.0.1:1");
        let err = client.submit_log("   ").await.unwrap_err();
        assert!(matches!(err, VigilError::InvalidInput(_)));
    }

    #[test]
    fn urls_join_cleanly_with_trailing_slash() {
        let client = BackendClient::new("http://ops.example:5000/");
        assert_eq!(client.url("/api/events"), "http://ops.example:5000/api/events");
    }

    #[test]
    fn ack_wire_format_deserializes() {
        let ack: SubmitLogResponse =
            serde_json::from_str(r#"{"status": "success", "message": "Log added and knowledge base updated."}"#)
                .unwrap();
        assert_eq!(ack.status, "success");

        let bare: SubmitLogResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(bare.message.is_empty());
    }
}
