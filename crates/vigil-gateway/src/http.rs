//! Shared HTTP error mapping for the gateway clients.

use serde::Deserialize;

use vigil_core::VigilError;

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success response into the error taxonomy.
///
/// The backend wraps error text as `{"status": "error", "message": ...}`;
/// when the body is anything else it is carried verbatim.
pub(crate) async fn error_from_response(response: reqwest::Response) -> VigilError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|wrapper| wrapper.message)
        .unwrap_or(body);
    VigilError::http(status, message)
}
