//! SSE implementation of the investigation stream port.
//!
//! One `open()` call issues one POST against the backend's investigate
//! endpoint and turns the response body into decoded [`AgentMessage`]
//! signals. Frames are parsed at this boundary; nothing downstream sees
//! wire text. A connection fault or undecodable frame produces exactly one
//! `Fault` signal and ends the reader. There is no retry or reconnect
//! logic here: a fresh investigation is a user action.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;

use vigil_core::investigation::{
    AgentMessage, InvestigationStream, StepStream, StreamHandle, StreamSignal,
};
use vigil_core::{Result, VigilError};

use crate::http::error_from_response;
use crate::sse::SseDecoder;

/// Stream opener against the operations backend.
pub struct SseInvestigationStream {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct InvestigateRequest<'a> {
    event: &'a str,
}

impl SseInvestigationStream {
    /// Creates an opener for the given backend base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/investigate", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl InvestigationStream for SseInvestigationStream {
    async fn open(&self, subject_description: &str) -> Result<StepStream> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "text/event-stream")
            .json(&InvestigateRequest {
                event: subject_description,
            })
            .send()
            .await
            .map_err(|err| VigilError::transport(format!("investigation request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let (stream, tx, handle) = StepStream::channel();
        tokio::spawn(read_stream(response, tx, handle));
        Ok(stream)
    }
}

/// Drains the response body, delivering decoded signals in server order.
///
/// Stops on: handle closed (supersession), consumer gone, end of body, or
/// the first fault. Nothing is sent once the handle is closed.
async fn read_stream(
    response: reqwest::Response,
    tx: mpsc::Sender<StreamSignal>,
    handle: StreamHandle,
) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = handle.closed() => return,
            chunk = body.next() => chunk,
        };
        let Some(chunk) = chunk else {
            // Clean end of body; the sentinel is the protocol-level
            // terminator, so closing the channel is all that happens here.
            return;
        };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                let fault = VigilError::transport(format!("stream read failed: {err}"));
                deliver_fault(&tx, &handle, fault).await;
                return;
            }
        };

        let frames = match decoder.feed(&chunk) {
            Ok(frames) => frames,
            Err(err) => {
                deliver_fault(&tx, &handle, err).await;
                return;
            }
        };
        for frame in frames {
            let message = match AgentMessage::parse(&frame) {
                Ok(message) => message,
                Err(err) => {
                    deliver_fault(&tx, &handle, err).await;
                    return;
                }
            };
            let delivered = tokio::select! {
                _ = handle.closed() => return,
                sent = tx.send(StreamSignal::Message(message)) => sent.is_ok(),
            };
            if !delivered {
                return;
            }
        }
    }
}

async fn deliver_fault(tx: &mpsc::Sender<StreamSignal>, handle: &StreamHandle, err: VigilError) {
    if handle.is_closed() {
        return;
    }
    tracing::warn!(error = %err, "investigation stream fault");
    tokio::select! {
        _ = handle.closed() => {}
        _ = tx.send(StreamSignal::Fault(err)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The reader's decode path: backend wire bytes -> frames -> messages.
    #[test]
    fn decodes_backend_wire_format_to_messages() {
        let mut decoder = SseDecoder::new();
        let wire = concat!(
            "data: {\"detect_anomaly\": {\"anomaly_description\": \"Zero power output.\"}}\n\n",
            "data: {\"formulate_conclusion\": {\"final_conclusion\": \"Root cause: icing.\"}}\n\n",
            "data: {\"__end__\": null}\n\n",
        );

        let messages: Vec<AgentMessage> = decoder
            .feed(wire.as_bytes())
            .unwrap()
            .iter()
            .map(|frame| AgentMessage::parse(frame).unwrap())
            .collect();

        assert_eq!(messages.len(), 3);
        assert!(!messages[0].is_sentinel());
        assert!(!messages[1].is_sentinel());
        assert!(messages[2].is_sentinel());
    }

    #[test]
    fn undecodable_frame_is_a_malformed_error() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: not json\n\n").unwrap();
        assert!(AgentMessage::parse(&frames[0]).unwrap_err().is_malformed());
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let stream = SseInvestigationStream::new("http://ops.example:5000/");
        assert_eq!(stream.endpoint, "http://ops.example:5000/api/investigate");
    }
}
