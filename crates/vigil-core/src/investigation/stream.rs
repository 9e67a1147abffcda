//! Stream transport port.
//!
//! Defines the interface for the long-lived server-push channel that carries
//! an investigation's reasoning stream. Implementations live in the gateway
//! crate; tests use channel-backed mocks.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, VigilError};
use crate::investigation::message::AgentMessage;

/// Bounded capacity of the decoded-signal channel.
///
/// The backend paces frames; a small buffer is enough and keeps a stalled
/// consumer from accumulating an unbounded backlog.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 32;

/// One delivery from an open stream.
#[derive(Debug)]
pub enum StreamSignal {
    /// A decoded frame, in the order the server sent it
    Message(AgentMessage),
    /// A terminal fault; delivered at most once, nothing follows it
    Fault(VigilError),
}

/// Cancellation handle for an open stream.
///
/// `close()` is synchronous and idempotent. The reader task owns a clone and
/// stops delivering before sending anything once the token is cancelled, so
/// no signal is observed after `close()` returns.
#[derive(Debug, Clone, Default)]
pub struct StreamHandle {
    cancel: CancellationToken,
}

impl StreamHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminates the underlying connection.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// True once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the handle is closed; used by reader tasks.
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }
}

/// An open investigation stream: decoded signals plus its cancellation handle.
pub struct StepStream {
    /// Decoded signals in server order; closed when the stream ends
    pub signals: mpsc::Receiver<StreamSignal>,
    /// Cancellation primitive used when the session is superseded
    pub handle: StreamHandle,
}

impl StepStream {
    /// Creates a stream pair: the consumer half and the producer sender.
    ///
    /// The producer side must honor the returned handle: once it is closed,
    /// stop sending. This is the contract mocks and the gateway share.
    pub fn channel() -> (Self, mpsc::Sender<StreamSignal>, StreamHandle) {
        let (tx, rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let handle = StreamHandle::new();
        (
            Self {
                signals: rx,
                handle: handle.clone(),
            },
            tx,
            handle,
        )
    }
}

/// An abstract opener for investigation streams.
///
/// One call dispatches one investigation: the request carries the subject
/// description and the response is the push stream of reasoning frames.
/// No retry or reconnect logic lives behind this trait; a fault is terminal
/// for the session and a fresh investigation is a user action.
#[async_trait]
pub trait InvestigationStream: Send + Sync {
    /// Opens the push stream for one investigation.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established or the
    /// server answers with a non-success status.
    async fn open(&self, subject_description: &str) -> Result<StepStream>;
}
