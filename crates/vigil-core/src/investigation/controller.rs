//! Investigation stream controller.
//!
//! Owns at most one live investigation for the whole application. Starting a
//! new investigation supersedes the current one: its transport handle is
//! closed, its step log is replaced by the new session's, and any of its
//! late deliveries are dropped. The push-callback pattern of the wire
//! protocol is re-expressed here as explicit transitions on an owned
//! session object so supersession and idempotent termination hold by
//! construction rather than by accident.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};

use crate::error::Result;
use crate::investigation::message::StepRecord;
use crate::investigation::session::{Applied, InvestigationSession, Liveness};
use crate::investigation::stream::{InvestigationStream, StepStream, StreamHandle, StreamSignal};

/// Renderer-facing notification of a session state change.
#[derive(Debug, Clone, PartialEq)]
pub enum InvestigationUpdate {
    /// A step was appended to the visible log
    StepAppended(StepRecord),
    /// The session reached a terminal liveness
    Finished(Liveness),
}

/// The stream currently owned by the active session.
struct OpenStream {
    handle: StreamHandle,
    generation: u64,
}

/// Single-owner handle over the one live investigation session.
///
/// The visible session state is shared behind a lock so a renderer can take
/// a consistent snapshot of "steps so far" at any time; the pump task is the
/// only writer while a stream is live. A generation counter, checked under
/// the session write lock, keeps a superseded pump from ever touching a
/// newer session's log.
pub struct InvestigationController {
    stream: Arc<dyn InvestigationStream>,
    session: Arc<RwLock<Option<InvestigationSession>>>,
    open_stream: Arc<Mutex<Option<OpenStream>>>,
    generation: Arc<AtomicU64>,
    updates: mpsc::UnboundedSender<InvestigationUpdate>,
}

impl InvestigationController {
    /// Creates a controller over the given stream opener.
    ///
    /// Returns the controller and the receiver of renderer updates. Update
    /// sends are best-effort: a dropped receiver means a headless run and is
    /// not an error.
    pub fn new(
        stream: Arc<dyn InvestigationStream>,
    ) -> (Self, mpsc::UnboundedReceiver<InvestigationUpdate>) {
        let (updates, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                stream,
                session: Arc::new(RwLock::new(None)),
                open_stream: Arc::new(Mutex::new(None)),
                generation: Arc::new(AtomicU64::new(0)),
                updates,
            },
            update_rx,
        )
    }

    /// Dispatches a new investigation, superseding any live one.
    ///
    /// The previous session (if active) is marked superseded and its
    /// transport handle closed; the visible step log is replaced by the new
    /// session's, initially empty. A failure to open the stream leaves the
    /// new session visible in the `Failed` state with its partial (empty)
    /// log retained.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream cannot be opened; the session is
    /// already marked `Failed` when this happens.
    pub async fn start_investigation(&self, subject_description: &str) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Taking the handle out of its slot yields exactly one close per
        // superseded stream.
        if let Some(previous) = self.open_stream.lock().await.take() {
            previous.handle.close();
        }
        {
            let mut session = self.session.write().await;
            if let Some(current) = session.as_mut() {
                current.supersede();
            }
            *session = Some(InvestigationSession::new(subject_description));
        }
        tracing::debug!(subject = subject_description, "investigation dispatched");

        let StepStream { signals, handle } = match self.stream.open(subject_description).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "failed to open investigation stream");
                let mut session = self.session.write().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    if let Some(current) = session.as_mut() {
                        current.fail();
                    }
                    let _ = self.updates.send(InvestigationUpdate::Finished(Liveness::Failed));
                }
                return Err(err);
            }
        };

        {
            let mut slot = self.open_stream.lock().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                // A newer investigation superseded this one mid-open.
                handle.close();
                return Ok(());
            }
            slot.replace(OpenStream {
                handle,
                generation,
            });
        }

        tokio::spawn(pump(
            Arc::clone(&self.session),
            Arc::clone(&self.open_stream),
            Arc::clone(&self.generation),
            self.updates.clone(),
            signals,
            generation,
        ));
        Ok(())
    }

    /// A consistent snapshot of the visible session, if any.
    pub async fn snapshot(&self) -> Option<InvestigationSession> {
        self.session.read().await.clone()
    }

    /// True while a dispatched investigation is still consuming its stream.
    pub async fn is_active(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|session| session.liveness == Liveness::Active)
    }
}

/// Drains one stream's signals into the session, in arrival order.
///
/// Single consumer per stream: no message is classified while another is
/// mid-classification. The generation check runs under the session write
/// lock, so a stale pump observes the bumped counter before it could touch
/// the successor's log.
async fn pump(
    session: Arc<RwLock<Option<InvestigationSession>>>,
    open_stream: Arc<Mutex<Option<OpenStream>>>,
    generation_counter: Arc<AtomicU64>,
    updates: mpsc::UnboundedSender<InvestigationUpdate>,
    mut signals: mpsc::Receiver<StreamSignal>,
    generation: u64,
) {
    while let Some(signal) = signals.recv().await {
        let mut guard = session.write().await;
        if generation_counter.load(Ordering::SeqCst) != generation {
            break;
        }
        let Some(current) = guard.as_mut() else {
            break;
        };
        match signal {
            StreamSignal::Message(message) => match current.apply_message(message) {
                Applied::Appended(record) => {
                    drop(guard);
                    let _ = updates.send(InvestigationUpdate::StepAppended(record));
                }
                Applied::CompletedByConclusion(record) => {
                    drop(guard);
                    let _ = updates.send(InvestigationUpdate::StepAppended(record));
                    let _ = updates.send(InvestigationUpdate::Finished(Liveness::Completed));
                    break;
                }
                Applied::CompletedBySentinel => {
                    drop(guard);
                    let _ = updates.send(InvestigationUpdate::Finished(Liveness::Completed));
                    break;
                }
                Applied::Ignored => {}
            },
            StreamSignal::Fault(err) => {
                tracing::warn!(error = %err, "investigation stream fault");
                current.fail();
                drop(guard);
                let _ = updates.send(InvestigationUpdate::Finished(Liveness::Failed));
                break;
            }
        }
    }

    // The signal channel closing without a terminal transition means the
    // stream ended prematurely; that is a transport fault, not a completion.
    {
        let mut guard = session.write().await;
        if generation_counter.load(Ordering::SeqCst) == generation {
            if let Some(current) = guard.as_mut() {
                if !current.liveness.is_terminal() {
                    tracing::warn!("investigation stream closed before a terminal signal");
                    current.fail();
                    drop(guard);
                    let _ = updates.send(InvestigationUpdate::Finished(Liveness::Failed));
                }
            }
        }
    }

    // Tidy the connection when the slot is still ours; a superseding start
    // already closed it otherwise.
    let mut slot = open_stream.lock().await;
    if slot.as_ref().is_some_and(|open| open.generation == generation) {
        if let Some(open) = slot.take() {
            open.handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VigilError;
    use crate::investigation::message::AgentMessage;
    use crate::investigation::projection::project;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::timeout;

    struct OpenRecord {
        tx: Option<mpsc::Sender<StreamSignal>>,
        handle: StreamHandle,
    }

    // Mock stream opener that hands the test the producer side of every
    // opened stream.
    #[derive(Default)]
    struct MockStream {
        opens: StdMutex<Vec<OpenRecord>>,
    }

    impl MockStream {
        fn open_count(&self) -> usize {
            self.opens.lock().unwrap().len()
        }

        fn producer(&self, index: usize) -> (mpsc::Sender<StreamSignal>, StreamHandle) {
            let opens = self.opens.lock().unwrap();
            let record = &opens[index];
            (
                record.tx.clone().expect("producer already taken"),
                record.handle.clone(),
            )
        }

        /// Moves the stored sender out so dropping it closes the channel.
        fn take_producer(&self, index: usize) -> mpsc::Sender<StreamSignal> {
            self.opens.lock().unwrap()[index].tx.take().unwrap()
        }
    }

    #[async_trait]
    impl InvestigationStream for MockStream {
        async fn open(&self, _subject_description: &str) -> Result<StepStream> {
            let (stream, tx, handle) = StepStream::channel();
            self.opens.lock().unwrap().push(OpenRecord {
                tx: Some(tx),
                handle,
            });
            Ok(stream)
        }
    }

    struct FailingStream;

    #[async_trait]
    impl InvestigationStream for FailingStream {
        async fn open(&self, _subject_description: &str) -> Result<StepStream> {
            Err(VigilError::http(502, "bad gateway"))
        }
    }

    fn step_message(node_name: &str) -> StreamSignal {
        StreamSignal::Message(
            AgentMessage::parse(&format!("{{\"{node_name}\": {{}}}}")).unwrap(),
        )
    }

    async fn next_update(
        rx: &mut mpsc::UnboundedReceiver<InvestigationUpdate>,
    ) -> InvestigationUpdate {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("update channel closed")
    }

    #[tokio::test]
    async fn appends_steps_in_arrival_order() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());
        controller.start_investigation("subject").await.unwrap();

        let (tx, _) = stream.producer(0);
        tx.send(step_message("detect_anomaly")).await.unwrap();
        tx.send(step_message("investigate_with_rag")).await.unwrap();

        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));
        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));

        let session = controller.snapshot().await.unwrap();
        let names: Vec<&str> = session.steps.iter().map(|s| s.node_name.as_str()).collect();
        assert_eq!(names, ["detect_anomaly", "investigate_with_rag"]);
        assert_eq!(session.liveness, Liveness::Active);
    }

    #[tokio::test]
    async fn sentinel_completes_the_session() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());
        controller.start_investigation("subject").await.unwrap();

        let (tx, _) = stream.producer(0);
        tx.send(step_message("detect_anomaly")).await.unwrap();
        tx.send(StreamSignal::Message(AgentMessage::Sentinel))
            .await
            .unwrap();

        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));
        assert_eq!(
            next_update(&mut updates).await,
            InvestigationUpdate::Finished(Liveness::Completed)
        );

        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.steps.len(), 1);
        assert_eq!(session.liveness, Liveness::Completed);
    }

    #[tokio::test]
    async fn conclusion_completes_before_sentinel_arrives() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());
        controller.start_investigation("subject").await.unwrap();

        let (tx, _) = stream.producer(0);
        tx.send(step_message("gather_telemetry")).await.unwrap();
        tx.send(step_message("formulate_conclusion")).await.unwrap();

        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));
        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));
        assert_eq!(
            next_update(&mut updates).await,
            InvestigationUpdate::Finished(Liveness::Completed)
        );

        // The sentinel still sent by the backend afterwards changes nothing.
        let _ = tx.send(StreamSignal::Message(AgentMessage::Sentinel)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.steps.len(), 2);
        assert_eq!(session.liveness, Liveness::Completed);
    }

    #[tokio::test]
    async fn supersession_closes_first_stream_and_isolates_its_log() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());

        controller.start_investigation("first subject").await.unwrap();
        let (first_tx, first_handle) = stream.producer(0);
        first_tx.send(step_message("detect_anomaly")).await.unwrap();
        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));

        controller.start_investigation("second subject").await.unwrap();
        assert_eq!(stream.open_count(), 2);
        let (second_tx, second_handle) = stream.producer(1);
        assert!(first_handle.is_closed());
        assert!(!second_handle.is_closed());

        // Anything the first transport still emits after close() must not
        // reach the visible log.
        let _ = first_tx.send(step_message("late_from_first")).await;

        second_tx.send(step_message("gather_telemetry")).await.unwrap();
        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));

        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.subject_description, "second subject");
        let names: Vec<&str> = session.steps.iter().map(|s| s.node_name.as_str()).collect();
        assert_eq!(names, ["gather_telemetry"]);
    }

    #[tokio::test]
    async fn fault_freezes_partial_steps() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());
        controller.start_investigation("subject").await.unwrap();

        let (tx, _) = stream.producer(0);
        tx.send(step_message("detect_anomaly")).await.unwrap();
        tx.send(step_message("investigate_with_rag")).await.unwrap();
        tx.send(step_message("calculator")).await.unwrap();
        tx.send(StreamSignal::Fault(VigilError::transport("connection reset")))
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(matches!(
                next_update(&mut updates).await,
                InvestigationUpdate::StepAppended(_)
            ));
        }
        assert_eq!(
            next_update(&mut updates).await,
            InvestigationUpdate::Finished(Liveness::Failed)
        );

        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.steps.len(), 3);
        assert_eq!(session.liveness, Liveness::Failed);

        let view = project(&session.steps, session.liveness);
        assert!(view.iter().all(|step| step.is_complete));
    }

    #[tokio::test]
    async fn premature_stream_end_is_a_fault() {
        let stream = Arc::new(MockStream::default());
        let (controller, mut updates) = InvestigationController::new(stream.clone());
        controller.start_investigation("subject").await.unwrap();

        let tx = stream.take_producer(0);
        tx.send(step_message("detect_anomaly")).await.unwrap();
        assert!(matches!(
            next_update(&mut updates).await,
            InvestigationUpdate::StepAppended(_)
        ));
        drop(tx);

        assert_eq!(
            next_update(&mut updates).await,
            InvestigationUpdate::Finished(Liveness::Failed)
        );
        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.steps.len(), 1);
        assert_eq!(session.liveness, Liveness::Failed);
    }

    #[tokio::test]
    async fn open_failure_marks_session_failed() {
        let (controller, mut updates) = InvestigationController::new(Arc::new(FailingStream));

        let result = controller.start_investigation("subject").await;
        assert!(result.is_err());
        assert_eq!(
            next_update(&mut updates).await,
            InvestigationUpdate::Finished(Liveness::Failed)
        );

        let session = controller.snapshot().await.unwrap();
        assert_eq!(session.liveness, Liveness::Failed);
        assert!(session.steps.is_empty());
        assert!(!controller.is_active().await);
    }

    #[tokio::test]
    async fn snapshot_is_none_before_first_dispatch() {
        let (controller, _updates) = InvestigationController::new(Arc::new(MockStream::default()));
        assert!(controller.snapshot().await.is_none());
        assert!(!controller.is_active().await);
    }
}
