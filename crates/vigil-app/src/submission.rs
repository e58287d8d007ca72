//! Submission lifecycle.
//!
//! Drives one request at a time through encode → moderate → normalize and
//! publishes the outcome to observers.
//!
//! ## States
//!
//! ```text
//! Idle ──submit──▶ Analyzing ──ok──▶ Done(result)
//!                      │
//!                      └──err──▶ Failed { reason }
//! ```
//!
//! `Done` and `Failed` hold until the next submission, which always re-enters
//! `Analyzing`. Each submission takes a sequence number; a completion is only
//! published if no newer submission (or reset) has started since, so a slow
//! stale response cannot overwrite a newer state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use vigil_client::Moderator;
use vigil_core::{encode, normalize, ModerationInput, ModerationResult, ModerationType};

use crate::error::SubmitError;

/// Observable state of the submission pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SubmissionState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A request is in flight.
    Analyzing,
    /// The last request completed.
    Done(ModerationResult),
    /// The last request failed.
    Failed {
        /// User-facing failure message.
        reason: String,
    },
}

impl SubmissionState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Done(_) => "done",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns true for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed { .. })
    }

    /// Returns the result, if the last request completed.
    pub fn result(&self) -> Option<&ModerationResult> {
        match self {
            Self::Done(result) => Some(result),
            _ => None,
        }
    }

    /// Returns the failure reason, if the last request failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coordinates submissions and owns the single visible state slot.
///
/// Clones share the same state and sequence counter.
pub struct Submitter<M> {
    moderator: Arc<M>,
    state: Arc<watch::Sender<SubmissionState>>,
    /// Sequence number of the newest submission or reset.
    latest: Arc<AtomicU64>,
}

impl<M> Clone for Submitter<M> {
    fn clone(&self) -> Self {
        Self {
            moderator: Arc::clone(&self.moderator),
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<M> fmt::Debug for Submitter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("state", &*self.state.borrow())
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .finish()
    }
}

impl<M: Moderator> Submitter<M> {
    /// Creates a submitter in the `Idle` state.
    pub fn new(moderator: M) -> Self {
        Self::with_shared(Arc::new(moderator))
    }

    /// Creates a submitter around a shared moderator.
    pub fn with_shared(moderator: Arc<M>) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            moderator,
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Returns the sequence number of the newest submission.
    pub fn current_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Submits input for moderation and waits for the outcome.
    ///
    /// Returns this submission's own outcome. It is published only if no
    /// newer submission started in the meantime.
    pub async fn submit(
        &self,
        moderation_type: ModerationType,
        input: ModerationInput,
    ) -> SubmissionState {
        let seq = self.begin();
        tracing::debug!(seq, kind = %moderation_type, "submission analyzing");

        let outcome = match self.run(moderation_type, &input).await {
            Ok(result) => SubmissionState::Done(result),
            Err(e) => {
                tracing::warn!(seq, "Submission failed: {}", e);
                SubmissionState::Failed {
                    reason: e.user_message(),
                }
            }
        };

        self.complete(seq, outcome.clone());
        outcome
    }

    /// Returns to `Idle` and discards any in-flight completion.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(seq, "submission reset");
            *state = SubmissionState::Idle;
        });
    }

    /// Takes the next sequence number and enters `Analyzing`.
    ///
    /// Both happen under the state lock so completions observe them together.
    fn begin(&self) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = SubmissionState::Analyzing;
        });
        seq
    }

    /// Publishes an outcome if `seq` is still the newest submission.
    fn complete(&self, seq: u64, outcome: SubmissionState) -> bool {
        self.state.send_if_modified(|state| {
            let latest = self.latest.load(Ordering::SeqCst);
            if seq != latest {
                tracing::debug!(seq, latest, "discarding stale completion");
                return false;
            }
            tracing::debug!(seq, to = %outcome, "submission complete");
            *state = outcome;
            true
        })
    }

    async fn run(
        &self,
        moderation_type: ModerationType,
        input: &ModerationInput,
    ) -> Result<ModerationResult, SubmitError> {
        let payload = encode(moderation_type, input)?;
        let verdict = self.moderator.moderate(payload).await?;
        Ok(normalize(verdict.as_ref(), moderation_type, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;
    use vigil_client::ClientError;
    use vigil_core::{ImageFile, RawVerdict, TransportPayload};

    /// What the fake service answers with.
    enum Reply {
        Verdict(Option<RawVerdict>),
        Status(u16, &'static str),
    }

    /// Moderator whose replies are released by the test, one per call.
    #[derive(Default)]
    struct GatedModerator {
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        payloads: Mutex<Vec<TransportPayload>>,
    }

    impl GatedModerator {
        /// Queues a reply that the test releases later.
        fn gate(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().unwrap().push_back(rx);
            tx
        }

        /// Queues a reply that is available immediately.
        fn reply(&self, reply: Reply) {
            let tx = self.gate();
            let _ = tx.send(reply);
        }

        fn payloads(&self) -> Vec<TransportPayload> {
            self.payloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Moderator for GatedModerator {
        async fn moderate(
            &self,
            payload: TransportPayload,
        ) -> vigil_client::Result<Option<RawVerdict>> {
            self.payloads.lock().unwrap().push(payload);
            let rx = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no reply queued");
            match rx.await.expect("gate dropped") {
                Reply::Verdict(verdict) => Ok(verdict),
                Reply::Status(code, reason) => Err(ClientError::Transport {
                    status: Some(code),
                    message: format!("{} {}", code, reason),
                }),
            }
        }
    }

    fn verdict(is_toxic: bool, confidence: f64, summary: &str) -> Reply {
        Reply::Verdict(Some(RawVerdict {
            is_toxic: Some(is_toxic),
            confidence: Some(confidence),
            summary: Some(summary.to_string()),
        }))
    }

    fn submitter() -> (Submitter<GatedModerator>, Arc<GatedModerator>) {
        let moderator = Arc::new(GatedModerator::default());
        (Submitter::with_shared(Arc::clone(&moderator)), moderator)
    }

    async fn wait_for(rx: &mut watch::Receiver<SubmissionState>, name: &str) {
        rx.wait_for(|state| state.as_str() == name).await.unwrap();
    }

    // ==================== SubmissionState Tests ====================

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(SubmissionState::default(), SubmissionState::Idle);
        assert!(!SubmissionState::Idle.is_terminal());
        assert!(!SubmissionState::Analyzing.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(SubmissionState::Analyzing).unwrap();
        assert_eq!(json["state"], "analyzing");

        let json = serde_json::to_value(SubmissionState::Failed {
            reason: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");
    }

    // ==================== Lifecycle Tests ====================

    #[tokio::test]
    async fn test_submit_text_success() {
        let (submitter, moderator) = submitter();
        assert_eq!(submitter.state(), SubmissionState::Idle);
        moderator.reply(verdict(false, 0.95, "benign greeting"));

        let outcome = submitter
            .submit(ModerationType::Text, "hello world".into())
            .await;

        let result = outcome.result().unwrap();
        assert!(result.is_safe);
        assert_eq!(result.confidence, 95);
        assert_eq!(result.summary, "benign greeting");
        assert_eq!(result.content, "hello world");
        assert_eq!(submitter.state(), outcome);
        assert_eq!(
            moderator.payloads(),
            vec![TransportPayload::Text("hello world".to_string())]
        );
    }

    #[tokio::test]
    async fn test_observers_see_analyzing_then_done() {
        let (submitter, moderator) = submitter();
        let mut rx = submitter.subscribe();
        let gate = moderator.gate();

        let task = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "hi".into()).await })
        };

        wait_for(&mut rx, "analyzing").await;
        assert_eq!(submitter.state(), SubmissionState::Analyzing);

        let _ = gate.send(verdict(true, 0.87, "rude"));
        task.await.unwrap();

        wait_for(&mut rx, "done").await;
        let state = submitter.state();
        assert!(!state.result().unwrap().is_safe);
        assert_eq!(state.result().unwrap().confidence, 87);
    }

    #[tokio::test]
    async fn test_failure_clears_prior_result() {
        let (submitter, moderator) = submitter();
        moderator.reply(verdict(false, 0.9, "fine"));
        moderator.reply(Reply::Status(500, "Internal Server Error"));

        submitter.submit(ModerationType::Text, "first".into()).await;
        assert!(submitter.state().result().is_some());

        submitter.submit(ModerationType::Text, "second".into()).await;
        let state = submitter.state();
        assert!(state.result().is_none());
        assert!(state.failure().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_encode_error_fails_without_request() {
        let (submitter, moderator) = submitter();

        let outcome = submitter
            .submit(ModerationType::Image, "not an image".into())
            .await;

        assert!(outcome.failure().unwrap().contains("invalid input"));
        assert_eq!(submitter.state().as_str(), "failed");
        assert!(moderator.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_missing_result_completes() {
        let (submitter, moderator) = submitter();
        moderator.reply(Reply::Verdict(None));

        let outcome = submitter.submit(ModerationType::Text, "hello".into()).await;
        let result = outcome.result().unwrap();
        assert!(result.incomplete);
        assert!(!result.is_safe);
    }

    #[tokio::test]
    async fn test_image_data_uri_without_mime() {
        let (submitter, moderator) = submitter();
        moderator.reply(verdict(false, 0.99, "landscape"));

        let uri = "base64,iVBORw0KGgo=".to_string();
        let outcome = submitter
            .submit(ModerationType::Image, ModerationInput::DataUri(uri.clone()))
            .await;

        let payloads = moderator.payloads();
        let part = payloads[0].image().unwrap();
        assert_eq!(part.filename, "image.png");
        assert_eq!(part.mime_type, "image/png");
        assert_eq!(outcome.result().unwrap().content, uri);
    }

    #[tokio::test]
    async fn test_image_file_content_is_displayable() {
        let (submitter, moderator) = submitter();
        moderator.reply(verdict(false, 0.8, "cat"));

        let file = ImageFile::new(vec![0xFF, 0xD8, 0xFF, 0xE0]).with_filename("cat.jpg");
        let outcome = submitter.submit(ModerationType::Image, file.into()).await;

        assert!(outcome
            .result()
            .unwrap()
            .content
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(moderator.payloads()[0].image().unwrap().filename, "cat.jpg");
    }

    // ==================== Ordering Tests ====================

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let (submitter, moderator) = submitter();
        let first_gate = moderator.gate();
        let second_gate = moderator.gate();

        let first = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "first".into()).await })
        };
        while moderator.payloads().is_empty() {
            tokio::task::yield_now().await;
        }

        let second = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "second".into()).await })
        };
        while moderator.payloads().len() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(submitter.state(), SubmissionState::Analyzing);
        assert_eq!(submitter.current_seq(), 2);

        // Newer request finishes first.
        let _ = second_gate.send(verdict(false, 0.9, "second"));
        second.await.unwrap();
        assert_eq!(submitter.state().result().unwrap().content, "second");

        // The older one arrives late and must not overwrite.
        let _ = first_gate.send(verdict(true, 0.9, "first"));
        let stale = first.await.unwrap();
        assert_eq!(stale.result().unwrap().content, "first");
        assert_eq!(submitter.state().result().unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_stale_completion_while_newer_in_flight() {
        let (submitter, moderator) = submitter();
        let first_gate = moderator.gate();
        let second_gate = moderator.gate();

        let first = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "first".into()).await })
        };
        while moderator.payloads().is_empty() {
            tokio::task::yield_now().await;
        }
        let second = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "second".into()).await })
        };
        while moderator.payloads().len() < 2 {
            tokio::task::yield_now().await;
        }

        let _ = first_gate.send(Reply::Status(500, "Internal Server Error"));
        first.await.unwrap();
        assert_eq!(submitter.state(), SubmissionState::Analyzing);

        let _ = second_gate.send(verdict(false, 0.5, "second"));
        second.await.unwrap();
        assert_eq!(submitter.state().result().unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight() {
        let (submitter, moderator) = submitter();
        let gate = moderator.gate();

        let task = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.submit(ModerationType::Text, "hi".into()).await })
        };
        while moderator.payloads().is_empty() {
            tokio::task::yield_now().await;
        }

        submitter.reset();
        assert_eq!(submitter.state(), SubmissionState::Idle);

        let _ = gate.send(verdict(false, 0.9, "late"));
        task.await.unwrap();
        assert_eq!(submitter.state(), SubmissionState::Idle);
    }

    // ==================== End-to-End Tests ====================

    mod service {
        use super::*;

        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::json;
        use vigil_client::{ClientConfig, ModerationClient};

        async fn client_for(router: Router) -> ModerationClient {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            let config = ClientConfig::new(&format!("http://{}", addr)).unwrap();
            ModerationClient::new(config).unwrap()
        }

        #[tokio::test]
        async fn test_hello_world_against_service() {
            let client = client_for(Router::new().route(
                "/moderate",
                post(|| async {
                    Json(json!({
                        "result": {"is_toxic": false, "confidence": 0.95, "summary": "benign greeting"}
                    }))
                }),
            ))
            .await;
            let submitter = Submitter::new(client);

            let outcome = submitter
                .submit(ModerationType::Text, "hello world".into())
                .await;
            let result = outcome.result().unwrap();
            assert!(result.is_safe);
            assert_eq!(result.confidence, 95);
            assert_eq!(result.summary, "benign greeting");
            assert_eq!(result.content, "hello world");
        }

        #[tokio::test]
        async fn test_server_error_fails_with_status() {
            let client = client_for(Router::new().route(
                "/moderate",
                post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            ))
            .await;
            let submitter = Submitter::new(client);

            submitter.submit(ModerationType::Text, "hello".into()).await;
            let state = submitter.state();
            assert_eq!(state.as_str(), "failed");
            assert!(state.failure().unwrap().contains("500"));
        }

        #[tokio::test]
        async fn test_empty_envelope_is_total() {
            let client = client_for(
                Router::new().route("/moderate", post(|| async { Json(json!({})) })),
            )
            .await;
            let submitter = Submitter::new(client);

            let outcome = submitter.submit(ModerationType::Text, "hello".into()).await;
            assert!(outcome.result().unwrap().incomplete);
        }
    }
}
