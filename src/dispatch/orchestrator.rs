//! Dispatch orchestrator — drives the find-a-worker → draft-an-email → send
//! flow for one selected message.
//!
//! **Core invariant: at most one in-flight dispatch session system-wide.**
//! A new dispatch is only accepted once the previous session reached a
//! terminal phase. Async completions (worker search, draft responses) are
//! matched against the session id and request counter, so results arriving
//! after a dismissal are dropped instead of resurrecting the dialog.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::delay::SearchDelay;
use super::draft::DraftService;
use super::session::{DispatchPhase, DispatchSession};
use super::workers::{MAX_WORKER_OPTIONS, WorkerFinder};
use crate::error::{DispatchError, DraftError};
use crate::store::MessageStore;
use crate::triage::types::MessageStatus;

/// Orchestrates dispatch sessions and writes outcomes back into the store.
pub struct DispatchOrchestrator {
    store: Arc<MessageStore>,
    finder: Arc<dyn WorkerFinder>,
    drafter: Arc<dyn DraftService>,
    delay: Arc<dyn SearchDelay>,
    session: RwLock<Option<DispatchSession>>,
}

impl DispatchOrchestrator {
    pub fn new(
        store: Arc<MessageStore>,
        finder: Arc<dyn WorkerFinder>,
        drafter: Arc<dyn DraftService>,
        delay: Arc<dyn SearchDelay>,
    ) -> Self {
        Self {
            store,
            finder,
            drafter,
            delay,
            session: RwLock::new(None),
        }
    }

    /// Snapshot of the current session, if one is active.
    pub async fn snapshot(&self) -> Option<DispatchSession> {
        self.session.read().await.clone()
    }

    /// Start dispatching a maintenance message.
    ///
    /// Runs the simulated worker-location lookup and resolves once the
    /// session reaches `Choosing`. Non-maintenance messages are rejected
    /// without touching the machine; a failed or empty lookup still reaches
    /// `Choosing` with an empty option list.
    pub async fn start_dispatch(&self, message_id: &str) -> Result<DispatchSession, DispatchError> {
        let message =
            self.store
                .select(message_id)
                .await
                .ok_or_else(|| DispatchError::UnknownMessage {
                    id: message_id.to_string(),
                })?;

        if !message.is_maintenance() {
            debug!(
                id = %message.id,
                category = %message.category,
                "Dispatch refused for non-maintenance message"
            );
            return Err(DispatchError::NotMaintenance {
                category: message.category,
            });
        }

        let session_id = {
            let mut guard = self.session.write().await;
            if guard.as_ref().is_some_and(|s| !s.phase.is_terminal()) {
                return Err(DispatchError::SessionActive);
            }
            let session = DispatchSession::begin(&message);
            let session_id = session.id;
            info!(
                session = %session_id,
                message = %message.id,
                location = %message.property,
                "Dispatch started, searching for workers"
            );
            *guard = Some(session);
            session_id
        };

        // Simulated search latency, then the lookup itself
        self.delay.wait().await;
        let options = match self.finder.find_workers(&message.property).await {
            Ok(options) => options,
            Err(e) => {
                warn!(error = %e, "Worker search failed, presenting empty option list");
                Vec::new()
            }
        };

        let mut guard = self.session.write().await;
        match guard.as_mut() {
            Some(session) if session.id == session_id && session.phase == DispatchPhase::Searching => {
                session.options = options;
                session.options.truncate(MAX_WORKER_OPTIONS);
                session.transition_to(DispatchPhase::Choosing)?;
                info!(
                    session = %session_id,
                    options = session.options.len(),
                    "Worker options ready"
                );
                Ok(session.clone())
            }
            _ => {
                debug!(session = %session_id, "Search completed for a dismissed session, dropping result");
                Err(DispatchError::Aborted)
            }
        }
    }

    /// Pick a worker by name and request the initial email draft.
    ///
    /// The session moves to `Drafting` immediately; a missing or failed
    /// draft leaves the pane empty/regenerable, never resolves the message.
    pub async fn worker_picked(&self, name: &str) -> Result<DispatchSession, DispatchError> {
        let (session_id, seq, worker, issue) = {
            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(DispatchError::NoSession)?;
            if session.phase != DispatchPhase::Choosing {
                return Err(DispatchError::InvalidPhase {
                    phase: session.phase,
                    action: "pick a worker",
                });
            }
            let worker = session
                .options
                .iter()
                .find(|option| option.name == name)
                .cloned()
                .ok_or_else(|| DispatchError::UnknownWorker {
                    name: name.to_string(),
                })?;
            session.chosen = Some(worker.clone());
            session.transition_to(DispatchPhase::Drafting)?;
            let seq = session.next_request_seq();
            info!(session = %session.id, worker = %worker.name, "Worker picked, requesting draft");
            (session.id, seq, worker, session.issue.clone())
        };

        let outcome = self.drafter.draft_for_selection(&worker, &issue).await;
        self.apply_draft_outcome(session_id, seq, outcome).await
    }

    /// Re-issue the draft request, replacing the prior draft on success.
    pub async fn regenerate(&self) -> Result<DispatchSession, DispatchError> {
        let (session_id, seq, worker, issue) = {
            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(DispatchError::NoSession)?;
            if session.phase != DispatchPhase::Drafting {
                return Err(DispatchError::InvalidPhase {
                    phase: session.phase,
                    action: "regenerate a draft",
                });
            }
            let worker = session
                .chosen
                .clone()
                .ok_or(DispatchError::InvalidPhase {
                    phase: session.phase,
                    action: "regenerate without a chosen worker",
                })?;
            let seq = session.next_request_seq();
            info!(session = %session.id, worker = %worker.name, "Regenerating draft");
            (session.id, seq, worker, session.issue.clone())
        };

        let outcome = self
            .drafter
            .request_draft(&worker, &issue)
            .await
            .map(Some);
        self.apply_draft_outcome(session_id, seq, outcome).await
    }

    /// Send the drafted email and resolve the message.
    pub async fn send(&self) -> Result<DispatchSession, DispatchError> {
        let session = {
            let mut guard = self.session.write().await;
            match guard.as_ref() {
                None => return Err(DispatchError::NoSession),
                Some(s) if s.phase != DispatchPhase::Drafting => {
                    return Err(DispatchError::InvalidPhase {
                        phase: s.phase,
                        action: "send the draft",
                    });
                }
                Some(_) => {}
            }
            let mut session = guard.take().ok_or(DispatchError::NoSession)?;
            session.transition_to(DispatchPhase::Resolved)?;
            session
        };

        self.store
            .set_status(&session.message_id, MessageStatus::Done)
            .await;
        info!(
            session = %session.id,
            message = %session.message_id,
            "Draft sent, message resolved"
        );
        Ok(session)
    }

    /// Reject every worker option and resolve the message anyway.
    ///
    /// Reached from `Choosing` only; the draft service is never contacted.
    pub async fn dismiss_all(&self) -> Result<DispatchSession, DispatchError> {
        let session = {
            let mut guard = self.session.write().await;
            match guard.as_ref() {
                None => return Err(DispatchError::NoSession),
                Some(s) if s.phase != DispatchPhase::Choosing => {
                    return Err(DispatchError::InvalidPhase {
                        phase: s.phase,
                        action: "dismiss the options",
                    });
                }
                Some(_) => {}
            }
            let mut session = guard.take().ok_or(DispatchError::NoSession)?;
            session.transition_to(DispatchPhase::Resolved)?;
            session
        };

        self.store
            .set_status(&session.message_id, MessageStatus::Done)
            .await;
        info!(
            session = %session.id,
            message = %session.message_id,
            "All workers dismissed, message resolved"
        );
        Ok(session)
    }

    /// Close the dispatch dialog.
    ///
    /// While `Choosing` this is the same as dismissing every option
    /// (resolves the message); mid-search or mid-draft it abandons the
    /// session without touching message status, and any in-flight result is
    /// dropped by the session-id guard. Returns `None` when nothing was
    /// active.
    pub async fn cancel(&self) -> Result<Option<DispatchSession>, DispatchError> {
        let (session, resolved) = {
            let mut guard = self.session.write().await;
            let Some(current) = guard.as_ref() else {
                return Ok(None);
            };
            let resolved = current.phase == DispatchPhase::Choosing;
            let mut session = guard.take().ok_or(DispatchError::NoSession)?;
            if resolved {
                session.transition_to(DispatchPhase::Resolved)?;
            } else {
                session.transition_to(DispatchPhase::Dismissed)?;
            }
            (session, resolved)
        };

        if resolved {
            self.store
                .set_status(&session.message_id, MessageStatus::Done)
                .await;
            info!(session = %session.id, "Dialog closed while choosing, message resolved");
        } else {
            info!(session = %session.id, phase = %session.phase, "Dispatch session abandoned");
        }
        Ok(Some(session))
    }

    /// Apply a draft response if the session still expects it.
    ///
    /// Responses for a stale session id or superseded request counter are
    /// discarded — the session they belonged to is gone or has moved on.
    async fn apply_draft_outcome(
        &self,
        session_id: Uuid,
        seq: u64,
        outcome: Result<Option<String>, DraftError>,
    ) -> Result<DispatchSession, DispatchError> {
        let mut guard = self.session.write().await;
        match guard.as_mut() {
            Some(session)
                if session.id == session_id
                    && session.request_seq == seq
                    && session.phase == DispatchPhase::Drafting =>
            {
                match outcome {
                    Ok(Some(text)) => {
                        // draft_ready — the machine's one self-loop
                        session.transition_to(DispatchPhase::Drafting)?;
                        session.draft = Some(text.clone());
                        session.draft_error = None;
                        if let Some(chosen) = session.chosen.as_mut() {
                            chosen.email_draft = Some(text);
                        }
                    }
                    Ok(None) => {
                        debug!(session = %session_id, "Proceeding without a draft");
                        session.draft = None;
                        session.draft_error = None;
                    }
                    Err(e) => {
                        warn!(session = %session_id, error = %e, "Draft request failed");
                        session.draft_error = Some(e.to_string());
                    }
                }
                Ok(session.clone())
            }
            _ => {
                debug!(session = %session_id, seq, "Dropping stale draft response");
                Err(DispatchError::Aborted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::delay::NoDelay;
    use crate::dispatch::draft::IssueDetails;
    use crate::dispatch::workers::WorkerOption;
    use crate::error::FeedError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn workers() -> Vec<WorkerOption> {
        vec![
            WorkerOption {
                name: "John Smith".into(),
                specialty: "Plumber".into(),
                rating: "4.8".into(),
                email_draft: None,
            },
            WorkerOption {
                name: "Mike Johnson".into(),
                specialty: "Handyman".into(),
                rating: "4.6".into(),
                email_draft: None,
            },
            WorkerOption {
                name: "Dave Brown".into(),
                specialty: "Electrician".into(),
                rating: "4.5".into(),
                email_draft: None,
            },
        ]
    }

    struct StubFinder {
        options: Vec<WorkerOption>,
        fail: bool,
    }

    #[async_trait]
    impl WorkerFinder for StubFinder {
        async fn find_workers(&self, _location: &str) -> Result<Vec<WorkerOption>, FeedError> {
            if self.fail {
                Err(FeedError::Unavailable("search store down".into()))
            } else {
                Ok(self.options.clone())
            }
        }
    }

    /// Scripted draft outcome for one adapter call.
    #[derive(Clone)]
    enum DraftOutcome {
        Text(&'static str),
        Missing,
        Fail,
    }

    struct StubDrafter {
        selection: StdMutex<VecDeque<DraftOutcome>>,
        requests: StdMutex<VecDeque<DraftOutcome>>,
        selection_calls: AtomicUsize,
        request_calls: AtomicUsize,
    }

    impl StubDrafter {
        fn scripted(
            selection: Vec<DraftOutcome>,
            requests: Vec<DraftOutcome>,
        ) -> Arc<Self> {
            Arc::new(Self {
                selection: StdMutex::new(selection.into()),
                requests: StdMutex::new(requests.into()),
                selection_calls: AtomicUsize::new(0),
                request_calls: AtomicUsize::new(0),
            })
        }

        fn happy() -> Arc<Self> {
            Self::scripted(vec![DraftOutcome::Text("Dear worker, ...")], vec![])
        }
    }

    #[async_trait]
    impl DraftService for StubDrafter {
        async fn draft_for_selection(
            &self,
            _worker: &WorkerOption,
            _issue: &IssueDetails,
        ) -> Result<Option<String>, DraftError> {
            self.selection_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .selection
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(DraftOutcome::Text("Dear worker, ..."));
            match outcome {
                DraftOutcome::Text(text) => Ok(Some(text.to_string())),
                DraftOutcome::Missing => Ok(None),
                DraftOutcome::Fail => Err(DraftError::RequestFailed {
                    reason: "connection refused".into(),
                }),
            }
        }

        async fn request_draft(
            &self,
            _worker: &WorkerOption,
            _issue: &IssueDetails,
        ) -> Result<String, DraftError> {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .requests
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(DraftOutcome::Text("Dear worker, regenerated"));
            match outcome {
                DraftOutcome::Text(text) => Ok(text.to_string()),
                DraftOutcome::Missing => Err(DraftError::Unavailable),
                DraftOutcome::Fail => Err(DraftError::RequestFailed {
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    fn orchestrator_with(
        finder: StubFinder,
        drafter: Arc<StubDrafter>,
    ) -> (Arc<MessageStore>, DispatchOrchestrator) {
        let store = MessageStore::with_seed();
        let orchestrator = DispatchOrchestrator::new(
            Arc::clone(&store),
            Arc::new(finder),
            drafter,
            Arc::new(NoDelay),
        );
        (store, orchestrator)
    }

    // Seed message "1" is Maintenance, "3" is Rent.

    #[tokio::test]
    async fn non_maintenance_message_stays_idle() {
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        let err = orchestrator.start_dispatch("3").await.unwrap_err();
        assert!(matches!(err, DispatchError::NotMaintenance { .. }));
        assert!(orchestrator.snapshot().await.is_none());
        // Message untouched
        assert_ne!(store.select("3").await.unwrap().status, MessageStatus::Done);
    }

    #[tokio::test]
    async fn unknown_message_is_rejected() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );
        let err = orchestrator.start_dispatch("no-such-id").await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownMessage { .. }));
    }

    #[tokio::test]
    async fn maintenance_dispatch_reaches_choosing_with_capped_options() {
        let mut options = workers();
        options.push(WorkerOption {
            name: "Extra Worker".into(),
            specialty: "Roofer".into(),
            rating: "4.1".into(),
            email_draft: None,
        });
        let (_store, orchestrator) =
            orchestrator_with(StubFinder { options, fail: false }, StubDrafter::happy());

        let session = orchestrator.start_dispatch("1").await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Choosing);
        assert_eq!(session.options.len(), MAX_WORKER_OPTIONS);
        for option in &session.options {
            assert!(!option.name.is_empty());
            assert!(!option.specialty.is_empty());
            assert!(!option.rating.is_empty());
        }
    }

    #[tokio::test]
    async fn failed_worker_search_still_reaches_choosing_empty() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: vec![], fail: true },
            StubDrafter::happy(),
        );

        let session = orchestrator.start_dispatch("1").await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Choosing);
        assert!(session.options.is_empty());
    }

    #[tokio::test]
    async fn reentry_rejected_while_session_active() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let err = orchestrator.start_dispatch("4").await.unwrap_err();
        assert!(matches!(err, DispatchError::SessionActive));
    }

    #[tokio::test]
    async fn pick_drafts_send_resolves() {
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let session = orchestrator.worker_picked("John Smith").await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Drafting);
        assert_eq!(session.chosen.as_ref().unwrap().rating, "4.8");
        assert_eq!(session.draft.as_deref(), Some("Dear worker, ..."));
        assert_eq!(
            session.chosen.as_ref().unwrap().email_draft.as_deref(),
            Some("Dear worker, ...")
        );

        // Draft ready does not resolve the message
        assert_ne!(store.select("1").await.unwrap().status, MessageStatus::Done);

        let session = orchestrator.send().await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Resolved);
        assert_eq!(store.select("1").await.unwrap().status, MessageStatus::Done);
        // Session destroyed on terminal phase
        assert!(orchestrator.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn unknown_worker_name_is_rejected() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let err = orchestrator.worker_picked("Nobody").await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownWorker { .. }));
        // Still choosing
        assert_eq!(
            orchestrator.snapshot().await.unwrap().phase,
            DispatchPhase::Choosing
        );
    }

    #[tokio::test]
    async fn dismiss_all_resolves_without_drafting() {
        let drafter = StubDrafter::happy();
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            Arc::clone(&drafter),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let session = orchestrator.dismiss_all().await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Resolved);
        assert_eq!(store.select("1").await.unwrap().status, MessageStatus::Done);
        assert_eq!(drafter.selection_calls.load(Ordering::SeqCst), 0);
        assert_eq!(drafter.request_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_draft_stays_drafting_and_regenerate_recovers() {
        let drafter = StubDrafter::scripted(
            vec![DraftOutcome::Fail],
            vec![DraftOutcome::Text("Dear John, second try")],
        );
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            Arc::clone(&drafter),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let session = orchestrator.worker_picked("John Smith").await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Drafting);
        assert!(session.draft.is_none());
        assert!(session.draft_error.is_some());
        // Failure never resolves the message
        assert_ne!(store.select("1").await.unwrap().status, MessageStatus::Done);

        let session = orchestrator.regenerate().await.unwrap();
        assert_eq!(session.draft.as_deref(), Some("Dear John, second try"));
        assert!(session.draft_error.is_none());
    }

    #[tokio::test]
    async fn missing_draft_falls_back_to_bare_selection() {
        let drafter = StubDrafter::scripted(vec![DraftOutcome::Missing], vec![]);
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            drafter,
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let session = orchestrator.worker_picked("John Smith").await.unwrap();
        assert_eq!(session.phase, DispatchPhase::Drafting);
        assert!(session.draft.is_none());
        assert!(session.draft_error.is_none());
    }

    #[tokio::test]
    async fn regenerate_replaces_prior_draft() {
        let drafter = StubDrafter::scripted(
            vec![DraftOutcome::Text("first draft")],
            vec![DraftOutcome::Text("second draft")],
        );
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            drafter,
        );

        orchestrator.start_dispatch("1").await.unwrap();
        orchestrator.worker_picked("John Smith").await.unwrap();
        let session = orchestrator.regenerate().await.unwrap();
        assert_eq!(session.draft.as_deref(), Some("second draft"));
    }

    #[tokio::test]
    async fn regenerate_failure_keeps_prior_draft_with_error() {
        let drafter = StubDrafter::scripted(
            vec![DraftOutcome::Text("first draft")],
            vec![DraftOutcome::Fail],
        );
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            drafter,
        );

        orchestrator.start_dispatch("1").await.unwrap();
        orchestrator.worker_picked("John Smith").await.unwrap();
        let session = orchestrator.regenerate().await.unwrap();
        assert_eq!(session.draft.as_deref(), Some("first draft"));
        assert!(session.draft_error.is_some());
    }

    #[tokio::test]
    async fn unavailable_draft_on_regenerate_is_recoverable() {
        let drafter = StubDrafter::scripted(
            vec![DraftOutcome::Missing],
            vec![DraftOutcome::Missing, DraftOutcome::Text("third try")],
        );
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            drafter,
        );

        orchestrator.start_dispatch("1").await.unwrap();
        orchestrator.worker_picked("John Smith").await.unwrap();

        let session = orchestrator.regenerate().await.unwrap();
        assert!(session.draft.is_none());
        assert_eq!(session.draft_error.as_deref(), Some("No draft available"));

        let session = orchestrator.regenerate().await.unwrap();
        assert_eq!(session.draft.as_deref(), Some("third try"));
        assert!(session.draft_error.is_none());
    }

    #[tokio::test]
    async fn cancel_while_choosing_resolves_like_dismiss_all() {
        let drafter = StubDrafter::happy();
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            Arc::clone(&drafter),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        let session = orchestrator.cancel().await.unwrap().unwrap();
        assert_eq!(session.phase, DispatchPhase::Resolved);
        assert_eq!(store.select("1").await.unwrap().status, MessageStatus::Done);
        assert_eq!(drafter.selection_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_while_drafting_abandons_without_status_change() {
        let (store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        orchestrator.start_dispatch("1").await.unwrap();
        orchestrator.worker_picked("John Smith").await.unwrap();
        let session = orchestrator.cancel().await.unwrap().unwrap();
        assert_eq!(session.phase, DispatchPhase::Dismissed);
        assert_ne!(store.select("1").await.unwrap().status, MessageStatus::Done);
        // A fresh dispatch is possible again
        orchestrator.start_dispatch("1").await.unwrap();
    }

    #[tokio::test]
    async fn cancel_with_no_session_is_noop() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );
        assert!(orchestrator.cancel().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_result_after_cancellation_is_dropped() {
        use tokio::sync::Notify;

        /// Delay that parks until the test releases it.
        struct GateDelay {
            gate: Notify,
        }

        #[async_trait]
        impl SearchDelay for GateDelay {
            async fn wait(&self) {
                self.gate.notified().await;
            }
        }

        let store = MessageStore::with_seed();
        let gate = Arc::new(GateDelay { gate: Notify::new() });
        let orchestrator = Arc::new(DispatchOrchestrator::new(
            Arc::clone(&store),
            Arc::new(StubFinder { options: workers(), fail: false }),
            StubDrafter::happy(),
            Arc::clone(&gate) as Arc<dyn SearchDelay>,
        ));

        let handle = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.start_dispatch("1").await })
        };

        // Wait until the session is parked in Searching, then close the dialog
        loop {
            if let Some(session) = orchestrator.snapshot().await {
                assert_eq!(session.phase, DispatchPhase::Searching);
                break;
            }
            tokio::task::yield_now().await;
        }
        let session = orchestrator.cancel().await.unwrap().unwrap();
        assert_eq!(session.phase, DispatchPhase::Dismissed);

        // Release the search; its completion must be dropped
        gate.gate.notify_one();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(DispatchError::Aborted)));
        assert!(orchestrator.snapshot().await.is_none());
        assert_ne!(store.select("1").await.unwrap().status, MessageStatus::Done);
    }

    #[tokio::test]
    async fn send_outside_drafting_is_rejected() {
        let (_store, orchestrator) = orchestrator_with(
            StubFinder { options: workers(), fail: false },
            StubDrafter::happy(),
        );

        let err = orchestrator.send().await.unwrap_err();
        assert!(matches!(err, DispatchError::NoSession));

        orchestrator.start_dispatch("1").await.unwrap();
        let err = orchestrator.send().await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPhase { .. }));
    }
}
