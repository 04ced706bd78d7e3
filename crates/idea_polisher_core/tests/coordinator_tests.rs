//! Integration tests for the Session Coordinator, run against scripted
//! in-memory implementations of the collaborator ports.

use async_trait::async_trait;
use chrono::Utc;
use idea_polisher_core::domain::{ArchivedItem, CapturedAudio, DraftStatus, User};
use idea_polisher_core::ports::{
    ArchiveStore, AudioCaptureDevice, CaptureHandle, CategoryService, DefaultRecipientStore,
    EmailDeliveryService, ExpansionService, PolishingService, PortError, PortResult,
    TranscriptionService,
};
use idea_polisher_core::session::{SessionCoordinator, SessionServices};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

//=========================================================================================
// Scripted text service (shared by polish / expand / classify / transcribe)
//=========================================================================================

enum Reply {
    Now(PortResult<String>),
    /// Blocks until the paired sender fires, to stage races deliberately.
    Wait(oneshot::Receiver<PortResult<String>>),
}

struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    entered: Notify,
}

impl ScriptedService {
    fn scripted(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
        })
    }

    /// Answers every call with the same text.
    fn always(text: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Wait(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(PortError::Service("reply sender dropped".into()))),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(PortError::Service("unexpected call".into())),
            },
        }
    }
}

#[async_trait]
impl PolishingService for ScriptedService {
    async fn polish(&self, _raw_notes: &str) -> PortResult<String> {
        self.next().await
    }
}

#[async_trait]
impl ExpansionService for ScriptedService {
    async fn expand(&self, _polished_outline: &str) -> PortResult<String> {
        self.next().await
    }
}

#[async_trait]
impl CategoryService for ScriptedService {
    async fn classify(&self, _polished_outline: &str) -> PortResult<String> {
        self.next().await
    }
}

#[async_trait]
impl TranscriptionService for ScriptedService {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> PortResult<String> {
        self.next().await
    }
}

//=========================================================================================
// Scripted capture device
//=========================================================================================

struct ScriptedHandle {
    bytes: Vec<u8>,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl CaptureHandle for ScriptedHandle {
    async fn stop(self: Box<Self>) -> PortResult<CapturedAudio> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(CapturedAudio {
            bytes: self.bytes,
            mime_type: "audio/pcm;rate=48000".to_string(),
        })
    }
}

#[derive(Default)]
struct ScriptedCapture {
    handles: Mutex<VecDeque<ScriptedHandle>>,
    deny: bool,
}

impl ScriptedCapture {
    fn denied() -> Arc<Self> {
        Arc::new(Self {
            handles: Mutex::new(VecDeque::new()),
            deny: true,
        })
    }

    /// Queues a handle that will capture `bytes`, and returns the counter
    /// tracking how many times its resources were released.
    fn push_handle(&self, bytes: Vec<u8>) -> Arc<AtomicUsize> {
        let released = Arc::new(AtomicUsize::new(0));
        self.handles.lock().unwrap().push_back(ScriptedHandle {
            bytes,
            released: released.clone(),
        });
        released
    }
}

#[async_trait]
impl AudioCaptureDevice for ScriptedCapture {
    async fn acquire(&self) -> PortResult<Box<dyn CaptureHandle>> {
        if self.deny {
            return Err(PortError::PermissionDenied);
        }
        match self.handles.lock().unwrap().pop_front() {
            Some(handle) => Ok(Box::new(handle)),
            None => Ok(Box::new(ScriptedHandle {
                bytes: vec![0, 1, 2, 3],
                released: Arc::new(AtomicUsize::new(0)),
            })),
        }
    }
}

/// A capture device whose first `acquire` blocks until released, for
/// overlapping two starts deliberately.
struct GatedCapture {
    first_gate: Mutex<Option<oneshot::Receiver<()>>>,
    entered: Notify,
    handles: Mutex<VecDeque<ScriptedHandle>>,
}

impl GatedCapture {
    fn new(gate: oneshot::Receiver<()>) -> Self {
        Self {
            first_gate: Mutex::new(Some(gate)),
            entered: Notify::new(),
            handles: Mutex::new(VecDeque::new()),
        }
    }

    fn push_handle(&self, bytes: Vec<u8>) -> Arc<AtomicUsize> {
        let released = Arc::new(AtomicUsize::new(0));
        self.handles.lock().unwrap().push_back(ScriptedHandle {
            bytes,
            released: released.clone(),
        });
        released
    }
}

#[async_trait]
impl AudioCaptureDevice for GatedCapture {
    async fn acquire(&self) -> PortResult<Box<dyn CaptureHandle>> {
        let handle = self
            .handles
            .lock()
            .unwrap()
            .pop_front()
            .expect("a scripted handle per acquire");
        let gate = self.first_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            self.entered.notify_one();
            rx.await.ok();
        }
        Ok(Box::new(handle))
    }
}

//=========================================================================================
// In-memory archive store, email relay and recipient store
//=========================================================================================

#[derive(Default)]
struct MemArchive {
    items: Mutex<Vec<ArchivedItem>>,
    fail_with: Option<String>,
}

impl MemArchive {
    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl ArchiveStore for MemArchive {
    async fn insert_archived_item(&self, item: &ArchivedItem) -> PortResult<String> {
        if let Some(message) = &self.fail_with {
            return Err(PortError::Constraint(message.clone()));
        }
        self.items.lock().unwrap().push(item.clone());
        Ok(item.archive_id.clone())
    }

    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<ArchivedItem>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MemEmail {
    sent: Mutex<Vec<(String, String, String)>>,
    fail_with: Option<String>,
}

impl MemEmail {
    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl EmailDeliveryService for MemEmail {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> PortResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(PortError::Delivery(message.clone()));
        }
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
struct MemRecipientStore {
    value: Mutex<Option<String>>,
}

#[async_trait]
impl DefaultRecipientStore for MemRecipientStore {
    async fn load(&self) -> PortResult<Option<String>> {
        Ok(self.value.lock().unwrap().clone())
    }

    async fn save(&self, recipient: &str) -> PortResult<()> {
        *self.value.lock().unwrap() = Some(recipient.to_string());
        Ok(())
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

fn base_services() -> SessionServices {
    SessionServices {
        polisher: ScriptedService::always("# Polished\n- point"),
        expander: ScriptedService::always("- expansion"),
        classifier: ScriptedService::always("Business"),
        transcriber: ScriptedService::always("transcript"),
        archive: Arc::new(MemArchive::default()),
        email: Arc::new(MemEmail::default()),
        capture: Arc::new(ScriptedCapture::default()),
        recipient_store: Arc::new(MemRecipientStore::default()),
    }
}

fn test_user() -> User {
    User {
        user_id: Uuid::new_v4(),
        email: Some("owner@example.com".to_string()),
    }
}

//=========================================================================================
// Primary polish flow
//=========================================================================================

#[tokio::test]
async fn overlapping_polish_commits_only_the_newest_generation() {
    let (release_first, gated) = oneshot::channel();
    let polisher = ScriptedService::scripted(vec![
        Reply::Wait(gated),
        Reply::Now(Ok("# Second Draft".to_string())),
    ]);
    let expander = ScriptedService::always("- expansion");
    let mut services = base_services();
    services.polisher = polisher.clone();
    services.expander = expander.clone();
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("messy notes".to_string()).await;

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.polish().await }
    });
    polisher.entered.notified().await;

    // Second submission supersedes the one still in flight.
    coordinator.polish().await;
    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Success);
    assert_eq!(view.draft.polished_outline, "# Second Draft");

    // The first polish finally resolves; its result must be dropped before
    // the dependent calls are even issued.
    release_first.send(Ok("# First Draft".to_string())).unwrap();
    first.await.unwrap();

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Success);
    assert_eq!(view.draft.polished_outline, "# Second Draft");
    assert_eq!(expander.calls(), 1);
}

#[tokio::test]
async fn cancel_during_polish_returns_to_idle_and_discards_the_result() {
    let (release, gated) = oneshot::channel();
    let polisher = ScriptedService::scripted(vec![Reply::Wait(gated)]);
    let mut services = base_services();
    services.polisher = polisher.clone();
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("messy notes".to_string()).await;

    let task = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.polish().await }
    });
    polisher.entered.notified().await;
    assert_eq!(coordinator.view().await.status, DraftStatus::Polishing);

    coordinator.cancel_processing().await;
    assert_eq!(coordinator.view().await.status, DraftStatus::Idle);

    release.send(Ok("# Abandoned".to_string())).unwrap();
    task.await.unwrap();

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Idle);
    assert_eq!(view.draft.polished_outline, "");
    assert_eq!(view.error, None);
}

#[tokio::test]
async fn polish_failure_surfaces_the_raw_service_message() {
    let polisher =
        ScriptedService::scripted(vec![Reply::Now(Err(PortError::Service("rate limited".into())))]);
    let mut services = base_services();
    services.polisher = polisher;
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("launch idea".to_string()).await;

    coordinator.polish().await;

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Error);
    assert_eq!(view.error.as_deref(), Some("rate limited"));
    assert_eq!(view.draft.raw_notes, "launch idea");
    assert_eq!(view.draft.polished_outline, "");
}

#[tokio::test]
async fn dependent_call_failure_leaves_previous_content_untouched() {
    let classifier =
        ScriptedService::scripted(vec![Reply::Now(Err(PortError::Service("overloaded".into())))]);
    let mut services = base_services();
    services.classifier = classifier;
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("some notes".to_string()).await;

    coordinator.polish().await;

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Error);
    assert_eq!(view.error.as_deref(), Some("overloaded"));
    // No partial commit: the successful polish output was not applied.
    assert_eq!(view.draft.polished_outline, "");
    assert_eq!(view.draft.expansion_ideas, "");
}

#[tokio::test]
async fn polish_with_empty_notes_is_rejected_without_a_generation() {
    let polisher = ScriptedService::always("# unused");
    let mut services = base_services();
    services.polisher = polisher.clone();
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("   \n ".to_string()).await;

    coordinator.polish().await;

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Idle);
    assert!(view.error.is_some());
    assert_eq!(polisher.calls(), 0);
}

//=========================================================================================
// Voice capture flow
//=========================================================================================

#[tokio::test]
async fn stopping_with_no_audio_skips_transcription() {
    let capture = Arc::new(ScriptedCapture::default());
    capture.push_handle(Vec::new());
    let transcriber = ScriptedService::always("unused");
    let mut services = base_services();
    services.capture = capture;
    services.transcriber = transcriber.clone();
    let coordinator = SessionCoordinator::new(services);

    coordinator.start_recording().await;
    coordinator.stop_recording().await;

    let view = coordinator.view().await;
    assert!(!view.is_recording);
    assert!(!view.is_transcribing);
    assert_eq!(view.error, None);
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn transcript_appends_with_exactly_one_space_separator() {
    let transcriber = ScriptedService::always("second half");
    let mut services = base_services();
    services.transcriber = transcriber;
    let coordinator = SessionCoordinator::new(services);

    // Appending to empty notes yields exactly the transcript.
    coordinator.start_recording().await;
    coordinator.stop_recording().await;
    assert_eq!(coordinator.view().await.draft.raw_notes, "second half");

    // Appending to non-empty notes inserts a single space.
    coordinator.set_notes("first half ".to_string()).await;
    coordinator.start_recording().await;
    coordinator.stop_recording().await;
    assert_eq!(
        coordinator.view().await.draft.raw_notes,
        "first half second half"
    );
}

#[tokio::test]
async fn empty_transcript_surfaces_the_no_voice_message() {
    let transcriber = ScriptedService::scripted(vec![Reply::Now(Ok("  ".to_string()))]);
    let mut services = base_services();
    services.transcriber = transcriber;
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("existing".to_string()).await;

    coordinator.start_recording().await;
    coordinator.stop_recording().await;

    let view = coordinator.view().await;
    assert_eq!(
        view.error.as_deref(),
        Some("No voice detected. Please try speaking closer to the microphone.")
    );
    assert_eq!(view.draft.raw_notes, "existing");
}

#[tokio::test]
async fn starting_a_second_recording_releases_the_first_handle_once() {
    let capture = Arc::new(ScriptedCapture::default());
    let first_released = capture.push_handle(vec![1]);
    let second_released = capture.push_handle(vec![2]);
    let mut services = base_services();
    services.capture = capture;
    let coordinator = SessionCoordinator::new(services);

    coordinator.start_recording().await;
    coordinator.start_recording().await;

    assert_eq!(first_released.load(Ordering::SeqCst), 1);
    assert_eq!(second_released.load(Ordering::SeqCst), 0);
    assert!(coordinator.view().await.is_recording);

    coordinator.stop_recording().await;
    assert_eq!(second_released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_recording_displaced_by_a_concurrent_start_is_still_released() {
    let (release_first, gate) = oneshot::channel();
    let capture = Arc::new(GatedCapture::new(gate));
    let slow_released = capture.push_handle(vec![1]);
    let fast_released = capture.push_handle(vec![2]);
    let mut services = base_services();
    services.capture = capture.clone();
    let coordinator = SessionCoordinator::new(services);

    // The first start blocks inside the device acquisition.
    let slow = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.start_recording().await }
    });
    capture.entered.notified().await;

    // A second start commits its handle while the first is still acquiring.
    coordinator.start_recording().await;
    assert!(coordinator.view().await.is_recording);

    release_first.send(()).unwrap();
    slow.await.unwrap();

    // Whichever handle the slow start displaced was released exactly once,
    // and exactly one of the two is still live.
    assert_eq!(
        slow_released.load(Ordering::SeqCst) + fast_released.load(Ordering::SeqCst),
        1
    );
    assert!(coordinator.view().await.is_recording);

    coordinator.stop_recording().await;
    assert_eq!(slow_released.load(Ordering::SeqCst), 1);
    assert_eq!(fast_released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn device_denial_surfaces_an_error_without_state_corruption() {
    let mut services = base_services();
    services.capture = ScriptedCapture::denied();
    let coordinator = SessionCoordinator::new(services);

    coordinator.start_recording().await;

    let view = coordinator.view().await;
    assert!(!view.is_recording);
    assert_eq!(view.error.as_deref(), Some("Microphone access denied."));
    assert_eq!(view.status, DraftStatus::Idle);
}

#[tokio::test]
async fn cancel_invalidates_a_transcription_already_in_flight() {
    let (release, gated) = oneshot::channel();
    let transcriber = ScriptedService::scripted(vec![Reply::Wait(gated)]);
    let mut services = base_services();
    services.transcriber = transcriber.clone();
    let coordinator = SessionCoordinator::new(services);
    coordinator.set_notes("keep me".to_string()).await;

    coordinator.start_recording().await;
    let stop = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.stop_recording().await }
    });
    transcriber.entered.notified().await;
    assert!(coordinator.view().await.is_transcribing);

    coordinator.cancel_processing().await;
    assert!(!coordinator.view().await.is_transcribing);

    release.send(Ok("ghost text".to_string())).unwrap();
    stop.await.unwrap();

    let view = coordinator.view().await;
    assert_eq!(view.draft.raw_notes, "keep me");
    assert_eq!(view.error, None);
}

#[tokio::test]
async fn cancel_is_idempotent_when_nothing_is_in_flight() {
    let coordinator = SessionCoordinator::new(base_services());
    coordinator.cancel_processing().await;
    coordinator.cancel_processing().await;

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Idle);
    assert!(!view.is_recording);
    assert!(!view.is_transcribing);
}

//=========================================================================================
// Reset
//=========================================================================================

#[tokio::test]
async fn reset_clears_the_whole_draft() {
    let coordinator = SessionCoordinator::new(base_services());
    coordinator.set_notes("notes".to_string()).await;
    coordinator.polish().await;
    assert_eq!(coordinator.view().await.status, DraftStatus::Success);

    coordinator.reset().await;

    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Idle);
    assert_eq!(view.draft.raw_notes, "");
    assert_eq!(view.draft.polished_outline, "");
    assert_eq!(view.draft.expansion_ideas, "");
    assert_eq!(view.draft.category, "General");
}

//=========================================================================================
// Archive and email
//=========================================================================================

#[tokio::test]
async fn polish_then_archive_end_to_end() {
    let archive = Arc::new(MemArchive::default());
    let mut services = base_services();
    services.polisher = ScriptedService::always("# PetSit Connect\n- walkers on demand");
    services.expander = ScriptedService::always("- scale to vet partnerships");
    services.classifier = ScriptedService::always("Business");
    services.archive = archive.clone();
    let coordinator = SessionCoordinator::new(services);
    coordinator.initialize(Some(test_user())).await;
    coordinator
        .set_notes("launch idea for a pet sitting app".to_string())
        .await;

    coordinator.polish().await;
    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Success);
    assert_eq!(view.draft.category, "Business");
    assert_eq!(
        view.draft.expansion_ideas,
        "- scale to vet partnerships"
    );

    let archive_id = coordinator.archive().await.expect("archive should succeed");
    assert!(archive_id.starts_with("POL-"));

    let stored = archive.items.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "PetSit Connect");
    assert_eq!(stored[0].original_notes, "launch idea for a pet sitting app");
    drop(stored);

    // Success also refreshed the history list.
    let view = coordinator.view().await;
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.history[0].title, "PetSit Connect");
}

#[tokio::test]
async fn archive_without_a_user_asks_for_login() {
    let archive = Arc::new(MemArchive::default());
    let mut services = base_services();
    services.archive = archive.clone();
    let coordinator = SessionCoordinator::new(services);

    assert_eq!(coordinator.archive().await, None);
    assert_eq!(
        coordinator.view().await.error.as_deref(),
        Some("Please login to save ideas to the cloud.")
    );
    assert!(archive.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn archive_failure_is_prefixed_with_context() {
    let mut services = base_services();
    services.archive = MemArchive::failing("duplicate key value");
    let coordinator = SessionCoordinator::new(services);
    coordinator.initialize(Some(test_user())).await;

    assert_eq!(coordinator.archive().await, None);
    assert_eq!(
        coordinator.view().await.error.as_deref(),
        Some("Archiving failed: duplicate key value")
    );
}

#[tokio::test]
async fn email_success_with_save_persists_the_default_recipient() {
    let email = Arc::new(MemEmail::default());
    let recipient_store = Arc::new(MemRecipientStore::default());
    let mut services = base_services();
    services.email = email.clone();
    services.recipient_store = recipient_store.clone();
    let coordinator = SessionCoordinator::new(services.clone());
    coordinator.set_notes("notes".to_string()).await;
    coordinator.polish().await;

    assert!(coordinator.send_email("a@b.com", true).await);

    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@b.com");
    assert_eq!(sent[0].1, "Polished Idea: Polished");
    assert!(sent[0].2.contains("EXPANSION OPPORTUNITIES"));
    drop(sent);

    // Retrievable on next load without re-entry.
    let next_session = SessionCoordinator::new(services);
    next_session.initialize(None).await;
    assert_eq!(
        next_session.view().await.default_recipient.as_deref(),
        Some("a@b.com")
    );
}

#[tokio::test]
async fn email_failure_shows_a_generic_message_and_saves_nothing() {
    let recipient_store = Arc::new(MemRecipientStore::default());
    let mut services = base_services();
    services.email = MemEmail::failing("relay said 550");
    services.recipient_store = recipient_store.clone();
    let coordinator = SessionCoordinator::new(services);

    assert!(!coordinator.send_email("a@b.com", true).await);

    let view = coordinator.view().await;
    assert_eq!(
        view.error.as_deref(),
        Some("Email failed to send. Please check your connection.")
    );
    assert_eq!(*recipient_store.value.lock().unwrap(), None);
}

#[tokio::test]
async fn email_title_falls_back_when_nothing_is_polished() {
    let email = Arc::new(MemEmail::default());
    let mut services = base_services();
    services.email = email.clone();
    let coordinator = SessionCoordinator::new(services);

    assert!(coordinator.send_email("a@b.com", false).await);
    let sent = email.sent.lock().unwrap();
    assert_eq!(sent[0].1, "Polished Idea: Polished Project Outline");
}

//=========================================================================================
// History
//=========================================================================================

#[tokio::test]
async fn loading_a_history_item_restores_it_as_the_live_draft() {
    let archive = Arc::new(MemArchive::default());
    let user = test_user();
    archive
        .insert_archived_item(&ArchivedItem {
            user_id: user.user_id,
            title: "Old Idea".to_string(),
            original_notes: "old notes".to_string(),
            polished_outline: "# Old Idea".to_string(),
            expansion_ideas: "- revisit".to_string(),
            recipient_email: None,
            category: "Creative".to_string(),
            archive_id: "POL-AAAAA".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let mut services = base_services();
    services.archive = archive;
    let coordinator = SessionCoordinator::new(services);
    coordinator.initialize(Some(user)).await;

    assert!(coordinator.load_history_item("POL-AAAAA").await);
    let view = coordinator.view().await;
    assert_eq!(view.status, DraftStatus::Success);
    assert_eq!(view.draft.raw_notes, "old notes");
    assert_eq!(view.draft.polished_outline, "# Old Idea");
    assert_eq!(view.draft.category, "Creative");

    assert!(!coordinator.load_history_item("POL-ZZZZZ").await);
}
