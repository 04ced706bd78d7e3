//! crates/idea_polisher_core/src/session.rs
//!
//! The Session Coordinator: owns the live draft, the generation counter and
//! the stale-result guard, and sequences every asynchronous action against
//! the collaborator ports.
//!
//! All mutable session state lives behind one `Mutex`, and the lock is never
//! held across an external-service await. Every async action captures the
//! generation current at the moment it is initiated and re-checks it under
//! the lock immediately before committing anything, so the last-issued
//! generation always wins regardless of completion order.

use crate::domain::{ArchivedItem, Draft, DraftStatus, User};
use crate::ports::{
    ArchiveStore, AudioCaptureDevice, CaptureHandle, CategoryService, DefaultRecipientStore,
    EmailDeliveryService, ExpansionService, PolishingService, PortError, TranscriptionService,
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

//=========================================================================================
// User-Facing Messages
//=========================================================================================

const MSG_EMPTY_NOTES: &str = "Add some notes before polishing.";
const MSG_MIC_DENIED: &str = "Microphone access denied.";
const MSG_NO_VOICE: &str = "No voice detected. Please try speaking closer to the microphone.";
const MSG_LOGIN_REQUIRED: &str = "Please login to save ideas to the cloud.";
const MSG_EMAIL_FAILED: &str = "Email failed to send. Please check your connection.";

const FALLBACK_ARCHIVE_TITLE: &str = "Untitled Project";
const FALLBACK_EMAIL_TITLE: &str = "Polished Project Outline";

//=========================================================================================
// Service Bundle and Session State
//=========================================================================================

/// The collaborator ports a session works against.
#[derive(Clone)]
pub struct SessionServices {
    pub polisher: Arc<dyn PolishingService>,
    pub expander: Arc<dyn ExpansionService>,
    pub classifier: Arc<dyn CategoryService>,
    pub transcriber: Arc<dyn TranscriptionService>,
    pub archive: Arc<dyn ArchiveStore>,
    pub email: Arc<dyn EmailDeliveryService>,
    pub capture: Arc<dyn AudioCaptureDevice>,
    pub recipient_store: Arc<dyn DefaultRecipientStore>,
}

/// A live recording, tagged with the generation current when it started.
/// The transcription issued after stop is guarded by that generation, not
/// the one current at stop time.
struct ActiveRecording {
    handle: Box<dyn CaptureHandle>,
    generation: u64,
}

/// All mutable state for one user session.
struct SessionState {
    generation: u64,
    status: DraftStatus,
    draft: Draft,
    error: Option<String>,
    recording: Option<ActiveRecording>,
    transcribing: bool,
    user: Option<User>,
    history: Vec<ArchivedItem>,
    default_recipient: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            generation: 0,
            status: DraftStatus::Idle,
            draft: Draft::default(),
            error: None,
            recording: None,
            transcribing: false,
            user: None,
            history: Vec::new(),
            default_recipient: None,
        }
    }

    /// Increments the counter and returns the new current generation,
    /// invalidating every result still in flight.
    fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// A read-only clone of the state, for the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub status: DraftStatus,
    pub draft: Draft,
    pub error: Option<String>,
    pub is_recording: bool,
    pub is_transcribing: bool,
    pub user_email: Option<String>,
    pub default_recipient: Option<String>,
    pub history: Vec<ArchivedItem>,
}

//=========================================================================================
// SessionCoordinator
//=========================================================================================

/// Orchestrates the polish / voice / archive / email flows for one session.
///
/// Cheap to clone; clones share the same state, so operations may be run
/// from concurrently spawned tasks and still serialize their commits.
#[derive(Clone)]
pub struct SessionCoordinator {
    services: SessionServices,
    state: Arc<Mutex<SessionState>>,
}

impl SessionCoordinator {
    pub fn new(services: SessionServices) -> Self {
        Self {
            services,
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Resolves the session's user and preloads the default recipient and,
    /// when logged in, the archive history.
    pub async fn initialize(&self, user: Option<User>) {
        match self.services.recipient_store.load().await {
            Ok(saved) => self.state.lock().await.default_recipient = saved,
            Err(e) => warn!(error = %e, "failed to load default recipient"),
        }
        let logged_in = user.is_some();
        self.state.lock().await.user = user;
        if logged_in {
            self.refresh_history().await;
        }
    }

    pub async fn view(&self) -> SessionView {
        let s = self.state.lock().await;
        SessionView {
            status: s.status,
            draft: s.draft.clone(),
            error: s.error.clone(),
            is_recording: s.recording.is_some(),
            is_transcribing: s.transcribing,
            user_email: s.user.as_ref().and_then(|u| u.email.clone()),
            default_recipient: s.default_recipient.clone(),
            history: s.history.clone(),
        }
    }

    pub async fn set_notes(&self, text: String) {
        self.state.lock().await.draft.raw_notes = text;
    }

    async fn is_current(&self, generation: u64) -> bool {
        self.state.lock().await.generation == generation
    }

    //-------------------------------------------------------------------------------------
    // Primary "polish" flow
    //-------------------------------------------------------------------------------------

    /// Submits the raw notes for polishing, then fans out to the expansion
    /// and classification calls. All three results commit together; a result
    /// from a superseded generation is dropped without touching state.
    pub async fn polish(&self) {
        let (generation, raw_notes) = {
            let mut s = self.state.lock().await;
            if s.draft.raw_notes.trim().is_empty() {
                s.error = Some(MSG_EMPTY_NOTES.to_string());
                return;
            }
            let generation = s.begin_generation();
            s.status = DraftStatus::Polishing;
            s.error = None;
            (generation, s.draft.raw_notes.clone())
        };

        let polished = match self.services.polisher.polish(&raw_notes).await {
            Ok(text) => text,
            Err(e) => {
                self.fail_polish_if_current(generation, e).await;
                return;
            }
        };

        // Guard before the dependent calls: no point paying for expansion
        // and classification of an outline nobody will see.
        if !self.is_current(generation).await {
            debug!(generation, "discarding stale polish result");
            return;
        }

        let outcome = futures::try_join!(
            self.services.expander.expand(&polished),
            self.services.classifier.classify(&polished),
        );

        let mut s = self.state.lock().await;
        if s.generation != generation {
            debug!(generation, "discarding stale expansion/classification results");
            return;
        }
        match outcome {
            Ok((expansion, category)) => {
                s.draft.polished_outline = polished;
                s.draft.expansion_ideas = expansion;
                s.draft.category = category;
                s.status = DraftStatus::Success;
            }
            Err(e) => {
                error!(error = %e, "polish flow failed");
                s.error = Some(e.to_string());
                s.status = DraftStatus::Error;
            }
        }
    }

    async fn fail_polish_if_current(&self, generation: u64, e: PortError) {
        let mut s = self.state.lock().await;
        if s.generation != generation {
            debug!(generation, "discarding stale polish failure");
            return;
        }
        error!(error = %e, "polishing call failed");
        s.error = Some(e.to_string());
        s.status = DraftStatus::Error;
    }

    //-------------------------------------------------------------------------------------
    // Voice capture flow
    //-------------------------------------------------------------------------------------

    /// Acquires the capture device and starts a recording. A recording that
    /// is still live is stopped and released first, so at most one handle
    /// exists at any time.
    pub async fn start_recording(&self) {
        let previous = {
            let mut s = self.state.lock().await;
            s.error = None;
            s.recording.take()
        };
        if let Some(rec) = previous {
            // The superseded recording's audio is discarded.
            if let Err(e) = rec.handle.stop().await {
                warn!(error = %e, "failed to stop superseded recording");
            }
        }

        match self.services.capture.acquire().await {
            Ok(handle) => {
                let displaced = {
                    let mut s = self.state.lock().await;
                    let generation = s.generation;
                    s.recording.replace(ActiveRecording { handle, generation })
                };
                // Another start may have committed while this one was still
                // acquiring the device; its handle must still be released.
                if let Some(rec) = displaced {
                    if let Err(e) = rec.handle.stop().await {
                        warn!(error = %e, "failed to stop superseded recording");
                    }
                }
            }
            Err(PortError::PermissionDenied) => {
                self.state.lock().await.error = Some(MSG_MIC_DENIED.to_string());
            }
            Err(e) => {
                self.state.lock().await.error = Some(e.to_string());
            }
        }
    }

    /// Stops the live recording, releases the device, and transcribes the
    /// captured audio. Transcribed text is appended to the raw notes, never
    /// replacing them. With zero captured bytes the transcription service is
    /// not invoked at all.
    pub async fn stop_recording(&self) {
        let Some(rec) = self.state.lock().await.recording.take() else {
            return;
        };
        let generation = rec.generation;

        let captured = match rec.handle.stop().await {
            Ok(captured) => captured,
            Err(e) => {
                let mut s = self.state.lock().await;
                if s.generation == generation {
                    s.error = Some(e.to_string());
                }
                return;
            }
        };
        if captured.bytes.is_empty() {
            return;
        }

        {
            let mut s = self.state.lock().await;
            if s.generation != generation {
                return;
            }
            s.transcribing = true;
        }

        let result = self
            .services
            .transcriber
            .transcribe(&captured.bytes, &captured.mime_type)
            .await;

        let mut s = self.state.lock().await;
        // The call is no longer in flight either way; the flag is transient
        // UI state, not a result, so the guard does not apply to it.
        s.transcribing = false;
        if s.generation != generation {
            debug!(generation, "discarding stale transcription result");
            return;
        }
        match result {
            Ok(text) if text.trim().is_empty() => {
                s.error = Some(MSG_NO_VOICE.to_string());
            }
            Ok(text) => {
                s.draft.raw_notes = if s.draft.raw_notes.trim().is_empty() {
                    text
                } else {
                    format!("{} {}", s.draft.raw_notes.trim(), text)
                };
            }
            Err(e) => {
                s.error = Some(e.to_string());
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Cancel and reset
    //-------------------------------------------------------------------------------------

    /// Invalidates all in-flight work: advances the generation, force-stops
    /// any live recording, clears the transcribing flag and returns a
    /// Polishing status to Idle. Safe to call when nothing is in flight.
    pub async fn cancel_processing(&self) {
        let recording = {
            let mut s = self.state.lock().await;
            s.begin_generation();
            s.transcribing = false;
            if s.status == DraftStatus::Polishing {
                s.status = DraftStatus::Idle;
            }
            s.error = None;
            s.recording.take()
        };
        if let Some(rec) = recording {
            // Released unconditionally; the audio is discarded.
            if let Err(e) = rec.handle.stop().await {
                warn!(error = %e, "failed to release recording during cancel");
            }
        }
    }

    /// Cancels everything in flight and clears the draft back to empty.
    pub async fn reset(&self) {
        self.cancel_processing().await;
        let mut s = self.state.lock().await;
        s.draft = Draft::default();
        s.status = DraftStatus::Idle;
    }

    //-------------------------------------------------------------------------------------
    // Archive and email
    //-------------------------------------------------------------------------------------

    /// Persists a snapshot of the current draft to the archive store.
    /// Returns the archive id on success.
    pub async fn archive(&self) -> Option<String> {
        let item = {
            let mut s = self.state.lock().await;
            let Some(user) = s.user.clone() else {
                s.error = Some(MSG_LOGIN_REQUIRED.to_string());
                return None;
            };
            s.error = None;
            ArchivedItem {
                user_id: user.user_id,
                title: derive_title(&s.draft.polished_outline, FALLBACK_ARCHIVE_TITLE),
                original_notes: s.draft.raw_notes.clone(),
                polished_outline: s.draft.polished_outline.clone(),
                expansion_ideas: s.draft.expansion_ideas.clone(),
                recipient_email: s.default_recipient.clone().or_else(|| user.email.clone()),
                category: s.draft.category.clone(),
                archive_id: new_archive_id(),
                created_at: Utc::now(),
            }
        };

        match self.services.archive.insert_archived_item(&item).await {
            Ok(archive_id) => {
                self.refresh_history().await;
                Some(archive_id)
            }
            Err(e) => {
                self.state.lock().await.error = Some(format!("Archiving failed: {}", e));
                None
            }
        }
    }

    /// Sends the polished draft to `recipient`. On success with
    /// `save_as_default`, the recipient becomes the new default. Delivery
    /// failures show a generic message; the relay's error is only logged.
    pub async fn send_email(&self, recipient: &str, save_as_default: bool) -> bool {
        let (subject, body) = {
            let mut s = self.state.lock().await;
            s.error = None;
            let title = derive_title(&s.draft.polished_outline, FALLBACK_EMAIL_TITLE);
            let subject = format!("Polished Idea: {}", title);
            let body = format!(
                "Your project is ready!\n\n{}\n\n---\nEXPANSION OPPORTUNITIES\n{}",
                s.draft.polished_outline, s.draft.expansion_ideas
            );
            (subject, body)
        };

        match self.services.email.send(recipient, &subject, &body).await {
            Ok(()) => {
                if save_as_default {
                    match self.services.recipient_store.save(recipient).await {
                        Ok(()) => {
                            self.state.lock().await.default_recipient =
                                Some(recipient.to_string());
                        }
                        Err(e) => warn!(error = %e, "failed to persist default recipient"),
                    }
                }
                true
            }
            Err(e) => {
                error!(error = %e, "email delivery failed");
                self.state.lock().await.error = Some(MSG_EMAIL_FAILED.to_string());
                false
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // History
    //-------------------------------------------------------------------------------------

    /// Re-fetches the archive history. A fetch failure keeps the previous
    /// list and is not surfaced to the user.
    pub async fn refresh_history(&self) {
        let user_id = match &self.state.lock().await.user {
            Some(user) => user.user_id,
            None => return,
        };
        match self.services.archive.list_history(user_id).await {
            Ok(items) => self.state.lock().await.history = items,
            Err(e) => warn!(error = %e, "failed to refresh history"),
        }
    }

    /// Restores an archived item as the live draft.
    pub async fn load_history_item(&self, archive_id: &str) -> bool {
        let mut s = self.state.lock().await;
        let Some(item) = s.history.iter().find(|i| i.archive_id == archive_id).cloned() else {
            return false;
        };
        s.draft.raw_notes = item.original_notes;
        s.draft.polished_outline = item.polished_outline;
        s.draft.expansion_ideas = item.expansion_ideas;
        s.draft.category = item.category;
        s.status = DraftStatus::Success;
        s.error = None;
        true
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// The title of a draft is its first markdown `# ` heading line.
fn derive_title(outline: &str, fallback: &str) -> String {
    outline
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn new_archive_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("POL-{}", suffix)
}
