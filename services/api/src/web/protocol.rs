//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! API server for the idea polisher application.

use chrono::{DateTime, Utc};
use idea_polisher_core::domain::{ArchivedItem, DraftStatus};
use idea_polisher_core::session::SessionView;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================
// NOTE: microphone audio is sent as raw Binary frames, not as part of this
// enum. Binary frames are buffered only while a recording is live.
//=========================================================================================

fn default_true() -> bool {
    true
}

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a session. This must be the first message sent on the
    /// connection. `mic_access` is false when the browser refused
    /// microphone permission.
    Init {
        access_token: Option<String>,
        #[serde(default = "default_true")]
        mic_access: bool,
    },

    /// Replaces the raw notes with the textarea's current content.
    SetNotes { text: String },

    /// Submits the raw notes for polishing. Supersedes any polish still in
    /// flight.
    Polish,

    /// Starts a voice recording; subsequent binary frames are captured.
    StartRecording,

    /// Stops the recording and transcribes whatever was captured.
    StopRecording,

    /// Cancels all in-flight work without clearing the draft.
    CancelProcessing,

    /// Cancels all in-flight work and clears the draft.
    Reset,

    /// Archives the current draft to the cloud store.
    Archive,

    /// Emails the polished draft to `recipient`.
    SendEmail {
        recipient: String,
        save_as_default: bool,
    },

    /// Restores an archived item as the live draft.
    LoadHistoryItem { archive_id: String },

    /// Re-fetches the archive history.
    RefreshHistory,

    /// Clears the currently displayed error.
    DismissError,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// The polish status as shown to the client.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Idle,
    Polishing,
    Success,
    Error,
}

impl From<DraftStatus> for StatusLabel {
    fn from(status: DraftStatus) -> Self {
        match status {
            DraftStatus::Idle => StatusLabel::Idle,
            DraftStatus::Polishing => StatusLabel::Polishing,
            DraftStatus::Success => StatusLabel::Success,
            DraftStatus::Error => StatusLabel::Error,
        }
    }
}

/// A full snapshot of the session's displayable state. The server pushes
/// one after every command and after every async completion, so the client
/// never has to merge partial updates.
#[derive(Serialize, Debug, Clone)]
pub struct SessionSnapshot {
    pub status: StatusLabel,
    pub raw_notes: String,
    pub polished_outline: String,
    pub expansion_ideas: String,
    pub category: String,
    pub error: Option<String>,
    pub is_recording: bool,
    pub is_transcribing: bool,
}

impl From<&SessionView> for SessionSnapshot {
    fn from(view: &SessionView) -> Self {
        Self {
            status: view.status.into(),
            raw_notes: view.draft.raw_notes.clone(),
            polished_outline: view.draft.polished_outline.clone(),
            expansion_ideas: view.draft.expansion_ideas.clone(),
            category: view.draft.category.clone(),
            error: view.error.clone(),
            is_recording: view.is_recording,
            is_transcribing: view.is_transcribing,
        }
    }
}

/// One entry in the client's history panel.
#[derive(Serialize, Debug, Clone)]
pub struct HistoryEntry {
    pub archive_id: String,
    pub title: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ArchivedItem> for HistoryEntry {
    fn from(item: &ArchivedItem) -> Self {
        Self {
            archive_id: item.archive_id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            created_at: item.created_at,
        }
    }
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms a successful Init and reports who is logged in.
    SessionReady {
        user_email: Option<String>,
        default_recipient: Option<String>,
    },

    /// A full state snapshot.
    State(SessionSnapshot),

    /// The current draft was archived.
    Archived { archive_id: String },

    /// The email delivery succeeded.
    EmailSent,

    /// The user's archive history, newest first.
    History { items: Vec<HistoryEntry> },

    /// Reports a protocol-level error (bad init, unparseable message).
    Error { message: String },
}
