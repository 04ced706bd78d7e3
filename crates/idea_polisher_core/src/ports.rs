//! crates/idea_polisher_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases,
//! AI providers or mail relays.

use crate::domain::{ArchivedItem, CapturedAudio, User};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by all port operations.
///
/// `Service`, `Network`, `Constraint` and `Delivery` carry the collaborator's
/// own message and display it verbatim: the coordinator passes service errors
/// through to the user unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Access to a device (the microphone) was refused.
    #[error("permission denied")]
    PermissionDenied,
    /// An external AI/service call failed.
    #[error("{0}")]
    Service(String),
    /// The data store or auth backend could not be reached.
    #[error("{0}")]
    Network(String),
    /// The data store rejected the record.
    #[error("{0}")]
    Constraint(String),
    /// The mail relay refused or failed the delivery.
    #[error("{0}")]
    Delivery(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Reformats rough notes into a structured markdown outline.
#[async_trait]
pub trait PolishingService: Send + Sync {
    async fn polish(&self, raw_notes: &str) -> PortResult<String>;
}

/// Derives expansion suggestions from a polished outline.
#[async_trait]
pub trait ExpansionService: Send + Sync {
    async fn expand(&self, polished_outline: &str) -> PortResult<String>;
}

/// Classifies a polished outline into a single category label.
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn classify(&self, polished_outline: &str) -> PortResult<String>;
}

/// Turns captured audio into text.
///
/// An empty string is a valid outcome and means no usable speech was
/// detected; it is distinct from a `Service` failure.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> PortResult<String>;
}

/// The relational store holding archived drafts, keyed by user id.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Persists a snapshot and returns its archive id.
    async fn insert_archived_item(&self, item: &ArchivedItem) -> PortResult<String>;

    /// Returns the user's archived items, newest first.
    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<ArchivedItem>>;
}

/// The hosted passwordless authentication backend.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn request_magic_link(&self, email: &str) -> PortResult<()>;

    /// Resolves an access token to its user, or `None` if the token is
    /// missing, expired or otherwise not a session.
    async fn current_session(&self, access_token: &str) -> PortResult<Option<User>>;

    async fn sign_out(&self, access_token: &str) -> PortResult<()>;
}

/// Outbound transactional email. Fire-and-forget: no state is retained
/// after success or failure is reported.
#[async_trait]
pub trait EmailDeliveryService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> PortResult<()>;
}

/// A live recording. Stopping consumes the handle, which is what guarantees
/// the underlying hardware tracks are released exactly once per start.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Stops the underlying tracks unconditionally and hands back whatever
    /// audio was captured (possibly zero bytes).
    async fn stop(self: Box<Self>) -> PortResult<CapturedAudio>;
}

/// The audio capture device.
#[async_trait]
pub trait AudioCaptureDevice: Send + Sync {
    /// Acquires the device. Fails with `PermissionDenied` when the user
    /// refuses microphone access.
    async fn acquire(&self) -> PortResult<Box<dyn CaptureHandle>>;
}

/// The local persistent key-value store. A single fixed key is in use:
/// the default recipient email.
#[async_trait]
pub trait DefaultRecipientStore: Send + Sync {
    async fn load(&self) -> PortResult<Option<String>>;
    async fn save(&self, recipient: &str) -> PortResult<()>;
}
