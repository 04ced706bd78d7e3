//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use idea_polisher_core::ports::{
    ArchiveStore, AudioCaptureDevice, AuthService, CategoryService, DefaultRecipientStore,
    EmailDeliveryService, ExpansionService, PolishingService, TranscriptionService,
};
use idea_polisher_core::session::SessionServices;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers. Everything here is connection-independent; the one
/// per-connection collaborator (the capture device) is supplied when a
/// session's service bundle is assembled.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub archive: Arc<dyn ArchiveStore>,
    pub polisher: Arc<dyn PolishingService>,
    pub expander: Arc<dyn ExpansionService>,
    pub classifier: Arc<dyn CategoryService>,
    pub transcriber: Arc<dyn TranscriptionService>,
    pub email: Arc<dyn EmailDeliveryService>,
    pub recipient_store: Arc<dyn DefaultRecipientStore>,
}

impl AppState {
    /// Builds the service bundle for one session, pairing the shared
    /// adapters with that connection's capture device.
    pub fn session_services(&self, capture: Arc<dyn AudioCaptureDevice>) -> SessionServices {
        SessionServices {
            polisher: self.polisher.clone(),
            expander: self.expander.clone(),
            classifier: self.classifier.clone(),
            transcriber: self.transcriber.clone(),
            archive: self.archive.clone(),
            email: self.email.clone(),
            capture,
            recipient_store: self.recipient_store.clone(),
        }
    }
}
