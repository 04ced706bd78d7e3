pub mod domain;
pub mod ports;
pub mod session;

pub use domain::{ArchivedItem, CapturedAudio, Draft, DraftStatus, User, DEFAULT_CATEGORY};
pub use ports::{
    ArchiveStore, AudioCaptureDevice, AuthService, CaptureHandle, CategoryService,
    DefaultRecipientStore, EmailDeliveryService, ExpansionService, PolishingService, PortError,
    PortResult, TranscriptionService,
};
pub use session::{SessionCoordinator, SessionServices, SessionView};
