//! services/api/src/adapters/capture.rs
//!
//! Adapter for the audio capture device. The browser owns the microphone;
//! what reaches the server is a stream of raw PCM frames over the WebSocket.
//! This device exposes that stream through the `AudioCaptureDevice` port so
//! the coordinator owns the recording lifecycle: a handle is live between
//! `acquire` and `stop`, and frames fed outside that window are dropped.

use async_trait::async_trait;
use idea_polisher_core::domain::CapturedAudio;
use idea_polisher_core::ports::{AudioCaptureDevice, CaptureHandle, PortError, PortResult};
use std::sync::{Arc, Mutex};

/// The mime type of audio fed by the browser client.
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=48000";

/// `Some` while a recording is live, `None` otherwise.
type SharedBuffer = Arc<Mutex<Option<Vec<u8>>>>;

//=========================================================================================
// Device
//=========================================================================================

/// A per-connection capture device fed by WebSocket binary frames.
pub struct WsCaptureDevice {
    buffer: SharedBuffer,
    mime_type: String,
    allowed: bool,
}

impl WsCaptureDevice {
    /// `allowed` is false when the client reported that microphone access
    /// was refused; acquiring then fails with `PermissionDenied`.
    pub fn new(allowed: bool) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(None)),
            mime_type: PCM_MIME_TYPE.to_string(),
            allowed,
        }
    }

    /// Appends an incoming audio frame to the live recording. Frames that
    /// arrive while no recording is live are dropped.
    pub fn feed(&self, data: &[u8]) {
        if let Some(buffer) = self.buffer.lock().unwrap().as_mut() {
            buffer.extend_from_slice(data);
        }
    }
}

#[async_trait]
impl AudioCaptureDevice for WsCaptureDevice {
    async fn acquire(&self) -> PortResult<Box<dyn CaptureHandle>> {
        if !self.allowed {
            return Err(PortError::PermissionDenied);
        }
        *self.buffer.lock().unwrap() = Some(Vec::new());
        Ok(Box::new(WsCaptureHandle {
            buffer: self.buffer.clone(),
            mime_type: self.mime_type.clone(),
        }))
    }
}

//=========================================================================================
// Handle
//=========================================================================================

struct WsCaptureHandle {
    buffer: SharedBuffer,
    mime_type: String,
}

#[async_trait]
impl CaptureHandle for WsCaptureHandle {
    async fn stop(self: Box<Self>) -> PortResult<CapturedAudio> {
        // Taking the buffer out ends the live window; later frames are dropped.
        let bytes = self.buffer.lock().unwrap().take().unwrap_or_default();
        Ok(CapturedAudio {
            bytes,
            mime_type: self.mime_type,
        })
    }
}
