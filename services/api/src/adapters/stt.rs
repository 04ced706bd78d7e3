//! services/api/src/adapters/stt.rs
//!
//! This module contains the adapter for the speech-to-text (Whisper) service.
//! It implements the `TranscriptionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use hound::{WavSpec, WavWriter};
use idea_polisher_core::ports::{PortError, PortResult, TranscriptionService};

const DEFAULT_SAMPLE_RATE: u32 = 48_000;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TranscriptionService` port using the
/// OpenAI Whisper API. Raw PCM16 capture data is WAV-encoded before upload;
/// any other mime type is forwarded as-is.
#[derive(Clone)]
pub struct OpenAiSttAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSttAdapter {
    /// Creates a new `OpenAiSttAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = std::io::Cursor::new(Vec::new());

        let spec = WavSpec {
            channels: 1, // Mono
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::new(&mut cursor, spec)?;

        // Convert byte array to i16 samples. A trailing odd byte is dropped.
        for chunk in pcm_data.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            writer.write_sample(sample)?;
        }

        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

/// Reads the `rate=` parameter from a capture mime type like
/// `audio/pcm;rate=48000`.
fn sample_rate_from_mime(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse::<u32>().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Whisper-style providers may emit a leading space as a tokenization
/// artifact. Only leading whitespace is trimmed so internal formatting is
/// preserved.
fn normalize_transcript(text: String) -> String {
    match text.chars().next() {
        Some(c) if c.is_whitespace() => text.trim_start().to_string(),
        _ => text,
    }
}

//=========================================================================================
// `TranscriptionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TranscriptionService for OpenAiSttAdapter {
    /// Transcribes captured audio into text. An empty result means no
    /// usable speech was detected.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> PortResult<String> {
        let input = if mime_type.starts_with("audio/pcm") {
            let wav_data = Self::pcm16_to_wav(audio, sample_rate_from_mime(mime_type))
                .map_err(|e| PortError::Service(format!("Failed to encode WAV: {}", e)))?;
            AudioInput::from_vec_u8("user_audio.wav".into(), wav_data)
        } else {
            AudioInput::from_vec_u8("user_audio".into(), audio.to_vec())
        };

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.model.clone(),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        Ok(normalize_transcript(response.text))
    }
}
