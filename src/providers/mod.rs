/*!
 * Speech synthesis providers.
 *
 * This module defines the contract the pipeline uses to turn one cue's text
 * into encoded audio, and the client implementations behind it:
 * - Google: Google Cloud Text-to-Speech REST API
 * - Mock: tone generator used by tests and offline runs
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// Encoding of the audio returned by a provider
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension used for clips in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mp3 => write!(f, "MP3"),
            Self::Wav => write!(f, "WAV"),
        }
    }
}

/// Gender of the requested voice
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
    #[default]
    Neutral,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "MALE"),
            Self::Female => write!(f, "FEMALE"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Voice selection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelection {
    /// Language code (e.g. "ja-JP", "en-US")
    pub language_code: String,
    /// Gender of the voice
    pub gender: VoiceGender,
}

impl VoiceSelection {
    pub fn new(language_code: impl Into<String>, gender: VoiceGender) -> Self {
        Self {
            language_code: language_code.into(),
            gender,
        }
    }
}

/// One synthesis request, built per cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Voice to speak it with
    pub voice: VoiceSelection,
    /// Encoding of the returned audio
    pub audio_format: AudioFormat,
    /// Where the clip starts in the composite; never sent to the provider
    pub start_offset: Duration,
}

/// Common trait for all speech providers
///
/// Implementations turn the text of one request into encoded audio bytes.
/// Any error is fatal to the current run; providers may retry internally
/// but the pipeline never does.
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    /// Synthesize one request
    ///
    /// # Returns
    /// * `Result<Bytes, ProviderError>` - The encoded audio or an error
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, ProviderError>;

    /// Human readable provider name for logs
    fn name(&self) -> &str;
}

pub mod google;
pub mod mock;
