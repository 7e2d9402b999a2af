use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

use crate::providers::{AudioFormat, VoiceGender};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Voice language code (e.g. "ja", "en-US")
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Voice gender requested from the provider
    #[serde(default)]
    pub voice_gender: VoiceGender,

    /// Encoding of the per-cue clips requested from the provider
    #[serde(default)]
    pub clip_format: AudioFormat,

    /// Speech synthesis config
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Media backend config
    #[serde(default)]
    pub media: MediaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech synthesis provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    // @provider: Google Cloud Text-to-Speech
    #[default]
    Google,
}

impl SynthesisProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Cloud Text-to-Speech",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
        }
    }
}

impl std::fmt::Display for SynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for SynthesisProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Speech synthesis service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: SynthesisProvider,

    // @field: Service URL
    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,

    // @field: API key (falls back to GOOGLE_API_KEY)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: OAuth access token (falls back to GOOGLE_OAUTH_ACCESS_TOKEN)
    #[serde(default = "String::new")]
    pub access_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_synthesis_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::default(),
            endpoint: default_google_endpoint(),
            api_key: String::new(),
            access_token: String::new(),
            timeout_secs: default_synthesis_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl SynthesisConfig {
    /// API key from the config, then from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        non_empty(&self.api_key).or_else(|| env_non_empty(GOOGLE_API_KEY_ENV))
    }

    /// Access token from the config, then from the environment
    pub fn resolve_access_token(&self) -> Option<String> {
        non_empty(&self.access_token).or_else(|| env_non_empty(GOOGLE_ACCESS_TOKEN_ENV))
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Upper bound for `synthesis.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

/// Environment variable holding a Google API key
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable holding a Google OAuth access token
pub const GOOGLE_ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Media backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Timeout for a single ffmpeg invocation in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,

    /// Sample rate of the composite track
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel count of the composite track
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// LAME VBR quality (0 = best, 9 = worst)
    #[serde(default)]
    pub mp3_quality: u8,

    /// Video rendering settings
    #[serde(default)]
    pub video: VideoConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_media_timeout_secs(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            mp3_quality: 0,
            video: VideoConfig::default(),
        }
    }
}

impl MediaConfig {
    /// Timeout for a single ffmpeg invocation
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for video output
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VideoConfig {
    /// Frame width in pixels
    #[serde(default = "default_video_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_video_height")]
    pub height: u32,

    /// Frames per second of the background
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Background color (any ffmpeg color name or hex)
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Font size of the burned-in subtitles
    #[serde(default = "default_subtitle_font_size")]
    pub subtitle_font_size: u32,

    /// Font size of the elapsed-time readout
    #[serde(default = "default_timecode_font_size")]
    pub timecode_font_size: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_video_width(),
            height: default_video_height(),
            frame_rate: default_frame_rate(),
            background_color: default_background_color(),
            subtitle_font_size: default_subtitle_font_size(),
            timecode_font_size: default_timecode_font_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| non_empty(&value))
}

fn default_language_code() -> String {
    "ja".to_string()
}

fn default_google_endpoint() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_synthesis_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_media_timeout_secs() -> u64 {
    600
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_channels() -> u16 {
    2
}

fn default_video_width() -> u32 {
    1280
}

fn default_video_height() -> u32 {
    720
}

fn default_frame_rate() -> u32 {
    30
}

fn default_background_color() -> String {
    "black".to_string()
}

fn default_subtitle_font_size() -> u32 {
    24
}

fn default_timecode_font_size() -> u32 {
    48
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.language_code)?;

        if self.media.sample_rate == 0 {
            return Err(anyhow!("Sample rate must be greater than zero"));
        }

        if !(1..=2).contains(&self.media.channels) {
            return Err(anyhow!("Channel count must be 1 or 2, got {}", self.media.channels));
        }

        if self.media.mp3_quality > 9 {
            return Err(anyhow!("MP3 quality must be between 0 and 9, got {}", self.media.mp3_quality));
        }

        if self.media.timeout_secs == 0 || self.synthesis.timeout_secs == 0 {
            return Err(anyhow!("Timeouts must be greater than zero"));
        }

        let video = &self.media.video;
        if video.width == 0 || video.height == 0 || video.frame_rate == 0 {
            return Err(anyhow!(
                "Video size and frame rate must be greater than zero ({}x{} @ {})",
                video.width, video.height, video.frame_rate
            ));
        }

        if self.synthesis.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!(
                "Retry count must be at most {}, got {}",
                MAX_RETRY_COUNT, self.synthesis.retry_count
            ));
        }

        if self.synthesis.endpoint.trim().is_empty() {
            return Err(anyhow!("Synthesis endpoint must not be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language_code: default_language_code(),
            voice_gender: VoiceGender::default(),
            clip_format: AudioFormat::default(),
            synthesis: SynthesisConfig::default(),
            media: MediaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
