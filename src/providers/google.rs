use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::app_config::{SynthesisConfig, GOOGLE_ACCESS_TOKEN_ENV, GOOGLE_API_KEY_ENV};
use crate::errors::ProviderError;
use crate::providers::{AudioFormat, SpeechProvider, SynthesisRequest, VoiceGender};

/// How the client authenticates against the API
#[derive(Debug, Clone)]
pub enum GoogleCredentials {
    /// `?key=` query parameter
    ApiKey(String),
    /// `Authorization: Bearer` header
    AccessToken(String),
}

/// Google Cloud Text-to-Speech client
#[derive(Debug)]
pub struct GoogleTts {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the API
    endpoint: String,
    /// Credentials sent with every request
    credentials: GoogleCredentials,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// `text:synthesize` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeSpeechRequest {
    /// Text to synthesize
    pub input: SynthesisInput,
    /// Voice selection
    pub voice: VoiceSelectionParams,
    /// Output encoding
    pub audio_config: AudioConfig,
}

/// Text input of a request
#[derive(Debug, Serialize)]
pub struct SynthesisInput {
    pub text: String,
}

/// Voice parameters of a request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelectionParams {
    pub language_code: String,
    pub ssml_gender: &'static str,
}

/// Audio parameters of a request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: &'static str,
}

/// `text:synthesize` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeSpeechResponse {
    /// Base64 encoded audio
    #[serde(default)]
    pub audio_content: String,
}

impl SynthesizeSpeechRequest {
    /// Map a pipeline request onto the API body
    pub fn from_request(request: &SynthesisRequest) -> Self {
        Self {
            input: SynthesisInput {
                text: request.text.clone(),
            },
            voice: VoiceSelectionParams {
                language_code: request.voice.language_code.clone(),
                ssml_gender: map_gender(request.voice.gender),
            },
            audio_config: AudioConfig {
                audio_encoding: map_audio_format(request.audio_format),
            },
        }
    }
}

/// SSML gender name for a voice gender
pub fn map_gender(gender: VoiceGender) -> &'static str {
    match gender {
        VoiceGender::Male => "MALE",
        VoiceGender::Female => "FEMALE",
        VoiceGender::Neutral => "NEUTRAL",
    }
}

/// API encoding name for an audio format
pub fn map_audio_format(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Mp3 => "MP3",
        // LINEAR16 responses carry a WAV header
        AudioFormat::Wav => "LINEAR16",
    }
}

impl GoogleTts {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, credentials: GoogleCredentials, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            credentials,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }

    /// Create a client from the synthesis configuration
    ///
    /// Credentials come from the config first, then from the environment.
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, ProviderError> {
        let credentials = if let Some(key) = config.resolve_api_key() {
            GoogleCredentials::ApiKey(key)
        } else if let Some(token) = config.resolve_access_token() {
            GoogleCredentials::AccessToken(token)
        } else {
            return Err(ProviderError::AuthenticationError(format!(
                "no Google Cloud credentials configured; set synthesis.api_key or {} (or synthesis.access_token or {})",
                GOOGLE_API_KEY_ENV, GOOGLE_ACCESS_TOKEN_ENV
            )));
        };

        let mut client = Self::new(config.endpoint.clone(), credentials, config.timeout());
        client.max_retries = config.retry_count;
        client.backoff_base_ms = config.retry_backoff_ms;
        Ok(client)
    }

    /// Full URL of the synthesize method
    pub fn synthesize_url(&self) -> Result<Url, ProviderError> {
        let base = format!("{}/v1/text:synthesize", self.endpoint.trim_end_matches('/'));
        let parsed = match &self.credentials {
            GoogleCredentials::ApiKey(key) => Url::parse_with_params(&base, &[("key", key)]),
            GoogleCredentials::AccessToken(_) => Url::parse(&base),
        };
        parsed.map_err(|e| ProviderError::RequestFailed(format!("invalid endpoint '{}': {}", self.endpoint, e)))
    }

    /// Send one request, with exponential backoff on retryable failures
    pub async fn synthesize_speech(&self, body: &SynthesizeSpeechRequest) -> Result<SynthesizeSpeechResponse, ProviderError> {
        let url = self.synthesize_url()?;

        let mut attempt = 0;
        loop {
            let mut request = self.client.post(url.clone()).json(body);
            if let GoogleCredentials::AccessToken(token) = &self.credentials {
                request = request.bearer_auth(token);
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<SynthesizeSpeechResponse>()
                            .await
                            .map_err(|e| ProviderError::ParseError(e.to_string()));
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let error = classify_status(status, error_text);
                    if !is_retryable(&error) {
                        error!("Google TTS API error ({}): {}", status, error);
                        return Err(error);
                    }
                    error
                }
                Err(e) => ProviderError::ConnectionError(e.to_string()),
            };

            attempt += 1;
            if attempt > self.max_retries {
                error!("Google TTS request failed after {} attempt(s): {}", attempt, error);
                return Err(error);
            }

            let backoff_ms = backoff_delay_ms(self.backoff_base_ms, attempt);
            warn!(
                "Google TTS request failed ({}), retrying in {}ms - attempt {}/{}",
                error, backoff_ms, attempt.saturating_add(1), self.max_retries.saturating_add(1)
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }
}

#[async_trait]
impl SpeechProvider for GoogleTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, ProviderError> {
        let body = SynthesizeSpeechRequest::from_request(request);
        debug!(
            "Synthesizing {} chars ({} / {} / {})",
            request.text.chars().count(),
            body.voice.language_code,
            body.voice.ssml_gender,
            body.audio_config.audio_encoding
        );

        let response = self.synthesize_speech(&body).await?;
        decode_audio_content(&response.audio_content)
    }

    fn name(&self) -> &str {
        "Google Cloud Text-to-Speech"
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating at `u64::MAX`
pub fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

/// Decode the base64 `audioContent` field
pub fn decode_audio_content(audio_content: &str) -> Result<Bytes, ProviderError> {
    STANDARD
        .decode(audio_content.trim())
        .map(Bytes::from)
        .map_err(|e| ProviderError::ParseError(format!("invalid audioContent: {}", e)))
}

/// Map a non-success HTTP status to a provider error
pub fn classify_status(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::RateLimitExceeded(_) | ProviderError::ConnectionError(_) => true,
        ProviderError::ApiError { status_code, .. } => *status_code >= 500,
        _ => false,
    }
}
