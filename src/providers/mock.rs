/*!
 * Mock speech provider for testing.
 *
 * This module provides a stub gateway that simulates different behaviors:
 * - `MockProvider::tone(duration)` - Always succeeds with a fixed-length sine tone
 * - `MockProvider::fail_at(n)` - Succeeds until the n-th request, then fails
 * - `MockProvider::failing()` - Always fails with an error
 *
 * Tones are rendered as 16-bit mono WAV regardless of the requested format;
 * the media backend probes content, not extensions.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{SpeechProvider, SynthesisRequest};

/// Sample rate of generated tones
pub const MOCK_SAMPLE_RATE: u32 = 22_050;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tone
    Tone { duration: Duration, frequency: f32 },
    /// Fails on the request with this zero-based index, tones otherwise
    FailAt { index: usize, duration: Duration },
    /// Always fails with an error
    Failing,
    /// Returns no audio at all
    Empty,
}

/// Mock provider for testing synthesis behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Every request seen, in order
    requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a provider returning 440 Hz tones of a fixed duration
    pub fn tone(duration: Duration) -> Self {
        Self::new(MockBehavior::Tone {
            duration,
            frequency: 440.0,
        })
    }

    /// Create a provider failing on the given request index
    pub fn fail_at(index: usize, duration: Duration) -> Self {
        Self::new(MockBehavior::FailAt { index, duration })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty audio
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().clone()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let (duration, frequency) = match self.behavior {
            MockBehavior::Tone { duration, frequency } => (duration, frequency),
            MockBehavior::FailAt { index, .. } if index == count => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: format!("Simulated failure on request {}", count),
                });
            }
            MockBehavior::FailAt { duration, .. } => (duration, 440.0),
            MockBehavior::Failing => {
                return Err(ProviderError::ConnectionError("Simulated connection failure".to_string()));
            }
            MockBehavior::Empty => return Ok(Bytes::new()),
        };

        tone_wav(duration, frequency, MOCK_SAMPLE_RATE)
            .map(Bytes::from)
            .map_err(|e| ProviderError::RequestFailed(format!("failed to render tone: {}", e)))
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

/// Render a mono 16-bit sine tone as an in-memory WAV file
pub fn tone_wav(duration: Duration, frequency: f32, sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let samples = (duration.as_secs_f64() * f64::from(sample_rate)).round() as u64;
    let amplitude = f32::from(i16::MAX) * 0.5;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for n in 0..samples {
            let t = n as f32 / sample_rate as f32;
            let value = (t * frequency * std::f32::consts::TAU).sin() * amplitude;
            writer.write_sample(value as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
