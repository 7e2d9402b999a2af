/*!
 * Fake media backend for tests that must not depend on ffmpeg.
 *
 * Durations come from an explicit per-path table, then from the WAV header
 * of the file, then from a fixed default. Graphs and video jobs are
 * recorded so tests can inspect what the pipeline asked for.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vttspeak::errors::MediaError;
use vttspeak::media::{AudioEncoding, AudioGraph, MediaBackend, VideoJob};

/// Bytes returned by a successful encode
pub const FAKE_MP3: &[u8] = b"ID3-fake-mp3";

/// Bytes written by a successful render
pub const FAKE_MP4: &[u8] = b"fake-mp4-container";

/// Which operation should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Nothing,
    Probe,
    Encode,
    Render,
}

#[derive(Debug)]
pub struct FakeMediaBackend {
    durations: HashMap<PathBuf, Duration>,
    default_duration: Duration,
    fail_on: FailOn,
    graphs: Arc<Mutex<Vec<AudioGraph>>>,
    jobs: Arc<Mutex<Vec<VideoJob>>>,
    probes: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeMediaBackend {
    pub fn new() -> Self {
        Self {
            durations: HashMap::new(),
            default_duration: Duration::from_millis(1000),
            fail_on: FailOn::Nothing,
            graphs: Arc::new(Mutex::new(Vec::new())),
            jobs: Arc::new(Mutex::new(Vec::new())),
            probes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_duration<P: AsRef<Path>>(mut self, path: P, duration: Duration) -> Self {
        self.durations.insert(path.as_ref().to_path_buf(), duration);
        self
    }

    pub fn failing_on(mut self, fail_on: FailOn) -> Self {
        self.fail_on = fail_on;
        self
    }

    pub fn graphs(&self) -> Vec<AudioGraph> {
        self.graphs.lock().clone()
    }

    pub fn jobs(&self) -> Vec<VideoJob> {
        self.jobs.lock().clone()
    }

    pub fn probes(&self) -> Vec<PathBuf> {
        self.probes.lock().clone()
    }

    fn failure(&self, what: &str) -> MediaError {
        MediaError::UnexpectedOutput {
            program: "fake-media".to_string(),
            message: format!("simulated {} failure", what),
        }
    }

    fn wav_duration(path: &Path) -> Option<Duration> {
        let reader = hound::WavReader::open(path).ok()?;
        let spec = reader.spec();
        let millis = u64::from(reader.duration()) * 1000 / u64::from(spec.sample_rate);
        Some(Duration::from_millis(millis))
    }
}

#[async_trait]
impl MediaBackend for FakeMediaBackend {
    async fn probe_duration(&self, path: &Path) -> Result<Duration, MediaError> {
        self.probes.lock().push(path.to_path_buf());
        if self.fail_on == FailOn::Probe {
            return Err(self.failure("probe"));
        }
        Ok(self
            .durations
            .get(path)
            .copied()
            .or_else(|| Self::wav_duration(path))
            .unwrap_or(self.default_duration))
    }

    async fn encode(&self, graph: &AudioGraph, _encoding: &AudioEncoding) -> Result<Vec<u8>, MediaError> {
        self.graphs.lock().push(graph.clone());
        if self.fail_on == FailOn::Encode {
            return Err(self.failure("encode"));
        }
        Ok(FAKE_MP3.to_vec())
    }

    async fn render_video(&self, job: &VideoJob) -> Result<(), MediaError> {
        self.jobs.lock().push(job.clone());
        if self.fail_on == FailOn::Render {
            return Err(self.failure("render"));
        }
        std::fs::write(&job.output, FAKE_MP4).map_err(|e| self.failure(&e.to_string()))
    }
}
