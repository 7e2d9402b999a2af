/*!
 * Media backend abstraction.
 *
 * The pipeline needs five things from a media toolkit: measure a clip,
 * delay it, mix clips, normalize the result and encode it, plus one video
 * compositing pass. Delay/mix/normalize are expressed as an `AudioGraph`;
 * the backend measures, executes graphs and renders video.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_config::{MediaConfig, VideoConfig};
use crate::errors::MediaError;

pub mod ffmpeg;
pub mod graph;

pub use graph::{AudioGraph, AudioNode, StreamFormat, StreamRef};

/// Encoding of the composite track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncoding {
    /// Output sample rate and channel count
    pub format: StreamFormat,
    /// LAME VBR quality, 0 is best
    pub mp3_quality: u8,
}

impl AudioEncoding {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            format: StreamFormat {
                sample_rate: config.sample_rate,
                channels: config.channels,
            },
            mp3_quality: config.mp3_quality,
        }
    }
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}

/// Everything needed to render the video artifact
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob {
    /// Composite audio track
    pub audio: PathBuf,
    /// WebVTT track to burn in
    pub subtitles: PathBuf,
    /// Destination container
    pub output: PathBuf,
    /// Frame and overlay settings
    pub settings: VideoConfig,
}

/// Operations the pipeline needs from a media toolkit
#[async_trait]
pub trait MediaBackend: Send + Sync + Debug {
    /// Decoded length of an audio file
    async fn probe_duration(&self, path: &Path) -> Result<Duration, MediaError>;

    /// Execute a graph and return the encoded MP3 bytes of its output
    async fn encode(&self, graph: &AudioGraph, encoding: &AudioEncoding) -> Result<Vec<u8>, MediaError>;

    /// Composite background, audio, subtitles and timecode into a video
    async fn render_video(&self, job: &VideoJob) -> Result<(), MediaError>;
}
