use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::VideoConfig;
use crate::compositor::CompositeAudioStream;
use crate::errors::{AppError, RenderError};
use crate::file_utils::{FileManager, ScratchDir};
use crate::media::{MediaBackend, VideoJob};
use crate::subtitle_processor::CueSet;

// @module: Writing the final artifact

// @const: Intermediate files of video mode, inside the scratch directory
const VIDEO_AUDIO_TRACK: &str = "audio.mp3";
const VIDEO_SUBTITLE_TRACK: &str = "subtitles.vtt";

/// Kind of artifact to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Compressed audio only
    Audio,
    /// Video with burned-in subtitles and timecode
    Video,
}

impl OutputMode {
    /// `.mp4` destinations are videos, anything else is audio
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match FileManager::extension_lowercase(path).as_deref() {
            Some("mp4") => Self::Video,
            _ => Self::Audio,
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Serializes the composite track to the requested container
#[derive(Debug, Clone)]
pub struct OutputEmitter {
    backend: Arc<dyn MediaBackend>,
    video: VideoConfig,
}

impl OutputEmitter {
    pub fn new(backend: Arc<dyn MediaBackend>, video: VideoConfig) -> Self {
        Self { backend, video }
    }

    /// Write the artifact for `mode`
    pub async fn emit(
        &self,
        mode: OutputMode,
        stream: &CompositeAudioStream,
        cues: &CueSet,
        destination: &Path,
        scratch: &ScratchDir,
    ) -> Result<(), AppError> {
        match mode {
            OutputMode::Audio => self.emit_audio(stream, destination),
            OutputMode::Video => Ok(self.emit_video(stream, cues, destination, scratch).await?),
        }
    }

    /// Write the encoded track straight to `destination`
    pub fn emit_audio(&self, stream: &CompositeAudioStream, destination: &Path) -> Result<(), AppError> {
        FileManager::write_atomically(destination, &stream.bytes)?;
        info!("Wrote {} bytes of audio to {:?}", stream.len(), destination);
        Ok(())
    }

    /// Render the video artifact
    ///
    /// The audio track and a re-serialized subtitle track are written to the
    /// scratch directory first; the rendered container is staged next to
    /// the destination and only moved into place once rendering succeeded.
    pub async fn emit_video(
        &self,
        stream: &CompositeAudioStream,
        cues: &CueSet,
        destination: &Path,
        scratch: &ScratchDir,
    ) -> Result<(), RenderError> {
        let audio_path = scratch.join(VIDEO_AUDIO_TRACK);
        tokio::fs::write(&audio_path, &stream.bytes)
            .await
            .map_err(|source| RenderError::AudioTrack {
                path: audio_path.clone(),
                source,
            })?;

        let subtitle_path = scratch.join(VIDEO_SUBTITLE_TRACK);
        cues.write_to_vtt(&subtitle_path)?;
        debug!("Wrote intermediate tracks {:?} and {:?}", audio_path, subtitle_path);

        let staged = FileManager::staging_file_for(destination)?;

        let job = VideoJob {
            audio: audio_path,
            subtitles: subtitle_path,
            output: staged.path().to_path_buf(),
            settings: self.video.clone(),
        };
        self.backend.render_video(&job).await?;

        FileManager::persist_staging_file(staged, destination)?;

        info!("Rendered video to {:?}", destination);
        Ok(())
    }
}
