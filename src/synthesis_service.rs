/*!
 * Per-cue audio materialization.
 *
 * Drives a speech provider over a cue set, one request per cue, and stores
 * every clip in the run's scratch directory under its cue index. The
 * fan-out is sequential and all-or-nothing: the first failure aborts.
 */

use indicatif::ProgressBar;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::SynthesisError;
use crate::file_utils::ScratchDir;
use crate::providers::{AudioFormat, SpeechProvider, SynthesisRequest, VoiceSelection};
use crate::subtitle_processor::CueSet;

/// One synthesized clip in scratch storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Index of the cue the clip was made from
    pub index: usize,
    /// Where the clip starts in the composite
    pub start_offset: Duration,
    /// Encoded audio file
    pub path: PathBuf,
}

/// Turns cues into audio clips through a speech provider
#[derive(Debug, Clone)]
pub struct SynthesisService {
    provider: Arc<dyn SpeechProvider>,
    voice: VoiceSelection,
    audio_format: AudioFormat,
}

impl SynthesisService {
    pub fn new(provider: Arc<dyn SpeechProvider>, voice: VoiceSelection, audio_format: AudioFormat) -> Self {
        Self {
            provider,
            voice,
            audio_format,
        }
    }

    /// One request per cue, in cue order
    pub fn build_requests(&self, cues: &CueSet) -> Vec<SynthesisRequest> {
        cues.iter()
            .map(|cue| SynthesisRequest {
                text: cue.text.clone(),
                voice: self.voice.clone(),
                audio_format: self.audio_format,
                start_offset: cue.start,
            })
            .collect()
    }

    /// Scratch file name for the clip of cue `index`
    pub fn clip_file_name(&self, index: usize) -> String {
        format!("clip_{:05}.{}", index, self.audio_format.extension())
    }

    /// Synthesize every cue and store the clips in `scratch`
    pub async fn materialize(
        &self,
        cues: &CueSet,
        scratch: &ScratchDir,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<AudioClip>, SynthesisError> {
        let requests = self.build_requests(cues);
        info!(
            "Synthesizing {} cue(s) with {} ({}, {})",
            requests.len(),
            self.provider.name(),
            self.voice.language_code,
            self.voice.gender
        );

        let mut clips = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let audio = self
                .provider
                .synthesize(request)
                .await
                .map_err(|source| SynthesisError::Provider { index, source })?;

            if audio.is_empty() {
                return Err(SynthesisError::EmptyAudio { index });
            }

            let path = scratch.join(self.clip_file_name(index));
            tokio::fs::write(&path, &audio)
                .await
                .map_err(|source| SynthesisError::Storage {
                    path: path.clone(),
                    source,
                })?;
            debug!("Cue {} -> {:?} ({} bytes)", index, path, audio.len());

            clips.push(AudioClip {
                index,
                start_offset: request.start_offset,
                path,
            });

            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        Ok(clips)
    }
}
