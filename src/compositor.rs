/*!
 * Timed audio compositing.
 *
 * Takes clips that each start at an arbitrary offset and produces one
 * continuous track covering `[0, max(offset + measured duration)]`.
 * Durations are always measured from the clip audio; the cue's declared
 * end time plays no part in the span.
 */

use bytes::Bytes;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CompositionError;
use crate::media::{AudioEncoding, AudioGraph, MediaBackend};
use crate::synthesis_service::AudioClip;

/// The mixed, encoded track
#[derive(Debug, Clone)]
pub struct CompositeAudioStream {
    /// Encoded MP3 bytes
    pub bytes: Bytes,
    /// Expected length, `max(offset + measured duration)`
    pub span: Duration,
    /// Sample rate, channels and quality of the encoding
    pub encoding: AudioEncoding,
}

impl CompositeAudioStream {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A clip paired with its measured length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasuredClip {
    pub path: PathBuf,
    pub offset: Duration,
    pub duration: Duration,
}

impl MeasuredClip {
    /// Where the clip stops sounding in the composite
    pub fn end(&self) -> Duration {
        self.offset + self.duration
    }
}

/// Mixes offset-anchored clips into one track through a media backend
#[derive(Debug, Clone)]
pub struct Compositor {
    backend: Arc<dyn MediaBackend>,
    encoding: AudioEncoding,
}

impl Compositor {
    pub fn new(backend: Arc<dyn MediaBackend>, encoding: AudioEncoding) -> Self {
        Self { backend, encoding }
    }

    /// Composite materialized clips, each at its own start offset
    pub async fn compose(&self, clips: &[AudioClip]) -> Result<CompositeAudioStream, CompositionError> {
        let files: Vec<&Path> = clips.iter().map(|clip| clip.path.as_path()).collect();
        let offsets: Vec<Duration> = clips.iter().map(|clip| clip.start_offset).collect();
        self.compose_files(&files, &offsets).await
    }

    /// Composite audio files; `offsets[i]` is where `files[i]` starts
    pub async fn compose_files<P: AsRef<Path>>(
        &self,
        files: &[P],
        offsets: &[Duration],
    ) -> Result<CompositeAudioStream, CompositionError> {
        if files.is_empty() {
            return Err(CompositionError::NoClips);
        }
        if files.len() != offsets.len() {
            return Err(CompositionError::CountMismatch {
                clips: files.len(),
                offsets: offsets.len(),
            });
        }

        let measured = self.measure(files, offsets).await?;
        let span = composite_span(&measured);
        info!("Mixing {} clip(s) into a {:.3}s track", measured.len(), span.as_secs_f64());

        let graph = build_mix_graph(&measured, &self.encoding);
        let bytes = self.backend.encode(&graph, &self.encoding).await?;
        debug!("Composite track encoded to {} bytes", bytes.len());

        Ok(CompositeAudioStream {
            bytes: Bytes::from(bytes),
            span,
            encoding: self.encoding,
        })
    }

    /// Measure every clip; the first failure aborts the whole composite
    pub async fn measure<P: AsRef<Path>>(
        &self,
        files: &[P],
        offsets: &[Duration],
    ) -> Result<Vec<MeasuredClip>, CompositionError> {
        let mut measured = Vec::with_capacity(files.len());
        for (file, offset) in files.iter().zip(offsets) {
            let path = file.as_ref();
            let duration = self
                .backend
                .probe_duration(path)
                .await
                .map_err(|source| CompositionError::Probe {
                    path: path.to_path_buf(),
                    source,
                })?;
            measured.push(MeasuredClip {
                path: path.to_path_buf(),
                offset: *offset,
                duration,
            });
        }
        Ok(measured)
    }
}

/// `max(offset + duration)` over all clips
pub fn composite_span(clips: &[MeasuredClip]) -> Duration {
    clips
        .iter()
        .map(MeasuredClip::end)
        .max()
        .unwrap_or_default()
}

/// Delay every clip to its offset, fold them together with binary mixes and
/// normalize the result. A single clip is only delayed and normalized.
pub fn build_mix_graph(clips: &[MeasuredClip], encoding: &AudioEncoding) -> AudioGraph {
    let mut graph = AudioGraph::new();

    let delayed: Vec<_> = clips
        .iter()
        .map(|clip| {
            let input = graph.input(&clip.path);
            graph.delay(input, clip.offset)
        })
        .collect();

    let mut streams = delayed.into_iter();
    if let Some(first) = streams.next() {
        let mixed = streams.fold(first, |acc, next| graph.mix(acc, next));
        let output = graph.normalize(mixed, encoding.format);
        graph.set_output(output);
    }

    graph
}
