use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, SynthesisProvider};
use crate::compositor::Compositor;
use crate::errors::AppError;
use crate::file_utils::{FileManager, ScratchDir};
use crate::media::ffmpeg::FfmpegBackend;
use crate::media::{AudioEncoding, MediaBackend};
use crate::output_emitter::{OutputEmitter, OutputMode};
use crate::providers::google::GoogleTts;
use crate::providers::{SpeechProvider, VoiceSelection};
use crate::subtitle_processor::CueSet;
use crate::synthesis_service::SynthesisService;

// @module: Application controller for subtitle narration

/// Main application controller: parse, synthesize, composite, emit
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Speech gateway
    provider: Arc<dyn SpeechProvider>,
    // @field: Media toolkit
    backend: Arc<dyn MediaBackend>,
    // @field: Whether to draw a progress bar
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller with the configured provider and ffmpeg
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let provider: Arc<dyn SpeechProvider> = match config.synthesis.provider {
            SynthesisProvider::Google => Arc::new(GoogleTts::from_config(&config.synthesis)?),
        };
        let backend: Arc<dyn MediaBackend> = Arc::new(FfmpegBackend::from_config(&config.media));

        Ok(Self::with_components(config, provider, backend))
    }

    /// Create a controller around explicit collaborators
    pub fn with_components(
        config: Config,
        provider: Arc<dyn SpeechProvider>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            config,
            provider,
            backend,
            show_progress: true,
        }
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert a WebVTT file into narrated audio or video at `output_file`
    ///
    /// All intermediate files live in a scratch directory private to this
    /// run, removed on every exit path.
    pub async fn run(&self, input_file: &Path, output_file: &Path) -> Result<(), AppError> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }

        let mode = OutputMode::from_path(output_file);
        info!(
            "Converting {:?} to {:?} ({} output, language {})",
            input_file, output_file, mode, self.config.language_code
        );

        let cues = CueSet::parse_vtt_file(input_file)?;
        info!("Parsed {} cue(s)", cues.len());

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let scratch = ScratchDir::create(&run_id)?;

        let result = self.run_in_scratch(&cues, mode, output_file, &scratch).await;
        scratch.close();
        result?;

        info!(
            "Converted {:?} to {:?} in {}",
            input_file,
            output_file,
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    async fn run_in_scratch(
        &self,
        cues: &CueSet,
        mode: OutputMode,
        output_file: &Path,
        scratch: &ScratchDir,
    ) -> Result<(), AppError> {
        let voice = VoiceSelection::new(self.config.language_code.clone(), self.config.voice_gender);
        let synthesis = SynthesisService::new(Arc::clone(&self.provider), voice, self.config.clip_format);

        let progress = self.progress_bar(cues.len() as u64);
        let clips = synthesis.materialize(cues, scratch, progress.as_ref()).await;
        if let Some(progress) = &progress {
            progress.finish_and_clear();
        }
        let clips = clips?;

        let compositor = Compositor::new(Arc::clone(&self.backend), AudioEncoding::from_config(&self.config.media));
        let composite = compositor.compose(&clips).await?;

        let emitter = OutputEmitter::new(Arc::clone(&self.backend), self.config.media.video.clone());
        emitter.emit(mode, &composite, cues, output_file, scratch).await
    }

    fn progress_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let progress = ProgressBar::new(total);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({eta})")
        {
            Ok(style) => progress.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress bar template: {}", e),
        }
        Some(progress)
    }

    // @formats: Elapsed time as "1m 05s" or "3.2s"
    fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs >= 60 {
            format!("{}m {:02}s", secs / 60, secs % 60)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}
