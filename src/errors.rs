/*!
 * Error types for the vttspeak application.
 *
 * This module contains custom error types for each stage of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while parsing WebVTT input
#[derive(Error, Debug)]
pub enum ParseError {
    /// The first line does not start with the WEBVTT token
    #[error("invalid VTT file: missing WEBVTT header")]
    InvalidHeader,

    /// A timestamp line or timestamp is structurally wrong
    #[error("invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    /// The seconds field is not `SS.mmm`
    #[error("invalid seconds format: {0}")]
    InvalidSecondsFormat(String),

    /// A cue ends before it starts
    #[error("cue at line {line} ends before it starts ({start} --> {end})")]
    InvertedRange {
        /// 1-based line number of the timestamp line
        line: usize,
        /// Rendered start timestamp
        start: String,
        /// Rendered end timestamp
        end: String,
    },

    /// Reading the input failed
    #[error("failed to read subtitle input: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when working with speech provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while turning cues into audio clips
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The provider failed for one cue; the whole run is aborted
    #[error("speech synthesis failed for cue {index}: {source}")]
    Provider {
        /// Position of the cue in the cue set
        index: usize,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// The provider answered with no audio
    #[error("speech provider returned no audio for cue {index}")]
    EmptyAudio {
        /// Position of the cue in the cue set
        index: usize,
    },

    /// A clip could not be written to scratch storage
    #[error("failed to store audio clip {path:?}: {source}")]
    Storage {
        /// Target clip path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the external media backend
#[derive(Error, Debug)]
pub enum MediaError {
    /// The backend program could not be started
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that was invoked
        program: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The backend did not finish in time and was killed
    #[error("{program} timed out after {} seconds", .timeout.as_secs())]
    TimedOut {
        /// Program that was invoked
        program: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The backend exited with a non-zero status
    #[error("{program} failed ({status}): {output}")]
    Failed {
        /// Program that was invoked
        program: String,
        /// Exit status
        status: ExitStatus,
        /// Diagnostic output of the backend, verbatim
        output: String,
    },

    /// The graph handed to the backend cannot be executed
    #[error("invalid audio graph: {0}")]
    InvalidGraph(String),

    /// The backend output could not be interpreted
    #[error("unexpected {program} output: {message}")]
    UnexpectedOutput {
        /// Program that was invoked
        program: String,
        /// What was wrong with it
        message: String,
    },
}

/// Errors that can occur while compositing clips into one stream
#[derive(Error, Debug)]
pub enum CompositionError {
    /// Nothing to composite
    #[error("no audio clips to composite")]
    NoClips,

    /// Offsets and clips do not pair up
    #[error("clip count ({clips}) does not match offset count ({offsets})")]
    CountMismatch {
        /// Number of clips supplied
        clips: usize,
        /// Number of offsets supplied
        offsets: usize,
    },

    /// Measuring a clip's duration failed
    #[error("failed to measure duration of {path:?}: {source}")]
    Probe {
        /// Clip that could not be measured
        path: PathBuf,
        /// Backend failure
        #[source]
        source: MediaError,
    },

    /// Mixing or encoding failed
    #[error("failed to mix audio clips: {0}")]
    Media(#[from] MediaError),
}

/// Errors that can occur while rendering the video artifact
#[derive(Error, Debug)]
pub enum RenderError {
    /// The re-serialized subtitle track could not be written
    #[error("failed to write subtitle track: {0}")]
    SubtitleTrack(#[from] ParseError),

    /// The intermediate audio track could not be written
    #[error("failed to write audio track {path:?}: {source}")]
    AudioTrack {
        /// Target audio path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The video backend failed
    #[error("video rendering failed: {0}")]
    Media(#[from] MediaError),

    /// The rendered container could not be staged or moved into place
    #[error("{0}")]
    Output(#[from] ResourceError),
}

/// Errors around temporary and output file resources
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The per-run scratch directory could not be created
    #[error("failed to create scratch directory: {0}")]
    CreateScratch(#[source] std::io::Error),

    /// The final artifact could not be written
    #[error("failed to write output {path:?}: {source}")]
    Output {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from subtitle parsing
    #[error("Subtitle error: {0}")]
    Parse(#[from] ParseError),

    /// Error from speech synthesis
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from audio composition
    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    /// Error from video rendering
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Error from temporary or output resources
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
