use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::{MediaConfig, VideoConfig};
use crate::errors::MediaError;
use crate::media::{AudioEncoding, AudioGraph, AudioNode, MediaBackend, StreamRef, VideoJob};

// @module: ffmpeg-backed media operations

// @const: Progress readout of a decode pass, e.g. `time=00:00:01.45`
static PROGRESS_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap()
});

// @const: Container duration header, e.g. `Duration: 00:00:01.45`
static HEADER_DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap()
});

// @const: Label of the graph output
const OUTPUT_LABEL: &str = "aout";

/// Media backend that shells out to ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    /// ffmpeg executable
    program: String,
    /// Upper bound for one invocation; the process is killed when it elapses
    timeout: Duration,
}

impl FfmpegBackend {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.timeout())
    }

    /// Check that ffmpeg can be executed at all
    pub async fn ensure_available(&self) -> Result<(), MediaError> {
        let output = self.run(vec!["-hide_banner".into(), "-version".into()]).await?;
        if !output.status.success() {
            return Err(self.failure(&output, true));
        }
        let version = String::from_utf8_lossy(&output.stdout);
        debug!("Using {}", version.lines().next().unwrap_or("ffmpeg"));
        Ok(())
    }

    /// Run ffmpeg with the given arguments under the configured timeout
    async fn run(&self, args: Vec<OsString>) -> Result<Output, MediaError> {
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| MediaError::Spawn {
                program: self.program.clone(),
                source,
            }),
            Err(_) => Err(MediaError::TimedOut {
                program: self.program.clone(),
                timeout: self.timeout,
            }),
        }
    }

    fn failure(&self, output: &Output, verbatim: bool) -> MediaError {
        let stderr = String::from_utf8_lossy(&output.stderr);
        MediaError::Failed {
            program: self.program.clone(),
            status: output.status,
            output: if verbatim {
                stderr.into_owned()
            } else {
                filter_ffmpeg_stderr(&stderr)
            },
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, path: &Path) -> Result<Duration, MediaError> {
        // Decode the whole file; the last progress readout is the real length
        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-stats".into(),
            "-i".into(),
            path.as_os_str().to_owned(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ];

        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(self.failure(&output, false));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let duration = parse_decoded_duration(&stderr).ok_or_else(|| MediaError::UnexpectedOutput {
            program: self.program.clone(),
            message: format!("no duration found while decoding {:?}", path),
        })?;

        debug!("Measured {:?} as {}ms", path, duration.as_millis());
        Ok(duration)
    }

    async fn encode(&self, graph: &AudioGraph, encoding: &AudioEncoding) -> Result<Vec<u8>, MediaError> {
        let filter = compile_filter_graph(graph)?;
        debug!("Filter graph: {}", filter);

        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-nostdin".into(), "-y".into()];
        for input in graph.inputs() {
            args.push("-i".into());
            args.push(input.as_os_str().to_owned());
        }
        args.extend(
            [
                "-filter_complex".to_string(),
                filter,
                "-map".to_string(),
                format!("[{}]", OUTPUT_LABEL),
                "-c:a".to_string(),
                "libmp3lame".to_string(),
                "-q:a".to_string(),
                encoding.mp3_quality.to_string(),
                "-f".to_string(),
                "mp3".to_string(),
                "pipe:1".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );

        let output = self.run(args).await?;
        if !output.status.success() {
            let failure = self.failure(&output, false);
            error!("Audio mixing failed: {}", failure);
            return Err(failure);
        }

        if output.stdout.is_empty() {
            return Err(MediaError::UnexpectedOutput {
                program: self.program.clone(),
                message: "encoder produced no audio".to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn render_video(&self, job: &VideoJob) -> Result<(), MediaError> {
        let settings = &job.settings;
        let background = format!(
            "color=c={}:s={}x{}:r={}",
            settings.background_color, settings.width, settings.height, settings.frame_rate
        );

        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            background.into(),
            "-i".into(),
            job.audio.as_os_str().to_owned(),
            "-vf".into(),
            video_filter(&job.subtitles, settings).into(),
            "-c:a".into(),
            "aac".into(),
            "-c:v".into(),
            "libx264".into(),
            "-shortest".into(),
            job.output.as_os_str().to_owned(),
        ];

        let output = self.run(args).await?;
        if !output.status.success() {
            // Operators need the full diagnostic for render failures
            return Err(self.failure(&output, true));
        }
        Ok(())
    }
}

/// Translate an audio graph into an ffmpeg `-filter_complex` description
pub fn compile_filter_graph(graph: &AudioGraph) -> Result<String, MediaError> {
    let output = graph
        .output()
        .ok_or_else(|| MediaError::InvalidGraph("graph has no output".to_string()))?;

    let label = |stream: StreamRef| -> Result<String, MediaError> {
        match stream {
            StreamRef::Input(i) if i < graph.inputs().len() => Ok(format!("[{}:a]", i)),
            StreamRef::Node(n) if n < graph.nodes().len() => {
                if stream == output {
                    Ok(format!("[{}]", OUTPUT_LABEL))
                } else {
                    Ok(format!("[n{}]", n))
                }
            }
            other => Err(MediaError::InvalidGraph(format!("dangling stream reference {:?}", other))),
        }
    };

    label(output)?;

    let mut chains = Vec::with_capacity(graph.nodes().len() + 1);
    for (n, node) in graph.nodes().iter().enumerate() {
        let target = label(StreamRef::Node(n))?;
        let chain = match node {
            AudioNode::Delay { source, delay } => {
                format!("{}adelay={}:all=1{}", label(*source)?, delay.as_millis(), target)
            }
            AudioNode::Mix { left, right } => format!(
                "{}{}amix=inputs=2:duration=longest:dropout_transition=0:normalize=0{}",
                label(*left)?,
                label(*right)?,
                target
            ),
            AudioNode::Normalize { source, format } => format!(
                "{}aformat=sample_fmts=fltp:sample_rates={}:channel_layouts={}{}",
                label(*source)?,
                format.sample_rate,
                channel_layout(format.channels),
                target
            ),
        };
        chains.push(chain);
    }

    if let StreamRef::Input(_) = output {
        chains.push(format!("{}anull[{}]", label(output)?, OUTPUT_LABEL));
    }

    Ok(chains.join(";"))
}

fn channel_layout(channels: u16) -> &'static str {
    match channels {
        1 => "mono",
        _ => "stereo",
    }
}

/// Video filter chain: subtitles at top-center, elapsed time at the center
pub fn video_filter(subtitles: &Path, settings: &VideoConfig) -> String {
    let subtitles_path = subtitles.to_string_lossy();
    let force_style = format!("Alignment=6,FontSize={}", settings.subtitle_font_size);

    // HH:MM:SS.t, recomputed per frame so the tenths digit ticks 10 times a second
    let timecode = "%{eif:floor(t/3600):d:2}:%{eif:mod(floor(t/60),60):d:2}:%{eif:mod(floor(t),60):d:2}.%{eif:mod(floor(t*10),10):d}";

    let subtitles_filter = format!(
        "subtitles=filename={}:force_style={}",
        escape_graph_token(&escape_option_value(&subtitles_path)),
        escape_graph_token(&escape_option_value(&force_style)),
    );
    let drawtext_filter = format!(
        "drawtext=fontsize={}:fontcolor=white:x=(w-text_w)/2:y=(h-text_h)/2:box=1:boxcolor=black@0.5:boxborderw=5:text={}",
        settings.timecode_font_size,
        escape_graph_token(&escape_option_value(timecode)),
    );

    format!("{},{}", subtitles_filter, drawtext_filter)
}

/// Escape a value for ffmpeg's `key=value:key=value` option parser
pub fn escape_option_value(value: &str) -> String {
    escape_chars(value, &['\\', ':', '\''])
}

/// Escape a filter argument string for ffmpeg's filtergraph parser
pub fn escape_graph_token(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Length of a decode pass, from ffmpeg's stderr
///
/// The last `time=` progress readout reflects what was actually decoded;
/// the container header is only used when no readout is present.
pub fn parse_decoded_duration(stderr: &str) -> Option<Duration> {
    let from_progress = PROGRESS_TIME_REGEX
        .captures_iter(stderr)
        .last()
        .and_then(|caps| captures_to_duration(&caps));

    from_progress.or_else(|| {
        HEADER_DURATION_REGEX
            .captures(stderr)
            .and_then(|caps| captures_to_duration(&caps))
    })
}

fn captures_to_duration(caps: &regex::Captures) -> Option<Duration> {
    let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;

    let millis = (hours * 3600 + minutes * 60) * 1000 + (seconds * 1000.0).round() as u64;
    Some(Duration::from_millis(millis))
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .flat_map(|line| line.split('\r'))
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
