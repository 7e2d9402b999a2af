use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ParseError;

// @module: WebVTT cue parsing and serialization

// @const: Header token required on the first line
pub const VTT_HEADER: &str = "WEBVTT";

// @const: Separator between start and end timestamps
const TIMING_SEPARATOR: &str = "-->";

// @const: Lines that start with a timestamp-shaped token, even when malformed
static TIMING_CANDIDATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+:\d{2}[:.]").unwrap()
});

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Optional label line preceding the timing line
    pub id: Option<String>,

    // @field: Start offset from the beginning of the media
    pub start: Duration,

    // @field: End offset from the beginning of the media
    pub end: Duration,

    // @field: Cue text, lines joined with '\n'
    pub text: String,
}

impl Cue {
    /// Creates a cue without a label
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Cue {
            id: None,
            start,
            end,
            text: text.into(),
        }
    }

    /// Attaches a label to the cue
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Declared length of the cue
    pub fn declared_duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Writes the cue as a WebVTT block, using `fallback_label` when the cue has no id
    fn write_block<W: fmt::Write>(&self, out: &mut W, fallback_label: usize) -> fmt::Result {
        match &self.id {
            Some(id) => writeln!(out, "{}", id)?,
            None => writeln!(out, "{}", fallback_label)?,
        }
        writeln!(out, "{} {} {}", format_timestamp(self.start), TIMING_SEPARATOR, format_timestamp(self.end))?;
        writeln!(out, "{}", self.text)?;
        writeln!(out)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(id) = &self.id {
            writeln!(f, "{}", id)?;
        }
        writeln!(f, "{} {} {}", format_timestamp(self.start), TIMING_SEPARATOR, format_timestamp(self.end))?;
        writeln!(f, "{}", self.text)
    }
}

/// Ordered, immutable sequence of cues in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSet {
    /// File the cues were read from, if any
    source_file: Option<PathBuf>,

    /// Cues in file order
    cues: Vec<Cue>,
}

impl CueSet {
    /// Create a cue set from already-built cues
    pub fn new(cues: Vec<Cue>) -> Self {
        CueSet {
            source_file: None,
            cues,
        }
    }

    /// Parse a WebVTT file from disk
    pub fn parse_vtt_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut set = Self::parse_vtt_string(&content)?;
        set.source_file = Some(path.to_path_buf());
        debug!("Parsed {} cue(s) from {:?}", set.len(), path);
        Ok(set)
    }

    /// Parse WebVTT content into a cue set
    ///
    /// The first line must start with `WEBVTT`. Blocks are separated by blank
    /// lines; a block becomes a cue only when it has a timing line followed by
    /// at least one text line. Any malformed timing line aborts the parse.
    pub fn parse_vtt_string(content: &str) -> Result<Self, ParseError> {
        let mut lines = content.lines().enumerate();

        let header_ok = lines
            .next()
            .map(|(_, first)| first.trim_start_matches('\u{feff}').starts_with(VTT_HEADER))
            .unwrap_or(false);
        if !header_ok {
            return Err(ParseError::InvalidHeader);
        }

        let mut cues = Vec::new();
        let mut current: Option<Cue> = None;
        let mut text_lines: Vec<&str> = Vec::new();
        let mut pending_label: Option<&str> = None;

        for (index, line) in lines {
            let line_number = index + 1;

            if line.trim().is_empty() {
                finalize_cue(&mut cues, current.take(), &mut text_lines);
                pending_label = None;
                continue;
            }

            if is_timing_line(line) {
                finalize_cue(&mut cues, current.take(), &mut text_lines);

                let (start, end) = parse_timing_line(line)?;
                if start > end {
                    return Err(ParseError::InvertedRange {
                        line: line_number,
                        start: format_timestamp(start),
                        end: format_timestamp(end),
                    });
                }

                current = Some(Cue {
                    id: pending_label.take().map(|label| label.trim().to_string()),
                    start,
                    end,
                    text: String::new(),
                });
                continue;
            }

            if current.is_some() {
                text_lines.push(line);
            } else {
                // Candidate label; only the line right before a timing line counts
                pending_label = Some(line);
            }
        }

        finalize_cue(&mut cues, current.take(), &mut text_lines);

        if cues.is_empty() {
            warn!("No cues found in VTT content");
        }

        Ok(CueSet::new(cues))
    }

    /// Cues in file order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Iterate over the cues in file order
    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the set holds no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// File the cues were parsed from
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Render the cue set back into WebVTT text
    pub fn to_vtt_string(&self) -> String {
        let mut out = String::new();
        out.push_str(VTT_HEADER);
        out.push_str("\n\n");
        for (i, cue) in self.cues.iter().enumerate() {
            // Writing into a String cannot fail
            let _ = cue.write_block(&mut out, i + 1);
        }
        out
    }

    /// Write the cue set to a WebVTT file
    pub fn write_to_vtt<P: AsRef<Path>>(&self, path: P) -> Result<(), ParseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(self.to_vtt_string().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CueSet {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl fmt::Display for CueSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Set")?;
        if let Some(source) = &self.source_file {
            writeln!(f, "Source: {:?}", source)?;
        }
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}

// @appends: Open cue when it has text; drops text-less cues
fn finalize_cue(cues: &mut Vec<Cue>, cue: Option<Cue>, text_lines: &mut Vec<&str>) {
    if let Some(mut cue) = cue {
        if text_lines.is_empty() {
            debug!("Dropping cue at {} without text", format_timestamp(cue.start));
        } else {
            cue.text = text_lines.join("\n");
            cues.push(cue);
        }
    }
    text_lines.clear();
}

// @checks: Whether a line is meant as a timing line; prose containing `-->` stays text
fn is_timing_line(line: &str) -> bool {
    TIMING_CANDIDATE_REGEX.is_match(line)
}

/// Parse a `HH:MM:SS.mmm --> HH:MM:SS.mmm [settings]` line
pub fn parse_timing_line(line: &str) -> Result<(Duration, Duration), ParseError> {
    let (start, rest) = line
        .split_once(TIMING_SEPARATOR)
        .ok_or_else(|| ParseError::InvalidTimestamp(line.trim().to_string()))?;

    // Cue settings may follow the end timestamp
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::InvalidTimestamp(line.trim().to_string()))?;

    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse an `HH:MM:SS.mmm` timestamp
pub fn parse_timestamp(timestamp: &str) -> Result<Duration, ParseError> {
    let parts: Vec<&str> = timestamp.split(':').collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidTimestamp(timestamp.to_string()));
    }

    let hours = parse_field(parts[0], timestamp)?;
    let minutes = parse_field(parts[1], timestamp)?;

    let seconds_parts: Vec<&str> = parts[2].split('.').collect();
    if seconds_parts.len() != 2 || seconds_parts[1].len() != 3 {
        return Err(ParseError::InvalidSecondsFormat(timestamp.to_string()));
    }

    let seconds = parse_field(seconds_parts[0], timestamp)
        .map_err(|_| ParseError::InvalidSecondsFormat(timestamp.to_string()))?;
    let millis = parse_field(seconds_parts[1], timestamp)
        .map_err(|_| ParseError::InvalidSecondsFormat(timestamp.to_string()))?;

    let total_ms = hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|ms| ms.checked_add(seconds.checked_mul(1_000)?))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| ParseError::InvalidTimestamp(timestamp.to_string()))?;

    Ok(Duration::from_millis(total_ms))
}

fn parse_field(field: &str, timestamp: &str) -> Result<u64, ParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidTimestamp(timestamp.to_string()));
    }
    field
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(timestamp.to_string()))
}

/// Format a duration as a WebVTT timestamp (HH:MM:SS.mmm)
pub fn format_timestamp(duration: Duration) -> String {
    let ms = duration.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
