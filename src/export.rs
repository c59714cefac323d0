//! Transcript export formats
//!
//! Plain text is the transcript as shown. SRT uses the backend's segments when it sent
//! any and otherwise cuts the text into paragraphs spaced ten seconds apart.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Segment;

/// Seconds given to each paragraph when no segments are available
pub const FALLBACK_SEGMENT_SECONDS: u64 = 10;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Srt,
}

impl ExportFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Srt => "srt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "srt" => Ok(ExportFormat::Srt),
            other => Err(format!(
                "Invalid export format: {}. Valid formats are: txt, srt",
                other
            )),
        }
    }
}

/// Render a transcript in the given format
#[must_use]
pub fn render(format: ExportFormat, text: &str, segments: &[Segment]) -> String {
    match format {
        ExportFormat::Txt => text.to_string(),
        ExportFormat::Srt => export_srt(text, segments),
    }
}

/// SRT from real segments, or estimated from paragraphs when there are none
#[must_use]
pub fn export_srt(text: &str, segments: &[Segment]) -> String {
    if segments.is_empty() {
        fallback_srt(text)
    } else {
        to_srt(segments)
    }
}

/// Format segments as SRT
///
/// ```text
/// 1
/// 00:00:00,000 --> 00:00:05,000
/// Hello world
///
/// ```
#[must_use]
pub fn to_srt(segments: &[Segment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        write_cue(
            &mut output,
            i + 1,
            segment.start,
            segment.end,
            segment.text.trim(),
        );
    }

    output
}

/// SRT with one cue per paragraph, each lasting [`FALLBACK_SEGMENT_SECONDS`]
#[must_use]
pub fn fallback_srt(text: &str) -> String {
    let mut output = String::new();
    let step = FALLBACK_SEGMENT_SECONDS as f64;

    let paragraphs = text.split("\n\n").filter(|p| !p.trim().is_empty());
    for (i, paragraph) in paragraphs.enumerate() {
        let start = i as f64 * step;
        write_cue(&mut output, i + 1, start, start + step, paragraph.trim());
    }

    output
}

fn write_cue(output: &mut String, index: usize, start: f64, end: f64, text: &str) {
    writeln!(output, "{}", index).ok();
    writeln!(
        output,
        "{} --> {}",
        format_srt_time(start),
        format_srt_time(end)
    )
    .ok();
    writeln!(output, "{}", text).ok();
    writeln!(output).ok();
}

/// Format seconds as an SRT timecode (HH:MM:SS,mmm)
#[must_use]
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{hours:02}:{mins:02}:{secs:02},{ms:03}")
}

/// Format seconds for display next to a segment (MM:SS, minutes not wrapped)
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// One `[MM:SS] text` line per segment
#[must_use]
pub fn timestamped_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| format!("[{}] {}", format_timestamp(s.start), s.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
