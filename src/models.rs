// Video transcriber data models
//
// This module contains the data models shared by the client, the session and
// the exporters: job requests, progress events, transcript segments and history
// entries as returned by the transcription service.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Speech-to-text engine used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Engine {
    #[default]
    #[serde(rename = "whisper")]
    Whisper,
    #[serde(rename = "faster-whisper")]
    FasterWhisper,
}

impl Engine {
    pub const NAMES: &'static [&'static str] = &["whisper", "faster-whisper"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Whisper => "whisper",
            Engine::FasterWhisper => "faster-whisper",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whisper" => Ok(Engine::Whisper),
            "faster-whisper" | "faster_whisper" => Ok(Engine::FasterWhisper),
            other => Err(format!(
                "Invalid engine: {}. Valid engines are: {}",
                other,
                Engine::NAMES.join(", ")
            )),
        }
    }
}

/// Whisper model size requested for the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    #[default]
    Tiny,
    Base,
    Small,
    Medium,
}

impl ModelSize {
    pub const NAMES: &'static [&'static str] = &["tiny", "base", "small", "medium"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            other => Err(format!(
                "Invalid model size: {}. Valid sizes are: {}",
                other,
                ModelSize::NAMES.join(", ")
            )),
        }
    }
}

/// Request body for `POST /transcribe`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    /// Video URL to download and transcribe
    #[serde(rename = "url")]
    pub source_url: String,
    pub engine: Engine,
    pub model_size: ModelSize,
    /// Language hint, omitted when the backend should detect it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl JobRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            engine: Engine::default(),
            model_size: ModelSize::default(),
            language: None,
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_model_size(mut self, model_size: ModelSize) -> Self {
        self.model_size = model_size;
        self
    }

    /// Sets the language hint; empty and "auto" mean no hint
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && l != "auto");
        self
    }
}

/// Time-bounded span of transcript text, offsets in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Summary statistics reported with a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobStats {
    /// Processing time in seconds
    pub duration: f64,
    pub word_count: u64,
}

/// Terminal payload of a successful job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub title: String,
    pub transcription: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub stats: JobStats,
}

/// Status of the download phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Active,
    Completed,
}

/// One record of the streamed job response
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Download {
        status: DownloadStatus,
    },
    Transcribe {
        engine: Option<String>,
        model: Option<String>,
    },
    Complete(TranscriptionResult),
    Error {
        message: String,
    },
}

impl ProgressEvent {
    /// Complete and Error end the event sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete(_) | ProgressEvent::Error { .. })
    }
}

/// Row of `GET /history`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistorySummary {
    pub id: i64,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Full record of `GET /history/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub transcription: Option<String>,
    /// JSON-encoded segment list; some backends send the array directly
    #[serde(default)]
    pub segments: Option<serde_json::Value>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub word_count: Option<u64>,
}

impl HistoryEntry {
    /// Decodes the stored segments, which need a second JSON parse when sent as a string
    pub fn parsed_segments(&self) -> Result<Vec<Segment>, serde_json::Error> {
        match &self.segments {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::String(encoded)) if encoded.trim().is_empty() => Ok(Vec::new()),
            Some(serde_json::Value::String(encoded)) => serde_json::from_str(encoded),
            Some(value) => serde_json::from_value(value.clone()),
        }
    }
}

/// Parses the timestamps the history service emits (SQLite or RFC 3339)
pub fn parse_created_at(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_job_request_body() {
        let request = JobRequest::new("  https://youtu.be/dQw4w9WgXcQ ")
            .with_engine(Engine::FasterWhisper)
            .with_model_size(ModelSize::Small)
            .with_language(Some("es".to_string()));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "url": "https://youtu.be/dQw4w9WgXcQ",
                "engine": "faster-whisper",
                "model_size": "small",
                "language": "es"
            })
        );
    }

    #[test]
    fn test_job_request_omits_auto_language() {
        let request = JobRequest::new("https://example.test/v").with_language(Some("auto".into()));
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("language").is_none());
        assert_eq!(body["engine"], "whisper");
        assert_eq!(body["model_size"], "tiny");
    }

    #[test]
    fn test_engine_and_model_parse() {
        assert_eq!("Faster-Whisper".parse::<Engine>().unwrap(), Engine::FasterWhisper);
        assert!("whisperx".parse::<Engine>().is_err());
        assert_eq!("MEDIUM".parse::<ModelSize>().unwrap(), ModelSize::Medium);
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn test_history_segments_from_encoded_string() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": 3,
            "video_title": "Talk",
            "video_url": "https://youtu.be/dQw4w9WgXcQ",
            "created_at": "2025-02-01 10:15:00.123456",
            "transcription": "a b",
            "segments": "[{\"start\":0,\"end\":1.5,\"text\":\"a\"}]",
            "duration": 12.5,
            "word_count": 2
        }))
        .unwrap();

        let segments = entry.parsed_segments().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, 1.5);
    }

    #[test]
    fn test_history_segments_missing_or_array() {
        let entry: HistoryEntry = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(entry.parsed_segments().unwrap().is_empty());

        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": 1,
            "segments": [{"start": 1, "end": 2, "text": "x"}]
        }))
        .unwrap();
        assert_eq!(entry.parsed_segments().unwrap()[0].text, "x");
    }

    #[test]
    fn test_history_segments_malformed() {
        let entry: HistoryEntry =
            serde_json::from_value(json!({"id": 1, "segments": "[{not json"})).unwrap();
        assert!(entry.parsed_segments().is_err());
    }

    #[test]
    fn test_parse_created_at_formats() {
        let sqlite = parse_created_at("2025-02-01 10:15:00.123456").unwrap();
        assert_eq!((sqlite.year(), sqlite.month(), sqlite.day()), (2025, 2, 1));
        assert_eq!((sqlite.hour(), sqlite.minute()), (10, 15));

        assert!(parse_created_at("2025-02-01T10:15:00Z").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }
}
