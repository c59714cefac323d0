//! Session state for the transcription front-end
//!
//! One `SessionController` owns everything the user currently sees: the job slot,
//! the transcript on screen, the timestamp toggle and the video used for seeking.
//! Each submitted job gets a generation number; events that arrive for an older
//! generation are dropped, so a superseded job can never overwrite a newer one.

use log::{debug, info, warn};
use serde::Serialize;

use crate::export::{self, ExportFormat};
use crate::job_state::ClientJobState;
use crate::models::{HistoryEntry, JobRequest, ProgressEvent, Segment, TranscriptionResult};
use crate::video::{extract_video_id, watch_url};

/// Transcript currently on screen, whether it came from a job or from history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptView {
    pub title: String,
    pub transcription: String,
    pub segments: Vec<Segment>,
    /// Processing time in seconds, when known
    pub duration: Option<f64>,
    pub word_count: Option<u64>,
    pub video_url: Option<String>,
}

impl TranscriptView {
    pub fn from_result(result: &TranscriptionResult, video_url: Option<String>) -> Self {
        Self {
            title: result.title.clone(),
            transcription: result.transcription.clone(),
            segments: result.segments.clone(),
            duration: Some(result.stats.duration),
            word_count: Some(result.stats.word_count),
            video_url,
        }
    }

    /// View of a stored job; a malformed segment list is treated as no segments
    pub fn from_history(entry: &HistoryEntry) -> Self {
        let segments = entry.parsed_segments().unwrap_or_else(|e| {
            warn!("Ignoring malformed segments for history entry {}: {}", entry.id, e);
            Vec::new()
        });

        Self {
            title: entry.video_title.clone().unwrap_or_default(),
            transcription: entry.transcription.clone().unwrap_or_default(),
            segments,
            duration: entry.duration.filter(|d| *d > 0.0),
            word_count: entry.word_count.filter(|w| *w > 0),
            video_url: entry.video_url.clone(),
        }
    }

    /// View of a plain-text transcript, as produced by the TXT export
    pub fn from_plain_text(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            transcription: text.into(),
            segments: Vec::new(),
            duration: None,
            word_count: None,
            video_url: None,
        }
    }

    pub fn has_segments(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Contents of an export file for this transcript
    pub fn export(&self, format: ExportFormat) -> String {
        export::render(format, &self.transcription, &self.segments)
    }
}

/// Everything the session tracks between user actions
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub generation: u64,
    pub job: ClientJobState,
    pub view: Option<TranscriptView>,
    pub showing_timestamps: bool,
    pub video_id: Option<String>,
}

/// Identifies the job an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket {
    generation: u64,
}

impl JobTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of feeding an event to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The event belonged to the current job; carries the new state
    Current(ClientJobState),
    /// The event belonged to a superseded job and was dropped
    Stale,
}

/// Where to start playback for a segment
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCue {
    pub video_id: String,
    pub start: f64,
    pub watch_url: String,
}

/// Owner of the session state
#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    pending_url: Option<String>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn job(&self) -> &ClientJobState {
        &self.state.job
    }

    pub fn view(&self) -> Option<&TranscriptView> {
        self.state.view.as_ref()
    }

    /// Whether a job is downloading or transcribing
    pub fn is_busy(&self) -> bool {
        self.state.job.is_in_flight()
    }

    /// Starts a new job, superseding any job still in flight
    pub fn begin_job(&mut self, request: &JobRequest) -> JobTicket {
        if self.is_busy() {
            info!(
                "Superseding in-flight job (generation {})",
                self.state.generation
            );
        }

        self.state.generation += 1;
        self.state.job = ClientJobState::submitted();
        self.state.view = None;
        self.state.showing_timestamps = false;
        self.state.video_id = extract_video_id(&request.source_url);
        self.pending_url = Some(request.source_url.clone());

        debug!(
            "Job generation {} started for {}",
            self.state.generation, request.source_url
        );
        JobTicket {
            generation: self.state.generation,
        }
    }

    fn is_current(&self, ticket: JobTicket) -> bool {
        ticket.generation == self.state.generation
    }

    /// Feeds one progress event of the job identified by `ticket`
    pub fn apply(&mut self, ticket: JobTicket, event: ProgressEvent) -> Applied {
        if !self.is_current(ticket) {
            debug!(
                "Dropping event for stale job generation {} (current {})",
                ticket.generation, self.state.generation
            );
            return Applied::Stale;
        }

        let was_terminal = self.state.job.is_terminal();
        let job = std::mem::take(&mut self.state.job).apply(event);

        if !was_terminal {
            if let ClientJobState::Complete(result) = &job {
                self.state.view = Some(TranscriptView::from_result(
                    result,
                    self.pending_url.clone(),
                ));
                self.state.showing_timestamps = false;
            }
        }

        self.state.job = job.clone();
        Applied::Current(job)
    }

    /// Marks the job as failed after a transport or protocol error
    pub fn fail(&mut self, ticket: JobTicket, message: impl Into<String>) -> Applied {
        if !self.is_current(ticket) {
            return Applied::Stale;
        }
        let job = std::mem::take(&mut self.state.job).fail(message);
        self.state.job = job.clone();
        Applied::Current(job)
    }

    /// Shows a stored job; does not touch the job slot
    pub fn load_history(&mut self, entry: &HistoryEntry) -> &TranscriptView {
        let view = TranscriptView::from_history(entry);
        self.state.video_id = view.video_url.as_deref().and_then(extract_video_id);
        self.state.showing_timestamps = false;
        self.state.view.insert(view)
    }

    /// Shows an imported plain-text transcript
    pub fn load_view(&mut self, view: TranscriptView) -> &TranscriptView {
        self.state.video_id = view.video_url.as_deref().and_then(extract_video_id);
        self.state.showing_timestamps = false;
        self.state.view.insert(view)
    }

    /// Flips between plain and timestamped display; stays plain without segments
    pub fn toggle_timestamps(&mut self) -> bool {
        let has_segments = self.view().map(TranscriptView::has_segments).unwrap_or(false);
        self.state.showing_timestamps = has_segments && !self.state.showing_timestamps;
        self.state.showing_timestamps
    }

    pub fn set_timestamps(&mut self, show: bool) -> bool {
        if show != self.state.showing_timestamps {
            self.toggle_timestamps();
        }
        self.state.showing_timestamps
    }

    /// Text as currently displayed
    pub fn display_text(&self) -> String {
        match self.view() {
            Some(view) if self.state.showing_timestamps => export::timestamped_text(&view.segments),
            Some(view) => view.transcription.clone(),
            None => String::new(),
        }
    }

    /// Seek target for the segment at `index`, when the transcript has a known video
    pub fn cue(&self, index: usize) -> Option<PlayerCue> {
        let video_id = self.state.video_id.as_ref()?;
        let segment = self.view()?.segments.get(index)?;
        Some(PlayerCue {
            video_id: video_id.clone(),
            start: segment.start,
            watch_url: watch_url(video_id, segment.start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DownloadStatus, JobStats};
    use serde_json::json;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn complete(title: &str) -> ProgressEvent {
        ProgressEvent::Complete(TranscriptionResult {
            title: title.into(),
            transcription: "hello there\n\ngeneral".into(),
            segments: vec![
                Segment { start: 0.0, end: 2.0, text: "hello there".into() },
                Segment { start: 65.0, end: 67.0, text: "general".into() },
            ],
            stats: JobStats { duration: 4.5, word_count: 3 },
        })
    }

    fn transcribe() -> ProgressEvent {
        ProgressEvent::Transcribe { engine: None, model: None }
    }

    #[test]
    fn test_job_populates_view() {
        let mut session = SessionController::new();
        let ticket = session.begin_job(&JobRequest::new(URL));
        assert!(session.is_busy());
        assert_eq!(session.state().video_id.as_deref(), Some("dQw4w9WgXcQ"));

        session.apply(ticket, ProgressEvent::Download { status: DownloadStatus::Active });
        session.apply(ticket, transcribe());
        let applied = session.apply(ticket, complete("Demo"));

        assert!(matches!(applied, Applied::Current(ClientJobState::Complete(_))));
        let view = session.view().unwrap();
        assert_eq!(view.title, "Demo");
        assert_eq!(view.word_count, Some(3));
        assert_eq!(view.video_url.as_deref(), Some(URL));
        assert_eq!(session.display_text(), "hello there\n\ngeneral");
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut session = SessionController::new();
        let first = session.begin_job(&JobRequest::new(URL));
        session.apply(first, transcribe());

        let second = session.begin_job(&JobRequest::new("https://youtu.be/aaaaaaaaaaa"));
        assert_ne!(first, second);

        assert_eq!(session.apply(first, complete("Old")), Applied::Stale);
        assert_eq!(session.fail(first, "late failure"), Applied::Stale);
        assert_eq!(session.job(), &ClientJobState::Downloading);
        assert!(session.view().is_none());

        session.apply(second, transcribe());
        session.apply(second, complete("New"));
        assert_eq!(session.view().unwrap().title, "New");
    }

    #[test]
    fn test_error_event_fails_job() {
        let mut session = SessionController::new();
        let ticket = session.begin_job(&JobRequest::new(URL));
        let applied = session.apply(ticket, ProgressEvent::Error { message: "X".into() });
        assert_eq!(applied, Applied::Current(ClientJobState::Failed("X".into())));
        assert!(!session.is_busy());
        assert!(session.view().is_none());
    }

    #[test]
    fn test_toggle_timestamps_and_cue() {
        let mut session = SessionController::new();
        let ticket = session.begin_job(&JobRequest::new(URL));
        session.apply(ticket, transcribe());
        session.apply(ticket, complete("Demo"));

        assert!(session.toggle_timestamps());
        assert_eq!(session.display_text(), "[00:00] hello there\n[01:05] general");
        assert!(!session.toggle_timestamps());
        assert_eq!(session.display_text(), "hello there\n\ngeneral");

        let cue = session.cue(1).unwrap();
        assert_eq!(cue.start, 65.0);
        assert_eq!(cue.watch_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=65s");
        assert!(session.cue(5).is_none());
    }

    #[test]
    fn test_toggle_without_segments_stays_plain() {
        let mut session = SessionController::new();
        session.load_view(TranscriptView::from_plain_text("notes", "just text"));
        assert!(!session.toggle_timestamps());
        assert!(!session.set_timestamps(true));
        assert_eq!(session.display_text(), "just text");
    }

    #[test]
    fn test_load_history_with_malformed_segments() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": 9,
            "video_title": "Stored",
            "video_url": "https://youtu.be/dQw4w9WgXcQ",
            "transcription": "saved text",
            "segments": "not json",
            "duration": 0.0
        }))
        .unwrap();

        let mut session = SessionController::new();
        let view = session.load_history(&entry);
        assert!(view.segments.is_empty());
        assert_eq!(view.duration, None);
        assert_eq!(session.state().video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(session.job(), &ClientJobState::Idle);
        assert_eq!(session.display_text(), "saved text");
    }

    #[test]
    fn test_plain_text_round_trip() {
        let text = "First paragraph.\n\nSecond paragraph with ñ.\n";
        let exported = TranscriptView::from_plain_text("t", text).export(ExportFormat::Txt);

        let mut session = SessionController::new();
        session.load_view(TranscriptView::from_plain_text("t", exported));
        assert_eq!(session.display_text(), text);
    }
}
