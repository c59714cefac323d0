//! Client-side job state machine
//!
//! A job moves `Idle -> Downloading -> Transcribing -> Complete | Failed`, driven only
//! by progress events. `Complete` and `Failed` are terminal: later events are ignored.

use log::{debug, warn};
use serde::Serialize;

use crate::models::{DownloadStatus, ProgressEvent, TranscriptionResult};

/// Current phase of the session's job
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "detail")]
pub enum ClientJobState {
    #[default]
    Idle,
    Downloading,
    Transcribing,
    Complete(TranscriptionResult),
    Failed(String),
}

impl ClientJobState {
    /// Complete or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClientJobState::Complete(_) | ClientJobState::Failed(_))
    }

    /// Downloading or Transcribing
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ClientJobState::Downloading | ClientJobState::Transcribing)
    }

    /// Entered when a request is submitted
    pub fn submitted() -> Self {
        ClientJobState::Downloading
    }

    /// Applies one progress event and returns the next state
    pub fn apply(self, event: ProgressEvent) -> Self {
        match (self, event) {
            (state, _) if state.is_terminal() => {
                debug!("Ignoring progress event after terminal state");
                state
            }
            (_, ProgressEvent::Error { message }) => ClientJobState::Failed(message),
            (ClientJobState::Idle, event) => {
                warn!("Progress event received with no job submitted: {:?}", event);
                ClientJobState::Idle
            }
            // A finished download is only a progress cue; the phase changes when
            // transcription starts.
            (state, ProgressEvent::Download { status }) => {
                if state == ClientJobState::Transcribing {
                    debug!("Late download event ({:?}) while transcribing", status);
                }
                state
            }
            (_, ProgressEvent::Transcribe { .. }) => ClientJobState::Transcribing,
            (ClientJobState::Downloading, ProgressEvent::Complete(result)) => {
                warn!("Job completed without a transcribe step");
                ClientJobState::Complete(result)
            }
            (_, ProgressEvent::Complete(result)) => ClientJobState::Complete(result),
        }
    }

    /// Transport or protocol failure outside the event stream
    pub fn fail(self, message: impl Into<String>) -> Self {
        if self.is_terminal() {
            return self;
        }
        ClientJobState::Failed(message.into())
    }

    /// Human-readable status line for the current phase
    pub fn status_text(&self) -> &'static str {
        match self {
            ClientJobState::Idle => "Idle",
            ClientJobState::Downloading => "Downloading audio...",
            ClientJobState::Transcribing => "Transcribing with AI...",
            ClientJobState::Complete(_) => "Transcription complete",
            ClientJobState::Failed(_) => "Transcription failed",
        }
    }
}

/// Approximate progress for an event, as a fraction of the whole job
pub fn progress_fraction(event: &ProgressEvent) -> f32 {
    match event {
        ProgressEvent::Download {
            status: DownloadStatus::Active,
        } => 0.3,
        ProgressEvent::Download {
            status: DownloadStatus::Completed,
        } => 0.5,
        ProgressEvent::Transcribe { .. } => 0.9,
        ProgressEvent::Complete(_) => 1.0,
        ProgressEvent::Error { .. } => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStats, Segment};

    fn result() -> TranscriptionResult {
        TranscriptionResult {
            title: "Demo".into(),
            transcription: "hello".into(),
            segments: vec![Segment {
                start: 0.0,
                end: 1.0,
                text: "hello".into(),
            }],
            stats: JobStats {
                duration: 2.0,
                word_count: 1,
            },
        }
    }

    fn download(status: DownloadStatus) -> ProgressEvent {
        ProgressEvent::Download { status }
    }

    fn transcribe() -> ProgressEvent {
        ProgressEvent::Transcribe {
            engine: None,
            model: None,
        }
    }

    #[test]
    fn test_full_happy_path() {
        let state = ClientJobState::submitted();
        assert_eq!(state, ClientJobState::Downloading);

        let state = state.apply(download(DownloadStatus::Active));
        assert_eq!(state, ClientJobState::Downloading);

        let state = state.apply(download(DownloadStatus::Completed));
        assert_eq!(state, ClientJobState::Downloading);

        let state = state.apply(transcribe());
        assert_eq!(state, ClientJobState::Transcribing);
        assert!(state.is_in_flight());

        let state = state.apply(ProgressEvent::Complete(result()));
        assert_eq!(state, ClientJobState::Complete(result()));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_error_from_any_phase() {
        for start in [ClientJobState::Downloading, ClientJobState::Transcribing] {
            let state = start.apply(ProgressEvent::Error {
                message: "X".into(),
            });
            assert_eq!(state, ClientJobState::Failed("X".into()));
        }
    }

    #[test]
    fn test_terminal_states_ignore_events() {
        let failed = ClientJobState::Failed("X".into());
        assert_eq!(failed.clone().apply(transcribe()), failed);
        assert_eq!(failed.clone().fail("later"), failed);

        let done = ClientJobState::Complete(result());
        assert_eq!(
            done.clone().apply(ProgressEvent::Error {
                message: "late".into()
            }),
            done
        );
    }

    #[test]
    fn test_complete_straight_from_download() {
        let state = ClientJobState::Downloading.apply(ProgressEvent::Complete(result()));
        assert!(matches!(state, ClientJobState::Complete(_)));
    }

    #[test]
    fn test_idle_ignores_progress() {
        assert_eq!(ClientJobState::Idle.apply(transcribe()), ClientJobState::Idle);
    }

    #[test]
    fn test_progress_fraction_is_monotonic() {
        let steps = [
            download(DownloadStatus::Active),
            download(DownloadStatus::Completed),
            transcribe(),
            ProgressEvent::Complete(result()),
        ];
        let fractions: Vec<f32> = steps.iter().map(progress_fraction).collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    }
}
