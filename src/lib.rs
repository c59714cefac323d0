// Video Transcriber Library
//
// This crate is a client for a video transcription service. It submits a video URL,
// follows the newline-delimited JSON progress stream until the job completes, and
// exposes the result, the service's history and SRT/TXT exports.

pub mod cli;
pub mod client;
pub mod config;
pub mod config_loader;
pub mod config_validator;
pub mod error;
pub mod export;
pub mod file_utils;
pub mod history;
pub mod job_state;
pub mod models;
pub mod session;
pub mod stream;
pub mod video;

// Re-export common types for easier access
pub use client::TranscriptionClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use export::ExportFormat;
pub use history::HistoryBrowser;
pub use job_state::ClientJobState;
pub use models::{
    Engine, HistoryEntry, HistorySummary, JobRequest, ModelSize, ProgressEvent, Segment,
    TranscriptionResult,
};
pub use session::{SessionController, TranscriptView};
