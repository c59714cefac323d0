// Error handling for the video transcriber
//
// This module defines the error types surfaced by the transcription client.
// It centralizes error definitions and provides helpful conversion traits.

use std::io;
use thiserror::Error;

/// Errors that can occur while talking to the transcription service
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure while opening or reading a response
    #[error("Request error: {0}")]
    Request(reqwest::Error),

    /// The service could not be reached at all
    #[error("Transcription service unreachable: {0}")]
    BackendUnreachable(String),

    /// The service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The response body did not follow the expected format
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The backend reported a failure for the job
    #[error("{0}")]
    Job(String),

    /// A history entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No video URL was given
    #[error("No URL provided")]
    EmptyUrl,

    /// Error when reading or writing export files
    #[error("File error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding error outside the progress stream
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Create a new Protocol error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// Message suitable for showing to the user as-is
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Job(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the job failed because of the backend rather than the transport
    pub fn is_job_error(&self) -> bool {
        matches!(self, ClientError::Job(_))
    }
}

/// Classify reqwest failures: connect and timeout errors mean the backend is unreachable
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ClientError::BackendUnreachable(err.to_string())
        } else {
            ClientError::Request(err)
        }
    }
}
