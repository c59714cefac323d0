//! Progress stream decoding
//!
//! The transcription service answers `POST /transcribe` with newline-delimited JSON:
//! one record per line, flushed as the job advances. Reads from the socket do not
//! respect line boundaries, so bytes are buffered until a newline arrives and only
//! complete lines are decoded.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use log::{debug, warn};
use serde_json::Value;

use crate::error::ClientError;
use crate::models::{DownloadStatus, ProgressEvent, TranscriptionResult};

/// Boxed stream of decoded progress events
pub type EventStream = BoxStream<'static, Result<ProgressEvent, ClientError>>;

/// Accumulates raw bytes and hands out complete lines
///
/// Works on bytes rather than text so a multi-byte character split between two
/// reads is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed, without terminators
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            lines.push(decode_line(&self.pending[consumed..end]));
            consumed = end + 1;
        }
        self.pending.drain(..consumed);
        lines
    }

    /// Returns the unterminated tail left when the body ends, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = decode_line(&self.pending);
        self.pending.clear();
        Some(tail)
    }

    /// Number of bytes waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// What a single line turned into
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Event(ProgressEvent),
    Skip,
}

/// Decodes one NDJSON record
///
/// Unparseable lines and unknown steps are skipped. A malformed line that carries a
/// `message` property is fatal, as is a `complete` record whose payload cannot be read.
pub fn parse_line(line: &str) -> Result<LineOutcome, ClientError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Skip);
    }

    let record: Value = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
            if line.contains("\"message\"") {
                return Err(ClientError::protocol(format!(
                    "Malformed progress record: {}",
                    e
                )));
            }
            warn!("Skipping malformed progress line ({}): {}", e, line);
            return Ok(LineOutcome::Skip);
        }
    };

    let Some(object) = record.as_object() else {
        warn!("Skipping non-object progress line: {}", line);
        return Ok(LineOutcome::Skip);
    };

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        return Ok(LineOutcome::Event(ProgressEvent::Error {
            message: error_text(error),
        }));
    }

    let step = object.get("step").and_then(Value::as_str).unwrap_or_default();
    let status = object.get("status").and_then(Value::as_str);

    let event = match (step, status) {
        ("download", Some("active")) => ProgressEvent::Download {
            status: DownloadStatus::Active,
        },
        ("download", Some("completed")) => ProgressEvent::Download {
            status: DownloadStatus::Completed,
        },
        ("transcribe", Some("active") | None) => ProgressEvent::Transcribe {
            engine: object.get("engine").and_then(Value::as_str).map(String::from),
            model: object.get("model").and_then(Value::as_str).map(String::from),
        },
        ("complete", _) => complete_event(object.get("data"))?,
        _ => {
            debug!("Ignoring progress record with step '{}' status {:?}", step, status);
            return Ok(LineOutcome::Skip);
        }
    };

    Ok(LineOutcome::Event(event))
}

fn complete_event(data: Option<&Value>) -> Result<ProgressEvent, ClientError> {
    let data = data.ok_or_else(|| ClientError::protocol("Complete record without data"))?;

    if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
        return Ok(ProgressEvent::Error {
            message: error_text(error),
        });
    }

    let result: TranscriptionResult = serde_json::from_value(data.clone())
        .map_err(|e| ClientError::protocol(format!("Invalid complete record: {}", e)))?;
    Ok(ProgressEvent::Complete(result))
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

struct DecoderState<S> {
    body: std::pin::Pin<Box<S>>,
    buffer: LineBuffer,
    ready: VecDeque<String>,
    body_done: bool,
    finished: bool,
}

/// Turns a chunked response body into progress events
///
/// The resulting stream ends right after the first terminal event (Complete or
/// Error), on the first transport or fatal protocol error, or with a protocol error
/// when the body ends before any terminal record.
pub fn decode_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let state = DecoderState {
        body: Box::pin(body),
        buffer: LineBuffer::new(),
        ready: VecDeque::new(),
        body_done: false,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.finished {
            return None;
        }

        loop {
            if let Some(line) = st.ready.pop_front() {
                match parse_line(&line) {
                    Ok(LineOutcome::Event(event)) => {
                        st.finished = event.is_terminal();
                        return Some((Ok(event), st));
                    }
                    Ok(LineOutcome::Skip) => continue,
                    Err(e) => {
                        st.finished = true;
                        return Some((Err(e), st));
                    }
                }
            }

            if st.body_done {
                st.finished = true;
                return Some((
                    Err(ClientError::protocol("stream ended before completion")),
                    st,
                ));
            }

            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let lines = st.buffer.push(chunk.as_ref());
                    st.ready.extend(lines);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.body_done = true;
                    if let Some(tail) = st.buffer.finish() {
                        st.ready.push_back(tail);
                    }
                }
            }
        }
    })
    .boxed()
}
