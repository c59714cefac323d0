//! HTTP client for the transcription service
//!
//! Wraps the four endpoints the front-end uses: the streamed `POST /transcribe` and the
//! history listing, detail and delete calls. History calls are bounded by the request
//! timeout; the transcription stream is not, since a long video can take many minutes.

use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::{Response, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::history::HistoryBrowser;
use crate::job_state::ClientJobState;
use crate::models::{HistoryEntry, HistorySummary, JobRequest, ProgressEvent, TranscriptionResult};
use crate::session::{Applied, SessionController};
use crate::stream::{decode_events, EventStream};

/// Client for one transcription service
#[derive(Clone, Debug)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl TranscriptionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a job stream
    ///
    /// Each call sends a new request; the returned stream yields events until the
    /// first Complete or Error record.
    pub async fn submit(&self, request: &JobRequest) -> Result<EventStream, ClientError> {
        if request.source_url.trim().is_empty() {
            return Err(ClientError::EmptyUrl);
        }

        info!(
            "Submitting {} (engine: {}, model: {}, language: {})",
            request.source_url,
            request.engine,
            request.model_size,
            request.language.as_deref().unwrap_or("auto")
        );

        let response = self
            .http
            .post(self.config.endpoint("/transcribe"))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(decode_events(response.bytes_stream()))
    }

    /// Runs a whole job through `session`, calling `on_event` after each applied event
    ///
    /// Returns the result on completion. Backend errors come back as
    /// [`ClientError::Job`]; transport and protocol failures as they occurred.
    pub async fn run_job<F>(
        &self,
        session: &mut SessionController,
        request: &JobRequest,
        mut on_event: F,
    ) -> Result<TranscriptionResult, ClientError>
    where
        F: FnMut(&ProgressEvent, &ClientJobState),
    {
        // A blank submit leaves the session exactly as it was
        if request.source_url.trim().is_empty() {
            return Err(ClientError::EmptyUrl);
        }

        let ticket = session.begin_job(request);

        let mut events = match self.submit(request).await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to start transcription: {}", e);
                session.fail(ticket, e.user_message());
                return Err(e);
            }
        };

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    error!("Transcription stream failed: {}", e);
                    session.fail(ticket, e.user_message());
                    return Err(e);
                }
            };

            let state = match session.apply(ticket, event.clone()) {
                Applied::Current(state) => state,
                Applied::Stale => {
                    warn!("Job generation {} was superseded", ticket.generation());
                    return Err(ClientError::protocol("job superseded by a newer request"));
                }
            };
            on_event(&event, &state);

            match state {
                ClientJobState::Complete(result) => {
                    info!(
                        "Transcription of '{}' complete: {} words in {}s",
                        result.title, result.stats.word_count, result.stats.duration
                    );
                    return Ok(result);
                }
                ClientJobState::Failed(message) => {
                    error!("Transcription failed: {}", message);
                    return Err(ClientError::Job(message));
                }
                _ => {}
            }
        }

        let e = ClientError::protocol("stream ended before completion");
        session.fail(ticket, e.user_message());
        Err(e)
    }

    /// `GET /history`
    pub async fn list_history(&self) -> Result<Vec<HistorySummary>, ClientError> {
        let response = self
            .http
            .get(self.config.endpoint("/history"))
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let entries: Vec<HistorySummary> = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("Invalid history listing: {}", e)))?;
        debug!("Fetched {} history entries", entries.len());
        Ok(entries)
    }

    /// Fetches the listing into a browser
    pub async fn history_browser(&self) -> Result<HistoryBrowser, ClientError> {
        Ok(HistoryBrowser::from_summaries(self.list_history().await?))
    }

    /// `GET /history/{id}`
    pub async fn get_history(&self, id: i64) -> Result<HistoryEntry, ClientError> {
        let response = self
            .http
            .get(self.config.endpoint(&format!("/history/{}", id)))
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("history entry {}", id)));
        }
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("Invalid history entry {}: {}", id, e)))
    }

    /// `DELETE /history/{id}`
    pub async fn delete_history(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.config.endpoint(&format!("/history/{}", id)))
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("history entry {}", id)));
        }
        check_status(response).await?;
        info!("Deleted history entry {}", id);
        Ok(())
    }

    /// Deletes an entry on the service, then drops it from `browser`
    pub async fn delete_from(&self, browser: &mut HistoryBrowser, id: i64) -> Result<(), ClientError> {
        self.delete_history(id).await?;
        browser.remove(id);
        Ok(())
    }
}

/// Passes 2xx responses through and turns the rest into `HttpStatus`
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    warn!("Service answered {}: {}", status, message);
    Err(ClientError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

/// `detail` (FastAPI) or `error` field of an error body, or the body itself
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["detail", "error"]
            .iter()
            .find_map(|key| value.get(key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .or_else(|| Some(body.to_string())),
        Err(_) => Some(body.to_string()),
    }
}
