// Video transcriber configuration
//
// This module contains configuration structures and constants for the transcription client.
// It centralizes all configuration parameters and provides defaults from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

use crate::models::{Engine, ModelSize};

/// Default values for configuration
pub mod defaults {
    // Base URL of the transcription service
    pub const SERVER_URL: &str = "http://127.0.0.1:8000";

    // Overall timeout for non-streaming requests (history), in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    // Timeout for establishing a connection, in seconds
    pub const CONNECT_TIMEOUT_SECONDS: u64 = 10;

    // Default transcription engine
    pub const ENGINE: &str = "whisper";

    // Default model size
    pub const MODEL_SIZE: &str = "tiny";

    // Directory where exported files are written
    pub const EXPORT_DIR: &str = ".";
}

// Environment variable names
pub const ENV_SERVER_URL: &str = "TRANSCRIBER_SERVER_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "TRANSCRIBER_REQUEST_TIMEOUT";
pub const ENV_CONNECT_TIMEOUT: &str = "TRANSCRIBER_CONNECT_TIMEOUT";
pub const ENV_ENGINE: &str = "TRANSCRIBER_ENGINE";
pub const ENV_MODEL_SIZE: &str = "TRANSCRIBER_MODEL_SIZE";
pub const ENV_LANGUAGE: &str = "TRANSCRIBER_LANGUAGE";
pub const ENV_EXPORT_DIR: &str = "TRANSCRIBER_EXPORT_DIR";

/// Configuration for the transcription client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the transcription service, without trailing slash
    pub server_url: String,
    /// Timeout for history requests. The transcription stream is not bounded by it.
    pub request_timeout: Duration,
    /// Timeout for establishing connections
    pub connect_timeout: Duration,
    /// Engine used when the caller does not pick one
    pub engine: Engine,
    /// Model size used when the caller does not pick one
    pub model_size: ModelSize,
    /// Language hint, `None` lets the backend detect it
    pub language: Option<String>,
    /// Directory for exported transcripts
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let engine = env::var(ENV_ENGINE)
            .unwrap_or_else(|_| String::from(defaults::ENGINE));
        let engine = engine.parse().unwrap_or_else(|_| {
            warn!(
                "Invalid engine in environment variable: {}. Using default: {}",
                engine,
                defaults::ENGINE
            );
            Engine::default()
        });

        let model_size = env::var(ENV_MODEL_SIZE)
            .unwrap_or_else(|_| String::from(defaults::MODEL_SIZE));
        let model_size = model_size.parse().unwrap_or_else(|_| {
            warn!(
                "Invalid model size in environment variable: {}. Using default: {}",
                model_size,
                defaults::MODEL_SIZE
            );
            ModelSize::default()
        });

        Self {
            server_url: normalize_base_url(
                &env::var(ENV_SERVER_URL).unwrap_or_else(|_| String::from(defaults::SERVER_URL)),
            ),
            request_timeout: Duration::from_secs(
                env::var(ENV_REQUEST_TIMEOUT)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults::REQUEST_TIMEOUT_SECONDS),
            ),
            connect_timeout: Duration::from_secs(
                env::var(ENV_CONNECT_TIMEOUT)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults::CONNECT_TIMEOUT_SECONDS),
            ),
            engine,
            model_size,
            language: env::var(ENV_LANGUAGE)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "auto"),
            export_dir: PathBuf::from(
                env::var(ENV_EXPORT_DIR).unwrap_or_else(|_| String::from(defaults::EXPORT_DIR)),
            ),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `server_url` with every other field at its default value
    pub fn with_server_url(server_url: &str) -> Self {
        Self {
            server_url: normalize_base_url(server_url),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECONDS),
            engine: Engine::default(),
            model_size: ModelSize::default(),
            language: None,
            export_dir: PathBuf::from(defaults::EXPORT_DIR),
        }
    }

    /// Points the configuration at another service, keeping the other fields
    pub fn set_server_url(&mut self, server_url: &str) {
        self.server_url = normalize_base_url(server_url);
    }

    /// Builds an absolute URL for an API path such as `/history/3`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.server_url, path.trim_start_matches('/'))
    }

    /// Ensures the export directory exists
    pub fn ensure_export_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.export_dir)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig::with_server_url("http://localhost:8000/");
        assert_eq!(config.endpoint("/history"), "http://localhost:8000/history");
        assert_eq!(config.endpoint("history/4"), "http://localhost:8000/history/4");
    }

    #[test]
    fn test_with_server_url_uses_defaults() {
        let config = ClientConfig::with_server_url("http://example.test");
        assert_eq!(config.engine, Engine::Whisper);
        assert_eq!(config.model_size, ModelSize::Tiny);
        assert!(config.language.is_none());
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(defaults::REQUEST_TIMEOUT_SECONDS)
        );
    }

    #[test]
    fn test_set_server_url_keeps_other_fields() {
        let mut config = ClientConfig::with_server_url("http://example.test");
        config.model_size = ModelSize::Medium;
        config.set_server_url(" http://10.0.0.5:8000/ ");
        assert_eq!(config.server_url, "http://10.0.0.5:8000");
        assert_eq!(config.model_size, ModelSize::Medium);
    }
}
