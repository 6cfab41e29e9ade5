//! Ollama completion backend.
//!
//! Implements [`CompletionBackend`] on top of a local Ollama server's
//! `/api/generate` endpoint. Non-streaming calls read one JSON object;
//! streaming calls hand the response body to a spawned task that feeds a
//! [`StreamHandle`] until the final chunk, or until the handle is cancelled
//! or dropped, at which point the HTTP response is dropped as well.

use super::stream::pump;
use super::types::{GenerateChunk, GenerateOptions, GenerateRequest, SamplingSettings};
use async_trait::async_trait;
use parley_application::{CompletionBackend, GatewayError, StreamHandle};
use parley_domain::CompletionOptions;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:12b";

/// Connection and model settings for [`OllamaBackend`]
#[derive(Debug, Clone)]
pub struct OllamaSettings {
    /// Base URL of the server, e.g. `http://localhost:11434`
    pub host: String,
    pub model: String,
    pub connect_timeout: Duration,
    pub sampling: SamplingSettings,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout: Duration::from_secs(10),
            sampling: SamplingSettings::default(),
        }
    }
}

pub struct OllamaBackend {
    client: reqwest::Client,
    settings: OllamaSettings,
    endpoint: String,
}

impl OllamaBackend {
    pub fn new(settings: OllamaSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        let endpoint = format!("{}/api/generate", settings.host.trim_end_matches('/'));
        info!("Using Ollama model '{}' at {}", settings.model, settings.host);
        Ok(Self {
            client,
            settings,
            endpoint,
        })
    }

    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }

    async fn send(
        &self,
        prompt: &str,
        options: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let request = GenerateRequest {
            model: &self.settings.model,
            prompt,
            stream,
            options: GenerateOptions::from_completion(options, &self.settings.sampling),
        };
        debug!(
            "POST {} (stream: {}, prompt: {} chars)",
            self.endpoint,
            stream,
            prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let response = self.send(prompt, options, false).await?;
        let body = response.text().await.map_err(map_transport_error)?;
        parse_completion(&body)
    }

    async fn complete_streaming(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let response = self.send(prompt, options, true).await?;

        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Ollama stream cancelled"),
                _ = pump(response, tx) => {}
            }
        });

        Ok(StreamHandle::with_cancellation(rx, cancel))
    }
}

/// Parse a non-streaming reply body
fn parse_completion(body: &str) -> Result<String, GatewayError> {
    let chunk: GenerateChunk = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("Invalid reply: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(classify_server_error(&error));
    }
    if !chunk.done {
        return Err(GatewayError::MalformedResponse(
            "Reply is not marked done".to_string(),
        ));
    }
    Ok(chunk.response)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else if e.is_decode() || e.is_body() {
        GatewayError::MalformedResponse(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

fn map_status(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<GenerateChunk>(body)
        .ok()
        .and_then(|c| c.error)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            GatewayError::ResourceLimit(format!("{}: {}", status, message))
        }
        _ => match classify_server_error(&message) {
            GatewayError::ResourceLimit(m) => GatewayError::ResourceLimit(m),
            _ => GatewayError::RequestFailed(format!("{}: {}", status, message)),
        },
    }
}

/// Ollama reports resource exhaustion as plain error text.
fn classify_server_error(message: &str) -> GatewayError {
    let lower = message.to_lowercase();
    if lower.contains("memory") || lower.contains("resource") || lower.contains("capacity") {
        GatewayError::ResourceLimit(message.to_string())
    } else {
        GatewayError::RequestFailed(message.to_string())
    }
}
