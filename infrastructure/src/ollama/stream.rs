//! JSON Lines stream handling for `/api/generate`.
//!
//! Ollama streams one JSON object per line (not SSE). [`LineDecoder`]
//! reassembles lines across arbitrary byte chunk boundaries, including
//! multi-byte UTF-8 characters split between chunks, and [`pump`] forwards
//! the decoded text to a [`StreamHandle`](parley_application::StreamHandle)
//! channel until the final `done` object arrives.

use super::types::GenerateChunk;
use futures::StreamExt;
use parley_application::GatewayError;
use parley_domain::StreamEvent;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Maximum size for buffers before we abort the stream.
const MAX_BUF: usize = 16 * 1024 * 1024;

/// Incremental JSON Lines decoder
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buffer: String,
    utf8_buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every complete object it finishes.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>, GatewayError> {
        self.utf8_buf.extend_from_slice(bytes);
        if self.utf8_buf.len() > MAX_BUF || self.buffer.len() > MAX_BUF {
            self.utf8_buf.clear();
            self.buffer.clear();
            return Err(GatewayError::MalformedResponse(
                "Stream buffer exceeded 16 MiB".to_string(),
            ));
        }

        self.decode_utf8();

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            if let Some(chunk) = parse_line(&line)? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// Decode whatever is left once the body has ended without a newline.
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>, GatewayError> {
        // A character cut off by the end of the body
        if !self.utf8_buf.is_empty() {
            self.buffer.push_str(&String::from_utf8_lossy(&self.utf8_buf));
            self.utf8_buf.clear();
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_line(rest.trim())
    }

    /// Move every decodable byte from `utf8_buf` into `buffer`, leaving at
    /// most an incomplete trailing character behind.
    fn decode_utf8(&mut self) {
        loop {
            match std::str::from_utf8(&self.utf8_buf) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.utf8_buf.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.utf8_buf[..valid_up_to]));
                    match e.error_len() {
                        // Permanently invalid bytes are skipped
                        Some(len) => {
                            self.utf8_buf.drain(..valid_up_to + len);
                        }
                        // Incomplete character; keep the tail for the next chunk
                        None => {
                            self.utf8_buf.drain(..valid_up_to);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn parse_line(line: &str) -> Result<Option<GenerateChunk>, GatewayError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<GenerateChunk>(line)
        .map(Some)
        .map_err(|e| GatewayError::MalformedResponse(format!("Invalid stream line: {}", e)))
}

/// What a decoded chunk means for the consumer
#[derive(Debug, PartialEq)]
pub(crate) enum ChunkOutcome {
    /// More to come; carries the fragment, if the chunk had text
    Continue(Option<String>),
    /// Final chunk; carries its trailing fragment, if any
    Done(Option<String>),
    Failed(String),
}

/// Classify one chunk, appending its text to `full_text`.
pub(crate) fn apply_chunk(chunk: GenerateChunk, full_text: &mut String) -> ChunkOutcome {
    if let Some(error) = chunk.error {
        return ChunkOutcome::Failed(error);
    }
    let delta = if chunk.response.is_empty() {
        None
    } else {
        full_text.push_str(&chunk.response);
        Some(chunk.response)
    };
    if chunk.done {
        if let Some(count) = chunk.eval_count {
            trace!("Stream finished after {} generated token(s)", count);
        }
        return ChunkOutcome::Done(delta);
    }
    ChunkOutcome::Continue(delta)
}

/// Forward a streaming response body to `tx`.
///
/// Sends `Delta` for every non-empty fragment, then exactly one terminal
/// event: `Completed` with the accumulated text or `Error`. Returns early
/// when the receiver goes away.
pub(crate) async fn pump(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut body = response.bytes_stream();
    let mut decoder = LineDecoder::new();
    let mut full_text = String::new();

    while let Some(next) = body.next().await {
        let chunks = match next {
            Ok(bytes) => decoder.push(&bytes),
            Err(e) => Err(GatewayError::ConnectionError(format!(
                "Stream read error: {}",
                e
            ))),
        };
        let chunks = match chunks {
            Ok(chunks) => chunks,
            Err(e) => {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };

        for chunk in chunks {
            if !forward(chunk, &mut full_text, &tx).await {
                return;
            }
        }
    }

    match decoder.finish() {
        Ok(Some(chunk)) => {
            if !forward(chunk, &mut full_text, &tx).await {
                return;
            }
        }
        Ok(None) => {}
        Err(e) => {
            let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            return;
        }
    }

    debug!("Stream body ended without a final chunk");
    let _ = tx
        .send(StreamEvent::Error(GatewayError::TransportClosed.to_string()))
        .await;
}

/// Send the events for one chunk. Returns `false` once the stream is over,
/// either because a terminal event was sent or the receiver was dropped.
async fn forward(
    chunk: GenerateChunk,
    full_text: &mut String,
    tx: &mpsc::Sender<StreamEvent>,
) -> bool {
    match apply_chunk(chunk, full_text) {
        ChunkOutcome::Continue(Some(delta)) => tx.send(StreamEvent::Delta(delta)).await.is_ok(),
        ChunkOutcome::Continue(None) => true,
        ChunkOutcome::Done(delta) => {
            if let Some(delta) = delta
                && tx.send(StreamEvent::Delta(delta)).await.is_err()
            {
                return false;
            }
            let _ = tx.send(StreamEvent::Completed(full_text.clone())).await;
            false
        }
        ChunkOutcome::Failed(message) => {
            let _ = tx.send(StreamEvent::Error(message)).await;
            false
        }
    }
}
