//! Streaming chat client for the xAI (Grok) chat completions API.
//!
//! The prompt is sent as a single user message with `stream: true`; the
//! server-sent event stream is decoded line by line and each content delta
//! is handed to the caller as it arrives.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use ctxkit_shared::{CtxKitError, HttpSettings, Result};

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// One decoded line of the event stream.
#[derive(Debug, PartialEq)]
enum StreamLine {
    /// Content deltas carried by a `data:` chunk.
    Content(Vec<String>),
    /// `data: [DONE]`.
    Done,
    /// Anything else (comments, blank keep-alives, other fields).
    Skip,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking Grok chat client.
pub struct GrokClient {
    client: Client,
    url: String,
    api_key: String,
}

impl GrokClient {
    /// Create a client for the endpoint at `url`.
    ///
    /// The HTTP timeout only bounds connecting; a streamed answer may take
    /// longer than any fixed request timeout.
    pub fn new(http: &HttpSettings, url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .connect_timeout(Duration::from_secs(http.timeout_secs))
            .timeout(None)
            .build()
            .map_err(|e| CtxKitError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    /// Send `prompt` to `model` and stream the answer into `on_chunk`.
    #[instrument(skip(self, prompt, on_chunk), fields(prompt_len = prompt.len()))]
    pub fn chat(
        &self,
        model: &str,
        prompt: &str,
        temperature: f64,
        on_chunk: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<()> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            stream: true,
        };

        info!(url = %self.url, "sending chat request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .map_err(|e| CtxKitError::Api(format!("POST {model} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CtxKitError::Api(format!(
                "POST {model} failed with status {status}"
            )));
        }

        let mut chunks = 0usize;
        for line in BufReader::new(response).lines() {
            let line = line.map_err(|e| CtxKitError::Api(format!("stream read failed: {e}")))?;
            match parse_stream_line(&line) {
                StreamLine::Content(parts) => {
                    for part in parts {
                        chunks += 1;
                        on_chunk(&part)?;
                    }
                }
                StreamLine::Done => break,
                StreamLine::Skip => {}
            }
        }

        debug!(chunks, "chat stream finished");
        Ok(())
    }
}

/// Decode one line of the event stream.
fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.strip_prefix("data: ") else {
        return StreamLine::Skip;
    };
    if data == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => StreamLine::Content(
            chunk
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .filter(|content| !content.is_empty())
                .collect(),
        ),
        Err(e) => {
            warn!(error = %e, "skipping undecodable stream chunk");
            StreamLine::Skip
        }
    }
}
