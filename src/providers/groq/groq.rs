use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::providers::traits::{CompletionProvider, TextStream};

#[derive(Clone)]
pub struct GroqProvider {
    api_key: String,
    api_url: String,
    client: Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqProvider {
    pub fn new(api_key: String, config: &ProviderConfig) -> Self {
        Self {
            api_key,
            api_url: config.api_url.clone(),
            client: Client::new(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Same client and credentials, different response length cap.
    pub fn with_max_tokens(&self, max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..self.clone()
        }
    }

    fn request_body(&self, messages: Value, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": stream,
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!(
                "API request failed: Status {}, Body: {}",
                status,
                error_text
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(json!([{ "role": "user", "content": prompt }]), false);
        let response_json: Value = self.send(&body).await?.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(anyhow!("API returned error: {}", error));
        }

        response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow!("Invalid response format: {}", response_json))
    }

    async fn stream_chat(&self, system_prompt: &str, user_message: &str) -> Result<TextStream> {
        let body = self.request_body(
            json!([
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ]),
            true,
        );
        let response = self.send(&body).await?;
        Ok(Box::pin(sse_fragments(response.bytes_stream())))
    }

    async fn get_model_info(&self) -> Result<String> {
        Ok(self.model.clone())
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(crate) enum SseLine {
    Content(String),
    Done,
    Ignore,
}

pub(crate) fn parse_sse_line(line: &str) -> Result<SseLine> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(SseLine::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseLine::Content)
        .unwrap_or(SseLine::Ignore))
}

/// Turns a server-sent-event byte stream into content fragments, stopping
/// at `[DONE]`. Lines may be split across chunks.
pub(crate) fn sse_fragments<S, B, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(anyhow::Error::from)?;
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&line).into_owned();
                match parse_sse_line(&line)? {
                    SseLine::Content(content) => {
                        yield content;
                    }
                    SseLine::Done => return,
                    SseLine::Ignore => {}
                }
            }
        }

        // Unterminated last line.
        let tail = String::from_utf8_lossy(&buffer).into_owned();
        if let SseLine::Content(content) = parse_sse_line(&tail)? {
            yield content;
        }
    }
}
