//! Streaming chat-completion client for OpenAI-compatible endpoints.

use crate::error::ChatError;
use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Incremental sequence of completion text fragments. Dropping the stream
/// closes the underlying connection, so an abandoned answer does not run to
/// completion unconsumed.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<FragmentStream, ChatError>;
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<FragmentStream, ChatError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "messages": messages,
                "stream": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!("{status}: {body}")));
        }

        Ok(sse_fragment_stream(response))
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Fragment(String),
    Done,
    Ignored,
}

/// Interprets one server-sent-event line. Comment lines (OpenRouter sends
/// keep-alive comments) and empty delta payloads are ignored.
fn parse_sse_line(line: &str) -> Result<SseEvent, ChatError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(SseEvent::Ignored);
    }

    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Ignored);
    };

    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|error| ChatError::MalformedStream(error.to_string()))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseEvent::Fragment)
        .unwrap_or(SseEvent::Ignored))
}

/// Splits a byte stream into lines at `\n`, decoding only complete lines.
/// Network chunks can end mid-character, so any trailing bytes (including a
/// split multi-byte sequence) stay buffered until the rest arrives.
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator, or `None` until one is
    /// buffered.
    fn next_line(&mut self) -> Option<String> {
        let newline = self.bytes.iter().position(|&byte| byte == b'\n')?;
        let mut line: Vec<u8> = self.bytes.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

struct SseState {
    response: reqwest::Response,
    buffer: LineBuffer,
    pending: VecDeque<String>,
    done: bool,
}

fn sse_fragment_stream(response: reqwest::Response) -> FragmentStream {
    let state = SseState {
        response,
        buffer: LineBuffer::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.done {
                return None;
            }

            match state.response.chunk().await {
                Ok(Some(bytes)) => {
                    state.buffer.extend(&bytes);

                    while let Some(line) = state.buffer.next_line() {
                        match parse_sse_line(&line) {
                            Ok(SseEvent::Fragment(fragment)) => state.pending.push_back(fragment),
                            Ok(SseEvent::Ignored) => {}
                            Ok(SseEvent::Done) => {
                                state.done = true;
                                break;
                            }
                            Err(error) => {
                                state.done = true;
                                return Some((Err(error), state));
                            }
                        }
                    }
                }
                Ok(None) => state.done = true,
                Err(error) => {
                    state.done = true;
                    return Some((Err(ChatError::Http(error)), state));
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta_becomes_a_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            parse_sse_line(line).expect("line should parse"),
            SseEvent::Fragment("Hello".to_string())
        );
    }

    #[test]
    fn done_marker_ends_the_stream() {
        assert_eq!(
            parse_sse_line("data: [DONE]").expect("line should parse"),
            SseEvent::Done
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        assert_eq!(
            parse_sse_line(": OPENROUTER PROCESSING").expect("line should parse"),
            SseEvent::Ignored
        );
        assert_eq!(parse_sse_line("").expect("line should parse"), SseEvent::Ignored);
    }

    #[test]
    fn empty_delta_is_ignored() {
        let line = r#"data: {"choices":[{"delta":{}}]}"#;
        assert_eq!(
            parse_sse_line(line).expect("line should parse"),
            SseEvent::Ignored
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_sse_line("data: {not json").is_err());
    }

    #[test]
    fn multibyte_character_split_across_chunks_stays_intact() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"g\u{fc}nayd\u{131}n\"}}]}\n";
        let bytes = line.as_bytes();
        // Cut right after the first byte of the two-byte "ü".
        let split = bytes.iter().position(|&b| b >= 0x80).expect("multibyte") + 1;

        let mut buffer = LineBuffer::new();
        buffer.extend(&bytes[..split]);
        assert!(buffer.next_line().is_none());

        buffer.extend(&bytes[split..]);
        let line = buffer.next_line().expect("complete line");
        assert_eq!(
            parse_sse_line(&line).expect("line should parse"),
            SseEvent::Fragment("günaydın".to_string())
        );
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn partial_lines_wait_for_their_terminator() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"data: [DO");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"NE]\r\ndata: trailing");
        assert_eq!(buffer.next_line().as_deref(), Some("data: [DONE]"));
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = ChatMessage::system("rules");
        let encoded = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(encoded["role"], "system");
        assert_eq!(encoded["content"], "rules");
    }
}
