//! OpenAI-compatible chat-completions client
//!
//! Works against the OpenAI API and Azure OpenAI-style deployments that
//! speak the same wire format. Retries transient failures with
//! exponential backoff.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, MessageContent, StopReason,
    TokenUsage, ToolCall,
};
use crate::config::LlmConfig;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Fallback wait when a 429 carries no retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// OpenAI-compatible API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Chat-completions endpoint
    ///
    /// The configured base url already carries any API version prefix
    /// (the default is `https://api.openai.com/v1`), so only the route
    /// is appended here.
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(self.convert_messages(&request.messages));

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.min(self.max_tokens),
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools.iter().map(|t| t.to_openai_schema()).collect::<Vec<_>>());
            body["tool_choice"] = serde_json::json!("auto");
        }

        body
    }

    /// Convert internal Message types to chat-completions format
    ///
    /// The API requires one message per tool result, so a single internal
    /// message with multiple tool results becomes multiple API messages.
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        let mut result = Vec::new();

        for msg in messages {
            let role = match msg.role {
                super::types::Role::User => "user",
                super::types::Role::Assistant => "assistant",
            };

            match &msg.content {
                MessageContent::Text(text) => {
                    result.push(serde_json::json!({
                        "role": role,
                        "content": text,
                    }));
                }
                MessageContent::Blocks(blocks) => {
                    let mut tool_calls = Vec::new();
                    let mut tool_results = Vec::new();
                    let mut text_content = String::new();

                    for block in blocks {
                        match block {
                            ContentBlock::Text { text } => {
                                text_content.push_str(text);
                            }
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(serde_json::json!({
                                    "id": id,
                                    "type": "function",
                                    "function": {
                                        "name": name,
                                        "arguments": input.to_string(),
                                    }
                                }));
                            }
                            ContentBlock::ToolResult {
                                tool_use_id, content, ..
                            } => {
                                tool_results.push((tool_use_id.clone(), content.clone()));
                            }
                        }
                    }

                    if !tool_results.is_empty() {
                        for (tool_call_id, content) in tool_results {
                            result.push(serde_json::json!({
                                "role": "tool",
                                "tool_call_id": tool_call_id,
                                "content": content,
                            }));
                        }
                        continue;
                    }

                    if !tool_calls.is_empty() {
                        let mut msg = serde_json::json!({
                            "role": "assistant",
                            "tool_calls": tool_calls,
                        });
                        if !text_content.is_empty() {
                            msg["content"] = serde_json::json!(text_content);
                        }
                        result.push(msg);
                        continue;
                    }

                    result.push(serde_json::json!({
                        "role": role,
                        "content": text_content,
                    }));
                }
            }
        }

        result
    }

    /// Parse the API response into internal types
    fn parse_response(&self, api_response: ChatResponse) -> CompletionResponse {
        let choice = api_response.choices.into_iter().next();

        let (content, tool_calls, stop_reason) = match choice {
            Some(c) => {
                let content = c.message.content;
                let tool_calls = c
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|tc| ToolCall {
                        id: tc.id,
                        name: tc.function.name,
                        input: serde_json::from_str(&tc.function.arguments).unwrap_or(serde_json::json!({})),
                    })
                    .collect();
                let stop_reason = match c.finish_reason.as_deref() {
                    Some("stop") => StopReason::EndTurn,
                    Some("tool_calls") => StopReason::ToolUse,
                    Some("length") => StopReason::MaxTokens,
                    _ => StopReason::EndTurn,
                };
                (content, tool_calls, stop_reason)
            }
            None => (None, vec![], StopReason::EndTurn),
        };

        CompletionResponse {
            content,
            tool_calls,
            stop_reason,
            usage: TokenUsage {
                input_tokens: api_response.usage.prompt_tokens,
                output_tokens: api_response.usage.completion_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, message_count = request.messages.len(), "complete: called");
        let url = self.endpoint();
        let body = self.build_request_body(&request);

        let mut last_error: Option<LlmError> = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                // A rate limit dictates its own wait; everything else backs
                // off exponentially.
                let backoff = last_error
                    .as_ref()
                    .and_then(|e| e.retry_after())
                    .unwrap_or_else(|| Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1)));
                warn!(attempt, backoff_ms = backoff.as_millis() as u64, "complete: retrying after transient error");
                tokio::time::sleep(backoff).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "complete: network error");
                    let err = LlmError::Network(e);
                    if err.is_retryable() && attempt < MAX_RETRIES {
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            };

            let status = response.status().as_u16();

            if !response.status().is_success() {
                let err = if status == 429 {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    LlmError::RateLimited {
                        retry_after: Duration::from_secs(retry_after),
                    }
                } else {
                    let text = response.text().await.unwrap_or_default();
                    LlmError::ApiError { status, message: text }
                };

                if err.is_retryable() && attempt < MAX_RETRIES {
                    debug!(attempt, status, "complete: retryable error");
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }

            let api_response: ChatResponse = response.json().await?;
            return Ok(self.parse_response(api_response));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

// Chat-completions API response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;

    fn test_client() -> OpenAIClient {
        OpenAIClient {
            model: "gpt-4o".to_string(),
            api_key: "test-key".to_string(),
            base_url: LlmConfig::default().base_url,
            http: Client::new(),
            max_tokens: 8192,
        }
    }

    #[test]
    fn test_endpoint_joins_without_doubling() {
        let mut client = test_client();
        // The shipped default base url already ends in /v1
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");

        client.base_url = "https://api.openai.com/v1/".to_string();
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");

        client.base_url = "https://example.azure.com/deployments/gpt".to_string();
        assert_eq!(client.endpoint(), "https://example.azure.com/deployments/gpt/chat/completions");
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client();

        let request = CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            tools: vec![],
            max_tokens: 1000,
        };

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_with_tools() {
        let client = test_client();

        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            tools: vec![ToolDefinition::new("search_flights", "Search", serde_json::json!({"type": "object"}))],
            max_tokens: 1000,
        };

        let body = client.build_request_body(&request);
        assert_eq!(body["tools"][0]["function"]["name"], "search_flights");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_max_tokens_capped() {
        let mut client = test_client();
        client.max_tokens = 1000;

        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            tools: vec![],
            max_tokens: 5000,
        };

        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_convert_messages_splits_tool_results() {
        let client = test_client();

        let messages = vec![Message::user_blocks(vec![
            ContentBlock::tool_result("call_1", "result one", false),
            ContentBlock::tool_result("call_2", "result two", false),
        ])];

        let converted = client.convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0]["role"], "tool");
        assert_eq!(converted[0]["tool_call_id"], "call_1");
        assert_eq!(converted[1]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let client = test_client();

        let api_response = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    content: None,
                    tool_calls: Some(vec![ChatToolCall {
                        id: "call_1".to_string(),
                        function: ChatFunction {
                            name: "book_hotel".to_string(),
                            arguments: r#"{"hotel_id": 3}"#.to_string(),
                        },
                    }]),
                },
                finish_reason: Some("tool_calls".to_string()),
            }],
            usage: ChatUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
            },
        };

        let resp = client.parse_response(api_response);
        assert_eq!(resp.stop_reason, StopReason::ToolUse);
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "book_hotel");
        assert_eq!(resp.tool_calls[0].input["hotel_id"], 3);
        assert_eq!(resp.usage.input_tokens, 100);
    }

    // Minimal HTTP listener: serves the scripted (status, body) pairs in
    // order and reports each request line back over a channel.
    fn spawn_server(responses: Vec<(u16, String)>) -> (String, std::sync::mpsc::Receiver<String>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut data = Vec::new();
                let mut buf = [0u8; 8192];
                loop {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    data.extend_from_slice(&buf[..n]);
                    if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                        let headers = String::from_utf8_lossy(&data[..pos]).to_string();
                        let content_length = headers
                            .lines()
                            .find_map(|l| {
                                let (k, v) = l.split_once(':')?;
                                k.eq_ignore_ascii_case("content-length")
                                    .then(|| v.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if data.len() >= pos + 4 + content_length {
                            let request_line = headers.lines().next().unwrap_or_default().to_string();
                            let _ = tx.send(request_line);
                            break;
                        }
                    }
                }

                let extra = if status == 429 { "Retry-After: 1\r\n" } else { "" };
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{extra}\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}"), rx)
    }

    fn ok_body() -> String {
        r#"{"choices":[{"message":{"content":"ok"},"finish_reason":"stop"}],"usage":{"prompt_tokens":1,"completion_tokens":1}}"#
            .to_string()
    }

    fn simple_request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![Message::user("hi")],
            tools: vec![],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_request_path_matches_default_base_url_shape() {
        let (base, rx) = spawn_server(vec![(200, ok_body())]);

        let mut client = test_client();
        // Same shape as the shipped default: version prefix on the base url
        client.base_url = format!("{base}/v1");

        let resp = client.complete(simple_request()).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("ok"));

        let request_line = rx.recv().unwrap();
        assert!(
            request_line.starts_with("POST /v1/chat/completions "),
            "unexpected request line: {request_line}"
        );
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (base, rx) = spawn_server(vec![(500, "{}".to_string()), (200, ok_body())]);

        let mut client = test_client();
        client.base_url = base;

        let resp = client.complete(simple_request()).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("ok"));
        assert!(rx.recv().is_ok());
        assert!(rx.recv().is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_waits_and_retries() {
        let (base, rx) = spawn_server(vec![(429, "{}".to_string()), (200, ok_body())]);

        let mut client = test_client();
        client.base_url = base;

        let started = std::time::Instant::now();
        let resp = client.complete(simple_request()).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("ok"));

        // Both requests arrived, and the retry honored the 1s retry-after
        assert!(rx.recv().is_ok());
        assert!(rx.recv().is_ok());
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (base, rx) = spawn_server(vec![(400, "bad request".to_string())]);

        let mut client = test_client();
        client.base_url = base;

        let err = client.complete(simple_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 400, .. }));
        assert!(rx.recv().is_ok());
        // No second request ever arrives
        assert!(rx.try_recv().is_err());
    }
}
