/// Anthropic API client (raw HTTP via reqwest)
///
/// Endpoints:
/// - POST https://api.anthropic.com/v1/messages
///
/// Anthropic keeps the system prompt outside the messages array and
/// streams `content_block_delta` events.
use super::types::{sse_data_lines, status_to_error, ChatResponse, DeltaStream, LlmError};
use super::{ChatRequest, LlmClient, MessageRole, Provider};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ENDPOINT_MESSAGES: &str = "/messages";
const API_VERSION: &str = "2023-06-01";
const TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const PROVIDER: &str = "anthropic";

pub struct AnthropicClient {
    api_key: String,
    client: Client,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }

    fn check_enabled(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::ProviderDisabled {
                provider: PROVIDER.to_string(),
            });
        }
        Ok(())
    }

    /// Anthropic separates the system prompt from the conversation
    fn chat_body(request: &ChatRequest, stream: bool) -> serde_json::Value {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                serde_json::json!({
                    "role": m.role.to_string(),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": stream,
        });
        if !system.is_empty() {
            body["system"] = serde_json::json!(system.join("\n\n"));
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }

    async fn post(&self, body: serde_json::Value) -> Result<reqwest::Response, LlmError> {
        self.check_enabled()?;
        let url = format!("{}{}", ANTHROPIC_BASE_URL, ENDPOINT_MESSAGES);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        provider: PROVIDER.to_string(),
                        timeout_ms: TIMEOUT_SECS * 1000,
                    }
                } else {
                    LlmError::NetworkError {
                        provider: PROVIDER.to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(PROVIDER, status.as_u16(), body));
        }
        Ok(response)
    }

    /// Extract the text delta from one streamed event payload
    pub fn extract_delta(data: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        if value.get("type")?.as_str()? != "content_block_delta" {
            return None;
        }
        value
            .get("delta")?
            .get("text")?
            .as_str()
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[ANTHROPIC] Chat completion: model={}", request.model),
        );

        let model = request.model.clone();
        let response = self.post(Self::chat_body(&request, false)).await?;
        let value: serde_json::Value = response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: format!("Messages response: {}", e),
        })?;

        let content = value
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            model,
            finish_reason: value
                .get("stop_reason")
                .and_then(|r| r.as_str())
                .unwrap_or("end_turn")
                .to_string(),
        })
    }

    async fn stream_deltas(&self, request: ChatRequest) -> Result<DeltaStream, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[ANTHROPIC] Streaming chat: model={}", request.model),
        );

        let response = self.post(Self::chat_body(&request, true)).await?;
        let stream = sse_data_lines(PROVIDER, response).filter_map(|item| async move {
            match item {
                Ok(data) => Self::extract_delta(&data).map(Ok),
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::llm::ChatMessage;

    #[test]
    fn test_extract_delta() {
        let event = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(AnthropicClient::extract_delta(event), Some("Hi".to_string()));
    }

    #[test]
    fn test_extract_delta_ignores_other_events() {
        let event = r#"{"type":"message_start","message":{"id":"msg_1"}}"#;
        assert_eq!(AnthropicClient::extract_delta(event), None);
    }

    #[test]
    fn test_system_prompt_lifted_out_of_messages() {
        let request = ChatRequest::new(
            "claude-sonnet-4-5",
            vec![
                ChatMessage::system("You are terse"),
                ChatMessage::user("hello"),
            ],
        );

        let body = AnthropicClient::chat_body(&request, false);
        assert_eq!(body["system"], "You are terse");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }
}
