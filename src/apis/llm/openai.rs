/// OpenAI API client (raw HTTP via reqwest)
///
/// Endpoints:
/// - POST https://api.openai.com/v1/chat/completions
/// - POST https://api.openai.com/v1/images/generations
///
/// This is the fallback provider for unrecognized model strings, and the
/// only provider used for image generation.
use super::types::{sse_data_lines, status_to_error, ChatResponse, DeltaStream, LlmError};
use super::{ChatRequest, LlmClient, Provider};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ENDPOINT_CHAT: &str = "/chat/completions";
const ENDPOINT_IMAGES: &str = "/images/generations";
const TIMEOUT_SECS: u64 = 60;
const PROVIDER: &str = "openai";

pub struct OpenAiClient {
    api_key: String,
    client: Client,
}

impl OpenAiClient {
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

    fn chat_body(request: &ChatRequest, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": stream,
        })
    }

    async fn post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, LlmError> {
        self.check_enabled()?;
        let url = format!("{}{}", OPENAI_BASE_URL, endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

    /// Extract the text delta from one streamed chunk payload
    pub fn extract_delta(data: &str) -> Option<String> {
        if data == "[DONE]" {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        value
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()
            .map(|s| s.to_string())
    }

    /// Generate one image and return its URL
    pub async fn generate_image(&self, prompt: &str) -> Result<String, LlmError> {
        logger::debug(LogTag::Llm, "[OPENAI] Generating image");

        let body = serde_json::json!({
            "model": "dall-e-3",
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
            "quality": "hd",
            "style": "vivid",
        });

        let response = self.post(ENDPOINT_IMAGES, body).await?;
        let value: serde_json::Value = response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: format!("Image response: {}", e),
        })?;

        value
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("url"))
            .and_then(|u| u.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: "No image URL in response".to_string(),
            })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[OPENAI] Chat completion: model={}", request.model),
        );

        let model = request.model.clone();
        let response = self.post(ENDPOINT_CHAT, Self::chat_body(&request, false)).await?;
        let value: serde_json::Value = response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: format!("Chat response: {}", e),
        })?;

        let choice = value
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: "No choices in response".to_string(),
            })?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        Ok(ChatResponse {
            content,
            model,
            finish_reason: choice
                .get("finish_reason")
                .and_then(|r| r.as_str())
                .unwrap_or("stop")
                .to_string(),
        })
    }

    async fn stream_deltas(&self, request: ChatRequest) -> Result<DeltaStream, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[OPENAI] Streaming chat: model={}", request.model),
        );

        let response = self.post(ENDPOINT_CHAT, Self::chat_body(&request, true)).await?;
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

    #[test]
    fn test_extract_delta() {
        let chunk = r#"{"choices":[{"delta":{"content":"Hello"},"index":0}]}"#;
        assert_eq!(OpenAiClient::extract_delta(chunk), Some("Hello".to_string()));
    }

    #[test]
    fn test_extract_delta_done_marker() {
        assert_eq!(OpenAiClient::extract_delta("[DONE]"), None);
    }

    #[test]
    fn test_extract_delta_role_only_chunk() {
        let chunk = r#"{"choices":[{"delta":{"role":"assistant"},"index":0}]}"#;
        assert_eq!(OpenAiClient::extract_delta(chunk), None);
    }

    #[test]
    fn test_empty_key_disables_provider() {
        let client = OpenAiClient::new(String::new());
        assert!(client.check_enabled().is_err());
    }
}
