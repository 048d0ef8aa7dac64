/// Google Gemini API client (raw HTTP via reqwest)
///
/// Endpoints:
/// - POST {base}/models/{model}:generateContent
/// - POST {base}/models/{model}:streamGenerateContent?alt=sse
///
/// Gemini has no message roles beyond user/model; system prompts travel
/// in systemInstruction.
use super::types::{sse_data_lines, status_to_error, ChatResponse, DeltaStream, LlmError};
use super::{ChatRequest, LlmClient, MessageRole, Provider};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const TIMEOUT_SECS: u64 = 60;
const PROVIDER: &str = "gemini";

pub struct GeminiClient {
    api_key: String,
    client: Client,
}

impl GeminiClient {
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

    fn chat_body(request: &ChatRequest) -> serde_json::Value {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                let role = match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{"text": m.content}],
                })
            })
            .collect();

        let mut body = serde_json::json!({ "contents": contents });
        if !system.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{"text": system.join("\n\n")}],
            });
        }
        if request.temperature.is_some() || request.max_tokens.is_some() {
            body["generationConfig"] = serde_json::json!({
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            });
        }
        body
    }

    async fn post(
        &self,
        model: &str,
        action: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, LlmError> {
        self.check_enabled()?;
        let url = format!("{}/models/{}:{}", GEMINI_BASE_URL, model, action);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        let text = value
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .get(0)?
            .get("text")?
            .as_str()?;
        Some(text.to_string())
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[GEMINI] Chat completion: model={}", request.model),
        );

        let model = request.model.clone();
        let response = self
            .post(&request.model, "generateContent", Self::chat_body(&request))
            .await?;
        let value: serde_json::Value = response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: format!("generateContent response: {}", e),
        })?;

        let content = Self::extract_delta(&value.to_string()).unwrap_or_default();

        Ok(ChatResponse {
            content,
            model,
            finish_reason: value
                .get("candidates")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("finishReason"))
                .and_then(|r| r.as_str())
                .unwrap_or("STOP")
                .to_string(),
        })
    }

    async fn stream_deltas(&self, request: ChatRequest) -> Result<DeltaStream, LlmError> {
        logger::debug(
            LogTag::Llm,
            &format!("[GEMINI] Streaming chat: model={}", request.model),
        );

        let response = self
            .post(
                &request.model,
                "streamGenerateContent?alt=sse",
                Self::chat_body(&request),
            )
            .await?;
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
        let chunk = r#"{"candidates":[{"content":{"parts":[{"text":"Hey"}],"role":"model"}}]}"#;
        assert_eq!(GeminiClient::extract_delta(chunk), Some("Hey".to_string()));
    }

    #[test]
    fn test_extract_delta_without_text() {
        let chunk = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(GeminiClient::extract_delta(chunk), None);
    }

    #[test]
    fn test_assistant_role_maps_to_model() {
        let request = ChatRequest::new(
            "gemini-2.0-flash-exp",
            vec![
                ChatMessage::system("Be brief"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
            ],
        );

        let body = GeminiClient::chat_body(&request);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1]["role"], "model");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Be brief"));
    }
}
