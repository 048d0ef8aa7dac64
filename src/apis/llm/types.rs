/// Core LLM API types
///
/// Unified request/response types for all LLM providers. Individual
/// providers transform these to/from their specific API formats.
use futures_util::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

// ============================================================================
// MESSAGE TYPES
// ============================================================================

/// Chat message with role and content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role in a chat conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub finish_reason: String,
}

// ============================================================================
// STREAMING
// ============================================================================

/// Stream of text deltas from a provider
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Split a provider's SSE response into its `data:` payloads.
///
/// Providers all use server-sent events but differ in payload shape; each
/// client maps these payloads to text deltas with its own extractor.
pub fn sse_data_lines(
    provider: &'static str,
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>> {
    let stream = futures_util::stream::unfold(
        (response.bytes_stream(), String::new(), VecDeque::new()),
        move |(mut bytes, mut buffer, mut ready)| async move {
            loop {
                if let Some(line) = ready.pop_front() {
                    return Some((Ok(line), (bytes, buffer, ready)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim_end_matches('\r').to_string();
                            buffer.drain(..=pos);
                            if let Some(data) = line.strip_prefix("data:") {
                                let data = data.trim_start();
                                if !data.is_empty() {
                                    ready.push_back(data.to_string());
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let error = LlmError::NetworkError {
                            provider: provider.to_string(),
                            message: format!("Stream error: {}", e),
                        };
                        return Some((Err(error), (bytes, buffer, ready)));
                    }
                    None => return None,
                }
            }
        },
    );
    Box::pin(stream)
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// LLM API errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmError {
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },
    Timeout {
        provider: String,
        timeout_ms: u64,
    },
    InvalidResponse {
        provider: String,
        message: String,
    },
    AuthError {
        provider: String,
        message: String,
    },
    NetworkError {
        provider: String,
        message: String,
    },
    ApiError {
        provider: String,
        status_code: u16,
        message: String,
    },
    ProviderDisabled {
        provider: String,
    },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::RateLimited {
                provider,
                retry_after_ms,
            } => {
                if let Some(ms) = retry_after_ms {
                    write!(f, "[{}] Rate limited (retry after {}ms)", provider, ms)
                } else {
                    write!(f, "[{}] Rate limited", provider)
                }
            }
            LlmError::Timeout {
                provider,
                timeout_ms,
            } => {
                write!(f, "[{}] Request timeout ({}ms)", provider, timeout_ms)
            }
            LlmError::InvalidResponse { provider, message } => {
                write!(f, "[{}] Invalid response: {}", provider, message)
            }
            LlmError::AuthError { provider, message } => {
                write!(f, "[{}] Auth error: {}", provider, message)
            }
            LlmError::NetworkError { provider, message } => {
                write!(f, "[{}] Network error: {}", provider, message)
            }
            LlmError::ApiError {
                provider,
                status_code,
                message,
            } => {
                write!(f, "[{}] API error {}: {}", provider, status_code, message)
            }
            LlmError::ProviderDisabled { provider } => {
                write!(f, "[{}] Provider disabled in config", provider)
            }
        }
    }
}

impl std::error::Error for LlmError {}

impl From<LlmError> for String {
    fn from(err: LlmError) -> String {
        err.to_string()
    }
}

/// Map a non-success HTTP status to the matching error variant
pub fn status_to_error(provider: &'static str, status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthError {
            provider: provider.to_string(),
            message: "Invalid API key".to_string(),
        },
        429 => LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after_ms: None,
        },
        _ => LlmError::ApiError {
            provider: provider.to_string(),
            status_code: status,
            message: body,
        },
    }
}
