/// LLM provider clients
///
/// Model strings are mapped to a closed Provider set through one lookup
/// function; the orchestration code never branches on raw model strings.
/// "gemini"/"google" selects Gemini, "claude"/"anthropic" selects
/// Anthropic, everything else falls back to OpenAI (the documented
/// default, not an accident of string matching).
pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod types;

pub use types::{
    ChatMessage, ChatRequest, ChatResponse, DeltaStream, LlmError, MessageRole,
};

use crate::global::Configs;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The closed set of supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    /// Select the provider for a model string. Unknown strings resolve to
    /// OpenAI by design.
    pub fn from_model(model: &str) -> Provider {
        let lower = model.to_lowercase();
        if lower.contains("gemini") || lower.contains("google") {
            Provider::Gemini
        } else if lower.contains("claude") || lower.contains("anthropic") {
            Provider::Anthropic
        } else {
            Provider::OpenAi
        }
    }

    /// Model used when the request names only a provider prefix
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-sonnet-4-5-20250929",
            Provider::Gemini => "gemini-2.0-flash-exp",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strip a "provider/" prefix from a model string, falling back to the
/// provider default when nothing usable remains.
pub fn resolve_model_name(provider: Provider, model: &str) -> String {
    let name = model.split('/').next_back().unwrap_or("").trim();
    if name.is_empty() {
        provider.default_model().to_string()
    } else {
        name.to_string()
    }
}

/// Uniform provider client interface
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Single-shot completion
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Streamed completion as text deltas
    async fn stream_deltas(&self, request: ChatRequest) -> Result<DeltaStream, LlmError>;
}

/// Registry of configured provider clients
pub struct LlmRegistry {
    clients: HashMap<Provider, Arc<dyn LlmClient>>,
    openai: Arc<openai::OpenAiClient>,
}

impl LlmRegistry {
    pub fn from_config(configs: &Configs) -> Self {
        let openai = Arc::new(openai::OpenAiClient::new(configs.openai_api_key.clone()));
        let anthropic = Arc::new(anthropic::AnthropicClient::new(
            configs.anthropic_api_key.clone(),
        ));
        let gemini = Arc::new(gemini::GeminiClient::new(configs.gemini_api_key.clone()));

        let mut clients: HashMap<Provider, Arc<dyn LlmClient>> = HashMap::new();
        clients.insert(Provider::OpenAi, openai.clone());
        clients.insert(Provider::Anthropic, anthropic);
        clients.insert(Provider::Gemini, gemini);

        Self { clients, openai }
    }

    /// Resolve a model string to its client and the provider-local model name
    pub fn client_for_model(&self, model: &str) -> (Arc<dyn LlmClient>, String) {
        let provider = Provider::from_model(model);
        let client = self
            .clients
            .get(&provider)
            .expect("All providers are registered")
            .clone();
        (client, resolve_model_name(provider, model))
    }

    /// The OpenAI client, which additionally serves image generation
    pub fn openai(&self) -> Arc<openai::OpenAiClient> {
        self.openai.clone()
    }
}

static LLM_REGISTRY: OnceCell<LlmRegistry> = OnceCell::new();

/// Build and install the global registry from the configs
pub fn init_llm_registry(configs: &Configs) {
    let _ = LLM_REGISTRY.set(LlmRegistry::from_config(configs));
}

/// Get the global registry. Panics if init_llm_registry was never called.
pub fn get_llm_registry() -> &'static LlmRegistry {
    LLM_REGISTRY
        .get()
        .expect("LLM registry not initialized - call init_llm_registry() first")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_model() {
        assert_eq!(Provider::from_model("gemini-2.5-flash"), Provider::Gemini);
        assert_eq!(Provider::from_model("google/gemini-2.5-flash"), Provider::Gemini);
        assert_eq!(Provider::from_model("claude-sonnet-4-5"), Provider::Anthropic);
        assert_eq!(Provider::from_model("anthropic/claude-opus"), Provider::Anthropic);
        assert_eq!(Provider::from_model("gpt-4o-mini"), Provider::OpenAi);
        // Typos and unknown models land on the documented default
        assert_eq!(Provider::from_model("gemni-flash"), Provider::OpenAi);
        assert_eq!(Provider::from_model(""), Provider::OpenAi);
    }

    #[test]
    fn test_resolve_model_name_strips_prefix() {
        assert_eq!(
            resolve_model_name(Provider::Gemini, "google/gemini-2.5-flash"),
            "gemini-2.5-flash"
        );
        assert_eq!(
            resolve_model_name(Provider::OpenAi, "gpt-4o-mini"),
            "gpt-4o-mini"
        );
        assert_eq!(
            resolve_model_name(Provider::Anthropic, ""),
            Provider::Anthropic.default_model()
        );
    }
}
