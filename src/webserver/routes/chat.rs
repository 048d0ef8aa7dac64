/// LLM-backed routes: streamed chat, prompt enhancement, and agent-derived
/// token details.
use axum::{
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use futures_util::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::{
    apis::llm::{self, ChatMessage, ChatRequest, LlmClient},
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response, utils::failure_response},
};

const ENHANCE_MODEL: &str = "gpt-4";
const TICKER_MODEL: &str = "gpt-4";

const ENHANCE_SYSTEM_PROMPT: &str = "You are an expert AI prompt engineer. Your task is to take a user's basic system prompt for an AI agent and enhance it to be more effective, detailed, and well-structured.\n\nGuidelines for enhancement:\n- Maintain the core intent and personality of the original prompt\n- Add specific behavioral guidelines and response patterns\n- Include examples of how the AI should handle different scenarios\n- Define clear boundaries and capabilities\n- Make it more actionable and specific\n- Keep it concise but comprehensive (aim for 200-400 words)\n- Use clear, professional language\n- Structure it logically with clear sections if needed\n\nReturn ONLY the enhanced prompt text, no explanations or meta-commentary.";

const TICKER_SYSTEM_PROMPT: &str = "You are a ticker symbol generator. Create a ticker symbol (3-5 characters) that DIRECTLY represents the agent name. Extract key letters or abbreviate the name logically. Examples: 'Bitcoin Expert' -> 'BTC', 'Crypto Advisor' -> 'CRYPT', 'Trading Bot' -> 'TRADE'. Return ONLY the ticker symbol in uppercase, nothing else.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/enhance-prompt", post(enhance_prompt))
        .route("/generate-from-agent", post(generate_from_agent))
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    messages: Option<Vec<ChatMessage>>,
    model: Option<String>,
    #[serde(rename = "systemPrompt")]
    system_prompt: Option<String>,
}

/// Streamed model completion. Deltas are emitted as SSE events shaped
/// `{"delta": "..."}`, with a final `{"done": true}` event.
async fn chat(Json(body): Json<ChatBody>) -> Response {
    let messages = match body.messages {
        Some(messages) => messages,
        None => return error_response(StatusCode::BAD_REQUEST, "Messages must be an array"),
    };

    let registry = llm::get_llm_registry();
    let model = body.model.unwrap_or_default();
    let (client, model_name) = registry.client_for_model(&model);

    logger::debug(
        LogTag::Llm,
        &format!("Chat request: provider={} model={}", client.provider(), model_name),
    );

    let mut all_messages = Vec::with_capacity(messages.len() + 1);
    if let Some(system_prompt) = body.system_prompt.filter(|p| !p.is_empty()) {
        all_messages.push(ChatMessage::system(system_prompt));
    }
    all_messages.extend(messages);

    let request = ChatRequest::new(model_name, all_messages);

    match client.stream_deltas(request).await {
        Ok(deltas) => {
            let events = deltas
                .map(|item| {
                    let payload = match item {
                        Ok(delta) => serde_json::json!({ "delta": delta }),
                        Err(e) => serde_json::json!({ "error": e.to_string() }),
                    };
                    Ok::<Event, Infallible>(Event::default().data(payload.to_string()))
                })
                .chain(futures_util::stream::once(async {
                    Ok(Event::default().data(serde_json::json!({ "done": true }).to_string()))
                }));

            Sse::new(events).keep_alive(KeepAlive::default()).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Llm, &format!("Chat stream failed: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process chat request")
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnhanceBody {
    prompt: Option<String>,
}

/// Rewrite a user's system prompt through the prompt-engineer template
async fn enhance_prompt(Json(body): Json<EnhanceBody>) -> Response {
    let prompt = match body.prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "Prompt is required"),
    };

    let request = ChatRequest::new(
        ENHANCE_MODEL,
        vec![
            ChatMessage::system(ENHANCE_SYSTEM_PROMPT),
            ChatMessage::user(format!("Enhance this AI agent system prompt:\n\n{}", prompt)),
        ],
    )
    .with_temperature(0.7)
    .with_max_tokens(1000);

    match llm::get_llm_registry().openai().complete(request).await {
        Ok(response) => {
            Json(serde_json::json!({ "enhancedPrompt": response.content })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Llm, &format!("Error enhancing prompt: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to enhance prompt")
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    #[serde(rename = "agentName")]
    agent_name: Option<String>,
    #[serde(rename = "agentDescription")]
    agent_description: Option<String>,
}

/// Derive a ticker and a logo image from an agent's name and description
async fn generate_from_agent(Json(body): Json<GenerateBody>) -> Response {
    let (agent_name, agent_description) = match (
        body.agent_name.as_deref(),
        body.agent_description.as_deref(),
    ) {
        (Some(name), Some(description)) if !name.is_empty() && !description.is_empty() => {
            (name, description)
        }
        _ => {
            return failure_response(
                StatusCode::BAD_REQUEST,
                "Agent name and description are required",
            )
        }
    };

    let openai = llm::get_llm_registry().openai();

    let ticker_request = ChatRequest::new(
        TICKER_MODEL,
        vec![
            ChatMessage::system(TICKER_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Create a ticker symbol that directly matches this agent name: \"{}\"",
                agent_name
            )),
        ],
    )
    .with_temperature(0.3)
    .with_max_tokens(10);

    let ticker = match openai.complete(ticker_request).await {
        Ok(response) => {
            let ticker = response.content.trim().to_uppercase();
            if ticker.is_empty() {
                "TOKEN".to_string()
            } else {
                ticker
            }
        }
        Err(e) => {
            logger::error(LogTag::Llm, &format!("Ticker generation failed: {}", e));
            return failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let image_prompt = format!(
        "Design a premium cryptocurrency token logo specifically for an AI agent called \"{name}\".\n\n\
         Agent Purpose: {description}\n\n\
         Design Requirements:\n\
         - Create a circular token logo that visually represents the agent's specific purpose and characteristics\n\
         - Use symbols, icons, or abstract shapes that directly relate to what this agent does\n\
         - Modern, professional cryptocurrency aesthetic\n\
         - Vibrant gradient colors: electric cyan (#06b6d4), vivid purple (#a855f7), hot pink (#ec4899)\n\
         - Clean, minimalist design with strong visual impact\n\
         - No text or letters in the design\n\
         - High contrast and bold shapes\n\
         - Premium quality suitable for a top-tier crypto token\n\n\
         The logo should immediately communicate what \"{name}\" does based on: {description}. \
         Make it unique and memorable while maintaining professional crypto token standards.",
        name = agent_name,
        description = agent_description,
    );

    match openai.generate_image(&image_prompt).await {
        Ok(image_url) => Json(serde_json::json!({
            "success": true,
            "ticker": ticker,
            "imageUrl": image_url,
        }))
        .into_response(),
        Err(e) => {
            logger::error(LogTag::Llm, &format!("Logo generation failed: {}", e));
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
