// Anthropic Messages API adapter
// API Reference: https://docs.anthropic.com/en/api/messages
//
// Only the first text block of a response is surfaced. Tool use and
// thinking blocks are skipped.

use crate::config::LLMConfig;
use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, ContentPart, LLMMessage, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
// The Messages API rejects requests without max_tokens
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

// Request types for the Messages API
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum AnthropicBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

// Response types
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl AnthropicAdapter {
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.anthropic_api_key.clone(),
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert internal message format to Messages API format
    fn convert_message(msg: &LLMMessage) -> AnthropicMessage {
        let content = msg
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => AnthropicBlock::Text { text: text.clone() },
                ContentPart::ImageBase64 { base64, media_type } => AnthropicBlock::Image {
                    source: ImageSource {
                        source_type: "base64",
                        media_type: media_type.clone(),
                        data: base64.clone(),
                    },
                },
            })
            .collect();

        AnthropicMessage {
            role: msg.role.clone(),
            content,
        }
    }
}

#[async_trait]
impl LLMAdapter for AnthropicAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        if self.api_key.is_empty() {
            return Err(AppError::LLMApi("ANTHROPIC_API_KEY is not configured".to_string()));
        }

        let url = format!("{}/v1/messages", self.base_url);

        let body = AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system_instruction.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
        };

        let with_images = request.messages.iter().any(LLMMessage::has_images);
        debug!(model = %request.model, with_images, "Sending Anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<AnthropicErrorResponse>(&error_text) {
                return Err(AppError::LLMApi(format!(
                    "Anthropic API error ({}): {}: {}",
                    status, error_response.error.error_type, error_response.error.message
                )));
            }

            return Err(AppError::LLMApi(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Anthropic response: {}", e)))?;

        let content = parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } if !text.is_empty() => Some(text),
                _ => None,
            })
            .ok_or_else(|| AppError::LLMApi("No text content in response".to_string()))?;

        Ok(LLMResponse {
            content,
            finish_reason: parsed.stop_reason.unwrap_or_else(|| "end_turn".to_string()),
            usage: TokenUsage {
                prompt_tokens: parsed.usage.input_tokens,
                completion_tokens: parsed.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn adapter_for(server: &mockito::Server, api_key: &str) -> AnthropicAdapter {
        let config = LLMConfig {
            anthropic_api_key: api_key.to_string(),
            anthropic_base_url: server.url(),
            ..crate::config::Config::default().llm
        };
        AnthropicAdapter::from_config(&config).unwrap()
    }

    fn image_request() -> LLMRequest {
        LLMRequest {
            model: "claude-test".to_string(),
            messages: vec![LLMMessage::user_with_base64_image("Analyze", "QUJD", "image/jpeg")],
            max_tokens: Some(128),
            system_instruction: Some("You are Cipher".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sends_image_block_and_returns_first_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-test",
                "max_tokens": 128,
                "system": "You are Cipher",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "QUJD"}},
                        {"type": "text", "text": "Analyze"}
                    ]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "msg_1",
                    "type": "message",
                    "content": [
                        {"type": "thinking", "thinking": "hmm"},
                        {"type": "text", "text": "{\"pattern_name\":\"Tartan\"}"},
                        {"type": "text", "text": "ignored"}
                    ],
                    "stop_reason": "end_turn",
                    "usage": {"input_tokens": 10, "output_tokens": 5}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server, "test-key");
        let response = adapter.create_chat_completion(&image_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "{\"pattern_name\":\"Tartan\"}");
        assert_eq!(response.finish_reason, "end_turn");
        assert_eq!(response.usage.prompt_tokens, 10);
        assert_eq!(response.usage.completion_tokens, 5);
    }

    #[tokio::test]
    async fn test_missing_text_block_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(json!({"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}).to_string())
            .create_async()
            .await;

        let adapter = adapter_for(&server, "test-key");
        let err = adapter.create_chat_completion(&image_request()).await.unwrap_err();
        assert_eq!(err.to_string(), "No text content in response");
    }

    #[tokio::test]
    async fn test_api_error_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(
                json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}})
                    .to_string(),
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server, "test-key");
        let err = adapter.create_chat_completion(&image_request()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("overloaded_error"));
        assert!(message.contains("Overloaded"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let server = mockito::Server::new_async().await;
        let adapter = adapter_for(&server, "");
        let err = adapter.create_chat_completion(&image_request()).await.unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
