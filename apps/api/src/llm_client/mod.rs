//! LLM Client: the single point of entry for all generative-text calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! Handlers and the chat session depend on the `ChatModel` trait, never on `GeminiClient`.
//!
//! Model: gemini-1.5-flash (hardcoded, like the temperature)

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::chat::{ChatMessage, ChatRole};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for every call. Intentionally not configurable.
pub const MODEL: &str = "gemini-1.5-flash";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The two conversational roles the endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl From<ChatRole> for TurnRole {
    /// The system prompt is sent as a user-authored instruction.
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::System | ChatRole::User => TurnRole::User,
            ChatRole::Assistant => TurnRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData")]
    InlineData(InlineData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

/// A binary document sent alongside a prompt, e.g. a resume PDF.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Bytes,
}

impl Attachment {
    fn to_part(&self) -> Part {
        Part::InlineData(InlineData {
            mime_type: self.mime_type.clone(),
            data: BASE64.encode(&self.data),
        })
    }
}

/// Converts a conversation into request turns.
pub fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .map(|message| Content {
            role: TurnRole::from(message.role),
            parts: vec![Part::Text(message.content.clone())],
        })
        .collect()
}

/// Opaque text-generation function. Implement this to swap the backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, contents: Vec<Content>) -> Result<String, LlmError>;

    /// Sends a whole conversation and returns the completion text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.generate(to_contents(messages)).await
    }

    /// Single-turn analysis of one document: the prompt and the inline file
    /// travel in the same user turn.
    async fn analyze_document(
        &self,
        attachment: &Attachment,
        prompt: &str,
    ) -> Result<String, LlmError> {
        self.generate(vec![Content {
            role: TurnRole::User,
            parts: vec![Part::Text(prompt.to_string()), attachment.to_part()],
        }])
        .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Client for the Gemini `generateContent` endpoint.
/// Calls are not retried; a failed call is reported to the caller as is.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, contents: Vec<Content>) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            contents: &contents,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(format!("{GEMINI_API_BASE}/{MODEL}:generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={:?}, completion_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or_else(|| {
            let finish_reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            debug!("LLM returned no text (finish_reason={finish_reason})");
            LlmError::EmptyContent
        })
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted model: pops one outcome per call and records what it was sent.
    #[derive(Default)]
    pub struct ScriptedModel {
        outcomes: Mutex<VecDeque<Result<String, String>>>,
        pub calls: Mutex<Vec<Vec<Content>>>,
    }

    impl ScriptedModel {
        pub fn replying(replies: &[&str]) -> Self {
            let model = Self::default();
            for reply in replies {
                model.push_reply(reply);
            }
            model
        }

        pub fn push_reply(&self, reply: &str) {
            self.outcomes
                .lock()
                .unwrap()
                .push_back(Ok(reply.to_string()));
        }

        pub fn push_failure(&self, message: &str) {
            self.outcomes
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate(&self, contents: Vec<Content>) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(contents);
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(LlmError::Api {
                    status: 503,
                    message,
                }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_map_to_two_turn_vocabulary() {
        let messages = vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        let roles: Vec<TurnRole> = to_contents(&messages).iter().map(|c| c.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::User, TurnRole::Model]);
    }

    #[tokio::test]
    async fn test_document_analysis_sends_prompt_and_file_in_one_turn() {
        let model = testing::ScriptedModel::replying(&["looks good"]);
        let pdf = Attachment {
            mime_type: "application/pdf".into(),
            data: Bytes::from_static(b"%PDF"),
        };
        let reply = model.analyze_document(&pdf, "Review this").await.unwrap();
        assert_eq!(reply, "looks good");

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].role, TurnRole::User);
        assert_eq!(calls[0][0].parts[0], Part::Text("Review this".into()));
        assert_eq!(
            calls[0][0].parts[1],
            Part::InlineData(InlineData {
                mime_type: "application/pdf".into(),
                data: "JVBERg==".into(),
            })
        );
    }

    #[test]
    fn test_request_serializes_to_wire_shape() {
        let contents = vec![Content {
            role: TurnRole::User,
            parts: vec![Part::Text("hello".into())],
        }];
        let body = serde_json::to_value(GenerateContentRequest {
            contents: &contents,
            generation_config: GenerationConfig { temperature: 0.5 },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn test_response_text_joins_first_candidate_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "SKILLS: Rust"}, {"text": ", Go"}]},
                 "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("SKILLS: Rust, Go"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(parsed.text().is_none());
    }
}
