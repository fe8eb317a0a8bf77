//! Axum route handlers for the Chat API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::interpreter::AnalysisResult;
use crate::chat::kind::ChatKind;
use crate::chat::session::{ActiveChat, ChatSession};
use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::session::extract::CurrentSession;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    pub kind: ChatKind,
    /// Required for `custom` chats, ignored otherwise.
    pub system_prompt: Option<String>,
    /// Defaults to CHAT_MAX_MESSAGES.
    pub max_messages: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub chat_id: Uuid,
    pub kind: ChatKind,
    pub max_messages: usize,
    /// The conversation without its system message.
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub chat_id: Uuid,
    pub kind: ChatKind,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: ChatMessage,
    /// Present for chats whose replies follow the marker format.
    pub analysis: Option<AnalysisResult>,
}

fn find_chat(current: &CurrentSession, chat_id: Uuid) -> Result<ActiveChat, AppError> {
    current
        .session
        .chats
        .get(&chat_id)
        .map(|chat| chat.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))
}

async fn chat_response(chat_id: Uuid, chat: &ActiveChat) -> ChatResponse {
    let conversation = chat.session.snapshot().await;
    ChatResponse {
        chat_id,
        kind: chat.kind,
        max_messages: conversation.max_messages(),
        messages: conversation.visible().to_vec(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chats
pub async fn handle_start_chat(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(request): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let identity = current.identity()?;
    let system_prompt = request.kind.system_prompt(request.system_prompt.as_deref())?;
    let max_messages = request
        .max_messages
        .unwrap_or(state.config.chat_max_messages);

    let (chat_id, chat) = current.session.open_chat(
        request.kind,
        ChatSession::start(system_prompt, max_messages),
        state.config.max_open_chats,
    );
    info!("Started {:?} chat {chat_id} for {}", chat.kind, identity.uid);

    Ok((StatusCode::CREATED, Json(chat_response(chat_id, &chat).await)))
}

/// GET /api/v1/chats
///
/// Oldest first.
pub async fn handle_list_chats(current: CurrentSession) -> Result<Json<Vec<ChatSummary>>, AppError> {
    current.identity()?;
    let mut chats: Vec<(u64, ChatSummary)> = current
        .session
        .chats
        .iter()
        .map(|entry| {
            let summary = ChatSummary {
                chat_id: *entry.key(),
                kind: entry.value().kind,
            };
            (entry.value().opened, summary)
        })
        .collect();
    chats.sort_by_key(|(opened, _)| *opened);
    Ok(Json(chats.into_iter().map(|(_, summary)| summary).collect()))
}

/// GET /api/v1/chats/:id
pub async fn handle_get_chat(
    current: CurrentSession,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatResponse>, AppError> {
    current.identity()?;
    let chat = find_chat(&current, chat_id)?;
    Ok(Json(chat_response(chat_id, &chat).await))
}

/// DELETE /api/v1/chats/:id
pub async fn handle_delete_chat(
    current: CurrentSession,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.identity()?;
    current
        .session
        .chats
        .remove(&chat_id)
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/chats/:id/messages
///
/// Sends one user message and waits for the model's reply.
pub async fn handle_send_message(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    current.identity()?;
    let chat = find_chat(&current, chat_id)?;

    let reply = chat
        .session
        .send(state.llm.as_ref(), &request.text)
        .await?;

    let analysis = chat
        .kind
        .is_structured()
        .then(|| state.interpreter.interpret(&reply.content));

    Ok(Json(SendMessageResponse { reply, analysis }))
}

/// GET /api/v1/chats/:id/analysis
///
/// Interprets the latest assistant message; recomputed on every call.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<AnalysisResult>, AppError> {
    current.identity()?;
    let chat = find_chat(&current, chat_id)?;
    let latest = chat
        .session
        .last_assistant()
        .await
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} has no reply yet")))?;
    Ok(Json(state.interpreter.interpret(&latest.content)))
}
