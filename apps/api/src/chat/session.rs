//! Chat Session Manager: a bounded conversation with the generative model.
//!
//! The conversation always starts with exactly one system message. After every append
//! the window is enforced: when the conversation is longer than `max_messages`, the
//! system message is kept and only the latest `max_messages - 1` other messages survive.
//!
//! The conversation lock is never held across a model call. Two overlapping sends on
//! the same chat may therefore interleave their appends; each send still appends its
//! user message before calling the model and its reply after.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chat::kind::ChatKind;
use crate::errors::AppError;
use crate::llm_client::{ChatModel, LlmError};
use crate::models::chat::{ChatMessage, ChatRole};

/// Smallest usable window: the system message plus the latest message.
pub const MIN_MAX_MESSAGES: usize = 2;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => AppError::Validation(e.to_string()),
            ChatError::Model(e) => AppError::Llm(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl Conversation {
    /// Windows below `MIN_MAX_MESSAGES` are raised to it.
    pub fn new(system_prompt: impl Into<String>, max_messages: usize) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            max_messages: max_messages.max(MIN_MAX_MESSAGES),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.enforce_window();
    }

    fn enforce_window(&mut self) {
        let len = self.messages.len();
        if len > self.max_messages {
            // Index 0 is the system message; drop the oldest messages right after it.
            let excess = len - self.max_messages;
            self.messages.drain(1..1 + excess);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Everything except the system message.
    pub fn visible(&self) -> &[ChatMessage] {
        &self.messages[1..]
    }

    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::Assistant)
    }
}

/// Shared handle to one conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation: Arc<Mutex<Conversation>>,
}

impl ChatSession {
    pub fn start(system_prompt: impl Into<String>, max_messages: usize) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::new(system_prompt, max_messages))),
        }
    }

    /// Appends `text` as a user message, asks the model and appends its reply.
    /// On a model failure the user message stays in the conversation and no reply
    /// is appended.
    pub async fn send(&self, model: &dyn ChatModel, text: &str) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let history = {
            let mut conversation = self.conversation.lock().await;
            conversation.push(ChatMessage::user(text));
            conversation.messages().to_vec()
        };

        let reply = match model.chat(&history).await {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(e) => {
                warn!("Chat model call failed: {e}");
                return Err(e.into());
            }
        };

        self.conversation.lock().await.push(reply.clone());
        info!("Chat reply received ({} chars)", reply.content.len());
        Ok(reply)
    }

    pub async fn snapshot(&self) -> Conversation {
        self.conversation.lock().await.clone()
    }

    pub async fn last_assistant(&self) -> Option<ChatMessage> {
        self.conversation.lock().await.last_assistant().cloned()
    }
}

/// A chat opened inside a login session.
#[derive(Debug, Clone)]
pub struct ActiveChat {
    pub kind: ChatKind,
    pub session: ChatSession,
    /// Position in the order chats were opened within the login session.
    pub opened: u64,
}
