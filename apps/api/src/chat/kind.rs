use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::{CAREER_COUNSELOR_SYSTEM, JOB_ANALYZER_SYSTEM};

/// Chat presets. Only `custom` takes a caller-supplied system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    CareerCounselor,
    JobAnalyzer,
    Custom,
}

impl ChatKind {
    /// Replies of this kind are run through the response interpreter.
    pub fn is_structured(&self) -> bool {
        matches!(self, ChatKind::JobAnalyzer)
    }

    pub fn system_prompt(&self, custom: Option<&str>) -> Result<String, AppError> {
        match self {
            ChatKind::CareerCounselor => Ok(CAREER_COUNSELOR_SYSTEM.to_string()),
            ChatKind::JobAnalyzer => Ok(JOB_ANALYZER_SYSTEM.to_string()),
            ChatKind::Custom => custom
                .map(str::trim)
                .filter(|prompt| !prompt.is_empty())
                .map(String::from)
                .ok_or_else(|| {
                    AppError::Validation("system_prompt is required for custom chats".to_string())
                }),
        }
    }
}
