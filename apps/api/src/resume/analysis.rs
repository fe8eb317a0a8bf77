//! Resume analysis: one PDF plus one prompt template, answered in a single model call.

use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{
    RESUME_COMPREHENSIVE_PROMPT, RESUME_CUSTOM_PROMPT_TEMPLATE, RESUME_IMPACT_PROMPT,
    RESUME_KEYWORDS_PROMPT, RESUME_STRUCTURE_PROMPT,
};
use crate::llm_client::{Attachment, ChatModel};

pub const PDF_MIME_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    Structure,
    Keywords,
    Impact,
    Custom,
}

impl FromStr for AnalysisType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "comprehensive" => Ok(AnalysisType::Comprehensive),
            "structure" => Ok(AnalysisType::Structure),
            "keywords" => Ok(AnalysisType::Keywords),
            "impact" => Ok(AnalysisType::Impact),
            "custom" => Ok(AnalysisType::Custom),
            other => Err(AppError::Validation(format!(
                "analysis_type must be one of comprehensive, structure, keywords, impact, custom (got '{other}')"
            ))),
        }
    }
}

/// The uploaded document and what to ask about it.
#[derive(Debug, Clone)]
pub struct ResumeRequest {
    pub content_type: Option<String>,
    pub data: Bytes,
    pub analysis_type: AnalysisType,
    /// Focus of a custom analysis; ignored for the other types.
    pub custom_request: Option<String>,
}

impl ResumeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.data.is_empty() {
            return Err(AppError::Validation("file cannot be empty".to_string()));
        }
        let declared_pdf = self.content_type.as_deref() == Some(PDF_MIME_TYPE);
        if !declared_pdf && !self.data.starts_with(PDF_MAGIC) {
            return Err(AppError::Validation("Please upload a PDF file".to_string()));
        }
        if self.analysis_type == AnalysisType::Custom && self.custom_focus().is_none() {
            return Err(AppError::Validation(
                "custom_request is required for custom analysis".to_string(),
            ));
        }
        Ok(())
    }

    fn custom_focus(&self) -> Option<&str> {
        if self.analysis_type != AnalysisType::Custom {
            return None;
        }
        self.custom_request
            .as_deref()
            .map(str::trim)
            .filter(|request| !request.is_empty())
    }

    pub fn prompt(&self) -> String {
        match self.analysis_type {
            AnalysisType::Comprehensive => RESUME_COMPREHENSIVE_PROMPT.to_string(),
            AnalysisType::Structure => RESUME_STRUCTURE_PROMPT.to_string(),
            AnalysisType::Keywords => RESUME_KEYWORDS_PROMPT.to_string(),
            AnalysisType::Impact => RESUME_IMPACT_PROMPT.to_string(),
            AnalysisType::Custom => RESUME_CUSTOM_PROMPT_TEMPLATE
                .replace("{request}", self.custom_focus().unwrap_or_default()),
        }
    }
}

/// One entry of a session's analysis history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub analysis_type: AnalysisType,
    pub request: Option<String>,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

pub async fn analyze_resume(
    model: &dyn ChatModel,
    request: &ResumeRequest,
) -> Result<ResumeAnalysis, AppError> {
    request.validate()?;

    let attachment = Attachment {
        mime_type: PDF_MIME_TYPE.to_string(),
        data: request.data.clone(),
    };

    let result = model
        .analyze_document(&attachment, &request.prompt())
        .await
        .map_err(|e| {
            warn!("Resume analysis failed: {e}");
            AppError::Llm(e.to_string())
        })?;

    info!(
        "Resume analysis ({:?}) completed: {} bytes in, {} chars out",
        request.analysis_type,
        request.data.len(),
        result.len()
    );

    Ok(ResumeAnalysis {
        analysis_type: request.analysis_type,
        request: request.custom_focus().map(String::from),
        result,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::Part;

    fn pdf_request(analysis_type: AnalysisType, custom: Option<&str>) -> ResumeRequest {
        ResumeRequest {
            content_type: Some(PDF_MIME_TYPE.to_string()),
            data: Bytes::from_static(b"%PDF-1.7 resume"),
            analysis_type,
            custom_request: custom.map(String::from),
        }
    }

    #[test]
    fn test_analysis_type_parsing() {
        assert_eq!("".parse::<AnalysisType>().unwrap(), AnalysisType::Comprehensive);
        assert_eq!("impact".parse::<AnalysisType>().unwrap(), AnalysisType::Impact);
        assert!("summary".parse::<AnalysisType>().is_err());
    }

    #[test]
    fn test_rejects_non_pdf_and_empty_uploads() {
        let mut request = pdf_request(AnalysisType::Structure, None);
        request.content_type = Some("text/plain".into());
        request.data = Bytes::from_static(b"plain text");
        assert!(request.validate().is_err());

        request.data = Bytes::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_pdf_magic_accepted_without_declared_type() {
        let mut request = pdf_request(AnalysisType::Keywords, None);
        request.content_type = None;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_custom_requires_request_text() {
        assert!(pdf_request(AnalysisType::Custom, Some("  ")).validate().is_err());
        let request = pdf_request(AnalysisType::Custom, Some("leadership"));
        assert!(request.validate().is_ok());
        assert!(request.prompt().contains("with focus on: leadership"));
    }

    #[tokio::test]
    async fn test_analysis_sends_prompt_with_pdf() {
        let model = ScriptedModel::replying(&["## Report"]);
        let analysis = analyze_resume(&model, &pdf_request(AnalysisType::Impact, Some("ignored")))
            .await
            .unwrap();

        assert_eq!(analysis.result, "## Report");
        assert_eq!(analysis.analysis_type, AnalysisType::Impact);
        assert!(analysis.request.is_none());

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0][0].parts[0], Part::Text(RESUME_IMPACT_PROMPT.to_string()));
        assert!(matches!(calls[0][0].parts[1], Part::InlineData(_)));
    }

    #[tokio::test]
    async fn test_model_failure_is_reported() {
        let model = ScriptedModel::default();
        model.push_failure("overloaded");
        let err = analyze_resume(&model, &pdf_request(AnalysisType::Comprehensive, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
