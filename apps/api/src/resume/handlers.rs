//! Axum route handlers for the Resume API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::resume::analysis::{analyze_resume, AnalysisType, ResumeAnalysis, ResumeRequest};
use crate::session::extract::CurrentSession;
use crate::state::AppState;

fn upload_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid upload: {e}"))
}

/// Reads the `file`, `analysis_type` and `custom_request` fields.
async fn read_upload(mut multipart: Multipart) -> Result<ResumeRequest, AppError> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut analysis_type = AnalysisType::default();
    let mut custom_request = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(upload_error)?;
                file = Some((content_type, data));
            }
            "analysis_type" => {
                analysis_type = field.text().await.map_err(upload_error)?.parse()?;
            }
            "custom_request" => {
                custom_request = Some(field.text().await.map_err(upload_error)?);
            }
            _ => {}
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    Ok(ResumeRequest {
        content_type,
        data,
        analysis_type,
        custom_request,
    })
}

/// POST /api/v1/resume/analyze
///
/// Multipart upload of a PDF resume; the analysis is added to the session history.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    current: CurrentSession,
    multipart: Multipart,
) -> Result<Json<ResumeAnalysis>, AppError> {
    current.identity()?;
    let request = read_upload(multipart).await?;
    let analysis = analyze_resume(state.llm.as_ref(), &request).await?;

    current
        .session
        .resume_history
        .write()
        .await
        .insert(0, analysis.clone());

    Ok(Json(analysis))
}

/// GET /api/v1/resume/history
pub async fn handle_resume_history(
    current: CurrentSession,
) -> Result<Json<Vec<ResumeAnalysis>>, AppError> {
    current.identity()?;
    Ok(Json(current.session.resume_history.read().await.clone()))
}
