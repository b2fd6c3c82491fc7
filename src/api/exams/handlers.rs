use axum::extract::{Path, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamResultResponse, ExamSummaryResponse};

pub(super) async fn list_exams(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummaryResponse>>, ApiError> {
    let exams = repositories::exams::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut responses = Vec::with_capacity(exams.len());
    for exam in exams {
        let question_count = repositories::exams::count_questions(state.db(), &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count exam questions"))?;
        responses.push(ExamSummaryResponse::from_exam(exam, question_count));
    }

    Ok(Json(responses))
}

pub(super) async fn get_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamSummaryResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id} not found")))?;

    let question_count = repositories::exams::count_questions(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exam questions"))?;

    Ok(Json(ExamSummaryResponse::from_exam(exam, question_count)))
}

pub(super) async fn list_exam_results(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<Vec<ExamResultResponse>>, ApiError> {
    if repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .is_none()
    {
        return Err(ApiError::NotFound(format!("Exam {exam_id} not found")));
    }

    let results = repositories::results::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exam results"))?;

    Ok(Json(results.into_iter().map(ExamResultResponse::from).collect()))
}
