use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::session::{
    DoubtRequest, FocusLossResponse, NavigateAction, NavigateRequest, ResultResponse,
    SaveAnswerRequest, SessionStateResponse, StartSessionRequest,
};
use crate::services::progress;
use crate::services::question::Question;
use crate::services::runtime::try_finish_session;
use crate::services::session::{ExamSession, FocusLossOutcome, NewSession};

/// Starts a session, or resumes the participant's existing one for the same
/// exam. Resuming keeps the shuffled order and restores the saved position.
pub(super) async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionStateResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(existing) =
        state.sessions().find_by_student_exam(&payload.student_id, &payload.exam_id).await
    {
        let saved = progress::load(state.redis(), &payload.student_id, &payload.exam_id).await;
        let mut guard = existing.lock().await;
        if !guard.is_finished() {
            if let Some(index) = saved {
                guard.resume_at(index);
            }
        }
        return Ok((StatusCode::OK, Json(SessionStateResponse::from_session(&guard))));
    }

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {} not found", payload.exam_id)))?;
    if !exam.is_active {
        return Err(ApiError::BadRequest(format!("Exam {} is not active", exam.id)));
    }

    let rows = repositories::exams::list_questions(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam questions"))?;
    if rows.is_empty() {
        return Err(ApiError::BadRequest(format!("Exam {} has no questions", exam.id)));
    }
    let questions = rows
        .into_iter()
        .map(Question::from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::internal(e, "Exam has invalid question data"))?;

    let max_concurrent = state.settings().exam().max_concurrent_sessions as usize;
    if state.sessions().unfinished_count().await >= max_concurrent {
        return Err(ApiError::ServiceUnavailable(
            "Too many concurrent exam sessions, try again later".to_string(),
        ));
    }

    let params = NewSession {
        exam_id: exam.id.clone(),
        exam_title: exam.title,
        student_id: payload.student_id.clone(),
        student_name: payload.student_name,
        questions,
        duration_seconds: (exam.duration_minutes.max(0) as u64) * 60,
        anti_cheat: state.settings().anti_cheat().clone(),
        started_at: primitive_now_utc(),
    };
    let mut session = ExamSession::new(params, &mut StdRng::from_entropy());

    // A position saved by a run before a restart still counts.
    if let Some(index) = progress::load(state.redis(), &payload.student_id, &exam.id).await {
        session.resume_at(index);
    }

    // The registry keys on (student, exam); if a concurrent start won the
    // race, its session is returned and this one's shuffle is discarded.
    let (session, created) = state.sessions().insert(session).await;
    let guard = session.lock().await;
    if !created {
        return Ok((StatusCode::OK, Json(SessionStateResponse::from_session(&guard))));
    }

    metrics::counter!("exam_sessions_started_total").increment(1);
    tracing::info!(
        session_id = guard.id(),
        exam_id = guard.exam_id(),
        student_id = guard.student_id(),
        "exam session started"
    );

    Ok((StatusCode::CREATED, Json(SessionStateResponse::from_session(&guard))))
}

pub(super) async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let guard = session.lock().await;
    Ok(Json(SessionStateResponse::from_session(&guard)))
}

pub(super) async fn save_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let mut guard = session.lock().await;

    match payload.answer {
        Some(answer) => guard.record_answer(payload.question_index, answer.into())?,
        None => guard.clear_answer(payload.question_index)?,
    }

    Ok(Json(SessionStateResponse::from_session(&guard)))
}

pub(super) async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let (response, student_id, exam_id, index) = {
        let mut guard = session.lock().await;
        let index = match payload.action {
            NavigateAction::Next => guard.go_next()?,
            NavigateAction::Previous => guard.go_previous()?,
            NavigateAction::Jump => {
                let index = payload.index.ok_or_else(|| {
                    ApiError::BadRequest("index is required for a jump".to_string())
                })?;
                guard.jump_to(index)?
            }
        };
        (
            SessionStateResponse::from_session(&guard),
            guard.student_id().to_string(),
            guard.exam_id().to_string(),
            index,
        )
    };

    progress::save(state.redis(), &student_id, &exam_id, index).await;

    Ok(Json(response))
}

pub(super) async fn toggle_doubt(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<DoubtRequest>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let mut guard = session.lock().await;
    guard.toggle_doubt(payload.question_index)?;
    Ok(Json(SessionStateResponse::from_session(&guard)))
}

pub(super) async fn report_focus_loss(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FocusLossResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let mut guard = session.lock().await;

    let response = match guard.report_focus_loss() {
        FocusLossOutcome::Ignored => FocusLossResponse {
            violation_registered: false,
            frozen: false,
            freeze_seconds: 0,
            violation_count: guard.violation_count(),
            alert_text: None,
            play_sound: false,
        },
        FocusLossOutcome::AlreadyFrozen { remaining_seconds } => FocusLossResponse {
            violation_registered: false,
            frozen: true,
            freeze_seconds: remaining_seconds,
            violation_count: guard.violation_count(),
            alert_text: None,
            play_sound: false,
        },
        FocusLossOutcome::Frozen { freeze_seconds, violation_count } => {
            metrics::counter!("exam_focus_violations_total").increment(1);
            tracing::warn!(
                session_id = guard.id(),
                student_id = guard.student_id(),
                violation_count,
                freeze_seconds,
                "focus loss violation registered"
            );
            FocusLossResponse {
                violation_registered: true,
                frozen: true,
                freeze_seconds,
                violation_count,
                alert_text: Some(guard.anti_cheat().alert_text.clone()),
                play_sound: guard.anti_cheat().enable_sound,
            }
        }
    };

    Ok(Json(response))
}

/// Manual finish. Rejected while frozen; the timer expiry path in the ticker
/// finalizes regardless.
pub(super) async fn finish_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    let session = lookup(&state, &session_id).await?;
    let outcome = try_finish_session(&state, &session).await?;
    Ok(Json(ResultResponse::from(&outcome)))
}

async fn lookup(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<Mutex<ExamSession>>, ApiError> {
    state
        .sessions()
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {session_id} not found")))
}
