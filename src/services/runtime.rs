use std::collections::HashMap;
use std::sync::Arc;

use time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::results::{self, CreateResult};
use crate::services::penalty::PenaltyState;
use crate::services::progress;
use crate::services::session::{ExamSession, SessionError, SessionOutcome};

/// In-memory index of live sessions, keyed by session id and by
/// (student, exam) so a participant holds at most one session per exam even
/// under concurrent start requests. Sessions are kept for a while after
/// finishing so the participant can re-fetch their result.
pub(crate) struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<String, Arc<Mutex<ExamSession>>>,
    by_participant: HashMap<(String, String), String>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self { inner: RwLock::new(RegistryInner::default()) }
    }

    /// Registers the session unless the participant already has one for the
    /// same exam; the existing session wins and the new shuffle is discarded.
    /// Returns the registered session and whether this call created it.
    pub(crate) async fn insert(&self, session: ExamSession) -> (Arc<Mutex<ExamSession>>, bool) {
        let id = session.id().to_string();
        let key = (session.student_id().to_string(), session.exam_id().to_string());

        let mut guard = self.inner.write().await;
        if let Some(existing_id) = guard.by_participant.get(&key) {
            if let Some(existing) = guard.by_id.get(existing_id) {
                return (existing.clone(), false);
            }
        }

        let session = Arc::new(Mutex::new(session));
        guard.by_id.insert(id.clone(), session.clone());
        guard.by_participant.insert(key, id);
        (session, true)
    }

    pub(crate) async fn get(&self, session_id: &str) -> Option<Arc<Mutex<ExamSession>>> {
        self.inner.read().await.by_id.get(session_id).cloned()
    }

    pub(crate) async fn find_by_student_exam(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> Option<Arc<Mutex<ExamSession>>> {
        let guard = self.inner.read().await;
        let id = guard.by_participant.get(&(student_id.to_string(), exam_id.to_string()))?;
        guard.by_id.get(id).cloned()
    }

    pub(crate) async fn snapshot(&self) -> Vec<Arc<Mutex<ExamSession>>> {
        self.inner.read().await.by_id.values().cloned().collect()
    }

    pub(crate) async fn unfinished_count(&self) -> usize {
        let snapshot = self.snapshot().await;
        let mut count = 0;
        for session in snapshot {
            if !session.lock().await.is_finished() {
                count += 1;
            }
        }
        count
    }

    /// Drops sessions whose result was submitted longer than `retention` ago.
    pub(crate) async fn evict_finished(&self, retention: Duration) -> usize {
        let now = primitive_now_utc();
        let snapshot: Vec<_> = self
            .inner
            .read()
            .await
            .by_id
            .iter()
            .map(|(id, session)| (id.clone(), session.clone()))
            .collect();

        let mut expired = Vec::new();
        for (id, session) in snapshot {
            let guard = session.lock().await;
            if let Some(outcome) = guard.outcome() {
                if now - outcome.submitted_at >= retention {
                    expired.push((
                        id,
                        guard.student_id().to_string(),
                        guard.exam_id().to_string(),
                    ));
                }
            }
        }

        let mut guard = self.inner.write().await;
        let mut evicted = 0;
        for (id, student_id, exam_id) in expired {
            if guard.by_id.remove(&id).is_some() {
                guard.by_participant.remove(&(student_id, exam_id));
                evicted += 1;
            }
        }
        evicted
    }
}

struct SealedSession {
    outcome: SessionOutcome,
    newly_finished: bool,
    session_id: String,
    student_id: String,
    student_name: String,
    exam_id: String,
    exam_title: String,
}

fn seal(session: &mut ExamSession) -> SealedSession {
    let newly_finished = !session.is_finished();
    let outcome = session.finish(primitive_now_utc()).clone();
    SealedSession {
        outcome,
        newly_finished,
        session_id: session.id().to_string(),
        student_id: session.student_id().to_string(),
        student_name: session.student_name().to_string(),
        exam_id: session.exam_id().to_string(),
        exam_title: session.exam_title().to_string(),
    }
}

/// Seals a session unconditionally, writes the result row, and clears the
/// saved position. Used by the ticker's expiry path, which finalizes frozen
/// sessions too. A failed result insert is logged but never loses the
/// in-memory outcome.
pub(crate) async fn finalize_session(
    state: &AppState,
    session: &Arc<Mutex<ExamSession>>,
) -> SessionOutcome {
    let sealed = {
        let mut guard = session.lock().await;
        seal(&mut guard)
    };
    persist(state, sealed).await
}

/// Manual finish. The frozen check and the seal happen under one lock, so a
/// freeze landing between them cannot be bypassed.
pub(crate) async fn try_finish_session(
    state: &AppState,
    session: &Arc<Mutex<ExamSession>>,
) -> Result<SessionOutcome, SessionError> {
    let sealed = {
        let mut guard = session.lock().await;
        if !guard.is_finished() {
            if let PenaltyState::Frozen { remaining_seconds } = guard.penalty_state() {
                return Err(SessionError::Frozen { remaining_seconds });
            }
        }
        seal(&mut guard)
    };
    Ok(persist(state, sealed).await)
}

async fn persist(state: &AppState, sealed: SealedSession) -> SessionOutcome {
    if !sealed.newly_finished {
        return sealed.outcome;
    }

    let create = CreateResult {
        id: &sealed.session_id,
        student_id: &sealed.student_id,
        student_name: &sealed.student_name,
        exam_id: &sealed.exam_id,
        exam_title: &sealed.exam_title,
        score: sealed.outcome.score,
        max_score: sealed.outcome.max_score,
        total_questions: sealed.outcome.total_questions as i32,
        violation_count: sealed.outcome.violation_count as i32,
        submitted_at: sealed.outcome.submitted_at,
    };
    if let Err(err) = results::create(state.db(), create).await {
        error!(error = %err, session_id = sealed.session_id, "failed to persist exam result");
    }

    progress::clear(state.redis(), &sealed.student_id, &sealed.exam_id).await;

    metrics::counter!("exam_sessions_finished_total").increment(1);
    info!(
        session_id = sealed.session_id,
        exam_id = sealed.exam_id,
        score = sealed.outcome.score,
        max_score = sealed.outcome.max_score,
        violations = sealed.outcome.violation_count,
        "exam session finished"
    );

    sealed.outcome
}
