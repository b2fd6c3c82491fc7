use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::types::QuestionKind;
use crate::services::countdown::TimeWarning;
use crate::services::penalty::PenaltyState;
use crate::services::question::{Answer, Question};
use crate::services::session::{ExamSession, SessionOutcome};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StartSessionRequest {
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(alias = "studentName")]
    #[validate(length(min = 1, message = "student_name must not be empty"))]
    pub(crate) student_name: String,
}

/// Wire form of an answer. The tag keeps the payload kind explicit so a
/// mismatched body fails deserialization instead of silently scoring zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AnswerPayload {
    SingleChoice { index: usize },
    MultiChoice { indices: Vec<usize> },
    TrueFalseSequence { verdicts: Vec<bool> },
    Essay { text: String },
}

impl From<AnswerPayload> for Answer {
    fn from(payload: AnswerPayload) -> Self {
        match payload {
            AnswerPayload::SingleChoice { index } => Answer::SingleChoice(index),
            AnswerPayload::MultiChoice { indices } => {
                Answer::MultiChoice(indices.into_iter().collect())
            }
            AnswerPayload::TrueFalseSequence { verdicts } => Answer::TrueFalseSequence(verdicts),
            AnswerPayload::Essay { text } => Answer::Essay(text),
        }
    }
}

impl From<&Answer> for AnswerPayload {
    fn from(answer: &Answer) -> Self {
        match answer {
            Answer::SingleChoice(index) => AnswerPayload::SingleChoice { index: *index },
            Answer::MultiChoice(indices) => {
                AnswerPayload::MultiChoice { indices: indices.iter().copied().collect() }
            }
            Answer::TrueFalseSequence(verdicts) => {
                AnswerPayload::TrueFalseSequence { verdicts: verdicts.clone() }
            }
            Answer::Essay(text) => AnswerPayload::Essay { text: text.clone() },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAnswerRequest {
    #[serde(alias = "questionIndex")]
    pub(crate) question_index: usize,
    /// Omitting the answer clears the slot.
    #[serde(default)]
    pub(crate) answer: Option<AnswerPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum NavigateAction {
    Next,
    Previous,
    Jump,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NavigateRequest {
    pub(crate) action: NavigateAction,
    #[serde(default)]
    pub(crate) index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DoubtRequest {
    #[serde(alias = "questionIndex")]
    pub(crate) question_index: usize,
}

/// A question as the participant sees it: shuffled options, no correctness
/// data.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) options: Vec<String>,
    pub(crate) points: i32,
}

impl From<&Question> for QuestionResponse {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            kind: question.kind(),
            text: question.text.clone(),
            image_url: question.image_url.clone(),
            options: question.options.clone(),
            points: question.points,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TimeWarningResponse {
    pub(crate) title: String,
    pub(crate) subtitle: String,
}

impl From<TimeWarning> for TimeWarningResponse {
    fn from(warning: TimeWarning) -> Self {
        let title = match warning {
            TimeWarning::FiveMinutes => "Waktu mengerjakan kurang 5 menit",
            TimeWarning::OneMinute => "Waktu mengerjakan kurang 60 detik",
        };
        Self {
            title: title.to_string(),
            subtitle: "Periksa kembali soal dan jawaban".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PenaltyResponse {
    pub(crate) frozen: bool,
    pub(crate) remaining_seconds: u64,
    pub(crate) violation_count: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) total_questions: usize,
    pub(crate) violation_count: u32,
    pub(crate) submitted_at: String,
    pub(crate) motivation: String,
}

impl From<&SessionOutcome> for ResultResponse {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            score: outcome.score,
            max_score: outcome.max_score,
            total_questions: outcome.total_questions,
            violation_count: outcome.violation_count,
            submitted_at: format_primitive(outcome.submitted_at),
            motivation: outcome.motivation.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FocusLossResponse {
    pub(crate) violation_registered: bool,
    pub(crate) frozen: bool,
    pub(crate) freeze_seconds: u64,
    pub(crate) violation_count: u32,
    pub(crate) alert_text: Option<String>,
    pub(crate) play_sound: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionStateResponse {
    pub(crate) session_id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) started_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) answers: Vec<Option<AnswerPayload>>,
    pub(crate) doubts: Vec<bool>,
    pub(crate) current_index: usize,
    pub(crate) answered_count: usize,
    pub(crate) remaining_seconds: u64,
    pub(crate) time_warning: Option<TimeWarningResponse>,
    pub(crate) penalty: PenaltyResponse,
    pub(crate) finished: bool,
    pub(crate) result: Option<ResultResponse>,
}

impl SessionStateResponse {
    pub(crate) fn from_session(session: &ExamSession) -> Self {
        let penalty = match session.penalty_state() {
            PenaltyState::Unfrozen => PenaltyResponse {
                frozen: false,
                remaining_seconds: 0,
                violation_count: session.violation_count(),
            },
            PenaltyState::Frozen { remaining_seconds } => PenaltyResponse {
                frozen: true,
                remaining_seconds,
                violation_count: session.violation_count(),
            },
        };

        Self {
            session_id: session.id().to_string(),
            exam_id: session.exam_id().to_string(),
            exam_title: session.exam_title().to_string(),
            student_id: session.student_id().to_string(),
            student_name: session.student_name().to_string(),
            started_at: format_primitive(session.started_at()),
            questions: session.questions().iter().map(QuestionResponse::from).collect(),
            answers: session
                .answers()
                .iter()
                .map(|answer| answer.as_ref().map(AnswerPayload::from))
                .collect(),
            doubts: session.doubts().to_vec(),
            current_index: session.current_index(),
            answered_count: session.answered_count(),
            remaining_seconds: session.countdown().remaining_seconds(),
            time_warning: session.countdown().visible_warning().map(TimeWarningResponse::from),
            penalty,
            finished: session.is_finished(),
            result: session.outcome().map(ResultResponse::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_payload_round_trips_through_its_tag() {
        let payload = AnswerPayload::MultiChoice { indices: vec![0, 2] };
        let json = serde_json::to_string(&payload).expect("serialize");

        assert_eq!(json, r#"{"kind":"multi_choice","indices":[0,2]}"#);
        let back: AnswerPayload = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, payload);
    }

    #[test]
    fn answer_payload_rejects_unknown_kinds() {
        let result =
            serde_json::from_str::<AnswerPayload>(r#"{"kind":"matching","pairs":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn single_choice_payload_converts_to_domain_answer() {
        let payload: AnswerPayload =
            serde_json::from_str(r#"{"kind":"single_choice","index":3}"#).expect("deserialize");
        assert_eq!(Answer::from(payload), Answer::SingleChoice(3));
    }

    #[test]
    fn multi_choice_payload_deduplicates_indices() {
        let payload = AnswerPayload::MultiChoice { indices: vec![2, 0, 2] };
        match Answer::from(payload) {
            Answer::MultiChoice(indices) => {
                assert_eq!(indices.into_iter().collect::<Vec<_>>(), vec![0, 2]);
            }
            other => panic!("unexpected answer: {other:?}"),
        }
    }

    #[test]
    fn navigate_request_accepts_a_bare_action() {
        let request: NavigateRequest =
            serde_json::from_str(r#"{"action":"next"}"#).expect("deserialize");
        assert!(matches!(request.action, NavigateAction::Next));
        assert_eq!(request.index, None);
    }

    #[test]
    fn time_warning_texts_match_the_threshold() {
        let five = TimeWarningResponse::from(TimeWarning::FiveMinutes);
        let one = TimeWarningResponse::from(TimeWarning::OneMinute);

        assert_eq!(five.title, "Waktu mengerjakan kurang 5 menit");
        assert_eq!(one.title, "Waktu mengerjakan kurang 60 detik");
        assert_eq!(five.subtitle, one.subtitle);
    }
}
