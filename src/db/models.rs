use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::QuestionKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Raw question row; correctness columns are nullable because each kind
/// populates a different one. `services::question` validates the shape.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionRow {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) position: i32,
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_index: Option<i32>,
    pub(crate) correct_indices: Option<Json<Vec<i32>>>,
    pub(crate) correct_sequence: Option<Json<Vec<bool>>>,
    pub(crate) points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResultRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) total_questions: i32,
    pub(crate) violation_count: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}
