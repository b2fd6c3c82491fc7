use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, ExamResultRow};

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) duration_minutes: i32,
    pub(crate) question_count: i64,
}

impl ExamSummaryResponse {
    pub(crate) fn from_exam(exam: Exam, question_count: i64) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            subject: exam.subject,
            duration_minutes: exam.duration_minutes,
            question_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResultResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) total_questions: i32,
    pub(crate) violation_count: i32,
    pub(crate) submitted_at: String,
}

impl From<ExamResultRow> for ExamResultResponse {
    fn from(row: ExamResultRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            score: row.score,
            max_score: row.max_score,
            total_questions: row.total_questions,
            violation_count: row.violation_count,
            submitted_at: format_primitive(row.submitted_at),
        }
    }
}
