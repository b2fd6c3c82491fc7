use sqlx::PgPool;

use crate::db::models::{Exam, QuestionRow};

pub(crate) const COLUMNS: &str =
    "id, title, subject, duration_minutes, is_active, created_at, updated_at";

const QUESTION_COLUMNS: &str = "\
    id, exam_id, position, kind, text, image_url, options, \
    correct_index, correct_indices, correct_sequence, points";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE is_active ORDER BY title"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY position"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_questions(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}
