use sqlx::PgPool;

use crate::db::models::ExamResultRow;

pub(crate) const COLUMNS: &str = "\
    id, student_id, student_name, exam_id, exam_title, \
    score, max_score, total_questions, violation_count, submitted_at";

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) student_name: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) exam_title: &'a str,
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) total_questions: i32,
    pub(crate) violation_count: i32,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    result: CreateResult<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_results (
            id, student_id, student_name, exam_id, exam_title,
            score, max_score, total_questions, violation_count, submitted_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
    )
    .bind(result.id)
    .bind(result.student_id)
    .bind(result.student_name)
    .bind(result.exam_id)
    .bind(result.exam_title)
    .bind(result.score)
    .bind(result.max_score)
    .bind(result.total_questions)
    .bind(result.violation_count)
    .bind(result.submitted_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamResultRow>(&format!(
        "SELECT {COLUMNS} FROM exam_results WHERE exam_id = $1 ORDER BY submitted_at DESC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
