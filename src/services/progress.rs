use tracing::warn;

use crate::core::redis::RedisHandle;

/// Saved position survives reconnects and service restarts so a participant
/// resumes on the question they left, without a fresh shuffle.
pub(crate) fn progress_key(student_id: &str, exam_id: &str) -> String {
    format!("exam:progress:{student_id}:{exam_id}")
}

pub(crate) async fn save(redis: &RedisHandle, student_id: &str, exam_id: &str, index: usize) {
    let key = progress_key(student_id, exam_id);
    if let Err(err) = redis.set(&key, &index.to_string()).await {
        warn!(error = %err, key, "failed to persist exam progress");
    }
}

pub(crate) async fn load(redis: &RedisHandle, student_id: &str, exam_id: &str) -> Option<usize> {
    let key = progress_key(student_id, exam_id);
    match redis.get(&key).await {
        Ok(Some(raw)) => parse_index(&raw).or_else(|| {
            warn!(key, raw, "discarding unparsable exam progress");
            None
        }),
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, key, "failed to load exam progress");
            None
        }
    }
}

pub(crate) async fn clear(redis: &RedisHandle, student_id: &str, exam_id: &str) {
    let key = progress_key(student_id, exam_id);
    if let Err(err) = redis.delete(&key).await {
        warn!(error = %err, key, "failed to clear exam progress");
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}
