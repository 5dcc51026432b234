// src/handlers/progress.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    error::AppError,
    models::{
        progress::{Progress, UpsertProgressRequest},
        quiz::QuestionResult,
    },
};

/// Manual progress upsert, used by clients replaying results captured
/// offline (e.g. from a downloaded manifest).
pub async fn save_progress(
    State(pool): State<PgPool>,
    Json(req): Json<UpsertProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let progress = upsert_progress(&pool, &req.student_id, req.quiz, req.score, &req.answers).await?;
    Ok(Json(progress))
}

/// Inserts or replaces the progress row for one (student, quiz) pair.
/// The merge key is the table's UNIQUE constraint; atomicity of the
/// last-write-wins race between concurrent submissions belongs to the
/// store, not the application.
pub(crate) async fn upsert_progress(
    pool: &PgPool,
    student_id: &str,
    quiz_id: i64,
    score: i64,
    answers: &[QuestionResult],
) -> Result<Progress, AppError> {
    let progress = sqlx::query_as::<_, Progress>(
        r#"
        INSERT INTO progress (student_id, quiz_id, score, answers)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_id, quiz_id)
        DO UPDATE SET score = EXCLUDED.score, answers = EXCLUDED.answers, updated_at = now()
        RETURNING id, student_id, quiz_id, score, answers, updated_at
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .bind(score)
    .bind(SqlJson(answers))
    .fetch_one(pool)
    .await?;

    Ok(progress)
}
