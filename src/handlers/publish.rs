// src/handlers/publish.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        lesson::Lesson,
        manifest::{ManifestBody, PublishRequest},
        quiz::Quiz,
    },
};

/// Snapshots the lessons for a (subject, week) plus the quizzes attached
/// to them into a new immutable manifest row, and returns the assembled
/// body (not the stored row).
///
/// `className` is accepted for parity with the authoring endpoints but
/// does not narrow the snapshot. Manifests accumulate; retrieval picks
/// the newest.
pub async fn publish_manifest(
    State(pool): State<PgPool>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    tracing::info!(
        subject = %req.subject,
        week = %req.week,
        class = req.class_name.as_deref().unwrap_or(""),
        "publishing manifest"
    );

    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT id, title, subject, week, class_name, content, created_at
        FROM lessons
        WHERE subject = $1 AND week = $2
        ORDER BY id
        "#,
    )
    .bind(&req.subject)
    .bind(&req.week)
    .fetch_all(&pool)
    .await?;

    // Only quizzes attached to the snapshotted lessons are bundled.
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT q.id, q.lesson_id, q.subject, q.class_name, q.data, q.created_at
        FROM quizzes q
        JOIN lessons l ON l.id = q.lesson_id
        WHERE l.subject = $1 AND l.week = $2
        ORDER BY q.id
        "#,
    )
    .bind(&req.subject)
    .bind(&req.week)
    .fetch_all(&pool)
    .await?;

    let body = ManifestBody {
        subject: req.subject.clone(),
        week: req.week.clone(),
        lessons,
        quizzes,
    };

    sqlx::query("INSERT INTO manifests (subject, week, body) VALUES ($1, $2, $3)")
        .bind(&req.subject)
        .bind(&req.week)
        .bind(SqlJson(&body))
        .execute(&pool)
        .await?;

    Ok(Json(body))
}

/// Returns the most recently published manifest body for a
/// (subject, week), or 404 when none has been published yet.
pub async fn get_manifest(
    State(pool): State<PgPool>,
    Path((subject, week)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let body = sqlx::query_scalar::<_, SqlJson<ManifestBody>>(
        r#"
        SELECT body FROM manifests
        WHERE subject = $1 AND week = $2
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(&subject)
    .bind(&week)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    Ok(Json(body.0))
}
