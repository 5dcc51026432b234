// src/handlers/lesson.rs

use std::path::Path as FilePath;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::lesson::{Lesson, UploadMeta},
    state::AppState,
    utils::{docx, html::clean_html},
};

const LESSON_COLUMNS: &str = "id, title, subject, week, class_name, content, created_at";

/// Accepts a multipart upload of one `.docx` document plus metadata
/// fields (title, subject, week, className), converts it to sanitized
/// HTML and stores it as a new lesson.
///
/// Validation happens before conversion: the file part must be present,
/// carry a `.docx` extension and be non-empty. The upload is spooled to a
/// uniquely named temp file under the configured upload directory and
/// removed best-effort once conversion succeeds.
pub async fn upload_lesson(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut meta = UploadMeta::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "title" => {
                meta.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "subject" => {
                meta.subject = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "week" => {
                meta.week = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "className" => {
                meta.class_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "file" => {
                let orig_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((orig_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (orig_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("no file uploaded".to_string()))?;

    let ext = FilePath::new(&orig_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "docx" {
        return Err(AppError::BadRequest(format!(
            "please upload a .docx file (got '{}')",
            orig_name
        )));
    }

    if bytes.is_empty() {
        return Err(AppError::BadRequest("uploaded file is empty".to_string()));
    }

    if let Err(validation_errors) = meta.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Spool to disk; each upload gets its own temp file so parallel
    // uploads never collide.
    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    let tmp_path =
        FilePath::new(&state.config.upload_dir).join(format!("{}.docx", Uuid::new_v4()));
    tokio::fs::write(&tmp_path, &bytes).await?;

    let buffer = tokio::fs::read(&tmp_path).await?;
    let conversion = docx::convert_to_html(&buffer)?;
    for msg in &conversion.messages {
        tracing::warn!("converter: {}", msg);
    }
    tracing::info!("generated html length: {}", conversion.html.len());

    let content = clean_html(&conversion.html);

    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        r#"
        INSERT INTO lessons (title, subject, week, class_name, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {LESSON_COLUMNS}
        "#
    ))
    .bind(&meta.title)
    .bind(&meta.subject)
    .bind(&meta.week)
    .bind(&meta.class_name)
    .bind(&content)
    .fetch_one(&state.pool)
    .await?;

    // Temp file removal is best effort; a failure is logged, not surfaced.
    if let Err(e) = tokio::fs::remove_file(&tmp_path).await {
        tracing::warn!("failed to remove temp upload {}: {}", tmp_path.display(), e);
    }

    Ok(Json(lesson))
}

/// Returns the most recently created lesson, as a one-element array.
pub async fn list_lessons(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let lessons = sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY id DESC LIMIT 1"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(lessons))
}

/// Fetches a single lesson by id. A missing row surfaces as the store's
/// single-row error (400), matching the reference behavior of this
/// endpoint.
pub async fn get_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"
    ))
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(lesson))
}
