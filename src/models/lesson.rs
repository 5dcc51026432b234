// src/models/lesson.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'lessons' table in the database.
/// A lesson is a converted teaching document tied to subject/week/class.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,

    pub title: String,

    pub subject: String,

    /// Teaching week the lesson belongs to (free-form, e.g. "3" or "W3").
    pub week: String,

    /// Class/group the lesson is taught to.
    /// Mapped from the column 'class_name'; `class` is a reserved keyword in Rust.
    #[serde(rename = "class")]
    pub class_name: String,

    /// Sanitized HTML fragment produced from the uploaded document.
    pub content: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Metadata fields accompanying an uploaded document.
/// Collected from the non-file parts of the multipart form.
#[derive(Debug, Default, Validate)]
pub struct UploadMeta {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 50, message = "week is required"))]
    pub week: String,
    #[validate(length(min = 1, max = 100, message = "className is required"))]
    pub class_name: String,
}
