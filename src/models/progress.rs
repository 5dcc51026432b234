// src/models/progress.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::quiz::QuestionResult;

/// Represents the 'progress' table in the database.
/// Stores the latest scored submission for one (student, quiz) pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Progress {
    pub id: i64,
    pub student_id: String,
    pub quiz_id: i64,
    pub score: i64,
    pub answers: Json<Vec<QuestionResult>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for the manual progress upsert endpoint.
#[derive(Debug, Deserialize)]
pub struct UpsertProgressRequest {
    pub student_id: String,
    /// Quiz row id.
    pub quiz: i64,
    pub answers: Vec<QuestionResult>,
    pub score: i64,
}
