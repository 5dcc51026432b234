// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quizzes' table in the database.
/// A quiz is an ordered set of scored questions tied to one lesson.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    /// The lesson this quiz belongs to, resolved at creation time.
    pub lesson_id: i64,

    pub subject: String,

    #[serde(rename = "class")]
    pub class_name: String,

    /// Ordered question list, stored verbatim as JSONB.
    pub data: Json<Vec<Question>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One question inside a quiz payload.
///
/// Only `id` and `correctAnswer` take part in scoring. The id may arrive
/// as a JSON string or number; lookups normalize it to its string form,
/// the same way a JS object key would behave. Prompt text, options and any
/// other authoring fields ride along in `extra` untouched so the stored
/// payload round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: serde_json::Value,

    /// Expected answer; compared to submissions with strict JSON equality.
    #[serde(
        rename = "correctAnswer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_answer: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Question {
    /// String form of the question id used as the answer-key lookup key.
    pub fn key(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// DTO for creating a new quiz.
///
/// The owning lesson is resolved by the (title, subject, week, class)
/// natural key. Clients that captured the lesson id at upload time can
/// send `lesson_id` instead and skip the lookup; `title` is then optional.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 50))]
    pub week: String,
    #[serde(rename = "className")]
    #[validate(length(min = 1, max = 100))]
    pub class_name: String,
    pub lesson_id: Option<i64>,
    #[validate(custom(function = validate_questions))]
    pub data: Vec<Question>,
}

fn validate_questions(data: &[Question]) -> Result<(), validator::ValidationError> {
    if data.is_empty() {
        return Err(validator::ValidationError::new("quiz_data_cannot_be_empty"));
    }
    Ok(())
}

/// DTO for submitting a student's answers to a quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Quiz row id.
    pub quiz: i64,

    pub student_id: String,

    /// questionId -> submitted answer, in the client's submission order
    /// (serde_json preserves object order here).
    pub answers: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of comparing one submitted answer against the answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    pub user_answer: serde_json::Value,
    /// Absent when the submitted question id is not part of the quiz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<serde_json::Value>,
    pub is_correct: bool,
}

/// Response body for a scored submission.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub score: i64,
    /// Number of questions in the quiz, not the number of answers.
    pub total: usize,
    pub results: Vec<QuestionResult>,
}
