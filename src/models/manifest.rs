// src/models/manifest.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{lesson::Lesson, quiz::Quiz};

/// Snapshot body stored in the 'manifests' table and served on retrieval.
/// Immutable once published; newer publishes add rows rather than update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestBody {
    pub subject: String,
    pub week: String,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
}

/// DTO for publishing a manifest. `className` is accepted for parity with
/// the other authoring endpoints but does not narrow the snapshot.
#[derive(Debug, Deserialize, Validate)]
pub struct PublishRequest {
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 50))]
    pub week: String,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
}
