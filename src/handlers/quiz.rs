// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::progress::upsert_progress,
    models::quiz::{
        CreateQuizRequest, Question, QuestionResult, Quiz, SubmitQuizRequest, SubmitQuizResponse,
    },
};

const QUIZ_COLUMNS: &str = "id, lesson_id, subject, class_name, data, created_at";

/// Creates a quiz attached to an existing lesson.
///
/// The lesson is resolved by the (title, subject, week, class) natural
/// key; zero or ambiguous matches answer 404 and no quiz is created.
/// Clients that kept the lesson id from upload can pass `lesson_id`
/// directly and skip the lookup.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    tracing::info!(
        subject = %req.subject,
        week = %req.week,
        class = %req.class_name,
        "incoming quiz payload"
    );

    let lesson_id = match req.lesson_id {
        Some(id) => sqlx::query_scalar::<_, i64>("SELECT id FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?,
        None => {
            let title = req
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest("title is required when lesson_id is not given".to_string())
                })?;

            let ids = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT id FROM lessons
                WHERE title = $1 AND subject = $2 AND week = $3 AND class_name = $4
                "#,
            )
            .bind(title)
            .bind(&req.subject)
            .bind(&req.week)
            .bind(&req.class_name)
            .fetch_all(&pool)
            .await?;

            match ids.as_slice() {
                [id] => *id,
                _ => {
                    tracing::error!(
                        title = %title,
                        matches = ids.len(),
                        "lesson lookup did not resolve to a single row"
                    );
                    return Err(AppError::NotFound("Lesson not found".to_string()));
                }
            }
        }
    };

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        r#"
        INSERT INTO quizzes (lesson_id, subject, class_name, data)
        VALUES ($1, $2, $3, $4)
        RETURNING {QUIZ_COLUMNS}
        "#
    ))
    .bind(lesson_id)
    .bind(&req.subject)
    .bind(&req.class_name)
    .bind(SqlJson(&req.data))
    .fetch_one(&pool)
    .await?;

    Ok(Json(quiz))
}

/// Fetches the `data` field of one quiz: the question list a student
/// needs in order to take it.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let data = sqlx::query_scalar::<_, SqlJson<Vec<Question>>>(
        "SELECT data FROM quizzes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(serde_json::json!({ "data": data.0 })))
}

/// Scores a student's submission against the stored answer key and
/// records the outcome as progress.
///
/// Progress durability is best effort by design: a failed upsert is
/// logged and the scoring response is still returned to the caller.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let data = sqlx::query_scalar::<_, SqlJson<Vec<Question>>>(
        "SELECT data FROM quizzes WHERE id = $1",
    )
    .bind(req.quiz)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let questions = data.0;
    let (score, results) = score_submission(&questions, &req.answers);

    if let Err(e) = upsert_progress(&pool, &req.student_id, req.quiz, score, &results).await {
        tracing::error!(
            student_id = %req.student_id,
            quiz = req.quiz,
            "failed to save progress: {}",
            e
        );
    }

    Ok(Json(SubmitQuizResponse {
        score,
        total: questions.len(),
        results,
    }))
}

/// Compares submitted answers against the quiz's answer key.
///
/// Iterates the submitted mapping in its insertion order; every submitted
/// question id yields one result record. Unknown ids score as incorrect
/// with no correct answer echoed, unanswered questions are simply never
/// scored. Matching is strict JSON equality ("1" does not equal 1).
fn score_submission(
    questions: &[Question],
    answers: &serde_json::Map<String, serde_json::Value>,
) -> (i64, Vec<QuestionResult>) {
    let mut key: HashMap<String, Option<&serde_json::Value>> = HashMap::new();
    for q in questions {
        key.insert(q.key(), q.correct_answer.as_ref());
    }

    let mut score = 0i64;
    let mut results = Vec::with_capacity(answers.len());

    for (question_id, user_answer) in answers {
        let correct = key.get(question_id.as_str()).copied().flatten();
        let is_correct = correct.is_some_and(|c| c == user_answer);
        if is_correct {
            score += 1;
        }
        results.push(QuestionResult {
            question_id: question_id.clone(),
            user_answer: user_answer.clone(),
            correct_answer: correct.cloned(),
            is_correct,
        });
    }

    (score, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn question(id: Value, correct: Value) -> Question {
        Question {
            id,
            correct_answer: Some(correct),
            extra: serde_json::Map::new(),
        }
    }

    fn answers(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        map
    }

    #[test]
    fn scores_matching_answers() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q2"), json!("B")),
            question(json!("q3"), json!("C")),
        ];
        let submitted = answers(&[("q1", json!("A")), ("q2", json!("x")), ("q3", json!("C"))]);

        let (score, results) = score_submission(&questions, &submitted);

        assert_eq!(score, 2);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_correct);
        assert!(!results[1].is_correct);
        assert_eq!(results[1].correct_answer, Some(json!("B")));
        assert!(results[2].is_correct);
    }

    #[test]
    fn score_equals_count_of_correct_results() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q2"), json!("B")),
        ];
        let submitted = answers(&[("q1", json!("A")), ("q2", json!("B"))]);

        let (score, results) = score_submission(&questions, &submitted);

        let correct = results.iter().filter(|r| r.is_correct).count() as i64;
        assert_eq!(score, correct);
    }

    #[test]
    fn matching_is_strict_about_types() {
        let questions = vec![question(json!("q1"), json!(1))];
        let submitted = answers(&[("q1", json!("1"))]);

        let (score, results) = score_submission(&questions, &submitted);

        assert_eq!(score, 0);
        assert!(!results[0].is_correct);
    }

    #[test]
    fn unanswered_questions_are_not_scored() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q2"), json!("B")),
        ];
        let submitted = answers(&[("q1", json!("A"))]);

        let (score, results) = score_submission(&questions, &submitted);

        assert_eq!(score, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn unknown_question_ids_score_as_incorrect() {
        let questions = vec![question(json!("q1"), json!("A"))];
        let submitted = answers(&[("bogus", json!("A"))]);

        let (score, results) = score_submission(&questions, &submitted);

        assert_eq!(score, 0);
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_correct);
        assert_eq!(results[0].correct_answer, None);
    }

    #[test]
    fn numeric_question_ids_match_string_keys() {
        // Authoring tools sometimes emit numeric ids; submissions always
        // arrive as JSON object keys, i.e. strings.
        let questions = vec![question(json!(7), json!("A"))];
        let submitted = answers(&[("7", json!("A"))]);

        let (score, _) = score_submission(&questions, &submitted);

        assert_eq!(score, 1);
    }

    #[test]
    fn scoring_is_order_independent() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q2"), json!("B")),
            question(json!("q3"), json!("C")),
        ];
        let forward = answers(&[("q1", json!("A")), ("q2", json!("B")), ("q3", json!("x"))]);
        let backward = answers(&[("q3", json!("x")), ("q2", json!("B")), ("q1", json!("A"))]);

        let (score_fwd, mut results_fwd) = score_submission(&questions, &forward);
        let (score_bwd, mut results_bwd) = score_submission(&questions, &backward);

        assert_eq!(score_fwd, score_bwd);

        results_fwd.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        results_bwd.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        assert_eq!(results_fwd, results_bwd);
    }

    #[test]
    fn results_follow_submission_order() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q2"), json!("B")),
        ];
        let submitted = answers(&[("q2", json!("B")), ("q1", json!("A"))]);

        let (_, results) = score_submission(&questions, &submitted);

        assert_eq!(results[0].question_id, "q2");
        assert_eq!(results[1].question_id, "q1");
    }

    #[test]
    fn duplicate_question_ids_resolve_to_the_last_definition() {
        let questions = vec![
            question(json!("q1"), json!("A")),
            question(json!("q1"), json!("B")),
        ];
        let submitted = answers(&[("q1", json!("B"))]);

        let (score, _) = score_submission(&questions, &submitted);

        assert_eq!(score, 1);
    }
}
