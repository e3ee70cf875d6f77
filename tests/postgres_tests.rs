// tests/postgres_tests.rs
//
// Runs against a real database when DATABASE_URL is set; every test returns
// early otherwise.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use quiz_backend::{
    config::Config,
    engine::{self, EngineError},
    models::{
        attempt::{AnswerDraft, AttemptDraft, Submission, SubmittedAnswer},
        ids::{AttemptId, QuestionId, QuizId, UserId},
    },
    routes,
    state::AppState,
    store::{PgQuizStore, QuizStore, StoreError},
    utils::jwt::sign_jwt,
};
use sqlx::{PgPool, postgres::PgPoolOptions};

const SECRET: &str = "postgres_test_secret";

async fn connect() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

async fn spawn_app(pool: PgPool) -> String {
    let config = Config {
        database_url: std::env::var("DATABASE_URL").ok(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
    };

    let state = AppState {
        store: Arc::new(PgQuizStore::new(pool)),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// A user id no other test run will share.
fn fresh_user() -> UserId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    UserId((nanos % i64::MAX as u128) as i64)
}

struct SeededQuiz {
    id: QuizId,
    /// Question ids in display order.
    questions: Vec<QuestionId>,
}

/// Inserts a quiz whose row ids run opposite to its display order, so only
/// the `position` columns put questions and options in the right sequence.
async fn seed_quiz(pool: &PgPool, questions: &[(&str, &[&str], usize)]) -> SeededQuiz {
    let (quiz_id,): (i64,) = sqlx::query_as(
        "INSERT INTO quizzes (title, description, user_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("Storage round trip")
    .bind("Seeded by postgres_tests")
    .bind(1_i64)
    .fetch_one(pool)
    .await
    .unwrap();

    let mut ids = Vec::new();
    for (position, (text, options, correct)) in questions.iter().enumerate().rev() {
        let (question_id,): (i64,) = sqlx::query_as(
            "INSERT INTO questions (quiz_id, question_text, position) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(quiz_id)
        .bind(*text)
        .bind(position as i32)
        .fetch_one(pool)
        .await
        .unwrap();

        for (option_position, option) in options.iter().enumerate().rev() {
            sqlx::query(
                "INSERT INTO options (question_id, option_text, is_correct, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(question_id)
            .bind(*option)
            .bind(option_position == *correct)
            .bind(option_position as i32)
            .execute(pool)
            .await
            .unwrap();
        }
        ids.push(QuestionId(question_id));
    }
    ids.reverse();

    SeededQuiz {
        id: QuizId(quiz_id),
        questions: ids,
    }
}

fn three_questions() -> Vec<(&'static str, &'static [&'static str], usize)> {
    vec![
        ("First?", &["a", "b", "c"], 2),
        ("Second?", &["yes", "no"], 0),
        ("Third?", &["x", "y"], 1),
    ]
}

#[tokio::test]
async fn submit_and_view_result_over_postgres() {
    let Some(pool) = connect().await else { return };
    let quiz = seed_quiz(&pool, &three_questions()).await;
    let address = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let user = fresh_user();
    let auth = format!("Bearer {}", sign_jwt(user, "user", SECRET, 600).unwrap());

    // Answers arrive out of display order; the second question is omitted.
    let submit_resp = client
        .post(&format!("{}/api/attempts", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "quiz_id": quiz.id,
            "answers": [
                { "question_id": quiz.questions[2], "answer_index": 1 },
                { "question_id": quiz.questions[0], "answer_index": 2 }
            ],
            "time_spent": 120_000
        }))
        .send()
        .await
        .expect("Submit failed");

    assert_eq!(submit_resp.status().as_u16(), 201);
    let created: serde_json::Value = submit_resp.json().await.unwrap();
    assert_eq!(created["score"], 67);
    let attempt_id = created["attempt_id"].as_i64().unwrap();

    // Editing and then deleting the quiz must not change the stored result.
    sqlx::query("UPDATE questions SET question_text = 'Rewritten' WHERE quiz_id = $1")
        .bind(quiz.id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz.id)
        .execute(&pool)
        .await
        .unwrap();

    let view_resp = client
        .get(&format!("{}/api/attempts/{}", address, attempt_id))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();

    assert_eq!(view_resp.status().as_u16(), 200);
    let view: serde_json::Value = view_resp.json().await.unwrap();
    assert_eq!(view["total_questions"], 3);
    assert_eq!(view["correct_answers"], 2);
    assert_eq!(view["time_spent"], 120_000);
    assert_eq!(view["quiz_title"], "Storage round trip");

    let texts: Vec<&str> = view["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["First?", "Second?", "Third?"]);
    assert_eq!(view["questions"][0]["options"], serde_json::json!(["a", "b", "c"]));
    assert_eq!(view["questions"][0]["correct_answer"], 2);
    assert_eq!(view["questions"][1]["user_answer"], serde_json::Value::Null);
    assert_eq!(view["questions"][2]["user_answer"], 1);
}

#[tokio::test]
async fn quiz_and_answers_follow_position_order() {
    let Some(pool) = connect().await else { return };
    let quiz = seed_quiz(&pool, &three_questions()).await;
    let store = PgQuizStore::new(pool.clone());

    // Row ids descend while positions ascend.
    assert!(quiz.questions[0] > quiz.questions[2]);

    let loaded = store.load_quiz(quiz.id).await.unwrap().unwrap();
    let loaded_ids: Vec<QuestionId> = loaded.questions.iter().map(|q| q.id).collect();
    assert_eq!(loaded_ids, quiz.questions);
    assert_eq!(loaded.questions[0].option_texts(), vec!["a", "b", "c"]);
    assert_eq!(loaded.questions[0].correct_index(), Ok(2));

    let result = engine::submit_attempt(
        &store,
        Submission {
            quiz_id: quiz.id,
            user_id: fresh_user(),
            answers: vec![SubmittedAnswer {
                question_id: quiz.questions[1],
                chosen_index: 0,
            }],
            time_spent: 9,
        },
    )
    .await
    .unwrap();

    let answers = store.load_answers(result.attempt_id).await.unwrap();
    let answered: Vec<QuestionId> = answers.iter().map(|a| a.question_id).collect();
    assert_eq!(answered, quiz.questions);
    assert_eq!(answers[1].chosen_index, Some(0));
    assert!(answers[1].is_correct);
    assert!(answers.iter().all(|a| a.attempt_id == result.attempt_id));
}

#[tokio::test]
async fn pending_attempt_is_not_visible() {
    let Some(pool) = connect().await else { return };
    let store = PgQuizStore::new(pool.clone());
    let user = fresh_user();

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO quiz_attempts (user_id, quiz_id, quiz_title, score, time_spent, status)
        VALUES ($1, 1, 'Half written', 0, 5, 'pending')
        RETURNING id
        "#,
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert!(store.load_attempt(AttemptId(id)).await.unwrap().is_none());
    assert!(matches!(
        engine::get_result(&store, AttemptId(id), user, true).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn failed_finalize_leaves_no_rows() {
    let Some(pool) = connect().await else { return };
    let quiz = seed_quiz(&pool, &three_questions()).await;
    let store = PgQuizStore::new(pool.clone());
    let user = fresh_user();

    // The score check constraint rejects the finalizing update, after the
    // attempt and answer inserts already ran inside the transaction.
    let draft = AttemptDraft {
        user_id: user,
        quiz_id: quiz.id,
        quiz_title: "Storage round trip".to_string(),
        time_spent: 3,
        score: 101,
        answers: quiz
            .questions
            .iter()
            .map(|question_id| AnswerDraft {
                question_id: *question_id,
                chosen_index: Some(0),
                is_correct: false,
                question_snapshot: r#"{"text":"t","options":["a"],"correctAnswer":0}"#.to_string(),
            })
            .collect(),
    };

    let err = store.record_attempt(draft).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));

    let (attempts,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1")
            .bind(user)
            .fetch_one(&pool)
            .await
            .unwrap();
    let (answers,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM user_answers ua
        JOIN quiz_attempts qa ON qa.id = ua.attempt_id
        WHERE qa.user_id = $1
        "#,
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(attempts, 0);
    assert_eq!(answers, 0);

    // No answer rows for this quiz's questions, under any attempt.
    let (orphans,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_answers WHERE question_id = ANY($1)",
    )
    .bind(quiz.questions.iter().map(|q| q.get()).collect::<Vec<i64>>())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(orphans, 0);
}
