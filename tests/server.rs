//! End-to-end tests over the HTTP surface: course pages, exercise
//! grading, and progress aggregation against a real sqlite ledger.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use lesebuch::content::load_course;
use lesebuch::handlers;
use lesebuch::progress::store::{init_db, ProgressStore};
use lesebuch::state::AppState;

fn write_fixture_course(dir: &TempDir) {
    std::fs::create_dir_all(dir.path().join("unit1")).unwrap();
    std::fs::write(
        dir.path().join("course.toml"),
        r#"
title = "Deutsch A1"

[[folder]]
name = "Einheit 1"
lessons = ["unit1/greetings.json", "unit1/listening.json"]
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("unit1/listening.json"),
        r#"{
            "title": "Hören",
            "blocks": [
                {"type": "exercise", "exercise": {
                    "kind": "audio_phrase",
                    "phrase": "Guten Morgen",
                    "speed_mode": true
                }},
                {"type": "exercise", "exercise": {
                    "kind": "media",
                    "source": "clip.mp4"
                }}
            ]
        }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("unit1/greetings.json"),
        r#"{
            "title": "Begrüßungen",
            "blocks": [
                {"type": "prose", "content": ["Willkommen!"]},
                {"type": "exercise", "exercise": {
                    "kind": "fill_blanks",
                    "text": ["Der [Mann|hint:male adult] geht."]
                }},
                {"type": "exercise", "exercise": {
                    "kind": "quiz",
                    "question": "Was bedeutet Hallo?",
                    "options": ["hello", "goodbye"],
                    "answer": "1"
                }}
            ]
        }"#,
    )
    .unwrap();
}

fn server() -> (TestServer, TempDir) {
    let dir = TempDir::new().unwrap();
    write_fixture_course(&dir);
    let course = Arc::new(load_course(dir.path()).unwrap());
    let pool = init_db(&dir.path().join("progress.db")).unwrap();
    let state = AppState::new(ProgressStore::new(pool), course, String::new());
    (TestServer::new(handlers::router(state)).unwrap(), dir)
}

#[tokio::test]
async fn test_health() {
    let (server, _dir) = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_index_lists_lessons_with_progress() {
    let (server, _dir) = server();
    let response = server.get("/").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("Deutsch A1"));
    assert!(body.contains("Einheit 1"));
    assert!(body.contains("/lesson/unit1/greetings"));
    assert!(body.contains("0/2"));
}

#[tokio::test]
async fn test_lesson_page_renders_exercises() {
    let (server, _dir) = server();
    let response = server.get("/lesson/unit1/greetings").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("Begrüßungen"));
    assert!(body.contains("data-kind=\"fill_blanks\""));
    assert!(body.contains("data-blank=\"0\""));
    assert!(body.contains("Was bedeutet Hallo?"));
    // The blank's answer never appears in the markup.
    assert!(!body.contains("Mann"));
}

#[tokio::test]
async fn test_unknown_lesson_is_404() {
    let (server, _dir) = server();
    let response = server.get("/lesson/unit9/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quiz_check_grades_and_records() {
    let (server, _dir) = server();

    let wrong = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 2,
            "answer": {"kind": "quiz", "selected": [2]}
        }))
        .await;
    wrong.assert_status_ok();
    assert!(wrong.text().contains("incorrect"));

    let right = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 2,
            "answer": {"kind": "quiz", "selected": [1]}
        }))
        .await;
    right.assert_status_ok();
    assert!(right.text().contains("correct"));

    let index = server.get("/").await.text();
    assert!(index.contains("1/2"));
}

#[tokio::test]
async fn test_blanks_check_trims_and_ignores_case() {
    let (server, _dir) = server();
    let response = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 1,
            "answer": {"kind": "blanks", "values": ["  mann "]}
        }))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("feedback correct"));
}

#[tokio::test]
async fn test_check_rejects_mismatched_answer_kind() {
    let (server, _dir) = server();
    let response = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 2,
            "answer": {"kind": "blanks", "values": ["x"]}
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_check_on_prose_block_is_404() {
    let (server, _dir) = server();
    let response = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 0,
            "answer": {"kind": "quiz", "selected": [1]}
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_speed_mode_phrase_cannot_self_complete() {
    let (server, _dir) = server();
    let response = server
        .post("/exercise/complete")
        .json(&json!({
            "lesson_path": "/unit1/listening",
            "block": 0
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was recorded.
    let index = server.get("/").await.text();
    assert!(!index.contains("1/2"));

    // The graded path still works.
    let check = server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/listening",
            "block": 0,
            "answer": {"kind": "transcript", "spoken": "guten morgen"}
        }))
        .await;
    check.assert_status_ok();
    assert!(check.text().contains("feedback correct"));
}

#[tokio::test]
async fn test_media_exercise_completes_directly() {
    let (server, _dir) = server();
    let response = server
        .post("/exercise/complete")
        .json(&json!({
            "lesson_path": "/unit1/listening",
            "block": 1
        }))
        .await;
    response.assert_status_ok();

    let index = server.get("/").await.text();
    assert!(index.contains("1/2"));
}

#[tokio::test]
async fn test_progress_reset() {
    let (server, _dir) = server();
    server
        .post("/exercise/check")
        .json(&json!({
            "lesson_path": "/unit1/greetings",
            "block": 2,
            "answer": {"kind": "quiz", "selected": [1]}
        }))
        .await
        .assert_status_ok();

    let before = server.get("/progress").await.text();
    assert!(before.contains("1/2"));

    server.post("/progress/reset").await.assert_status_ok();

    let after = server.get("/progress").await.text();
    assert!(after.contains("0/2"));
}

#[tokio::test]
async fn test_repeat_completion_is_idempotent() {
    let (server, _dir) = server();
    for _ in 0..3 {
        server
            .post("/exercise/check")
            .json(&json!({
                "lesson_path": "/unit1/greetings",
                "block": 2,
                "answer": {"kind": "quiz", "selected": [1]}
            }))
            .await
            .assert_status_ok();
    }
    let index = server.get("/").await.text();
    assert!(index.contains("1/2"));
}
