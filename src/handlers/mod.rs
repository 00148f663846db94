pub mod exercises;
pub mod progress;
mod render;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;

use crate::progress::{LessonProgress, RollupProgress};
use crate::state::AppState;

/// All application routes over shared state. Static assets are nested
/// separately by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/lesson/{*path}", get(lesson))
        .route("/exercise/check", post(exercises::check))
        .route("/exercise/complete", post(exercises::complete))
        .route("/progress", get(progress::progress_page))
        .route("/progress/reset", post(progress::reset))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn health() -> &'static str {
    "OK"
}

pub struct LessonLink {
    pub path: String,
    pub title: String,
    pub progress: LessonProgress,
}

pub struct FolderView {
    pub name: String,
    pub lessons: Vec<LessonLink>,
    pub rollup: RollupProgress,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub folders: Vec<FolderView>,
    pub course: RollupProgress,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let folders = state
        .course
        .folders
        .iter()
        .map(|folder| {
            let manifest = state.course.folder_manifest(folder);
            let lessons = folder
                .lessons
                .iter()
                .zip(manifest.iter())
                .map(|(lesson, entry)| LessonLink {
                    path: lesson.path.clone(),
                    title: lesson.title.clone(),
                    progress: state.store.lesson_progress(entry),
                })
                .collect();
            FolderView {
                name: folder.name.clone(),
                lessons,
                rollup: state.store.rollup(&manifest),
            }
        })
        .collect();

    let template = IndexTemplate {
        title: state.course.title.clone(),
        folders,
        course: state.store.rollup(&state.course.manifest()),
    };
    Html(template.render().unwrap_or_default())
}

#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate {
    pub title: String,
    pub path: String,
    pub body: String,
    pub progress: LessonProgress,
}

pub async fn lesson(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let lesson_path = format!("/{}", path.trim_start_matches('/'));
    let lesson = state
        .course
        .lesson(&lesson_path)
        .ok_or(StatusCode::NOT_FOUND)?;

    let entry = crate::progress::LessonManifestEntry {
        path: lesson.path.clone(),
        exercise_count: lesson.exercise_count(),
    };
    let template = LessonTemplate {
        title: lesson.title.clone(),
        path: lesson.path.clone(),
        body: render::render_lesson_body(lesson, &state),
        progress: state.store.lesson_progress(&entry),
    };
    Ok(Html(template.render().unwrap_or_default()))
}
