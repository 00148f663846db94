//! Progress overview page and reset.

use askama::Template;
use axum::extract::State;
use axum::response::Html;

use crate::progress::{LessonProgress, RollupProgress};
use crate::state::AppState;

pub struct LessonRow {
    pub path: String,
    pub title: String,
    pub progress: LessonProgress,
}

#[derive(Template)]
#[template(path = "progress.html")]
pub struct ProgressTemplate {
    pub title: String,
    pub rows: Vec<LessonRow>,
    pub course: RollupProgress,
}

pub async fn progress_page(State(state): State<AppState>) -> Html<String> {
    let manifest = state.course.manifest();
    let rows = state
        .course
        .lessons()
        .zip(manifest.iter())
        .map(|(lesson, entry)| LessonRow {
            path: lesson.path.clone(),
            title: lesson.title.clone(),
            progress: state.store.lesson_progress(entry),
        })
        .collect();

    let template = ProgressTemplate {
        title: state.course.title.clone(),
        rows,
        course: state.store.rollup(&manifest),
    };
    Html(template.render().unwrap_or_default())
}

/// POST /progress/reset: wipe the ledger, return the emptied summary
/// partial.
pub async fn reset(State(state): State<AppState>) -> Html<String> {
    state.store.reset_all();
    tracing::info!("progress ledger reset");
    Html("<span class=\"feedback\">Fortschritt zurückgesetzt.</span>".to_string())
}
