//! Application state passed to all handlers.

use std::sync::Arc;

use crate::content::Course;
use crate::progress::store::ProgressStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ProgressStore,
    pub course: Arc<Course>,
    /// Deployment base path, stripped when deriving exercise identity.
    pub base_path: String,
}

impl AppState {
    pub fn new(store: ProgressStore, course: Arc<Course>, base_path: String) -> Self {
        Self {
            store,
            course,
            base_path,
        }
    }
}
