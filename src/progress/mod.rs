//! Exercise identity and progress aggregation.
//!
//! Every exercise instance gets a deterministic id derived from its
//! lesson path, kind and authored content. The id survives re-renders
//! and token re-shuffles but intentionally changes when the authored
//! answer data changes, resetting completion for that exercise.
//! Completion lives in a persisted ledger (see [`store`]) and rolls up
//! exercise -> lesson -> folder -> course.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::exercise::ExerciseKind;

/// Strip the deployment base path so identity is stable across hosting
/// configurations, and normalize to a single leading slash.
pub fn canonicalize_lesson_path(lesson_path: &str, base_path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let stripped = if !base.is_empty() && lesson_path.starts_with(base) {
        &lesson_path[base.len()..]
    } else {
        lesson_path
    };
    let trimmed = stripped.trim_start_matches('/').trim_end_matches('/');
    format!("/{trimmed}")
}

/// Deterministic short digest of the content fingerprint: first 8 bytes
/// of a sha-256, hex-encoded. Stable across runs and platforms.
pub fn stable_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(&digest[..8])
}

/// `canonical-lesson-path:kind:content-hash`.
pub fn exercise_id(
    lesson_path: &str,
    kind: ExerciseKind,
    content_fingerprint: &str,
    base_path: &str,
) -> String {
    format!(
        "{}:{}:{}",
        canonicalize_lesson_path(lesson_path, base_path),
        kind,
        stable_hash(content_fingerprint)
    )
}

/// One ledger entry. Field names match the persisted blob format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub exercise_id: String,
    pub lesson_path: String,
    pub completed: bool,
    pub last_attempt: DateTime<Utc>,
}

/// The whole ledger: exercise id -> record, persisted as one JSON blob.
pub type Ledger = BTreeMap<String, ExerciseRecord>;

/// One lesson's entry in the exercise-count manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonManifestEntry {
    pub path: String,
    pub exercise_count: usize,
}

/// Per-lesson progress. `completed` is capped at the manifest total so
/// stale ledger entries (from since-edited content) can't overshoot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

impl LessonProgress {
    pub fn new(raw_completed: usize, total: usize) -> Self {
        let completed = raw_completed.min(total);
        let percentage = if total == 0 {
            0
        } else {
            ((completed * 100) / total) as u8
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// A lesson with no declared exercises has no progress to show and
    /// never counts as complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Folder or course roll-up: summed per-lesson exercise counts (each
/// capped like [`LessonProgress`]), plus whole-lesson completion counts.
/// The percentage is the exercise ratio, not the lesson ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollupProgress {
    pub completed: usize,
    pub total: usize,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    pub percentage: u8,
}

impl RollupProgress {
    pub fn from_lessons<I>(lessons: I) -> Self
    where
        I: IntoIterator<Item = LessonProgress>,
    {
        let mut completed = 0;
        let mut total = 0;
        let mut lessons_completed = 0;
        let mut lessons_total = 0;
        for lesson in lessons {
            completed += lesson.completed;
            total += lesson.total;
            lessons_total += 1;
            if lesson.is_complete() {
                lessons_completed += 1;
            }
        }
        let percentage = if total == 0 {
            0
        } else {
            ((completed * 100) / total) as u8
        };
        Self {
            completed,
            total,
            lessons_completed,
            lessons_total,
            percentage,
        }
    }
}
