//! Persisted completion ledger.
//!
//! The ledger is one JSON blob under a well-known key in a sqlite
//! key/value table, read fully on each query. At the expected scale of
//! a few hundred exercises this is simpler and plenty fast.
//!
//! Storage failures are caught here, logged, and degrade to "no
//! progress recorded"; a learner is never blocked from an exercise
//! because progress tracking failed.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ExerciseRecord, Ledger, LessonManifestEntry, LessonProgress, RollupProgress};

pub type DbPool = Arc<Mutex<Connection>>;

const LEDGER_KEY: &str = "exercise_ledger";

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}

/// Error returned when the database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database unavailable")
    }
}

impl std::error::Error for DbLockError {}

fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
    pool.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("database mutex poisoned - a thread panicked while holding the lock");
        DbLockError
    })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

#[cfg(test)]
pub fn init_db_in_memory() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Query/update interface over the ledger. Cheap to clone.
#[derive(Clone)]
pub struct ProgressStore {
    pool: DbPool,
}

impl ProgressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Read the whole ledger. Missing key, lock failure or a corrupted
    /// blob all degrade to an empty ledger.
    pub fn ledger(&self) -> Ledger {
        let conn = match try_lock(&self.pool) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("ledger read: {}", e);
                return Ledger::new();
            }
        };
        let blob: Option<String> = conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                [LEDGER_KEY],
                |row| row.get(0),
            )
            .optional()
            .log_warn_default("ledger read");
        match blob {
            Some(text) => serde_json::from_str(&text).log_warn_default("ledger parse"),
            None => Ledger::new(),
        }
    }

    fn write_ledger(&self, ledger: &Ledger) {
        let text = match serde_json::to_string(ledger) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("ledger serialize: {}", e);
                return;
            }
        };
        if let Ok(conn) = try_lock(&self.pool) {
            conn.execute(
                "INSERT INTO storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (LEDGER_KEY, &text),
            )
            .log_warn("ledger write");
        }
    }

    /// Idempotent upsert: completed stays true, the timestamp moves.
    pub fn mark_complete(&self, exercise_id: &str, lesson_path: &str) {
        let mut ledger = self.ledger();
        ledger.insert(
            exercise_id.to_string(),
            ExerciseRecord {
                exercise_id: exercise_id.to_string(),
                lesson_path: lesson_path.to_string(),
                completed: true,
                last_attempt: Utc::now(),
            },
        );
        self.write_ledger(&ledger);
    }

    pub fn is_complete(&self, exercise_id: &str) -> bool {
        self.ledger()
            .get(exercise_id)
            .is_some_and(|record| record.completed)
    }

    fn completed_for_lesson(&self, ledger: &Ledger, lesson_path: &str) -> usize {
        ledger
            .values()
            .filter(|record| record.completed && record.lesson_path == lesson_path)
            .count()
    }

    /// Progress for one lesson, capped at the manifest's declared
    /// exercise count.
    pub fn lesson_progress(&self, entry: &LessonManifestEntry) -> LessonProgress {
        let ledger = self.ledger();
        LessonProgress::new(
            self.completed_for_lesson(&ledger, &entry.path),
            entry.exercise_count,
        )
    }

    /// Roll up summed exercise counts plus whole-lesson completion; a
    /// lesson counts as complete only when it declares exercises and
    /// all of them are done.
    pub fn rollup(&self, manifest: &[LessonManifestEntry]) -> RollupProgress {
        let ledger = self.ledger();
        RollupProgress::from_lessons(manifest.iter().map(|entry| {
            LessonProgress::new(
                self.completed_for_lesson(&ledger, &entry.path),
                entry.exercise_count,
            )
        }))
    }

    /// Wipe all recorded progress.
    pub fn reset_all(&self) {
        if let Ok(conn) = try_lock(&self.pool) {
            conn.execute("DELETE FROM storage WHERE key = ?1", [LEDGER_KEY])
                .log_warn("ledger reset");
        }
    }
}
