//! Lesson content model and course loading.
//!
//! A course is a directory containing a `course.toml` manifest plus one
//! JSON document per lesson. Lesson documents hold a list of blocks:
//! prose (a rich-text tree) or exercises (typed per-kind configs).
//!
//! Malformed blocks degrade to inline error blocks and malformed lessons
//! are skipped with a warning; a broken widget never takes down the
//! course.

pub mod blanks;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::exercise::ExerciseConfig;

/// A node in a rich-text content tree: either a text leaf or an element
/// with ordered children (emphasis, paragraphs, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element {
        tag: String,
        #[serde(default)]
        children: Vec<Node>,
    },
}

impl Node {
    /// Fold this subtree into plain text, ignoring element structure.
    /// Used for content fingerprints, TTS input, and table detection.
    pub fn fold_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element { children, .. } => {
                for child in children {
                    child.fold_text(out);
                }
            }
        }
    }
}

/// Extract the plain text of a sequence of nodes in document order.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.fold_text(&mut out);
    }
    out
}

/// One block of a lesson document.
#[derive(Debug, Clone)]
pub enum Block {
    Prose(Vec<Node>),
    Exercise(ExerciseConfig),
    /// A block that failed to parse. Rendered as a visible inline error
    /// region so the author sees it; siblings keep working.
    Error { message: String },
}

/// Wire format for a block (strict); loading converts failures into
/// `Block::Error` instead of failing the lesson.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlock {
    Prose { content: Vec<Node> },
    Exercise { exercise: ExerciseConfig },
}

/// A loaded lesson.
#[derive(Debug, Clone)]
pub struct Lesson {
    /// Canonical lesson path, e.g. "/unit1/greetings"
    pub path: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Lesson {
    /// Number of exercises in this lesson. Error blocks do not count:
    /// a malformed exercise is not part of the progress denominator.
    pub fn exercise_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Exercise(_)))
            .count()
    }
}

/// A folder of lessons (one unit of the course).
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub lessons: Vec<Lesson>,
}

/// A fully loaded course.
#[derive(Debug, Clone, Default)]
pub struct Course {
    pub title: String,
    pub folders: Vec<Folder>,
}

impl Course {
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.folders.iter().flat_map(|f| f.lessons.iter())
    }

    pub fn lesson(&self, path: &str) -> Option<&Lesson> {
        self.lessons().find(|l| l.path == path)
    }

    /// Exercise-count manifest for progress aggregation.
    pub fn manifest(&self) -> Vec<crate::progress::LessonManifestEntry> {
        self.lessons()
            .map(|l| crate::progress::LessonManifestEntry {
                path: l.path.clone(),
                exercise_count: l.exercise_count(),
            })
            .collect()
    }

    /// Manifest entries for a single folder.
    pub fn folder_manifest(&self, folder: &Folder) -> Vec<crate::progress::LessonManifestEntry> {
        folder
            .lessons
            .iter()
            .map(|l| crate::progress::LessonManifestEntry {
                path: l.path.clone(),
                exercise_count: l.exercise_count(),
            })
            .collect()
    }
}

/// Error loading a course.
#[derive(Debug)]
pub enum ContentError {
    IoError(String),
    ParseError(String),
    InvalidCourse(String),
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentError::IoError(e) => write!(f, "IO error: {}", e),
            ContentError::ParseError(e) => write!(f, "Parse error: {}", e),
            ContentError::InvalidCourse(e) => write!(f, "Invalid course: {}", e),
        }
    }
}

impl std::error::Error for ContentError {}

/// `course.toml` manifest structure.
#[derive(Debug, Deserialize)]
struct CourseManifest {
    title: String,
    #[serde(default, rename = "folder")]
    folders: Vec<FolderManifest>,
}

#[derive(Debug, Deserialize)]
struct FolderManifest {
    name: String,
    #[serde(default)]
    lessons: Vec<String>,
}

/// Wire format for a lesson document.
#[derive(Debug, Deserialize)]
struct RawLesson {
    title: String,
    #[serde(default)]
    blocks: Vec<serde_json::Value>,
}

/// Load a course from a directory containing `course.toml`.
pub fn load_course(course_dir: &Path) -> Result<Course, ContentError> {
    let manifest_path = course_dir.join("course.toml");
    let manifest_text = fs::read_to_string(&manifest_path)
        .map_err(|e| ContentError::IoError(format!("{}: {}", manifest_path.display(), e)))?;
    let manifest: CourseManifest = toml::from_str(&manifest_text)
        .map_err(|e| ContentError::ParseError(format!("{}: {}", manifest_path.display(), e)))?;

    if manifest.folders.is_empty() {
        return Err(ContentError::InvalidCourse(
            "course.toml declares no folders".to_string(),
        ));
    }

    let mut folders = Vec::new();
    for folder in &manifest.folders {
        let mut lessons = Vec::new();
        for rel in &folder.lessons {
            let file = course_dir.join(rel);
            match load_lesson(&file, rel) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => {
                    tracing::warn!("Skipping lesson {}: {}", rel, e);
                }
            }
        }
        folders.push(Folder {
            name: folder.name.clone(),
            lessons,
        });
    }

    Ok(Course {
        title: manifest.title,
        folders,
    })
}

/// Load a single lesson document. The lesson path is derived from the
/// manifest-relative file path with the `.json` extension dropped.
pub fn load_lesson(file: &Path, relative: &str) -> Result<Lesson, ContentError> {
    let text = fs::read_to_string(file)
        .map_err(|e| ContentError::IoError(format!("{}: {}", file.display(), e)))?;
    let raw: RawLesson = serde_json::from_str(&text)
        .map_err(|e| ContentError::ParseError(format!("{}: {}", file.display(), e)))?;

    let path = lesson_path_from_relative(relative);

    let blocks = raw
        .blocks
        .into_iter()
        .map(|value| match serde_json::from_value::<RawBlock>(value) {
            Ok(RawBlock::Prose { content }) => Block::Prose(content),
            Ok(RawBlock::Exercise { exercise }) => Block::Exercise(exercise),
            Err(e) => {
                tracing::warn!("Malformed block in {}: {}", path, e);
                Block::Error {
                    message: e.to_string(),
                }
            }
        })
        .collect();

    Ok(Lesson {
        path,
        title: raw.title,
        blocks,
    })
}

/// "unit1/greetings.json" -> "/unit1/greetings"
fn lesson_path_from_relative(relative: &str) -> String {
    let trimmed = relative.trim_start_matches('/');
    let without_ext = trimmed.strip_suffix(".json").unwrap_or(trimmed);
    format!("/{}", without_ext)
}
