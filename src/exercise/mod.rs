//! Exercise types and per-kind configuration.
//!
//! Exercise attributes arrive as typed structs, validated and converted
//! at the content-ingestion boundary; nothing downstream handles untyped
//! attribute maps. Each config also yields a canonical content
//! fingerprint used to derive its stable identity (see
//! [`crate::progress::exercise_id`]): stable across re-renders and
//! re-shuffles, intentionally sensitive to authored edits.

pub mod blanks;
pub mod media;
pub mod placement;
pub mod speech;
pub mod transcript;
pub mod validators;

use serde::{Deserialize, Serialize};

use crate::content::{blanks::parse_blank_content, plain_text, Node};

/// Kind of exercise. The string form is part of the exercise identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    FillBlanks,
    InlineBlanks,
    Quiz,
    Ordering,
    Matching,
    Grouping,
    ImageLabeling,
    Flashcards,
    SpeakingChallenge,
    AudioPhrase,
    Media,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FillBlanks => "fill_blanks",
            Self::InlineBlanks => "inline_blanks",
            Self::Quiz => "quiz",
            Self::Ordering => "ordering",
            Self::Matching => "matching",
            Self::Grouping => "grouping",
            Self::ImageLabeling => "image_labeling",
            Self::Flashcards => "flashcards",
            Self::SpeakingChallenge => "speaking_challenge",
            Self::AudioPhrase => "audio_phrase",
            Self::Media => "media",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed configuration for one exercise instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseConfig {
    FillBlanks(FillBlanksConfig),
    InlineBlanks(InlineBlanksConfig),
    Quiz(QuizConfig),
    Ordering(OrderingConfig),
    Matching(MatchingConfig),
    Grouping(GroupingConfig),
    ImageLabeling(ImageLabelingConfig),
    Flashcards(FlashcardsConfig),
    SpeakingChallenge(SpeakingConfig),
    AudioPhrase(AudioPhraseConfig),
    Media(MediaConfig),
}

/// Fill-in-the-blank over a rich-text body with bracket syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillBlanksConfig {
    pub text: Vec<Node>,
    /// Drag tokens into blanks instead of typing.
    #[serde(default)]
    pub drag_mode: bool,
}

/// Blanks embedded inline in prose (same parsing engine, no separate
/// option bank rendering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineBlanksConfig {
    pub text: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    pub question: String,
    pub options: Vec<String>,
    /// 1-based correct option indices, comma-separated (e.g. "1,3").
    pub answer: String,
    /// Force multi-select even for a single-index answer key.
    #[serde(default)]
    pub multiple: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Items in the primary correct order.
    pub items: Vec<String>,
    /// Alternative accepted orders.
    #[serde(default)]
    pub alternatives: Vec<Vec<String>>,
    /// Vertical list reordering instead of horizontal slot placement.
    #[serde(default)]
    pub vertical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    pub groups: Vec<Group>,
}

/// A labeled drop target positioned on an image in percent coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSlot {
    pub x_pct: f32,
    pub y_pct: f32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLabelingConfig {
    pub image: String,
    pub slots: Vec<ImageSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardsConfig {
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingConfig {
    /// Target phrase the learner must speak.
    pub phrase: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPhraseConfig {
    pub phrase: String,
    #[serde(default)]
    pub translation: Option<String>,
    /// Speed mode grades a spoken repetition with the fuzzy transcript
    /// matcher instead of just playing the phrase.
    #[serde(default)]
    pub speed_mode: bool,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Playback timestamp in seconds.
    pub time: f64,
    pub exercise: Box<ExerciseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub source: String,
    #[serde(default)]
    pub audio_only: bool,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointConfig>,
}

impl ExerciseConfig {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            Self::FillBlanks(_) => ExerciseKind::FillBlanks,
            Self::InlineBlanks(_) => ExerciseKind::InlineBlanks,
            Self::Quiz(_) => ExerciseKind::Quiz,
            Self::Ordering(_) => ExerciseKind::Ordering,
            Self::Matching(_) => ExerciseKind::Matching,
            Self::Grouping(_) => ExerciseKind::Grouping,
            Self::ImageLabeling(_) => ExerciseKind::ImageLabeling,
            Self::Flashcards(_) => ExerciseKind::Flashcards,
            Self::SpeakingChallenge(_) => ExerciseKind::SpeakingChallenge,
            Self::AudioPhrase(_) => ExerciseKind::AudioPhrase,
            Self::Media(_) => ExerciseKind::Media,
        }
    }

    /// Canonical string derived from the authored answer data. Identity
    /// input only; never rendered.
    pub fn content_fingerprint(&self) -> String {
        match self {
            Self::FillBlanks(c) => blank_fingerprint(&c.text),
            Self::InlineBlanks(c) => blank_fingerprint(&c.text),
            Self::Quiz(c) => c.answer.clone(),
            Self::Ordering(c) => c.items.join("|"),
            Self::Matching(c) => c
                .pairs
                .iter()
                .map(|p| format!("{}={}", p.left, p.right))
                .collect::<Vec<_>>()
                .join(";"),
            Self::Grouping(c) => c
                .groups
                .iter()
                .map(|g| format!("{}:{}", g.name, g.members.join(",")))
                .collect::<Vec<_>>()
                .join(";"),
            Self::ImageLabeling(c) => c
                .slots
                .iter()
                .map(|s| s.label.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            Self::Flashcards(c) => c
                .cards
                .iter()
                .flat_map(|card| [card.front.as_str(), card.back.as_str()])
                .collect::<Vec<_>>()
                .join("|"),
            Self::SpeakingChallenge(c) => c.phrase.clone(),
            Self::AudioPhrase(c) => c.phrase.clone(),
            Self::Media(c) => {
                let times = c
                    .checkpoints
                    .iter()
                    .map(|cp| cp.time.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}@{}", c.source, times)
            }
        }
    }
}

/// Fingerprint for blank-based exercises: the answers in document
/// order. Uses the same parser as rendering so identity and behavior
/// can't drift apart.
fn blank_fingerprint(text: &[Node]) -> String {
    let parsed = parse_blank_content(text);
    if parsed.blanks.is_empty() {
        // No blanks authored; fall back to the prose itself.
        return plain_text(text);
    }
    parsed
        .blanks
        .iter()
        .map(|b| b.answer.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_tagged_deserialize() {
        let json = r#"{
            "kind": "ordering",
            "items": ["A", "B", "C"],
            "alternatives": [["A", "C", "B"]]
        }"#;
        let config: ExerciseConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kind(), ExerciseKind::Ordering);
        match config {
            ExerciseConfig::Ordering(c) => {
                assert_eq!(c.items, vec!["A", "B", "C"]);
                assert_eq!(c.alternatives.len(), 1);
                assert!(!c.vertical);
            }
            other => panic!("expected ordering, got {:?}", other),
        }
    }

    #[test]
    fn test_fingerprint_ignores_non_answer_fields() {
        let a = ExerciseConfig::Quiz(QuizConfig {
            question: "Frage?".to_string(),
            options: vec!["x".to_string(), "y".to_string()],
            answer: "1,3".to_string(),
            multiple: None,
        });
        let b = ExerciseConfig::Quiz(QuizConfig {
            question: "Andere Frage?".to_string(),
            options: vec!["x".to_string(), "y".to_string()],
            answer: "1,3".to_string(),
            multiple: Some(true),
        });
        assert_eq!(a.content_fingerprint(), b.content_fingerprint());
    }

    #[test]
    fn test_blank_fingerprint_is_answer_list() {
        let config = ExerciseConfig::FillBlanks(FillBlanksConfig {
            text: vec![Node::Text("Der [Mann|hint:x] [geht|lief].".to_string())],
            drag_mode: false,
        });
        assert_eq!(config.content_fingerprint(), "Mann|geht");
    }

    #[test]
    fn test_media_checkpoint_nesting() {
        let json = r#"{
            "kind": "media",
            "source": "lektion1.mp4",
            "checkpoints": [
                {"time": 10.0, "exercise": {
                    "kind": "quiz",
                    "question": "Was sagt er?",
                    "options": ["Hallo", "Tschüss"],
                    "answer": "1"
                }}
            ]
        }"#;
        let config: ExerciseConfig = serde_json::from_str(json).unwrap();
        match config {
            ExerciseConfig::Media(c) => {
                assert_eq!(c.checkpoints.len(), 1);
                assert_eq!(c.checkpoints[0].exercise.kind(), ExerciseKind::Quiz);
            }
            other => panic!("expected media, got {:?}", other),
        }
    }
}
