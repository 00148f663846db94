//! Exercise evaluation endpoints.
//!
//! The client posts the learner's current answer state; the server is
//! authoritative for grading. A correct submission is recorded in the
//! progress ledger before the feedback partial goes back.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::content::blanks::{canonical, parse_blank_content};
use crate::content::Block;
use crate::exercise::transcript::match_transcript;
use crate::exercise::{validators, ExerciseConfig};
use crate::progress;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub lesson_path: String,
    /// Block index within the lesson.
    pub block: usize,
    pub answer: SubmittedAnswer,
}

/// The learner's answer state, shaped per exercise kind.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmittedAnswer {
    Blanks {
        values: Vec<String>,
    },
    Quiz {
        selected: BTreeSet<u32>,
    },
    Ordering {
        sequence: Vec<String>,
    },
    Matching {
        placed: Vec<Option<String>>,
    },
    Grouping {
        placements: Vec<GroupPlacement>,
        bank_empty: bool,
    },
    Labeling {
        placed: Vec<Option<String>>,
    },
    Transcript {
        spoken: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct GroupPlacement {
    pub group: usize,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub lesson_path: String,
    pub block: usize,
}

fn lookup_exercise<'a>(
    state: &'a AppState,
    lesson_path: &str,
    block: usize,
) -> Option<&'a ExerciseConfig> {
    let lesson = state.course.lesson(lesson_path)?;
    match lesson.blocks.get(block)? {
        Block::Exercise(config) => Some(config),
        _ => None,
    }
}

/// Grade a submitted answer against the authored config. `None` means
/// the answer shape does not fit the exercise kind.
fn evaluate(config: &ExerciseConfig, answer: &SubmittedAnswer) -> Option<bool> {
    match (config, answer) {
        (ExerciseConfig::FillBlanks(c), SubmittedAnswer::Blanks { values }) => {
            Some(blanks_correct(&c.text, values))
        }
        (ExerciseConfig::InlineBlanks(c), SubmittedAnswer::Blanks { values }) => {
            Some(blanks_correct(&c.text, values))
        }
        (ExerciseConfig::Quiz(c), SubmittedAnswer::Quiz { selected }) => {
            Some(validators::quiz_correct(c, selected))
        }
        (ExerciseConfig::Ordering(c), SubmittedAnswer::Ordering { sequence }) => {
            Some(validators::ordering_correct(c, sequence))
        }
        (ExerciseConfig::Matching(c), SubmittedAnswer::Matching { placed }) => {
            let placed: Vec<Option<&str>> = placed.iter().map(|p| p.as_deref()).collect();
            Some(validators::matching_correct(c, &placed))
        }
        (
            ExerciseConfig::Grouping(c),
            SubmittedAnswer::Grouping {
                placements,
                bank_empty,
            },
        ) => {
            let placements: Vec<(usize, &str)> = placements
                .iter()
                .map(|p| (p.group, p.text.as_str()))
                .collect();
            Some(validators::grouping_correct(c, &placements, *bank_empty))
        }
        (ExerciseConfig::ImageLabeling(c), SubmittedAnswer::Labeling { placed }) => {
            let placed: Vec<Option<&str>> = placed.iter().map(|p| p.as_deref()).collect();
            Some(validators::labeling_correct(c, &placed))
        }
        (ExerciseConfig::SpeakingChallenge(c), SubmittedAnswer::Transcript { spoken }) => {
            Some(match_transcript(&c.phrase, spoken).passed())
        }
        (ExerciseConfig::AudioPhrase(c), SubmittedAnswer::Transcript { spoken }) => {
            Some(match_transcript(&c.phrase, spoken).passed())
        }
        _ => None,
    }
}

fn blanks_correct(text: &[crate::content::Node], values: &[String]) -> bool {
    let parsed = parse_blank_content(text);
    parsed.blanks.len() == values.len()
        && parsed
            .blanks
            .iter()
            .zip(values.iter())
            .all(|(blank, value)| canonical(value) == canonical(&blank.answer))
}

fn feedback_partial(correct: bool) -> Html<String> {
    let html = if correct {
        "<span class=\"feedback correct\">Richtig!</span>"
    } else {
        "<span class=\"feedback incorrect\">Noch nicht ganz.</span>"
    };
    Html(html.to_string())
}

/// POST /exercise/check
pub async fn check(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Result<Html<String>, StatusCode> {
    let config =
        lookup_exercise(&state, &request.lesson_path, request.block).ok_or(StatusCode::NOT_FOUND)?;
    let correct = evaluate(config, &request.answer).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    if correct {
        let id = progress::exercise_id(
            &request.lesson_path,
            config.kind(),
            &config.content_fingerprint(),
            &state.base_path,
        );
        state.store.mark_complete(&id, &request.lesson_path);
    }
    Ok(feedback_partial(correct))
}

/// Whether an exercise completes without grading: flashcards,
/// checkpointed media, and plain listening. A speed-mode audio phrase
/// is graded by transcript, so it must go through check.
fn is_self_paced(config: &ExerciseConfig) -> bool {
    match config {
        ExerciseConfig::Flashcards(_) | ExerciseConfig::Media(_) => true,
        ExerciseConfig::AudioPhrase(c) => !c.speed_mode,
        _ => false,
    }
}

/// POST /exercise/complete
///
/// Direct completion for self-paced exercises, where the client-side
/// controller decides when the exercise is done. Graded exercises must
/// go through check.
pub async fn complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> Result<Html<String>, StatusCode> {
    let config =
        lookup_exercise(&state, &request.lesson_path, request.block).ok_or(StatusCode::NOT_FOUND)?;
    if !is_self_paced(config) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let id = progress::exercise_id(
        &request.lesson_path,
        config.kind(),
        &config.content_fingerprint(),
        &state.base_path,
    );
    state.store.mark_complete(&id, &request.lesson_path);
    Ok(feedback_partial(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Node;
    use crate::exercise::{FillBlanksConfig, QuizConfig, SpeakingConfig};

    fn quiz(answer: &str) -> ExerciseConfig {
        ExerciseConfig::Quiz(QuizConfig {
            question: "?".to_string(),
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            answer: answer.to_string(),
            multiple: None,
        })
    }

    #[test]
    fn test_evaluate_rejects_kind_mismatch() {
        let config = quiz("1");
        let answer = SubmittedAnswer::Ordering {
            sequence: vec!["a".to_string()],
        };
        assert_eq!(evaluate(&config, &answer), None);
    }

    #[test]
    fn test_evaluate_quiz() {
        let config = quiz("1,3");
        let answer = SubmittedAnswer::Quiz {
            selected: BTreeSet::from([1, 3]),
        };
        assert_eq!(evaluate(&config, &answer), Some(true));
    }

    #[test]
    fn test_evaluate_blanks_requires_all_values() {
        let config = ExerciseConfig::FillBlanks(FillBlanksConfig {
            text: vec![Node::Text("Der [Mann] [geht].".to_string())],
            drag_mode: false,
        });
        let correct = SubmittedAnswer::Blanks {
            values: vec!["mann".to_string(), " GEHT ".to_string()],
        };
        assert_eq!(evaluate(&config, &correct), Some(true));
        let short = SubmittedAnswer::Blanks {
            values: vec!["mann".to_string()],
        };
        assert_eq!(evaluate(&config, &short), Some(false));
    }

    #[test]
    fn test_evaluate_speaking_uses_fuzzy_match() {
        let config = ExerciseConfig::SpeakingChallenge(SpeakingConfig {
            phrase: "Ich gehe nach Hause.".to_string(),
            translation: None,
            language: None,
        });
        let answer = SubmittedAnswer::Transcript {
            spoken: "ich gehe nach hause".to_string(),
        };
        assert_eq!(evaluate(&config, &answer), Some(true));
    }

    #[test]
    fn test_self_paced_excludes_speed_mode_phrases() {
        use crate::exercise::{AudioPhraseConfig, FlashcardsConfig, MediaConfig};
        let listen = ExerciseConfig::AudioPhrase(AudioPhraseConfig {
            phrase: "Guten Morgen".to_string(),
            translation: None,
            speed_mode: false,
            language: None,
        });
        assert!(is_self_paced(&listen));
        let speed = ExerciseConfig::AudioPhrase(AudioPhraseConfig {
            phrase: "Guten Morgen".to_string(),
            translation: None,
            speed_mode: true,
            language: None,
        });
        assert!(!is_self_paced(&speed));
        assert!(is_self_paced(&ExerciseConfig::Flashcards(FlashcardsConfig {
            cards: Vec::new(),
        })));
        assert!(is_self_paced(&ExerciseConfig::Media(MediaConfig {
            source: "clip.mp4".to_string(),
            audio_only: false,
            checkpoints: Vec::new(),
        })));
        assert!(!is_self_paced(&quiz("1")));
    }

    #[test]
    fn test_submitted_answer_deserializes_tagged() {
        let json = r#"{"kind": "quiz", "selected": [1, 3]}"#;
        let answer: SubmittedAnswer = serde_json::from_str(json).unwrap();
        match answer {
            SubmittedAnswer::Quiz { selected } => {
                assert_eq!(selected, BTreeSet::from([1, 3]));
            }
            other => panic!("expected quiz answer, got {:?}", other),
        }
    }
}
