//! Fuzzy transcript matching for speech-driven exercises.
//!
//! Speech recognition output is noisy, so grading is deliberately
//! lenient: both sides are normalized (lowercased, punctuation
//! stripped) and aligned word by word, tolerating one-character typos
//! in longer words and up to two inserted or misheard words. The result
//! is a matched-word ratio; the exercise passes at 85%.

use strsim::levenshtein;

/// Fraction of target words that must be matched.
pub const MATCH_THRESHOLD: f64 = 0.85;

/// How many spoken words to look ahead to recover from an insertion.
const LOOKAHEAD: usize = 2;

/// Words longer than this tolerate an edit distance of 1.
const FUZZY_MIN_LEN: usize = 3;

/// Outcome of aligning a recognized transcript against a target phrase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscriptMatch {
    pub matched: usize,
    pub total: usize,
}

impl TranscriptMatch {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total as f64
    }

    pub fn passed(&self) -> bool {
        self.total > 0 && self.ratio() >= MATCH_THRESHOLD
    }
}

/// Lowercase and strip punctuation, keeping letters, digits and
/// whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Exact match, or edit distance <= 1 for words longer than three
/// characters.
fn words_match(target: &str, spoken: &str) -> bool {
    if target == spoken {
        return true;
    }
    target.chars().count() > FUZZY_MIN_LEN && levenshtein(target, spoken) <= 1
}

/// Align the recognized transcript against the target phrase.
///
/// Walks the target word list once; for each word, up to `LOOKAHEAD`
/// extra spoken words may be skipped to recover from a single inserted
/// or misheard word.
pub fn match_transcript(target: &str, spoken: &str) -> TranscriptMatch {
    let target_norm = normalize(target);
    let spoken_norm = normalize(spoken);
    let target_words: Vec<&str> = target_norm.split_whitespace().collect();
    let spoken_words: Vec<&str> = spoken_norm.split_whitespace().collect();

    let mut matched = 0;
    let mut j = 0;
    for word in &target_words {
        for k in 0..=LOOKAHEAD {
            if j + k >= spoken_words.len() {
                break;
            }
            if words_match(word, spoken_words[j + k]) {
                matched += 1;
                j += k + 1;
                break;
            }
        }
    }

    TranscriptMatch {
        matched,
        total: target_words.len(),
    }
}
