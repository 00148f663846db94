//! Per-exercise-type correctness predicates.
//!
//! All functions here are pure: they look at the current
//! placement/selection state plus the authored answer key and return a
//! verdict. Text comparison is case-insensitive and trimmed throughout.

use std::collections::BTreeSet;

use crate::content::blanks::canonical;

use super::{GroupingConfig, ImageLabelingConfig, MatchingConfig, OrderingConfig, QuizConfig};

fn eq_ci(a: &str, b: &str) -> bool {
    canonical(a) == canonical(b)
}

// ==================== Quiz ====================

/// Multi-select is triggered by the explicit flag or by a
/// comma-separated answer key.
pub fn quiz_is_multi_select(config: &QuizConfig) -> bool {
    config.multiple.unwrap_or(false) || config.answer.contains(',')
}

/// Parse a 1-based answer key like "1,3". Malformed segments are
/// dropped.
pub fn parse_answer_indices(answer: &str) -> BTreeSet<u32> {
    answer
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .collect()
}

/// Exact set equality with the answer key: order irrelevant, no partial
/// credit.
pub fn quiz_correct(config: &QuizConfig, selected: &BTreeSet<u32>) -> bool {
    let key = parse_answer_indices(&config.answer);
    !key.is_empty() && *selected == key
}

// ==================== Ordering ====================

/// The current sequence must equal, element-wise, the primary order or
/// any supplied alternative.
pub fn ordering_correct<S: AsRef<str>>(config: &OrderingConfig, current: &[S]) -> bool {
    let matches = |expected: &[String]| {
        expected.len() == current.len()
            && expected
                .iter()
                .zip(current.iter())
                .all(|(e, c)| eq_ci(e, c.as_ref()))
    };
    matches(&config.items) || config.alternatives.iter().any(|alt| matches(alt))
}

// ==================== Matching ====================

/// A target is correct iff the token placed there carries the matching
/// pair key. Checked independently per pair.
pub fn matching_pair_correct(config: &MatchingConfig, slot: usize, placed: &str) -> bool {
    config
        .pairs
        .get(slot)
        .is_some_and(|pair| eq_ci(&pair.right, placed))
}

/// Every target filled and pair-correct.
pub fn matching_correct(config: &MatchingConfig, placed_by_slot: &[Option<&str>]) -> bool {
    placed_by_slot.len() == config.pairs.len()
        && placed_by_slot
            .iter()
            .enumerate()
            .all(|(slot, placed)| placed.is_some_and(|p| matching_pair_correct(config, slot, p)))
}

// ==================== Grouping ====================

/// A token is correctly placed iff its text is an authored member of
/// the group it occupies.
pub fn grouping_placement_correct(config: &GroupingConfig, group: usize, text: &str) -> bool {
    config
        .groups
        .get(group)
        .is_some_and(|g| g.members.iter().any(|m| eq_ci(m, text)))
}

/// Every token placed (none left in the bank) and every placement a
/// member of its group.
pub fn grouping_correct(
    config: &GroupingConfig,
    placements: &[(usize, &str)],
    bank_empty: bool,
) -> bool {
    bank_empty
        && placements
            .iter()
            .all(|(group, text)| grouping_placement_correct(config, *group, text))
}

// ==================== Image labeling ====================

/// Per-slot: the placed word equals the slot's authored label.
pub fn labeling_slot_correct(config: &ImageLabelingConfig, slot: usize, placed: &str) -> bool {
    config
        .slots
        .get(slot)
        .is_some_and(|s| eq_ci(&s.label, placed))
}

/// Every slot filled and correct.
pub fn labeling_correct(config: &ImageLabelingConfig, placed_by_slot: &[Option<&str>]) -> bool {
    placed_by_slot.len() == config.slots.len()
        && placed_by_slot
            .iter()
            .enumerate()
            .all(|(slot, placed)| placed.is_some_and(|p| labeling_slot_correct(config, slot, p)))
}
