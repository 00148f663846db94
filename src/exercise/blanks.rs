//! Blank interaction state machine.
//!
//! One [`BlankSession`] owns the transient input state for every blank
//! in one exercise instance (typing mode for fill-in-the-blank and
//! inline-blank exercises). Validation display follows a deliberate UX
//! rule: while the learner is mid-typing something that could still
//! become the correct answer, the blank is not flagged wrong unless the
//! field already lost focus or the exercise was submitted.

use crate::content::blanks::{canonical, Blank};

/// Per-blank, per-session interaction state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlankState {
    pub value: String,
    pub touched: bool,
    pub blurred: bool,
    pub revealed: bool,
}

/// Interaction state for all blanks of one exercise instance.
#[derive(Debug, Clone)]
pub struct BlankSession {
    blanks: Vec<Blank>,
    states: Vec<BlankState>,
    submitted: bool,
}

impl BlankSession {
    pub fn new(blanks: Vec<Blank>) -> Self {
        let states = vec![BlankState::default(); blanks.len()];
        Self {
            blanks,
            states,
            submitted: false,
        }
    }

    pub fn len(&self) -> usize {
        self.blanks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blanks.is_empty()
    }

    pub fn blank(&self, index: usize) -> Option<&Blank> {
        self.blanks.get(index)
    }

    pub fn state(&self, index: usize) -> Option<&BlankState> {
        self.states.get(index)
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// Set the current input value. Marks the blank touched and clears
    /// blurred so an in-progress partial match is not flagged wrong.
    pub fn set_value(&mut self, index: usize, value: &str) {
        if let Some(state) = self.states.get_mut(index) {
            state.value = value.to_string();
            state.touched = true;
            state.blurred = false;
        }
    }

    /// Focus left the field.
    pub fn blur(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            state.blurred = true;
        }
    }

    /// Submit the exercise: validation becomes authoritative for every
    /// blank regardless of blur state.
    pub fn check_all(&mut self) {
        self.submitted = true;
    }

    /// Force-set one blank to its answer (per-blank hint reveal). Does
    /// not submit the exercise.
    pub fn reveal_one(&mut self, index: usize) {
        if index < self.blanks.len() {
            let answer = self.blanks[index].answer.clone();
            let state = &mut self.states[index];
            state.value = answer;
            state.touched = true;
            state.revealed = true;
        }
    }

    /// Show all answers and submit.
    pub fn reveal_all(&mut self) {
        for (blank, state) in self.blanks.iter().zip(self.states.iter_mut()) {
            state.value = blank.answer.clone();
            state.touched = true;
            state.revealed = true;
        }
        self.submitted = true;
    }

    /// Back to a freshly-mounted state.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            *state = BlankState::default();
        }
        self.submitted = false;
    }

    pub fn is_correct(&self, index: usize) -> bool {
        match (self.blanks.get(index), self.states.get(index)) {
            (Some(blank), Some(state)) => canonical(&state.value) == canonical(&blank.answer),
            _ => false,
        }
    }

    /// Option lists only populate the picker; correctness is answer
    /// equality for every blank.
    pub fn all_correct(&self) -> bool {
        (0..self.blanks.len()).all(|i| self.is_correct(i))
    }

    /// Whether the blank should display as wrong right now.
    ///
    /// Pre-submission, wrongness is suppressed while the typed value is
    /// still a strict prefix of the answer and the field has not lost
    /// focus.
    pub fn shows_wrong(&self, index: usize) -> bool {
        let (blank, state) = match (self.blanks.get(index), self.states.get(index)) {
            (Some(b), Some(s)) => (b, s),
            _ => return false,
        };
        if canonical(&state.value) == canonical(&blank.answer) {
            return false;
        }
        self.submitted || state.blurred || !is_strict_prefix(&state.value, &blank.answer)
    }
}

/// True when `value` could still become `answer` by typing more.
fn is_strict_prefix(value: &str, answer: &str) -> bool {
    let value = canonical(value);
    let answer = canonical(answer);
    value != answer && answer.starts_with(&value)
}
