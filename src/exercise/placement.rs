//! Drag/click placement engine.
//!
//! A bank of movable tokens plus target slots, shared by drag-mode
//! fill-in-the-blank, grouping, horizontal ordering, matching and image
//! labeling. Two input modalities drive the same state: pointer
//! drag-and-drop, and click-select-then-click-target.
//!
//! Invariant: placements form a partial injective mapping slot -> token.
//! A token is in exactly one place (the bank xor one slot) and a slot
//! holds at most one token; placing into an occupied slot evicts the
//! occupant back to the bank within the same mutation.

use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Identity of a movable token within one exercise instance. Duplicate
/// text values get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub usize);

/// Identity of a drop/click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub usize);

#[derive(Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub text: String,
}

/// Ephemeral click-mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Token(TokenId),
    Slot(SlotId),
}

#[derive(Debug, Clone)]
pub struct PlacementBoard {
    tokens: Vec<Token>,
    /// Unplaced tokens in display order.
    bank: Vec<TokenId>,
    placements: BTreeMap<SlotId, TokenId>,
    slot_count: usize,
    selected: Option<Selection>,
}

impl PlacementBoard {
    /// Build a board from token texts. The bank order is randomized
    /// once here, never on re-render; only [`reset`](Self::reset)
    /// re-randomizes.
    pub fn new<S: AsRef<str>>(texts: &[S], slot_count: usize) -> Self {
        let tokens: Vec<Token> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Token {
                id: TokenId(i),
                text: t.as_ref().to_string(),
            })
            .collect();
        let mut bank: Vec<TokenId> = tokens.iter().map(|t| t.id).collect();
        bank.shuffle(&mut rand::rng());
        Self {
            tokens,
            bank,
            placements: BTreeMap::new(),
            slot_count,
            selected: None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn bank(&self) -> &[TokenId] {
        &self.bank
    }

    pub fn placements(&self) -> &BTreeMap<SlotId, TokenId> {
        &self.placements
    }

    pub fn selected(&self) -> Option<Selection> {
        self.selected
    }

    pub fn token_text(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id.0).map(|t| t.text.as_str())
    }

    pub fn placed_token(&self, slot: SlotId) -> Option<TokenId> {
        self.placements.get(&slot).copied()
    }

    /// Text placed in each slot, index = slot id.
    pub fn placed_texts(&self) -> Vec<Option<&str>> {
        (0..self.slot_count)
            .map(|i| self.placed_token(SlotId(i)).and_then(|t| self.token_text(t)))
            .collect()
    }

    /// Token texts currently in the bank, in bank order. For ordering
    /// exercises operating on a single sequence this IS the sequence.
    pub fn bank_texts(&self) -> Vec<&str> {
        self.bank
            .iter()
            .filter_map(|id| self.token_text(*id))
            .collect()
    }

    /// Place a token into a slot. Vacates the token's previous slot,
    /// evicts any current occupant back to the bank, and removes the
    /// token from the bank, all within this single mutation.
    pub fn place(&mut self, token: TokenId, slot: SlotId) {
        if token.0 >= self.tokens.len() || slot.0 >= self.slot_count {
            return;
        }
        // Vacate the token's current slot, if any.
        if let Some(current) = self.slot_of(token) {
            if current == slot {
                return;
            }
            self.placements.remove(&current);
        }
        // Evict the occupant of the target slot back to the bank.
        if let Some(evicted) = self.placements.insert(slot, token) {
            self.bank.push(evicted);
        }
        self.bank.retain(|id| *id != token);
    }

    /// Return a token to the bank. Idempotent; a drop outside any
    /// target is the same operation.
    pub fn unplace(&mut self, token: TokenId) {
        if let Some(slot) = self.slot_of(token) {
            self.placements.remove(&slot);
            self.bank.push(token);
        }
    }

    pub fn drop_outside(&mut self, token: TokenId) {
        self.unplace(token);
    }

    fn slot_of(&self, token: TokenId) -> Option<SlotId> {
        self.placements
            .iter()
            .find(|(_, t)| **t == token)
            .map(|(s, _)| *s)
    }

    /// Click-mode: tap a token. Same-item tap toggles the selection
    /// off, another token replaces it, a pending slot selection commits
    /// a placement.
    pub fn tap_token(&mut self, token: TokenId) {
        match self.selected {
            Some(Selection::Token(t)) if t == token => self.selected = None,
            Some(Selection::Slot(slot)) => {
                self.place(token, slot);
                self.selected = None;
            }
            _ => self.selected = Some(Selection::Token(token)),
        }
    }

    /// Click-mode: tap a slot.
    pub fn tap_slot(&mut self, slot: SlotId) {
        match self.selected {
            Some(Selection::Slot(s)) if s == slot => self.selected = None,
            Some(Selection::Token(token)) => {
                self.place(token, slot);
                self.selected = None;
            }
            _ => self.selected = Some(Selection::Slot(slot)),
        }
    }

    /// Reorder the bank sequence (vertical ordering mode).
    pub fn move_between(&mut self, from: usize, to: usize) {
        if from >= self.bank.len() {
            return;
        }
        let token = self.bank.remove(from);
        let to = to.min(self.bank.len());
        self.bank.insert(to, token);
    }

    /// Everything back to the bank with a fresh shuffle.
    pub fn reset(&mut self) {
        self.placements.clear();
        self.selected = None;
        self.bank = self.tokens.iter().map(|t| t.id).collect();
        self.bank.shuffle(&mut rand::rng());
    }

    /// Every token is placed (the bank is empty).
    pub fn bank_is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    /// Check the token/slot invariant; used by tests.
    pub fn invariant_holds(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        for id in &self.bank {
            if !seen.insert(*id) {
                return false;
            }
        }
        for token in self.placements.values() {
            if !seen.insert(*token) {
                return false;
            }
        }
        self.bank.len() + self.placements.len() <= self.tokens.len()
    }
}
