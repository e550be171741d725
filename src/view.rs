//! Derives what the user sees from the stored notes.
//!
//! The functions here are pure: they take the note list produced by
//! [`NoteStore::list_all`](crate::NoteStore::list_all) plus the current filter
//! inputs and session unlock set, and never read storage themselves.
use std::collections::HashSet;

use crate::{strip_markup, Note, ALL_CATEGORIES};

/// Filters `all_notes` by category, then by search text, keeping their order.
///
/// The search is a case-insensitive substring match against the title or the
/// visible text of the body. A blank query matches everything.
pub fn compute_visible(all_notes: &[Note], search_query: &str, category_filter: &str) -> Vec<Note> {
    let query = search_query.trim().to_lowercase();

    all_notes
        .iter()
        .filter(|note| category_filter == ALL_CATEGORIES || note.category == category_filter)
        .filter(|note| query.is_empty() || matches_query(note, &query))
        .cloned()
        .collect()
}

fn matches_query(note: &Note, lowered_query: &str) -> bool {
    note.title.to_lowercase().contains(lowered_query)
        || strip_markup(&note.body)
            .to_lowercase()
            .contains(lowered_query)
}

/// Picks the note to show in detail after the visible list changed.
///
/// Keeps the previous selection when it is still visible, returning the
/// version from `visible_notes` so edits are reflected; otherwise falls back
/// to the first visible note.
pub fn reconcile_active(visible_notes: &[Note], previous_active_id: Option<u64>) -> Option<Note> {
    previous_active_id
        .and_then(|id| visible_notes.iter().find(|note| note.id == id))
        .or_else(|| visible_notes.first())
        .cloned()
}

/// A note is locked when it has a pin that was not entered this session.
pub fn is_locked(note: &Note, unlocked_ids: &UnlockedNotes) -> bool {
    note.has_pin() && !unlocked_ids.contains(note.id)
}

/// Note ids whose PIN gate is bypassed until the session ends. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct UnlockedNotes {
    ids: HashSet<u64>,
}

impl UnlockedNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: u64) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: u64) {
        self.ids.remove(&id);
    }
}

/// Filter inputs and the derived list/selection shown to the user.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub search_query: String,
    pub category_filter: String,
    visible: Vec<Note>,
    active: Option<Note>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            category_filter: ALL_CATEGORIES.to_string(),
            visible: Vec::new(),
            active: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the visible list and active note from a fresh `list_all`.
    pub fn recompute(&mut self, all_notes: &[Note]) {
        self.visible = compute_visible(all_notes, &self.search_query, &self.category_filter);
        self.active = reconcile_active(&self.visible, self.active_note_id());
    }

    /// Like [`recompute`](Self::recompute), but prefers `id` as the active note.
    pub fn recompute_with_active(&mut self, all_notes: &[Note], id: u64) {
        self.visible = compute_visible(all_notes, &self.search_query, &self.category_filter);
        self.active = reconcile_active(&self.visible, Some(id));
    }

    pub fn visible(&self) -> &[Note] {
        &self.visible
    }

    pub fn active(&self) -> Option<&Note> {
        self.active.as_ref()
    }

    pub fn active_note_id(&self) -> Option<u64> {
        self.active.as_ref().map(|note| note.id)
    }
}
