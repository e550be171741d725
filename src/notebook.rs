//! Application context tying the store, the view and the session together.
//!
//! Every successful mutation and every filter change re-reads the store and
//! reconciles the active note. A failed mutation returns early and leaves the
//! view exactly as it was.
use std::collections::BTreeSet;

use log::{debug, info, warn};

use crate::{
    is_locked, validate_pin, BlobStore, Note, NoteDraft, NoteStore, NotesError, Result, Theme,
    UnlockedNotes, ValidationError, ViewState,
};

pub struct Notebook<B: BlobStore> {
    store: NoteStore<B>,
    view: ViewState,
    /// Lives exactly as long as this notebook: dropping it ends the session
    unlocked: UnlockedNotes,
}

impl<B: BlobStore> Notebook<B> {
    /// Starts a session over `blobs` with no filters and nothing unlocked.
    pub fn open(blobs: B) -> Self {
        let mut notebook = Self {
            store: NoteStore::new(blobs),
            view: ViewState::new(),
            unlocked: UnlockedNotes::new(),
        };
        notebook.refresh();
        info!(
            "Notebook opened with {} notes",
            notebook.view.visible().len()
        );
        notebook
    }

    pub fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn unlocked(&self) -> &UnlockedNotes {
        &self.unlocked
    }

    /// Visible notes in display order.
    pub fn notes(&self) -> &[Note] {
        self.view.visible()
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.view.active()
    }

    pub fn active_is_locked(&self) -> bool {
        self.view
            .active()
            .is_some_and(|note| is_locked(note, &self.unlocked))
    }

    pub fn is_locked(&self, id: u64) -> Result<bool> {
        let note = self.require(id)?;
        Ok(is_locked(&note, &self.unlocked))
    }

    /// Re-reads the store and reconciles the view.
    pub fn refresh(&mut self) {
        let all = self.store.list_all();
        self.view.recompute(&all);
    }

    fn refresh_with_active(&mut self, id: u64) {
        let all = self.store.list_all();
        self.view.recompute_with_active(&all, id);
    }

    fn require(&self, id: u64) -> Result<Note> {
        self.store.get(id).ok_or(NotesError::NotFound { id })
    }

    fn require_unlocked(&self, id: u64) -> Result<Note> {
        let note = self.require(id)?;
        if is_locked(&note, &self.unlocked) {
            return Err(ValidationError::NoteLocked { id }.into());
        }
        Ok(note)
    }

    /// Creates a note and makes it the active one if it is visible.
    pub fn add(&mut self, mut draft: NoteDraft) -> Result<Note> {
        draft.id = None;
        if draft.pin.is_some() && draft.favorite != Some(true) {
            return Err(ValidationError::NewNotePinRequiresFavorite.into());
        }

        let note = self.store.save(draft)?;
        if note.has_pin() {
            self.unlocked.insert(note.id);
        }
        self.refresh_with_active(note.id);
        Ok(note)
    }

    /// Replaces the text and optionally the category of an unlocked note.
    pub fn edit(
        &mut self,
        id: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
    ) -> Result<Note> {
        let mut draft = self.require_unlocked(id)?.to_draft();
        draft.title = title.into();
        draft.body = body.into();
        if category.is_some() {
            draft.category = category;
        }

        let note = self.store.save(draft)?;
        self.refresh_with_active(note.id);
        Ok(note)
    }

    /// Removes a note; an unknown id is not an error.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.store.delete(id)?;
        self.unlocked.remove(id);
        self.refresh();
        Ok(())
    }

    /// Flips the favorite flag. An existing pin is kept when unfavoriting.
    pub fn toggle_favorite(&mut self, id: u64) -> Result<Note> {
        let current = self.require(id)?;
        if current.favorite && current.has_pin() {
            warn!("Note {} loses favorite status but keeps its PIN", id);
        }

        let mut draft = current.to_draft();
        draft.favorite = Some(!current.favorite);
        let note = self.store.save(draft)?;
        self.refresh();
        Ok(note)
    }

    /// Protects a favorite note with a PIN. The note stays unlocked for the
    /// rest of this session.
    pub fn set_pin(&mut self, id: u64, pin: &str, confirmation: &str) -> Result<Note> {
        validate_pin(pin)?;
        if pin != confirmation {
            return Err(ValidationError::PinMismatch.into());
        }

        let current = self.require_unlocked(id)?;
        if !current.favorite {
            return Err(ValidationError::PinRequiresFavorite { id }.into());
        }

        let mut draft = current.to_draft();
        draft.pin = Some(pin.to_string());
        let note = self.store.save(draft)?;

        self.unlocked.insert(id);
        info!("PIN set on note {}", id);
        self.refresh();
        Ok(note)
    }

    /// Removes the PIN from an unlocked note.
    pub fn clear_pin(&mut self, id: u64) -> Result<Note> {
        let current = self.require(id)?;
        if !current.has_pin() {
            return Err(ValidationError::NoPinSet { id }.into());
        }
        if is_locked(&current, &self.unlocked) {
            return Err(ValidationError::NoteLocked { id }.into());
        }

        let mut draft = current.to_draft();
        draft.pin = None;
        let note = self.store.save(draft)?;

        self.unlocked.remove(id);
        info!("PIN cleared on note {}", id);
        self.refresh();
        Ok(note)
    }

    /// Unlocks a note for this session when `attempt` matches its PIN.
    pub fn unlock(&mut self, id: u64, attempt: &str) -> Result<()> {
        let note = self.require(id)?;
        match note.pin.as_deref() {
            None => {
                debug!("Note {} has no PIN, nothing to unlock", id);
                Ok(())
            }
            Some(pin) if pin == attempt => {
                self.unlocked.insert(id);
                debug!("Note {} unlocked for this session", id);
                Ok(())
            }
            Some(_) => {
                warn!("Incorrect PIN entered for note {}", id);
                Err(ValidationError::IncorrectPin { id }.into())
            }
        }
    }

    /// Locks a note again without ending the session.
    pub fn lock(&mut self, id: u64) {
        self.unlocked.remove(id);
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.view.search_query = query.into();
        self.refresh();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.view.category_filter = category.into();
        self.refresh();
    }

    /// Makes a visible note the active one.
    pub fn select(&mut self, id: u64) -> Result<()> {
        if !self.view.visible().iter().any(|note| note.id == id) {
            return Err(NotesError::NotFound { id });
        }
        self.refresh_with_active(id);
        Ok(())
    }

    /// Distinct categories across all stored notes, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.store
            .list_all()
            .into_iter()
            .map(|note| note.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn theme(&self) -> Result<Theme> {
        Theme::load(self.store.blobs())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        theme.save(self.store.blobs_mut())
    }
}
