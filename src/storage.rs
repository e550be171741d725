use std::collections::HashSet;

use chrono::{SubsecRound, Utc};
use log::{debug, info, trace, warn};

use crate::{
    note::RawNote, validate_pin, BlobStore, Note, NoteDraft, NotesError, Result,
    DEFAULT_CATEGORY, NOTES_KEY,
};

/// Owns the persisted note collection.
///
/// The whole collection lives in one blob under [`NOTES_KEY`]. Every mutation
/// reads it, changes it in memory and writes it back in full, so a failed write
/// leaves the stored collection exactly as it was.
pub struct NoteStore<B: BlobStore> {
    blobs: B,
}

impl<B: BlobStore> NoteStore<B> {
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn blobs_mut(&mut self) -> &mut B {
        &mut self.blobs
    }

    /// Returns every note, favorites first, then most recently updated first.
    ///
    /// Unreadable or corrupt storage yields an empty list; the next save
    /// overwrites whatever is stored.
    pub fn list_all(&self) -> Vec<Note> {
        let mut notes = match self.load() {
            Ok(notes) => notes,
            Err(e) => {
                warn!("Treating note collection as empty: {}", e);
                Vec::new()
            }
        };

        sort_for_display(&mut notes);
        notes
    }

    /// Returns the stored version of a single note.
    pub fn get(&self, id: u64) -> Option<Note> {
        self.list_all().into_iter().find(|note| note.id == id)
    }

    /// Creates or updates a note and returns what was stored.
    ///
    /// A draft whose id matches a stored note updates it; any other draft
    /// becomes a new note with a fresh id.
    pub fn save(&mut self, draft: NoteDraft) -> Result<Note> {
        if let Some(pin) = &draft.pin {
            validate_pin(pin)?;
        }

        let mut notes = self.load_for_write()?;
        // Stored timestamps carry milliseconds only
        let now = Utc::now().trunc_subsecs(3);

        let existing = draft
            .id
            .and_then(|id| notes.iter().position(|note| note.id == id));

        let saved = match existing {
            Some(index) => {
                let note = &mut notes[index];
                debug!("Updating note {}", note.id);
                note.title = draft.title;
                note.body = draft.body;
                if let Some(category) = draft.category.filter(|c| !c.is_empty()) {
                    note.category = category;
                }
                if let Some(favorite) = draft.favorite {
                    note.favorite = favorite;
                }
                note.pin = draft.pin;
                note.updated = now;
                note.clone()
            }
            None => {
                let id = next_id(&notes);
                debug!("Creating note {}", id);
                let note = Note {
                    id,
                    title: draft.title,
                    body: draft.body,
                    category: draft
                        .category
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                    favorite: draft.favorite.unwrap_or(false),
                    pin: draft.pin,
                    updated: now,
                };
                notes.push(note.clone());
                note
            }
        };

        self.persist(&notes)?;
        info!("Note saved: {}", saved.id);
        Ok(saved)
    }

    /// Removes a note. Deleting an unknown id does nothing.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        let mut notes = self.load_for_write()?;
        let before = notes.len();
        notes.retain(|note| note.id != id);

        if notes.len() == before {
            debug!("Delete of unknown note {} ignored", id);
            return Ok(());
        }

        self.persist(&notes)?;
        info!("Note {} deleted", id);
        Ok(())
    }

    /// Loads the collection for a read-modify-write. Corrupt data is replaced
    /// by the write; a backend that cannot be read at all fails the mutation.
    fn load_for_write(&self) -> Result<Vec<Note>> {
        match self.load() {
            Err(NotesError::StorageCorrupt { message }) => {
                warn!("Discarding corrupt notes, next write replaces them: {}", message);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Reads the collection in storage order.
    fn load(&self) -> Result<Vec<Note>> {
        let Some(blob) = self.blobs.get(NOTES_KEY)? else {
            trace!("No stored notes yet");
            return Ok(Vec::new());
        };

        // A `null` blob is what an empty collection looked like in older data
        let records: Option<Vec<serde_json::Value>> =
            serde_json::from_str(&blob).map_err(|e| NotesError::StorageCorrupt {
                message: e.to_string(),
            })?;

        let mut seen = HashSet::new();
        let mut notes = Vec::new();
        for record in records.unwrap_or_default() {
            let note = match serde_json::from_value::<RawNote>(record) {
                Ok(raw) => raw.into_note(),
                Err(e) => {
                    warn!("Skipping unreadable note record: {}", e);
                    continue;
                }
            };

            match note {
                Some(note) if seen.insert(note.id) => notes.push(note),
                Some(note) => warn!("Skipping duplicate note id {}", note.id),
                None => warn!("Skipping note record without an id"),
            }
        }

        trace!("Loaded {} notes", notes.len());
        Ok(notes)
    }

    fn persist(&mut self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_string(notes)?;
        self.blobs.set(NOTES_KEY, &json)
    }
}

/// Favorites first, then by `updated` descending. Stable, so equal
/// timestamps keep storage order.
pub fn sort_for_display(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.favorite
            .cmp(&a.favorite)
            .then_with(|| b.updated.cmp(&a.updated))
    });
}

/// One past the highest id. If that would overflow, the lowest unused id
/// from 1 upwards is taken instead.
fn next_id(notes: &[Note]) -> u64 {
    let Some(max) = notes.iter().map(|note| note.id).max() else {
        return 1;
    };

    max.checked_add(1).unwrap_or_else(|| {
        warn!("Highest note id is {}, reusing a free lower id", max);
        let taken: HashSet<u64> = notes.iter().map(|note| note.id).collect();
        // There are fewer notes than ids, so a free one always exists
        (1..=u64::MAX)
            .find(|id| !taken.contains(id))
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBlobStore, ValidationError};

    fn store_with(json: &str) -> NoteStore<MemoryBlobStore> {
        let mut blobs = MemoryBlobStore::new();
        blobs.set(NOTES_KEY, json).unwrap();
        NoteStore::new(blobs)
    }

    fn ids(notes: &[Note]) -> Vec<u64> {
        notes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = NoteStore::new(MemoryBlobStore::new());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_save_new_note_applies_defaults() {
        let mut store = NoteStore::new(MemoryBlobStore::new());
        let note = store.save(NoteDraft::new("Groceries", "milk")).unwrap();

        assert_eq!(note.id, 1);
        assert_eq!(note.category, DEFAULT_CATEGORY);
        assert!(!note.favorite);
        assert_eq!(note.pin, None);
        assert_eq!(store.list_all(), vec![note]);
    }

    #[test]
    fn test_ids_are_unique_across_saves_and_deletes() {
        let mut store = NoteStore::new(MemoryBlobStore::new());
        for i in 0..5 {
            store.save(NoteDraft::new(format!("n{}", i), "")).unwrap();
        }
        store.delete(5).unwrap();
        store.delete(2).unwrap();
        store.save(NoteDraft::new("again", "")).unwrap();
        // An unknown id creates a new note instead of reusing the given one
        let stray = store
            .save(NoteDraft {
                id: Some(2),
                ..NoteDraft::new("stray", "")
            })
            .unwrap();
        assert_ne!(stray.id, 2);

        let mut all = ids(&store.list_all());
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_update_touches_only_target() {
        let mut store = store_with(
            r#"[
                {"id": 1, "title": "a", "body": "x", "category": "work", "favorite": false, "pin": null, "updated": "2024-01-01T00:00:00Z"},
                {"id": 2, "title": "b", "body": "y", "category": "home", "favorite": true, "pin": "1111", "updated": "2024-01-02T00:00:00Z"}
            ]"#,
        );
        let other_before = store.get(2).unwrap();

        let mut draft = store.get(1).unwrap().to_draft();
        draft.title = "a2".into();
        draft.category = None;
        let updated = store.save(draft).unwrap();

        assert_eq!(updated.id, 1);
        assert_eq!(updated.title, "a2");
        assert_eq!(updated.category, "work");
        assert!(updated.updated > other_before.updated);
        assert_eq!(store.get(2).unwrap(), other_before);
        assert_eq!(store.list_all().len(), 2);
    }

    #[test]
    fn test_highest_possible_id_does_not_overflow() {
        let mut store = store_with(r#"[{"id": 0}, {"id": 1}, {"id": 18446744073709551615}]"#);

        let note = store.save(NoteDraft::new("new", "")).unwrap();
        assert_eq!(note.id, 2);

        let mut all = ids(&store.list_all());
        all.sort();
        assert_eq!(all, vec![0, 1, 2, u64::MAX]);
    }

    #[test]
    fn test_untouched_records_keep_their_bytes() {
        let legacy = r#"{"id":1,"title":"a","body":"<p>x</p>","category":"work","favorite":false,"pin":null,"updated":"2024-03-01T10:00:00.000Z"}"#;
        let mut store = store_with(&format!("[{}]", legacy));

        store.save(NoteDraft::new("b", "")).unwrap();

        let blob = store.blobs().get(NOTES_KEY).unwrap().unwrap();
        assert!(blob.starts_with(&format!("[{},", legacy)), "{}", blob);
    }

    #[test]
    fn test_favorite_wins_over_recency() {
        let store = store_with(
            r#"[
                {"id": 1, "title": "A", "body": "", "category": "general", "favorite": true, "pin": null, "updated": "2024-01-02T00:00:00Z"},
                {"id": 2, "title": "B", "body": "", "category": "general", "favorite": false, "pin": null, "updated": "2024-01-03T00:00:00Z"}
            ]"#,
        );
        assert_eq!(ids(&store.list_all()), vec![1, 2]);
    }

    #[test]
    fn test_order_within_groups_is_recent_first_and_stable() {
        let store = store_with(
            r#"[
                {"id": 1, "favorite": false, "updated": "2024-01-01T00:00:00Z"},
                {"id": 2, "favorite": true,  "updated": "2024-01-01T00:00:00Z"},
                {"id": 3, "favorite": false, "updated": "2024-01-05T00:00:00Z"},
                {"id": 4, "favorite": true,  "updated": "2024-01-04T00:00:00Z"},
                {"id": 5, "favorite": false, "updated": "2024-01-01T00:00:00Z"}
            ]"#,
        );
        assert_eq!(ids(&store.list_all()), vec![4, 2, 3, 1, 5]);
    }

    #[test]
    fn test_delete_removes_and_ignores_unknown() {
        let mut store = NoteStore::new(MemoryBlobStore::new());
        let a = store.save(NoteDraft::new("a", "")).unwrap();
        let b = store.save(NoteDraft::new("b", "")).unwrap();

        store.delete(a.id).unwrap();
        assert_eq!(ids(&store.list_all()), vec![b.id]);

        let before = store.blobs().get(NOTES_KEY).unwrap();
        store.delete(999).unwrap();
        assert_eq!(store.blobs().get(NOTES_KEY).unwrap(), before);
    }

    #[test]
    fn test_corrupt_blob_reads_empty_and_is_repaired() {
        let mut store = store_with("{not json");
        assert!(store.list_all().is_empty());

        let note = store.save(NoteDraft::new("fresh", "")).unwrap();
        assert_eq!(note.id, 1);
        assert_eq!(store.list_all(), vec![note]);
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let store = store_with(
            r#"[
                {"id": 1, "title": "ok"},
                {"title": "no id"},
                {"id": "seven"},
                {"id": 1, "title": "duplicate"},
                {"id": 2, "title": "also ok"}
            ]"#,
        );
        let notes = store.list_all();
        assert_eq!(notes.len(), 2);
        assert_eq!(store.get(1).unwrap().title, "ok");
    }

    struct UnreadableBlobs;

    impl BlobStore for UnreadableBlobs {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(NotesError::StorageUnavailable {
                message: "disk gone".into(),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            panic!("must not write after a failed read");
        }
    }

    #[test]
    fn test_unreadable_storage_fails_mutations() {
        let mut store = NoteStore::new(UnreadableBlobs);
        assert!(store.list_all().is_empty());
        assert!(matches!(
            store.save(NoteDraft::new("a", "")),
            Err(NotesError::StorageUnavailable { .. })
        ));
        assert!(store.delete(1).is_err());
    }

    #[test]
    fn test_null_blob_is_empty() {
        assert!(store_with("null").list_all().is_empty());
    }

    #[test]
    fn test_invalid_pin_rejected_without_write() {
        let mut store = NoteStore::new(MemoryBlobStore::new());
        let err = store
            .save(NoteDraft::new("a", "").with_pin("12"))
            .unwrap_err();
        assert!(matches!(
            err,
            NotesError::Validation(ValidationError::InvalidPin)
        ));
        assert_eq!(store.blobs().get(NOTES_KEY).unwrap(), None);
    }

    #[test]
    fn test_write_failure_propagates_and_keeps_collection() {
        let mut store = NoteStore::new(MemoryBlobStore::with_capacity_limit(300));
        let kept = store.save(NoteDraft::new("short", "")).unwrap();

        let err = store
            .save(NoteDraft::new("long", "x".repeat(500)))
            .unwrap_err();
        assert!(matches!(err, NotesError::StorageWriteFailed { .. }));
        assert_eq!(store.list_all(), vec![kept]);
    }

    #[test]
    fn test_persisted_layout() {
        let mut store = NoteStore::new(MemoryBlobStore::new());
        store
            .save(NoteDraft::new("t", "<b>b</b>").with_favorite(true).with_pin("0420"))
            .unwrap();

        let blob = store.blobs().get(NOTES_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let record = &value[0];
        assert_eq!(record["id"], 1);
        assert_eq!(record["title"], "t");
        assert_eq!(record["body"], "<b>b</b>");
        assert_eq!(record["category"], DEFAULT_CATEGORY);
        assert_eq!(record["favorite"], true);
        assert_eq!(record["pin"], "0420");
        assert!(record["updated"].as_str().unwrap().contains('T'));
    }
}
