//! Core data structures for the pinnotes application.
//!
//! `Note` is always fully populated. Stored records are decoded through
//! `RawNote`, which tolerates missing fields, and defaults are applied once in
//! `RawNote::into_note`.
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize, Serializer};

use crate::ValidationError;

/// Category given to notes that were saved without one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Category filter value that lets every note through.
pub const ALL_CATEGORIES: &str = "all";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, assigned on creation
    pub id: u64,
    /// Note title
    pub title: String,
    /// Rich text markup
    pub body: String,
    pub category: String,
    pub favorite: bool,
    /// 4-digit PIN gating the note's content
    pub pin: Option<String>,
    /// Last modification time, stored with millisecond precision
    #[serde(serialize_with = "serialize_millis")]
    pub updated: DateTime<Utc>,
}

/// Writes timestamps as `2024-03-01T10:00:00.000Z`, keeping the millisecond
/// field even when it is zero so stored records keep their exact layout.
fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Note {
    /// Returns a draft carrying this note's editable fields.
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            id: Some(self.id),
            title: self.title.clone(),
            body: self.body.clone(),
            category: Some(self.category.clone()),
            favorite: Some(self.favorite),
            pin: self.pin.clone(),
        }
    }

    pub fn has_pin(&self) -> bool {
        self.pin.is_some()
    }
}

/// Input of a save: a new note when `id` is absent or unknown, an update otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub id: Option<u64>,
    pub title: String,
    pub body: String,
    /// Kept from the stored note on update, defaulted on create
    pub category: Option<String>,
    /// Kept from the stored note on update, defaulted on create
    pub favorite: Option<bool>,
    /// Always replaces the stored pin
    pub pin: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }
}

/// A stored record as found on disk, before defaults are applied.
#[derive(Debug, Deserialize)]
pub(crate) struct RawNote {
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    favorite: Option<bool>,
    /// Older data may hold the PIN as a bare number
    #[serde(default)]
    pin: Option<serde_json::Value>,
    #[serde(default)]
    updated: Option<String>,
}

impl RawNote {
    /// Applies defaults. Records without an id cannot be addressed and yield `None`.
    pub(crate) fn into_note(self) -> Option<Note> {
        let id = self.id?;
        let pin = match self.pin {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(pin)) => Some(pin),
            Some(serde_json::Value::Number(pin)) => Some(pin.to_string()),
            Some(other) => {
                warn!("Note {} has a PIN of unexpected type, dropping it: {}", id, other);
                None
            }
        };
        let pin = pin.filter(|p| {
            let valid = validate_pin(p).is_ok();
            if !valid {
                warn!("Note {} has a malformed stored PIN, dropping it", id);
            }
            valid
        });

        let updated = self
            .updated
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_default();

        Some(Note {
            id,
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            favorite: self.favorite.unwrap_or(false),
            pin,
            updated,
        })
    }
}

/// A PIN is exactly four ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), ValidationError> {
    if pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPin)
    }
}
