//! Error types for the pinnotes application.
//!
//! Storage failures and validation failures are kept apart: storage errors mean
//! the mutation did not happen, validation errors mean it was never attempted.

use std::io;

use thiserror::Error;

/// The main error type for the pinnotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persistence backend could not be read at all.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// The persistence backend rejected a write (quota, permissions, disk full).
    #[error("Failed to write '{key}' to storage: {message}")]
    StorageWriteFailed { key: String, message: String },

    /// The stored collection could not be parsed.
    #[error("Stored data is corrupt: {message}")]
    StorageCorrupt { message: String },

    /// Input was rejected before any state changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No note with this id exists.
    #[error("Note not found: {id}")]
    NotFound { id: u64 },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Rejected user input around PIN handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("PIN confirmation does not match")]
    PinMismatch,

    #[error("Note {id} must be a favorite before a PIN can be set")]
    PinRequiresFavorite { id: u64 },

    #[error("A new note needs to be a favorite to be created with a PIN")]
    NewNotePinRequiresFavorite,

    #[error("Incorrect PIN for note {id}")]
    IncorrectPin { id: u64 },

    #[error("Note {id} has no PIN")]
    NoPinSet { id: u64 },

    #[error("Note {id} is locked")]
    NoteLocked { id: u64 },
}
