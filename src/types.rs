//! Shared types for the pinnotes application.
//!
//! Holds the crate-wide `Result` alias and the CLI subcommand definitions.
use clap::Subcommand;

use crate::NotesError;

/// A specialized Result type for pinnotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Available subcommands for the pinnotes application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    Add {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: String,

        /// Body of the note, may contain markup
        #[clap(short, long)]
        body: Option<String>,

        /// Category of the note
        #[clap(short, long)]
        category: Option<String>,

        /// Mark the note as a favorite
        #[clap(short, long)]
        favorite: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: u64,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New body for the note
        #[clap(short, long)]
        body: Option<String>,

        /// New category for the note
        #[clap(short, long)]
        category: Option<String>,

        /// PIN of the note, required when it is locked
        #[clap(short, long)]
        pin: Option<String>,
    },

    /// List notes with optional filtering
    List {
        /// Only show notes whose title or body contains this text
        #[clap(short, long)]
        search: Option<String>,

        /// Only show notes of this category ("all" for every category)
        #[clap(short, long, default_value = "all")]
        category: String,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// View a note by ID
    Show {
        /// ID of the note to view
        id: u64,

        /// PIN to unlock a protected note
        #[clap(short, long)]
        pin: Option<String>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: u64,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Toggle the favorite flag of a note
    Favorite {
        /// ID of the note
        id: u64,
    },

    /// PIN protection (set, clear)
    Pin {
        #[clap(subcommand)]
        action: PinAction,
    },

    /// List the categories in use
    Categories,

    /// Show or change the theme preference
    Theme {
        /// "dark", "light" or "toggle"; omit to show the current theme
        value: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum PinAction {
    /// Protect a favorite note with a 4-digit PIN, or change its PIN
    Set {
        id: u64,

        /// The new PIN
        #[clap(value_name = "PIN")]
        new_pin: String,

        /// The new PIN again
        confirm: String,

        /// Current PIN, required when the note already has one
        #[clap(short = 'p', long = "pin", value_name = "CURRENT")]
        current: Option<String>,
    },

    /// Remove the PIN from a note
    Clear {
        id: u64,

        /// Current PIN of the note
        #[clap(short, long)]
        pin: String,
    },
}
