//! Note-taking library with categories, favorites and PIN-protected notes
//!
//! Notes live in a single JSON blob behind a [`BlobStore`]. [`NoteStore`] owns
//! that collection, the functions in `view` derive the visible list and active
//! note from it, and [`Notebook`] ties both to the unlock state of one session.

mod blob;
mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod notebook;
mod storage;
mod theme;
mod types;
mod view;

// Re-export key components
pub use blob::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use notebook::*;
pub use storage::*;
pub use theme::*;
pub use types::*;
pub use view::*;
