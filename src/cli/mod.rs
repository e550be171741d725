//! CLI module for the pinnotes application
//!
//! This module handles the command-line interface for interacting with a
//! notebook stored on disk.
mod app;
mod args;

pub use app::App;
pub use args::Cli;
