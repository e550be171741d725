//! Command handlers for the pinnotes binary.
use std::io::{stdin, stdout, Write};

use log::info;

use crate::{
    is_locked, preview, BlobStore, Commands, Config, Note, NoteDraft, Notebook, NotesError,
    PinAction, Result, Theme,
};

/// CLI Application handler - processes CLI commands against a notebook
pub struct App<B: BlobStore> {
    /// The notebook for this invocation; its session ends with the process
    notebook: Notebook<B>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl<B: BlobStore> App<B> {
    /// Create a new CLI application over the given blob store and config
    pub fn new(blobs: B, config: Config, verbose: bool) -> Self {
        Self {
            notebook: Notebook::open(blobs),
            config,
            verbose,
        }
    }

    pub fn notebook(&self) -> &Notebook<B> {
        &self.notebook
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add {
                title,
                body,
                category,
                favorite,
            } => self.handle_add(title, body, category, favorite)?,

            Commands::Edit {
                id,
                title,
                body,
                category,
                pin,
            } => self.handle_edit(id, title, body, category, pin)?,

            Commands::List {
                search,
                category,
                json,
            } => self.handle_list(search, category, json)?,

            Commands::Show { id, pin } => self.handle_show(id, pin)?,

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Favorite { id } => {
                let note = self.notebook.toggle_favorite(id)?;
                if note.favorite {
                    println!("Note {} marked as favorite", note.id);
                } else {
                    println!("Note {} is no longer a favorite", note.id);
                    if note.has_pin() {
                        println!("Its PIN is kept; use `pin clear` to remove it.");
                    }
                }
            }

            Commands::Pin { action } => self.handle_pin(action)?,

            Commands::Categories => {
                for category in self.notebook.categories() {
                    println!("{}", category);
                }
            }

            Commands::Theme { value } => self.handle_theme(value)?,

            Commands::Config => {
                println!("{}", serde_json::to_string_pretty(&self.config)?);
            }
        }

        Ok(())
    }

    fn handle_add(
        &mut self,
        title: String,
        body: Option<String>,
        category: Option<String>,
        favorite: bool,
    ) -> Result<()> {
        let mut draft = NoteDraft::new(title, body.unwrap_or_default()).with_favorite(favorite);
        draft.category = category;

        let note = self.notebook.add(draft)?;
        println!("Note created with ID: {}", note.id);
        Ok(())
    }

    fn handle_edit(
        &mut self,
        id: u64,
        title: Option<String>,
        body: Option<String>,
        category: Option<String>,
        pin: Option<String>,
    ) -> Result<()> {
        if title.is_none() && body.is_none() && category.is_none() {
            return Err(NotesError::Config {
                message: "Nothing to change: pass --title, --body or --category".to_string(),
            });
        }

        if let Some(pin) = pin {
            self.notebook.unlock(id, &pin)?;
        }

        let current = self
            .notebook
            .store()
            .get(id)
            .ok_or(NotesError::NotFound { id })?;
        let note = self.notebook.edit(
            id,
            title.unwrap_or(current.title),
            body.unwrap_or(current.body),
            category,
        )?;

        println!("Note {} updated successfully", note.id);
        Ok(())
    }

    fn handle_list(&mut self, search: Option<String>, category: String, json: bool) -> Result<()> {
        self.notebook.set_category(category);
        self.notebook.set_search(search.unwrap_or_default());

        let notes = self.notebook.notes().to_vec();
        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        if json {
            self.display_notes_json(&notes)?;
        } else {
            self.display_notes_text(&notes);
            println!(
                "\nFound {} note{}",
                notes.len(),
                if notes.len() == 1 { "" } else { "s" }
            );
        }

        Ok(())
    }

    /// Locked notes are listed without their body or PIN
    fn display_notes_json(&self, notes: &[Note]) -> Result<()> {
        let unlocked = self.notebook.unlocked();
        let values: Vec<serde_json::Value> = notes
            .iter()
            .map(|note| {
                let locked = is_locked(note, unlocked);
                let body = (!locked).then_some(&note.body);
                serde_json::json!({
                    "id": note.id,
                    "title": note.title,
                    "body": body,
                    "category": note.category,
                    "favorite": note.favorite,
                    "locked": locked,
                    "updated": note.updated.to_rfc3339(),
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&values)?);
        Ok(())
    }

    fn display_notes_text(&self, notes: &[Note]) {
        // Use terminal width for formatting if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let unlocked = self.notebook.unlocked();

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let marker = if note.favorite { "★ " } else { "" };
            println!(
                "ID: {} | {} | Updated: {}",
                note.id,
                console::style(&note.category).cyan(),
                note.updated.format("%Y-%m-%d %H:%M")
            );
            println!("{}{}", marker, console::style(&note.title).bold());

            if is_locked(note, unlocked) {
                println!("{}", console::style("[locked]").yellow());
            } else {
                let text = preview(&note.body, self.config.preview_length);
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
        }
    }

    fn handle_show(&mut self, id: u64, pin: Option<String>) -> Result<()> {
        if let Some(pin) = pin {
            self.notebook.unlock(id, &pin)?;
        }
        self.notebook.select(id)?;

        let Some(note) = self.notebook.active_note() else {
            return Err(NotesError::NotFound { id });
        };

        println!("{}", console::style(&note.title).bold());
        println!(
            "Category: {} | Favorite: {} | Updated: {}",
            note.category,
            if note.favorite { "yes" } else { "no" },
            note.updated.format("%Y-%m-%d %H:%M:%S")
        );

        if self.notebook.active_is_locked() {
            println!(
                "\n{}",
                console::style("This note is locked. Pass --pin to view it.").yellow()
            );
        } else {
            println!("\n{}", crate::strip_markup(&note.body).trim());
            if self.verbose {
                println!("\n--- markup ---\n{}", note.body);
            }
        }

        Ok(())
    }

    fn handle_delete(&mut self, id: u64, force: bool) -> Result<()> {
        let Some(note) = self.notebook.store().get(id) else {
            println!("No note with ID {}, nothing deleted.", id);
            return Ok(());
        };

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:       {}", note.id);
            println!("Title:    {}", note.title);
            println!("Category: {}", note.category);

            print!("\nAre you sure you want to delete this note? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.notebook.delete(id)?;
        info!("Deleted note {} from the command line", id);
        println!(
            "Note '{}' ({}) has been permanently deleted.",
            note.title, note.id
        );
        Ok(())
    }

    fn handle_pin(&mut self, action: PinAction) -> Result<()> {
        match action {
            PinAction::Set {
                id,
                new_pin,
                confirm,
                current,
            } => {
                if let Some(current) = current {
                    self.notebook.unlock(id, &current)?;
                }
                self.notebook.set_pin(id, &new_pin, &confirm)?;
                println!("Note {} is now protected by a PIN", id);
            }
            PinAction::Clear { id, pin } => {
                self.notebook.unlock(id, &pin)?;
                self.notebook.clear_pin(id)?;
                println!("PIN removed from note {}", id);
            }
        }
        Ok(())
    }

    fn handle_theme(&mut self, value: Option<String>) -> Result<()> {
        let current = self.notebook.theme()?;
        let next = match value.as_deref() {
            None => {
                println!("{}", current);
                return Ok(());
            }
            Some("toggle") => current.toggle(),
            Some(other) => other.parse::<Theme>()?,
        };

        self.notebook.set_theme(next)?;
        println!("Theme set to {}", next);
        Ok(())
    }
}
