use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use crate::{BlobStore, NotesError, Result, THEME_KEY};

/// Color scheme preference, persisted as the plain string "dark" or "light".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Reads the stored preference. Missing or unknown values mean light.
    pub fn load(blobs: &impl BlobStore) -> Result<Self> {
        let theme = match blobs.get(THEME_KEY)? {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                debug!("Unknown stored theme '{}', using light", value.trim());
                Theme::Light
            }),
            None => Theme::Light,
        };
        Ok(theme)
    }

    pub fn save(self, blobs: &mut impl BlobStore) -> Result<()> {
        blobs.set(THEME_KEY, self.as_str())?;
        info!("Theme set to {}", self);
        Ok(())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(NotesError::Config {
                message: format!("Unknown theme '{}', expected dark or light", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBlobStore;

    #[test]
    fn test_defaults_to_light() {
        let blobs = MemoryBlobStore::new();
        assert_eq!(Theme::load(&blobs).unwrap(), Theme::Light);
    }

    #[test]
    fn test_round_trip_and_toggle() {
        let mut blobs = MemoryBlobStore::new();
        Theme::Light.toggle().save(&mut blobs).unwrap();
        assert_eq!(blobs.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(Theme::load(&blobs).unwrap(), Theme::Dark);
    }

    #[test]
    fn test_unknown_value_is_light() {
        let mut blobs = MemoryBlobStore::new();
        blobs.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Theme::load(&blobs).unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
    }
}
