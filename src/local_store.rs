use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::constants::THEME_KEY;
use crate::errors::StoreError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    fn parse(txt: &str) -> Option<Self> {
        match txt {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Client-side preferences kept in a small SQLite file.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = LocalStore {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.conn()?;
        conn.prepare(
            "create table if not exists preferences (
            key text not null unique primary key,
            value text not null
            )",
        )?
        .execute([])?;

        Ok(store)
    }

    fn conn(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("select value from preferences where key = ?1")?;
        Ok(stmt.query_row(params![key], |row| row.get(0)).optional()?)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "replace into preferences (key, value)
            values (?1, ?2)",
        )?;
        stmt.execute(params![key, value])?;
        Ok(())
    }

    /// Stored theme. Missing or unreadable values become dark, which is then
    /// written back.
    pub fn theme(&self) -> Result<Theme, StoreError> {
        if let Some(theme) = self.get(THEME_KEY)?.as_deref().and_then(Theme::parse) {
            return Ok(theme);
        }
        self.set(THEME_KEY, Theme::Dark.as_str())?;
        Ok(Theme::Dark)
    }

    pub fn toggle_theme(&self) -> Result<Theme, StoreError> {
        let theme = self.theme()?.toggled();
        self.set(THEME_KEY, theme.as_str())?;
        log::debug!("Theme switched to {}", theme.as_str());
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_defaults_to_dark_and_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.sqlite");
        let store = LocalStore::open(&path).unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        assert_eq!(store.theme().unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

        assert_eq!(store.toggle_theme().unwrap(), Theme::Light);
        // survives reopening the file
        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.theme().unwrap(), Theme::Light);
        assert_eq!(reopened.toggle_theme().unwrap(), Theme::Dark);
    }

    #[test]
    fn garbage_theme_resets_to_dark() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("prefs.sqlite")).unwrap();
        store.set(THEME_KEY, "sepia").unwrap();

        assert_eq!(store.theme().unwrap(), Theme::Dark);
    }
}
