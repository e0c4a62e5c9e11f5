//! Save files.
//!
//! One pretty-printed JSON [`DungeonSnapshot`] per save, named `<name>.json`
//! inside the save directory.

use std::fs;
use std::path::{Path, PathBuf};

use dungeon_model::{DungeonSnapshot, SnapshotError};
use tracing::info;

const EXTENSION: &str = "json";

/// Slot used by `save`/`load` without a name and by autosave.
pub const AUTOSAVE: &str = "autosave";

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("invalid save name '{0}'")]
    InvalidName(String),
    #[error("no save named '{0}'")]
    NotFound(String),
    #[error("save i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// A directory of named saves.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, SaveError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SaveError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, EXTENSION)))
    }

    pub fn save(&self, name: &str, snapshot: &DungeonSnapshot) -> Result<PathBuf, SaveError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|source| SaveError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut snapshot = snapshot.clone();
        snapshot.normalize();
        let json = snapshot.to_json()?;
        fs::write(&path, json).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;

        info!(name, rooms = snapshot.rooms.len(), path = %path.display(), "game saved");
        Ok(path)
    }

    /// Reads a save. Graph consistency is checked when it is restored.
    pub fn load(&self, name: &str) -> Result<DungeonSnapshot, SaveError> {
        let path = self.path_for(name)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SaveError::NotFound(name.to_string()))
            }
            Err(source) => return Err(SaveError::Io { path, source }),
        };
        Ok(DungeonSnapshot::from_json(&json)?)
    }

    /// Save names, sorted.
    pub fn list(&self) -> Result<Vec<String>, SaveError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SaveError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<(), SaveError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SaveError::NotFound(name.to_string()))
            }
            Err(source) => Err(SaveError::Io { path, source }),
        }
    }
}

/// Counts play turns and says when to autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autosave {
    every: u32,
    turns: u32,
}

impl Autosave {
    /// `every == 0` never saves.
    pub fn new(every: u32) -> Self {
        Self { every, turns: 0 }
    }

    /// Counts one turn. True when this turn is due for an autosave.
    pub fn tick(&mut self) -> bool {
        self.turns = self.turns.wrapping_add(1);
        self.every != 0 && self.turns % self.every == 0
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_model::fixtures::two_room_snapshot;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("saves"));
        let snapshot = two_room_snapshot();

        store.save("quick", &snapshot).unwrap();
        let mut expected = snapshot.clone();
        expected.normalize();
        assert_eq!(store.load("quick").unwrap(), expected);
    }

    #[test]
    fn test_list_is_sorted_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        let snapshot = two_room_snapshot();
        store.save("zeta", &snapshot).unwrap();
        store.save("alpha", &snapshot).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("nowhere"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        store.save("one", &two_room_snapshot()).unwrap();
        store.delete("one").unwrap();

        assert!(matches!(store.load("one"), Err(SaveError::NotFound(_))));
        assert!(matches!(store.delete("one"), Err(SaveError::NotFound(_))));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let store = SaveStore::new("saves");
        for name in ["", "../escape", "a/b", "dot.name"] {
            assert!(matches!(
                store.save(name, &two_room_snapshot()),
                Err(SaveError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        let mut snapshot = two_room_snapshot();
        snapshot.format_version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();
        fs::write(dir.path().join("future.json"), json).unwrap();

        assert!(matches!(
            store.load("future"),
            Err(SaveError::Snapshot(SnapshotError::UnsupportedVersion { .. }))
        ));
    }

    #[test]
    fn test_autosave_every_tenth_turn() {
        let mut autosave = Autosave::new(10);
        let due: Vec<u32> = (1..=25).filter(|_| autosave.tick()).collect();
        assert_eq!(due, vec![10, 20]);
        assert_eq!(autosave.turns(), 25);
    }

    #[test]
    fn test_autosave_disabled() {
        let mut autosave = Autosave::new(0);
        assert!((0..50).all(|_| !autosave.tick()));
    }
}
