/*
    FloppyBay
    https://github.com/dbalsom/floppybay

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/save_store.rs

    Host save locations for modified disk images.
    
    Images are never written over the file the host loaded them from. A save
    store keeps modified copies by display name, and a later load of the same
    name picks the saved copy up instead of the pristine original.
*/
use crate::FloppyError;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

pub trait SaveStore {
    /// Return the saved content for `name`, if any.
    fn load(&self, name: &str) -> Option<Vec<u8>>;
    /// Save content for `name`, replacing any previous save.
    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), FloppyError>;
    fn exists(&self, name: &str) -> bool {
        self.load(name).is_some()
    }
}

pub type BoxedSaveStore = Box<dyn SaveStore + Send + Sync>;

/// A save store kept in memory. Useful for hosts that persist saves themselves, and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySaveStore {
    saves: HashMap<String, Vec<u8>>,
    read_only: bool,
}

impl MemorySaveStore {
    pub fn new() -> MemorySaveStore {
        Default::default()
    }

    /// Make every store() fail, as a host with a read-only save location would.
    pub fn with_read_only(mut self, state: bool) -> MemorySaveStore {
        self.read_only = state;
        self
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }
}

impl SaveStore for MemorySaveStore {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        self.saves.get(name).cloned()
    }

    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), FloppyError> {
        if self.read_only {
            return Err(FloppyError::PersistFailed(format!("save store is read only: {}", name)));
        }
        self.saves.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.saves.contains_key(name)
    }
}

/// A save store backed by a host directory. Each image is saved under its display name.
#[derive(Clone, Debug)]
pub struct DirectorySaveStore {
    root: PathBuf,
}

impl DirectorySaveStore {
    pub fn new(root: impl AsRef<Path>) -> DirectorySaveStore {
        DirectorySaveStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Display names come from host paths but must never escape the save directory.
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let file_name = Path::new(name).file_name()?;
        Some(self.root.join(file_name))
    }
}

impl SaveStore for DirectorySaveStore {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(data) => {
                log::debug!("DirectorySaveStore::load(): found save {}", path.display());
                Some(data)
            }
            Err(_) => None,
        }
    }

    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), FloppyError> {
        let path = self
            .path_for(name)
            .ok_or_else(|| FloppyError::PersistFailed(format!("invalid save name: {:?}", name)))?;

        fs::create_dir_all(&self.root).map_err(|e| FloppyError::PersistFailed(e.to_string()))?;
        fs::write(&path, data).map_err(|e| FloppyError::PersistFailed(format!("{}: {}", path.display(), e)))?;
        log::info!("DirectorySaveStore::store(): wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_some_and(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemorySaveStore::new();
        assert!(!store.exists("a.st"));
        store.store("a.st", &[1, 2, 3]).unwrap();
        assert!(store.exists("a.st"));
        assert_eq!(store.load("a.st"), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_read_only_memory_store() {
        let mut store = MemorySaveStore::new().with_read_only(true);
        assert!(matches!(store.store("a.st", &[1]), Err(FloppyError::PersistFailed(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_directory_store() {
        let root = std::env::temp_dir().join(format!("floppybay_save_{}", std::process::id()));
        let mut store = DirectorySaveStore::new(&root);

        store.store("../../escape.st", &[9u8; 16]).unwrap();
        assert!(root.join("escape.st").is_file());
        assert!(store.exists("escape.st"));
        assert_eq!(store.load("escape.st"), Some(vec![9u8; 16]));
        assert_eq!(store.load("missing.st"), None);

        _ = fs::remove_dir_all(&root);
    }
}
