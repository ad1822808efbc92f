//! Subscriber store - chat ids persisted as a JSON array

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{NotifierError, NotifierResult};

#[derive(Debug, Clone)]
pub struct SubscriberStore {
    path: PathBuf,
    chat_ids: Vec<i64>,
}

impl SubscriberStore {
    /// Load subscribers from `path`; a missing file starts an empty list
    pub fn load(path: impl Into<PathBuf>) -> NotifierResult<Self> {
        let path = path.into();
        let chat_ids = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Subscriber file not found, starting empty");
                Vec::new()
            }
            Err(source) => return Err(NotifierError::Store { path, source }),
        };
        Ok(Self { path, chat_ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chat_ids(&self) -> &[i64] {
        &self.chat_ids
    }

    pub fn len(&self) -> usize {
        self.chat_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chat_ids.is_empty()
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.chat_ids.contains(&chat_id)
    }

    /// Returns false if already subscribed
    pub fn add(&mut self, chat_id: i64) -> bool {
        if self.contains(chat_id) {
            return false;
        }
        self.chat_ids.push(chat_id);
        true
    }

    /// Write the list through a temp file so readers never see a partial array
    pub fn save(&self) -> NotifierResult<()> {
        let store_err = |source| NotifierError::Store {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        let staging = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(&self.chat_ids)?;
        std::fs::write(&staging, body).map_err(store_err)?;
        std::fs::rename(&staging, &self.path).map_err(store_err)?;
        debug!(path = %self.path.display(), subscribers = self.chat_ids.len(), "Subscribers saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subs.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_dedupes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("subs.json");

        let mut store = SubscriberStore::load(&path).unwrap();
        assert!(store.add(42));
        assert!(store.add(-100123));
        assert!(!store.add(42));
        store.save().unwrap();

        let reloaded = SubscriberStore::load(&path).unwrap();
        assert_eq!(reloaded.chat_ids(), &[42, -100123]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[42,-100123]");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SubscriberStore::load(&path),
            Err(NotifierError::Json(_))
        ));
    }
}
