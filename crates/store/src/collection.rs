use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{DocumentId, StoreError, StoreResult};

/// A named set of documents of one type, persisted one JSON file per
/// document and indexed in memory.
///
/// All reads are served from the in-memory index; writes go through to disk
/// before the index is updated, so a failed write leaves the collection
/// unchanged. Scans iterate in insertion (id) order.
#[derive(Debug)]
pub struct Collection<T> {
    dir: PathBuf,
    inner: RwLock<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    docs: BTreeMap<DocumentId, T>,
    next_id: u64,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub(crate) fn open(root: &Path, name: &str) -> StoreResult<Self> {
        let dir = root.join(name);
        fs::create_dir_all(&dir).map_err(StoreError::DirCreation)?;

        let mut docs = BTreeMap::new();
        // Skipped (corrupt) documents still reserve their id slot, so id
        // allocation tracks every stem seen, not just the parsed ones.
        let mut highest_seen = 0;
        for entry in fs::read_dir(&dir).map_err(StoreError::DirRead)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(DocumentId::from_file_stem)
            else {
                tracing::warn!("skipping document with unexpected name: {}", path.display());
                continue;
            };
            highest_seen = highest_seen.max(id.value());
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<T>(&contents) {
                    Ok(doc) => {
                        docs.insert(id, doc);
                    }
                    Err(e) => {
                        tracing::warn!("skipping unreadable document {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("skipping unreadable document {}: {}", path.display(), e);
                }
            }
        }

        let next_id = highest_seen + 1;
        Ok(Self {
            dir,
            inner: RwLock::new(Inner { docs, next_id }),
        })
    }

    /// Appends a document and returns its id.
    pub fn insert(&self, doc: T) -> StoreResult<DocumentId> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = DocumentId::new(inner.next_id);
        self.persist(id, &doc)?;
        inner.next_id += 1;
        inner.docs.insert(id, doc);
        Ok(id)
    }

    pub fn get(&self, id: DocumentId) -> StoreResult<Option<T>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.docs.get(&id).cloned())
    }

    /// Applies `mutate` to the document and persists the result.
    ///
    /// Returns `false` when the id is unknown. The in-memory copy is only
    /// replaced after the new contents reach disk.
    pub fn modify(&self, id: DocumentId, mutate: impl FnOnce(&mut T)) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let Some(current) = inner.docs.get(&id) else {
            return Ok(false);
        };
        let mut updated = current.clone();
        mutate(&mut updated);
        self.persist(id, &updated)?;
        inner.docs.insert(id, updated);
        Ok(true)
    }

    /// Deletes a document; returns `false` when the id is unknown.
    pub fn remove(&self, id: DocumentId) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if !inner.docs.contains_key(&id) {
            return Ok(false);
        }
        fs::remove_file(self.dir.join(id.file_name())).map_err(StoreError::FileDelete)?;
        inner.docs.remove(&id);
        Ok(true)
    }

    pub fn len(&self) -> StoreResult<usize> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.docs.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All documents in insertion order.
    pub fn all(&self) -> StoreResult<Vec<(DocumentId, T)>> {
        self.select(|_| true)
    }

    /// Documents matching `pred`, in insertion order.
    pub fn select(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Vec<(DocumentId, T)>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .docs
            .iter()
            .filter(|(_, doc)| pred(doc))
            .map(|(id, doc)| (*id, doc.clone()))
            .collect())
    }

    /// The oldest document matching `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<(DocumentId, T)>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .docs
            .iter()
            .find(|(_, doc)| pred(doc))
            .map(|(id, doc)| (*id, doc.clone())))
    }

    /// The most recently inserted document matching `pred`.
    pub fn find_latest(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<(DocumentId, T)>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .docs
            .iter()
            .rev()
            .find(|(_, doc)| pred(doc))
            .map(|(id, doc)| (*id, doc.clone())))
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> StoreResult<usize> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.docs.values().filter(|doc| pred(doc)).count())
    }

    fn persist(&self, id: DocumentId, doc: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(StoreError::Serialization)?;
        fs::write(self.dir.join(id.file_name()), bytes).map_err(StoreError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Note {
        subject: String,
        flagged: bool,
    }

    fn note(subject: &str) -> Note {
        Note {
            subject: subject.to_owned(),
            flagged: false,
        }
    }

    #[test]
    fn test_insert_allocates_sequential_ids() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        let notes = store.collection::<Note>("notes").expect("collection");

        let a = notes.insert(note("a")).expect("insert");
        let b = notes.insert(note("b")).expect("insert");
        assert_eq!(a.value(), 1);
        assert_eq!(b.value(), 2);
        assert!(a < b);
    }

    #[test]
    fn test_documents_survive_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        {
            let notes = store.collection::<Note>("notes").expect("collection");
            notes.insert(note("persisted")).expect("insert");
        }

        let reopened = store.collection::<Note>("notes").expect("collection");
        let all = reopened.all().expect("all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.subject, "persisted");

        // Allocation continues after the highest id on disk.
        let next = reopened.insert(note("later")).expect("insert");
        assert_eq!(next.value(), 2);
    }

    #[test]
    fn test_unreadable_documents_are_skipped() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        {
            let notes = store.collection::<Note>("notes").expect("collection");
            notes.insert(note("good")).expect("insert");
        }
        std::fs::write(temp.path().join("notes/000000000002.json"), "{ not json")
            .expect("write corrupt file");

        let reopened = store.collection::<Note>("notes").expect("collection");
        assert_eq!(reopened.len().expect("len"), 1);
        // The corrupt file still reserves its id slot.
        let next = reopened.insert(note("after")).expect("insert");
        assert_eq!(next.value(), 3);
    }

    #[test]
    fn test_modify_persists_changes() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        let notes = store.collection::<Note>("notes").expect("collection");
        let id = notes.insert(note("original")).expect("insert");

        let changed = notes.modify(id, |n| n.flagged = true).expect("modify");
        assert!(changed);

        let reopened = store.collection::<Note>("notes").expect("collection");
        let doc = reopened.get(id).expect("get").expect("present");
        assert!(doc.flagged);

        let missing = notes
            .modify(DocumentId::new(99), |n| n.flagged = true)
            .expect("modify");
        assert!(!missing);
    }

    #[test]
    fn test_remove_deletes_file() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        let notes = store.collection::<Note>("notes").expect("collection");
        let id = notes.insert(note("gone")).expect("insert");

        assert!(notes.remove(id).expect("remove"));
        assert!(!notes.remove(id).expect("second remove"));
        assert!(notes.get(id).expect("get").is_none());
        assert!(!temp.path().join("notes").join(id.file_name()).exists());
    }

    #[test]
    fn test_find_and_find_latest_respect_insertion_order() {
        let temp = TempDir::new().expect("temp dir");
        let store = Store::open(temp.path()).expect("open");
        let notes = store.collection::<Note>("notes").expect("collection");
        notes.insert(note("dup")).expect("insert");
        notes.insert(note("other")).expect("insert");
        let last = notes.insert(note("dup")).expect("insert");

        let (first_id, _) = notes
            .find(|n| n.subject == "dup")
            .expect("find")
            .expect("present");
        assert_eq!(first_id.value(), 1);

        let (latest_id, _) = notes
            .find_latest(|n| n.subject == "dup")
            .expect("find_latest")
            .expect("present");
        assert_eq!(latest_id, last);

        assert_eq!(notes.count(|n| n.subject == "dup").expect("count"), 2);
    }
}
