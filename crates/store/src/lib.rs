//! JSON document store for the clinic branch records service.
//!
//! Documents live on disk as one pretty-printed JSON file per document,
//! grouped into named collection directories under a single data root:
//!
//! ```text
//! <data_dir>/
//!   payment_record/
//!     000000000001.json
//!     000000000002.json
//!   followups/
//!     000000000001.json
//! ```
//!
//! Document identifiers are monotonically increasing within a collection, so
//! id order is insertion order; "most recent" queries sort on the id, the
//! same way a Mongo `sort({_id: -1})` leans on object-id recency.
//!
//! A [`Store`] is opened once at process startup and handed to the services
//! that need it. There is no module-level cached handle: ownership of the
//! store's lifecycle sits with the process entry point.

mod collection;

pub use collection::Collection;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid collection name {0:?} (lowercase ascii, digits and '_' only)")]
    InvalidCollectionName(String),
    #[error("failed to create collection directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read collection directory: {0}")]
    DirRead(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to delete document: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("collection lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Identifier of a document within a collection.
///
/// Ids are allocated sequentially starting at 1 and never reused within a
/// process lifetime; comparing ids compares insertion order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// Rebuilds an id from its numeric value, e.g. from an API parameter.
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn file_name(self) -> String {
        format!("{self}.json")
    }

    pub(crate) fn from_file_stem(stem: &str) -> Option<Self> {
        stem.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012}", self.0)
    }
}

/// Handle to a data directory holding document collections.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Opens (creating if necessary) the data directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StoreError::DirCreation)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens a named collection, loading any documents already on disk.
    ///
    /// Unreadable documents are logged and skipped rather than failing the
    /// whole collection.
    pub fn collection<T>(&self, name: &str) -> StoreResult<Collection<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        validate_collection_name(name)?;
        Collection::open(&self.root, name)
    }
}

fn validate_collection_name(name: &str) -> StoreResult<()> {
    let ok = !name.is_empty()
        && name
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_owned()))
    }
}
