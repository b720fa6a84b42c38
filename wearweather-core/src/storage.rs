//! Key/value persistence shared between the app and its companion display.
//!
//! The shared area is a directory both processes can reach (derived from the
//! group id). When the environment refuses it, [`GroupStore::probe`] silently
//! falls back to a per-process directory, and failing that to memory. Callers
//! see the same API either way; the two processes then just keep independent
//! copies.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

/// Which kind of backend a [`GroupStore`] ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Visible to every process in the group.
    Shared,
    /// Private to this process.
    Isolated,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode or decode stored value: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Raw byte storage keyed by string.
///
/// Writes must replace the whole value atomically: a concurrent reader sees
/// either the old bytes or the new ones.
pub trait Storage: Send + Sync + Debug {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
    fn kind(&self) -> StorageKind;
}

/// One file per key inside a directory.
#[derive(Debug)]
pub struct DirectoryStorage {
    root: PathBuf,
    kind: StorageKind,
}

impl DirectoryStorage {
    /// Open (creating if needed) `root` and verify it accepts writes.
    pub fn open(root: impl Into<PathBuf>, kind: StorageKind) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        // A directory may exist but still be read-only to us (sandboxing).
        let mut probe = NamedTempFile::new_in(&root)?;
        probe.write_all(b"probe")?;
        drop(probe);

        Ok(Self { root, kind })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

impl Storage for DirectoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        // Rename within one directory is atomic, so readers never see a partial file.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn kind(&self) -> StorageKind {
        self.kind
    }
}

/// Process-local storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Isolated
    }
}

/// Candidate locations for [`GroupStore::probe`].
#[derive(Debug, Clone, Default)]
pub struct StoreLocations {
    /// Directory shared by the group; `None` when sharing is disabled.
    pub shared: Option<PathBuf>,
    /// This process's private directory.
    pub local: Option<PathBuf>,
}

/// Best-effort typed JSON store over a [`Storage`] backend.
///
/// Nothing here returns an error: failures are logged at debug level and
/// read as "nothing stored".
#[derive(Debug, Clone)]
pub struct GroupStore {
    backend: Arc<dyn Storage>,
}

impl GroupStore {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self { backend }
    }

    /// A fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Use the shared directory if it is usable, then the local one, then memory.
    pub fn probe(locations: &StoreLocations) -> Self {
        if let Some(shared) = &locations.shared {
            match DirectoryStorage::open(shared, StorageKind::Shared) {
                Ok(storage) => {
                    tracing::debug!("Using shared store at {}", shared.display());
                    return Self::new(Arc::new(storage));
                }
                Err(e) => {
                    tracing::debug!("Shared store at {} unavailable: {}", shared.display(), e);
                }
            }
        }

        Self::local_or_memory(locations.local.as_deref())
    }

    /// Process-private store at `dir`, or memory if `dir` is unusable.
    pub fn local_or_memory(dir: Option<&Path>) -> Self {
        if let Some(local) = dir {
            match DirectoryStorage::open(local, StorageKind::Isolated) {
                Ok(storage) => return Self::new(Arc::new(storage)),
                Err(e) => tracing::debug!("Local store at {} unavailable: {}", local.display(), e),
            }
        }

        tracing::debug!("Falling back to in-memory store");
        Self::in_memory()
    }

    pub fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    pub fn save<T: Serialize>(&self, value: &T, key: &str) {
        if let Err(e) = self.try_save(value, key) {
            tracing::debug!("Failed to save '{}': {}", key, e);
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Failed to load '{}': {}", key, e);
                None
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::debug!("Failed to remove '{}': {}", key, e);
        }
    }

    fn try_save<T: Serialize>(&self, value: &T, key: &str) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.write(key, &bytes)?;
        Ok(())
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.backend.read(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
