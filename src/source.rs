//! Where dictionary text comes from.
//!
//! The manager only needs two things from a source: a line reader for an
//! identifier (or a "not found" signal) and a freshness timestamp it can
//! compare against the one recorded at the previous load.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

pub type SourceReader<'a> = Box<dyn BufRead + Send + 'a>;

pub trait DictSource: Send + Sync {
    /// Opens `id` for reading. `Ok(None)` means the source does not exist.
    fn open(&self, id: &str) -> io::Result<Option<SourceReader<'_>>>;

    /// Last modification time of `id`, if it can be determined.
    fn last_modified(&self, id: &str) -> Option<SystemTime>;
}

/// Files resolved against a root directory. Absolute ids are used as-is.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, id: &str) -> PathBuf {
        let path = Path::new(id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl DictSource for FsSource {
    fn open(&self, id: &str) -> io::Result<Option<SourceReader<'_>>> {
        match File::open(self.resolve(id)) {
            Ok(f) => Ok(Some(Box::new(BufReader::with_capacity(512, f)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn last_modified(&self, id: &str) -> Option<SystemTime> {
        fs::metadata(self.resolve(id)).and_then(|m| m.modified()).ok()
    }
}

/// In-memory sources with a logical clock.
///
/// Every `insert` stamps the entry one tick later than the previous one, so
/// freshness comparisons are deterministic regardless of wall-clock
/// resolution.
#[derive(Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<String, (Arc<[u8]>, SystemTime)>>,
    clock: AtomicU64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let source = Self::new();
        for (id, text) in items {
            source.insert(id, text.as_ref());
        }
        source
    }

    /// Stores `text` under `id` and advances its timestamp.
    pub fn insert(&self, id: impl Into<String>, text: &str) {
        let stamp = self.tick();
        self.entries
            .write()
            .insert(id.into(), (Arc::from(text.as_bytes()), stamp));
    }

    /// Advances the timestamp of `id` without changing its text.
    pub fn touch(&self, id: &str) -> bool {
        let stamp = self.tick();
        match self.entries.write().get_mut(id) {
            Some(entry) => {
                entry.1 = stamp;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }

    fn tick(&self) -> SystemTime {
        let n = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(n)
    }
}

impl DictSource for MemorySource {
    fn open(&self, id: &str) -> io::Result<Option<SourceReader<'_>>> {
        let data = self.entries.read().get(id).map(|(data, _)| Arc::clone(data));
        Ok(data.map(|d| Box::new(Cursor::new(d)) as SourceReader<'_>))
    }

    fn last_modified(&self, id: &str) -> Option<SystemTime> {
        self.entries.read().get(id).map(|(_, stamp)| *stamp)
    }
}
