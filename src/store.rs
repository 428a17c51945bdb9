//! Per-user cookie storage.
//!
//! Uploaded cookie files are written to disk verbatim, one file per user,
//! and indexed in memory. The index lives for the process lifetime only;
//! after a restart users re-upload even if their old file is still on disk.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

/// Chat-transport user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread-safe cookie store: user id -> path of that user's cookie file.
pub struct CookieStore {
    dir: PathBuf,
    entries: RwLock<HashMap<UserId, PathBuf>>,
}

/// Shared handle used across handler tasks.
pub type SharedCookieStore = Arc<CookieStore>;

impl CookieStore {
    /// Create a store writing into `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Write the uploaded bytes to `<dir>/<user>.txt` and index the path.
    /// A second upload from the same user replaces the first in place.
    /// The content is stored as-is; nothing validates that it actually is
    /// a cookie file.
    pub async fn save(&self, user: UserId, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(user);
        tokio::fs::write(&path, bytes).await?;
        self.entries.write().insert(user, path.clone());
        info!("Saved cookies for user {} to {}", user, path.display());
        Ok(path)
    }

    /// Path of the user's cookie file, if one was uploaded this run.
    pub fn lookup(&self, user: UserId) -> Option<PathBuf> {
        self.entries.read().get(&user).cloned()
    }

    fn path_for(&self, user: UserId) -> PathBuf {
        self.dir.join(format!("{}.txt", user))
    }
}
