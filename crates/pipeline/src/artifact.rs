//! Materializing image payloads as displayable files
//!
//! Each successful payload gets a fresh, uniquely named file. A file joins the
//! retention window only when it is committed for display; only the most
//! recent committed files are kept, the way a page would revoke object URLs it
//! no longer displays.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use sv_core::{Artifact, Payload};
use tracing::{debug, warn};
use ulid::Ulid;

/// Files kept when no retention is configured
pub const DEFAULT_RETAIN: usize = 4;

/// Directory of materialized artifacts with bounded retention
pub struct ArtifactStore {
    /// Where artifacts are written
    dir: PathBuf,

    /// How many artifacts to keep on disk
    retain: usize,

    /// Written artifacts, oldest first
    written: Mutex<VecDeque<PathBuf>>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, retain: usize) -> Self {
        Self {
            dir: dir.into(),
            retain: retain.max(1),
            written: Mutex::new(VecDeque::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` to a new file without registering it
    ///
    /// The file counts toward retention only once it is [`committed`]. An
    /// artifact that is never committed must be [`discard`]ed by the caller.
    ///
    /// [`committed`]: ArtifactStore::commit
    /// [`discard`]: ArtifactStore::discard
    pub async fn write(&self, payload: &Payload) -> io::Result<Artifact> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self
            .dir
            .join(format!("{}.{}", Ulid::new(), payload.extension()));
        tokio::fs::write(&path, &payload.bytes).await?;
        debug!("Wrote {} bytes to {}", payload.len(), path.display());

        Ok(Artifact {
            path,
            content_type: payload.content_type.clone(),
            len: payload.len(),
        })
    }

    /// Register `artifact` as the newest displayed file
    ///
    /// Returns the files that fell out of the retention window. The newest
    /// artifact is never among them.
    pub fn commit(&self, artifact: &Artifact) -> Vec<PathBuf> {
        let mut written = self.written.lock();
        written.push_back(artifact.path.clone());
        let excess = written.len().saturating_sub(self.retain);
        written.drain(..excess).collect()
    }

    /// Delete files that are no longer displayed
    pub async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!("Removed artifact {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove artifact {}: {}", path.display(), e),
            }
        }
    }

    /// Artifacts currently kept, oldest first
    pub fn retained(&self) -> Vec<PathBuf> {
        self.written.lock().iter().cloned().collect()
    }
}
