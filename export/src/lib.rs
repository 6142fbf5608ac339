// export writes composites to PNG on a blocking worker and reports progress
// over a watch channel

pub mod error;
pub mod models;
pub mod writer;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cloud_core::ExportComposite;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

pub use error::{ExportError, Result};
pub use models::{ExportProgress, ExportStatus, ExportSummary};
pub use writer::{slice_path, validate_destination, write_composite};

/// Starts exports and refuses a second one to a destination that is still
/// being written. The in-flight set is shared between clones only, so callers
/// that need the overlap check must start every export through one `Exporter`
/// or clones of it.
#[derive(Clone, Default)]
pub struct Exporter {
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

// Releases the destination when the export task ends, however it ends.
struct InFlight {
    set: Arc<Mutex<HashSet<PathBuf>>>,
    key: PathBuf,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, path: &Path) -> bool {
        self.in_flight.lock().contains(&destination_key(path))
    }

    /// Validate `path` and start writing `composite` in the background.
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`ExportError::Busy`] if an export to the same path is still running;
    /// cancel that one first to replace it.
    pub fn start(&self, composite: ExportComposite, path: impl AsRef<Path>) -> Result<ExportHandle> {
        let path = path.as_ref().to_path_buf();
        validate_destination(&path)?;

        let key = destination_key(&path);
        if !self.in_flight.lock().insert(key.clone()) {
            return Err(ExportError::Busy { path });
        }
        let guard = InFlight {
            set: Arc::clone(&self.in_flight),
            key,
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(ExportStatus::Pending);
        let task = {
            let cancel = Arc::clone(&cancel);
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                let _guard = guard;
                let result = write_composite(&composite, &path, &cancel, |progress| {
                    tx.send_replace(ExportStatus::Running(progress));
                });
                let status = match &result {
                    Ok(summary) => ExportStatus::Finished(summary.clone()),
                    Err(ExportError::Cancelled { slices_written }) => ExportStatus::Cancelled {
                        slices_written: *slices_written,
                    },
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "export failed");
                        ExportStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                };
                tx.send_replace(status);
                result
            })
        };

        Ok(ExportHandle {
            path,
            cancel,
            status: rx,
            task,
        })
    }
}

fn destination_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// A running export.
pub struct ExportHandle {
    path: PathBuf,
    cancel: Arc<AtomicBool>,
    status: watch::Receiver<ExportStatus>,
    task: JoinHandle<Result<ExportSummary>>,
}

impl ExportHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest published status.
    pub fn status(&self) -> ExportStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status.clone()
    }

    /// Ask the worker to stop before its next slice. Slices already written
    /// stay on disk.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub async fn wait(self) -> Result<ExportSummary> {
        self.task.await?
    }
}
