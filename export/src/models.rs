use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Slices written so far and a time estimate for the rest. The estimate
/// assumes every slice costs as much as the average so far.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExportProgress {
    pub completed: u32,
    pub total: u32,
    pub elapsed: Duration,
    pub remaining: Option<Duration>, // None until the first slice lands
}

impl ExportProgress {
    pub fn new(completed: u32, total: u32, elapsed: Duration) -> Self {
        let remaining = (completed > 0).then(|| {
            elapsed
                .mul_f64(total as f64 / completed as f64)
                .saturating_sub(elapsed)
        });
        Self {
            completed,
            total,
            elapsed,
            remaining,
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ExportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exporting slice {}/{} ({:.1}%)",
            self.completed,
            self.total,
            self.fraction() * 100.0
        )?;
        match self.remaining {
            Some(remaining) => write!(f, " - {:.1}s remaining", remaining.as_secs_f64()),
            None => Ok(()),
        }
    }
}

/// What a finished export wrote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Status published to observers of a running export.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportStatus {
    Pending,
    Running(ExportProgress),
    Finished(ExportSummary),
    Failed { message: String },
    Cancelled { slices_written: u32 },
}

impl ExportStatus {
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            ExportStatus::Finished(_) | ExportStatus::Failed { .. } | ExportStatus::Cancelled { .. }
        )
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStatus::Pending => write!(f, "Initializing..."),
            ExportStatus::Running(progress) => write!(f, "{progress}"),
            ExportStatus::Finished(summary) => write!(
                f,
                "Export completed in {:.2} sec.",
                summary.elapsed.as_secs_f64()
            ),
            ExportStatus::Failed { message } => write!(f, "Export failed: {message}"),
            ExportStatus::Cancelled { slices_written } => {
                write!(f, "Export cancelled after {slices_written} slice(s)")
            }
        }
    }
}
