use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use cloud_core::{Dimensionality, ExportComposite};
use image::ImageFormat;
use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::models::{ExportProgress, ExportSummary};

pub const EXTENSION: &str = "png";

/// Reject destinations without a file name or a `.png` extension.
pub fn validate_destination(path: &Path) -> Result<()> {
    if path.file_stem().is_none() {
        return Err(ExportError::InvalidPath {
            path: path.to_path_buf(),
            reason: "missing file name".into(),
        });
    }
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION));
    if !has_extension {
        return Err(ExportError::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("expected a .{EXTENSION} extension"),
        });
    }
    Ok(())
}

/// `noise.png` -> `noise_slice_007.png` for `z = 7`.
pub fn slice_path(path: &Path, z: u32) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_slice_{z:03}.{}", ext.to_string_lossy()),
        None => format!("{stem}_slice_{z:03}"),
    };
    path.with_file_name(name)
}

/// Every file an export of this shape writes, in order.
pub fn destination_paths(path: &Path, dimensionality: Dimensionality, resolution: u32) -> Vec<PathBuf> {
    match dimensionality {
        Dimensionality::TwoD => vec![path.to_path_buf()],
        Dimensionality::ThreeD => (0..resolution).map(|z| slice_path(path, z)).collect(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| ExportError::InvalidPath {
                path: path.to_path_buf(),
                reason: format!("cannot create {}: {e}", dir.display()),
            })
        }
        _ => Ok(()),
    }
}

// Encode fully in memory first so an encoder error never leaves a file.
fn write_slice(source: &ExportComposite, z: u32, target: &Path) -> Result<()> {
    let mut png = Vec::new();
    source
        .slice_image(z)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExportError::Encode { slice: z, source: e })?;
    fs::write(target, &png).map_err(|e| {
        let _ = fs::remove_file(target);
        ExportError::Io {
            slice: z,
            path: target.to_path_buf(),
            source: e,
        }
    })
}

/// Write `source` as PNG: one file at `path` for 2D, one `_slice_NNN` file
/// per depth layer for 3D. `on_progress` is called after every slice.
///
/// The run stops at the first failure or when `cancel` is set. Slices of a 3D
/// export written before that point stay on disk.
pub fn write_composite(
    source: &ExportComposite,
    path: &Path,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportSummary> {
    validate_destination(path)?;
    ensure_parent(path)?;

    let start = Instant::now();
    let targets = destination_paths(path, source.dimensionality(), source.resolution());
    let total = targets.len() as u32;
    info!(path = %path.display(), slices = total, "export started");

    for (z, target) in targets.iter().enumerate() {
        let z = z as u32;
        if cancel.load(Ordering::Relaxed) {
            info!(slices_written = z, "export cancelled");
            return Err(ExportError::Cancelled { slices_written: z });
        }
        write_slice(source, z, target)?;
        debug!(slice = z, file = %target.display(), "wrote slice");
        on_progress(ExportProgress::new(z + 1, total, start.elapsed()));
    }

    let elapsed = start.elapsed();
    info!(
        path = %path.display(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "export finished"
    );
    Ok(ExportSummary {
        files: targets,
        elapsed,
    })
}
