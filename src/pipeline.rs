// Document shrinking pipeline.
//
// One run walks a fixed sequence of stages:
//
//   Start -> ScratchReady -> Extracted -> Recompressed -> Repacked
//         -> Committed | Unchanged
//
// Tool failures abort the run with a `ShrinkError`. Image failures never do:
// they are logged and collected in the `BatchReport`. The scratch directory
// is removed on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ShrinkOptions;
use crate::recompress::{self, ImageError, JpegSettings};
use crate::scratch::Scratch;
use crate::size::SizeChange;
use crate::tools::{ToolError, Toolkit};
use crate::walk;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal pipeline error. The original document is untouched unless the
/// variant says otherwise.
#[derive(Debug, thiserror::Error)]
pub enum ShrinkError {
    #[error("{}: {source}", path.display())]
    Target {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scratch directory under {}: {source}", root.display())]
    Scratch {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extract failed: {0}")]
    Extract(#[source] ToolError),
    #[error("scanning extracted files: {0}")]
    Scan(#[source] io::Error),
    #[error("repack failed: {0}")]
    Pack(#[source] ToolError),
    #[error("moving original to trash failed: {0}")]
    Trash(#[source] ToolError),
    /// The original is already in the trash when this happens.
    #[error("replacing {} failed (original is in the trash): {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Progress and results
// ---------------------------------------------------------------------------

/// Narrative progress, in the order the stages run.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    Extracting { target: &'a Path },
    Compressing { images: usize },
    Image { name: &'a str, size: SizeChange },
    ImageFailed { name: &'a str, error: &'a ImageError },
    Repacking,
    Unchanged { size: SizeChange },
    Committed { size: SizeChange },
}

/// A successfully recompressed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Path relative to the document root.
    pub path: PathBuf,
    pub size: SizeChange,
}

/// An image that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Path relative to the document root.
    pub path: PathBuf,
    /// See [`ImageError::kind`].
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of the recompression sweep.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub images: Vec<ImageRecord>,
    pub failures: Vec<ImageFailure>,
}

impl BatchReport {
    /// Combined before/after size over the recompressed images.
    pub fn total(&self) -> SizeChange {
        self.images.iter().fold(SizeChange::new(0, 0), |acc, rec| {
            SizeChange::new(acc.before + rec.size.before, acc.after + rec.size.after)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkStatus {
    /// The original was trashed and replaced by the smaller archive.
    Committed,
    /// The repacked archive was not smaller; nothing was changed.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ShrinkOutcome {
    pub status: ShrinkStatus,
    /// Document size before the run and size of the repacked archive.
    pub size: SizeChange,
    pub report: BatchReport,
}

type Progress<'p> = dyn for<'e> FnMut(ProgressEvent<'e>) + 'p;

// ---------------------------------------------------------------------------
// Recompression sweep
// ---------------------------------------------------------------------------

/// All recognized images under `root`, in lexical walk order.
pub fn collect_images(root: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(walk::walk_files(root)?
        .into_iter()
        .filter(|path| recompress::is_image_path(path))
        .collect())
}

/// Recompress every image under `root`, continuing past failures.
pub fn recompress_tree(
    root: &Path,
    settings: &JpegSettings,
    progress: &mut Progress<'_>,
) -> io::Result<BatchReport> {
    let images = collect_images(root)?;
    progress(ProgressEvent::Compressing {
        images: images.len(),
    });

    let mut report = BatchReport::default();

    #[cfg(not(feature = "parallel"))]
    for path in &images {
        let result = recompress::recompress_image(path, settings);
        record(root, path, result, &mut report, progress);
    }

    // Encoded on the pool, reported in walk order.
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let results: Vec<_> = images
            .par_iter()
            .map(|path| recompress::recompress_image(path, settings))
            .collect();
        for (path, result) in images.iter().zip(results) {
            record(root, path, result, &mut report, progress);
        }
    }

    Ok(report)
}

fn record(
    root: &Path,
    path: &Path,
    result: Result<SizeChange, ImageError>,
    report: &mut BatchReport,
    progress: &mut Progress<'_>,
) {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let name = path
        .file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy();

    match result {
        Ok(size) => {
            progress(ProgressEvent::Image { name: &name, size });
            report.images.push(ImageRecord {
                path: relative,
                size,
            });
        }
        Err(error) => {
            log::warn!("skipping {}: {error}", relative.display());
            progress(ProgressEvent::ImageFailed {
                name: &name,
                error: &error,
            });
            report.failures.push(ImageFailure {
                path: relative,
                kind: error.kind(),
                message: error.to_string(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Shrink the document at `target` in place.
///
/// The original is replaced only when the repacked archive is strictly
/// smaller, and only after `tools` has moved it to the trash.
pub fn shrink(
    target: &Path,
    options: &ShrinkOptions,
    tools: &dyn Toolkit,
    mut progress: impl FnMut(ProgressEvent<'_>),
) -> Result<ShrinkOutcome, ShrinkError> {
    let target_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| ShrinkError::Target { path, source }
    };

    let target = std::path::absolute(target).map_err(target_err(target))?;
    let file_name = target.file_name().ok_or_else(|| ShrinkError::Target {
        path: target.clone(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    let before = fs::metadata(&target).map_err(target_err(&target))?.len();

    let scratch = Scratch::acquire(&options.cache_root).map_err(|source| ShrinkError::Scratch {
        root: options.cache_root.clone(),
        source,
    })?;

    progress(ProgressEvent::Extracting { target: &target });
    tools
        .extract(&target, scratch.path())
        .map_err(ShrinkError::Extract)?;

    let report =
        recompress_tree(scratch.path(), &options.jpeg, &mut progress).map_err(ShrinkError::Scan)?;

    progress(ProgressEvent::Repacking);
    let packed = tools
        .pack(scratch.path(), file_name)
        .map_err(ShrinkError::Pack)?;
    let after = fs::metadata(&packed).map_err(target_err(&packed))?.len();
    let size = SizeChange::new(before, after);
    log::debug!("{}: {before} -> {after} bytes", target.display());

    if !size.shrank() {
        progress(ProgressEvent::Unchanged { size });
        return Ok(ShrinkOutcome {
            status: ShrinkStatus::Unchanged,
            size,
            report,
        });
    }

    commit(&target, &packed, tools)?;
    if let Err(e) = scratch.release() {
        log::warn!("could not remove scratch directory: {e}");
    }

    progress(ProgressEvent::Committed { size });
    Ok(ShrinkOutcome {
        status: ShrinkStatus::Committed,
        size,
        report,
    })
}

fn commit(target: &Path, packed: &Path, tools: &dyn Toolkit) -> Result<(), ShrinkError> {
    tools
        .reversible_delete(target)
        .map_err(ShrinkError::Trash)?;
    move_file(packed, target).map_err(|source| ShrinkError::Replace {
        path: target.to_path_buf(),
        source,
    })
}

/// Rename, falling back to copy + remove (e.g. across filesystems).
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(from, to) {
        log::debug!("rename {} failed ({e}), copying", from.display());
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
