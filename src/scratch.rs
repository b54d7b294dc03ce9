// Per-invocation scratch workspace.
//
// Each run gets its own uniquely named directory under the cache root, so
// concurrent runs never share state. The directory is removed when the
// guard is dropped, whichever way the pipeline exits.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "docshrink-";

/// Owned scratch directory; deleted on drop.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create `cache_root` if needed, then a fresh empty directory inside it.
    pub fn acquire(cache_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(cache_root)?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(cache_root)?;
        log::debug!("scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the directory now, reporting failures that drop would ignore.
    pub fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}
