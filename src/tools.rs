// Environment capabilities the pipeline delegates to.
//
// - `Toolkit`        — extract / pack / reversible delete
// - `NativeTools`    — in-process ZIP handling via the `zip` crate
// - `ExternalTools`  — `unzip` / `zip` subprocesses
// - `TrashCommand`   — moves a file to the desktop trash (both backends)

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::walk;

/// ODF and EPUB containers require this entry first and uncompressed.
const MIMETYPE_ENTRY: &str = "mimetype";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for toolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}")]
    Status { program: String, status: ExitStatus },
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("no trash command configured")]
    NoTrashCommand,
}

// ---------------------------------------------------------------------------
// Toolkit
// ---------------------------------------------------------------------------

/// Archive and trash operations used by the pipeline.
///
/// Implementations must be synchronous: each call returns once the
/// operation has finished.
pub trait Toolkit {
    /// Unpack every entry of `archive` into `dest`.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ToolError>;

    /// Package the whole tree under `dir` into `dir/output_name`.
    ///
    /// A file already at `dir/output_name` is part of the tree and is
    /// replaced by the archive. Returns the path of the written archive.
    fn pack(&self, dir: &Path, output_name: &OsStr) -> Result<PathBuf, ToolError>;

    /// Move `path` somewhere the user can restore it from.
    fn reversible_delete(&self, path: &Path) -> Result<(), ToolError>;
}

fn run_tool(cmd: &mut Command) -> Result<(), ToolError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("running {cmd:?}");
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(ToolError::Status { program, status })
    }
}

// ---------------------------------------------------------------------------
// Trash
// ---------------------------------------------------------------------------

/// Command line used to move a file to the trash; the path is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashCommand {
    argv: Vec<String>,
}

impl TrashCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace (`"gio trash"`).
    pub fn parse(line: &str) -> Self {
        Self::new(line.split_whitespace())
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn run(&self, path: &Path) -> Result<(), ToolError> {
        let (program, args) = self.argv.split_first().ok_or(ToolError::NoTrashCommand)?;
        run_tool(Command::new(program).args(args).arg(path))
    }
}

impl Default for TrashCommand {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new(["trash"])
        } else {
            Self::new(["gio", "trash"])
        }
    }
}

// ---------------------------------------------------------------------------
// Native backend
// ---------------------------------------------------------------------------

/// In-process backend built on the `zip` crate.
#[derive(Debug, Clone, Default)]
pub struct NativeTools {
    pub trash: TrashCommand,
}

impl NativeTools {
    pub fn new(trash: TrashCommand) -> Self {
        Self { trash }
    }
}

fn entry_options(name: &str) -> SimpleFileOptions {
    let method = if name == MIMETYPE_ENTRY {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default().compression_method(method)
}

impl Toolkit for NativeTools {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ToolError> {
        log::debug!("extracting {} into {}", archive.display(), dest.display());
        let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
        // `extract` refuses entries whose names escape `dest`.
        zip.extract(dest)?;
        Ok(())
    }

    fn pack(&self, dir: &Path, output_name: &OsStr) -> Result<PathBuf, ToolError> {
        let output = dir.join(output_name);

        // Walk before creating the staging file so it is never packed into itself.
        let mut entries = walk::walk_tree(dir)?;
        if let Some(pos) = entries
            .iter()
            .position(|e| e.name == MIMETYPE_ENTRY && !e.empty_dir)
        {
            let mimetype = entries.remove(pos);
            entries.insert(0, mimetype);
        }

        log::debug!("packing {} entries into {}", entries.len(), output.display());
        let staging = tempfile::Builder::new()
            .prefix(".docshrink-pack-")
            .tempfile_in(dir)?;
        let mut writer = ZipWriter::new(BufWriter::new(staging.as_file()));
        for entry in &entries {
            let options = entry_options(&entry.name);
            if entry.empty_dir {
                writer.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            writer.start_file(entry.name.as_str(), options)?;
            let mut src = File::open(&entry.path)?;
            io::copy(&mut src, &mut writer)?;
        }
        writer
            .finish()?
            .into_inner()
            .map_err(|e| e.into_error())?
            .sync_all()?;
        staging.persist(&output).map_err(|e| e.error)?;
        Ok(output)
    }

    fn reversible_delete(&self, path: &Path) -> Result<(), ToolError> {
        self.trash.run(path)
    }
}

// ---------------------------------------------------------------------------
// External backend
// ---------------------------------------------------------------------------

/// Subprocess backend: `unzip <archive> -d <dest>` and `zip <name> -r .`.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub unzip: String,
    pub zip: String,
    pub trash: TrashCommand,
}

impl ExternalTools {
    pub fn new(trash: TrashCommand) -> Self {
        Self {
            trash,
            ..Self::default()
        }
    }
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            unzip: "unzip".to_string(),
            zip: "zip".to_string(),
            trash: TrashCommand::default(),
        }
    }
}

impl Toolkit for ExternalTools {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ToolError> {
        run_tool(
            Command::new(&self.unzip)
                .arg(archive)
                .arg("-d")
                .arg(dest),
        )
    }

    fn pack(&self, dir: &Path, output_name: &OsStr) -> Result<PathBuf, ToolError> {
        // An existing `output_name` is updated in place by `zip`.
        let output = dir.join(output_name);
        run_tool(
            Command::new(&self.zip)
                .arg(output_name)
                .args(["-r", "."])
                .current_dir(dir),
        )?;
        Ok(output)
    }

    fn reversible_delete(&self, path: &Path) -> Result<(), ToolError> {
        self.trash.run(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
