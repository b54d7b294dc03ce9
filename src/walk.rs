// Deterministic directory traversal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One entry found under a walked root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute (root-joined) path.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub name: String,
    /// Directory with no entries below it. Non-empty directories are
    /// implied by their contents and not reported.
    pub empty_dir: bool,
}

/// Recursively list `root`, depth-first, children in lexical byte order.
///
/// Fails with `InvalidData` on the first symbolic link below `root`.
/// Extracted archives may carry links that point outside the tree.
pub fn walk_tree(root: &Path) -> io::Result<Vec<Entry>> {
    let mut out = Vec::new();
    walk_dir(root, "", &mut out)?;
    Ok(out)
}

/// Files only, same order as [`walk_tree`].
pub fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(walk_tree(root)?
        .into_iter()
        .filter(|e| !e.empty_dir)
        .map(|e| e.path)
        .collect())
}

fn walk_dir(dir: &Path, prefix: &str, out: &mut Vec<Entry>) -> io::Result<()> {
    let mut children = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    children.sort_by_key(|child| child.file_name());

    for child in children {
        let path = child.path();
        let name = format!("{prefix}{}", child.file_name().to_string_lossy());
        let file_type = child.file_type()?;
        if file_type.is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("symbolic link in extracted tree: {name}"),
            ));
        }
        if file_type.is_dir() {
            let before = out.len();
            walk_dir(&path, &format!("{name}/"), out)?;
            if out.len() == before {
                out.push(Entry {
                    path,
                    name: format!("{name}/"),
                    empty_dir: true,
                });
            }
        } else {
            out.push(Entry {
                path,
                name,
                empty_dir: false,
            });
        }
    }
    Ok(())
}
