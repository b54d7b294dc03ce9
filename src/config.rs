// Run options and input normalization.

use std::path::PathBuf;

use crate::recompress::JpegSettings;

/// Directory created under the user cache dir for scratch workspaces.
pub const CACHE_DIR_NAME: &str = "docshrink";

/// `<user cache dir>/docshrink`, or the system temp dir when there is no
/// cache dir for this user.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
}

/// Options for one [`crate::pipeline::shrink`] run.
#[derive(Debug, Clone)]
pub struct ShrinkOptions {
    /// Parent of the per-run scratch directory.
    pub cache_root: PathBuf,
    /// Encoder settings for recompressed images.
    pub jpeg: JpegSettings,
}

impl Default for ShrinkOptions {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            jpeg: JpegSettings::default(),
        }
    }
}

/// Clean up a path as typed or pasted by a user.
///
/// Surrounding `"` characters are stripped and `\` separators become `/`.
pub fn normalize_input_arg(arg: &str) -> PathBuf {
    PathBuf::from(arg.trim_matches('"').replace('\\', "/"))
}
