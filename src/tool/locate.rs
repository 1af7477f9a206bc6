//! Ghostscript binary discovery, run once at startup.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Binary names tried in order when no explicit path is configured.
pub const GS_BINARY_CANDIDATES: &[&str] = &["gs", "gswin64c", "gswin32c"];

/// Find the first candidate present in any of `dirs`.
///
/// Candidates take priority over directories: `gs` anywhere on the path wins
/// over `gswin64c` in an earlier directory.
pub fn find_in_dirs<I>(candidates: &[&str], dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let dirs: Vec<PathBuf> = dirs.into_iter().collect();

    for name in candidates {
        for dir in &dirs {
            for file_name in executable_names(name) {
                let path = dir.join(file_name);
                if is_executable(&path) {
                    return Some(path);
                }
            }
        }
    }

    None
}

/// A regular file that the current platform would run.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<String> {
    vec![format!("{}.exe", name), name.to_string()]
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

/// Resolve the Ghostscript binary.
///
/// An explicit path is used as-is if it is an executable file. Otherwise each entry of
/// [`GS_BINARY_CANDIDATES`] is looked up on `PATH`.
pub fn locate_ghostscript(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return is_executable(path).then(|| path.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    let found = find_in_dirs(GS_BINARY_CANDIDATES, env::split_paths(&path_var));
    if let Some(ref path) = found {
        debug!(path = %path.display(), "Found Ghostscript on PATH");
    }
    found
}
