use std::path::{Path, PathBuf};

use sgit::repo::{Error, OnDisk, Result};

// Discover a repo starting from the given path.
//
// This walks up from `path` until it finds a directory containing `.git`.
// If none of the ancestors qualify, the error describes `path` itself.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OnDisk> {
    let path = path.as_ref();

    for dir in path.ancestors() {
        if dir.join(".git").is_dir() {
            return OnDisk::new(dir);
        }
    }

    OnDisk::new(path)
}

// Convert a command-line path (relative to `cwd`, or absolute) into a
// `/`-separated path relative to the repo's work dir.
pub fn repo_path(repo: &OnDisk, cwd: &Path, arg: &str) -> Result<String> {
    let full: PathBuf = cwd.join(arg);

    let relative = full
        .strip_prefix(repo.work_dir())
        .map_err(|_| Error::NotFound(format!("`{}` is outside the repository", arg)))?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(segments.join("/"))
}
