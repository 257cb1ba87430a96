//! Filesystem helpers shared by the index, ref, and object writers.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::Result;

/// Replace the file at `path` with `data` using temp-file-then-rename.
///
/// The temporary file is created next to `path` so the final rename stays
/// within one filesystem. Readers see either the old or the new content.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
