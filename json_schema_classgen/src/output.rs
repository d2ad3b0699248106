//! Filesystem helpers for generated sources and debug artifacts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Create `dir` (and any missing parents) unless it already exists.
///
/// Returns `true` only when this call created the directory. Losing a race
/// against another process that created it first counts as success.
///
/// # Errors
///
/// Returns the underlying I/O error when the directory cannot be created or
/// the path exists but is not a directory.
pub fn ensure_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    if let Some(parent) = dir.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    match fs::create_dir(dir) {
        Ok(()) => {
            tracing::debug!(dir = %dir.display(), "created directory");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Write `contents` to `path` so readers see either the old file or the complete new one.
///
/// The bytes go to a temporary file in the destination directory, which is
/// then renamed over `path`. Missing parent directories are created. A
/// replaced file keeps its permissions; a new one gets the same mode as
/// `fs::write` would give it.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory, temporary file, or
/// final rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir: &Path = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    let mut temp: tempfile::NamedTempFile = new_temp_file(dir)?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Temporary files default to 0600; request 0666 so the umask applies as for a plain create.
#[cfg(unix)]
fn new_temp_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}

/// Persist a serialized document under `dir` for inspection; returns the file path.
///
/// # Errors
///
/// Returns the underlying I/O error if `dir` cannot be created or the file
/// cannot be written.
pub fn write_artifact(dir: &Path, file_name: &str, text: &str) -> io::Result<PathBuf> {
    ensure_dir(dir)?;
    let path: PathBuf = dir.join(file_name);
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}
