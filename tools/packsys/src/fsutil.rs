/*!
Small filesystem helpers shared across the engine: directory creation and
removal, file hashing, deterministic tree walks, and a scoped umask guard.
*/

use crate::error::{self, Result};
use log::debug;
use nix::sys::stat::{umask, Mode};
use sha2::{Digest, Sha256};
use snafu::ResultExt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensure that a specific directory exists.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).context(error::DirectoryCreateSnafu { path })
}

/// Remove a directory tree if it exists.
pub fn rmtree<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.symlink_metadata().is_ok() {
        debug!("Removing tree '{}'", path.display());
        std::fs::remove_dir_all(path).context(error::DirectoryRemoveSnafu { path })?;
    }
    Ok(())
}

/// Create an empty file (just like the unix touch command).
pub fn touch<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    File::create(path).context(error::FileCreateSnafu { path })?;
    Ok(())
}

/// The SHA-256 digest of a file's contents, hex encoded.
pub fn sha256_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let mut f = File::open(path).context(error::FileReadSnafu { path })?;
    let mut d = Sha256::new();
    io::copy(&mut f, &mut d).context(error::FileReadSnafu { path })?;
    Ok(hex::encode(d.finalize()))
}

/// Every file under `root`, as paths relative to `root`, in a deterministic
/// order: entries are visited name-sorted, directories before their
/// contents. Symlinks are reported as files, not followed.
pub fn sorted_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("walked path is under its root")
            .to_path_buf();
        files.push(relative);
    }
    Ok(files)
}

/// Scoped process umask. The umask is process-global and inherited by child
/// processes, so it is set for the duration of an install phase and restored
/// when the guard drops, including on unwind.
pub struct Umask {
    previous: Mode,
}

impl Umask {
    pub fn set(mask: u32) -> Self {
        let mode = Mode::from_bits_truncate(mask as nix::libc::mode_t);
        Self {
            previous: umask(mode),
        }
    }
}

impl Drop for Umask {
    fn drop(&mut self) {
        umask(self.previous);
    }
}
