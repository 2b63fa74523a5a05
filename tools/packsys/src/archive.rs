/*!
Deterministic release archives.

A release archive is a gzip-compressed GNU-format tar of a package's install
prefix. Two builds of the same tree must produce byte-identical archives, so
every entry is normalised: owner `xyz`/`xyz`, uid/gid 1000, a fixed
modification time, and entries appended in sorted walk order. The gzip
header carries no timestamp.

Extraction is used for staging dependency archives into a devtree. Archives
are extracted in dependency order and later archives may overwrite files
placed by earlier ones; that layering is intentional and left to recipe
authors to keep sensible.
*/

use crate::error::{self, Result};
use crate::{ARCHIVE_ID, ARCHIVE_OWNER, BASE_TIME};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use snafu::ResultExt;
use std::fs::File;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tar::{EntryType, Header};
use walkdir::WalkDir;

fn base_header() -> Header {
    let mut header = Header::new_gnu();
    header.set_uid(ARCHIVE_ID);
    header.set_gid(ARCHIVE_ID);
    header.set_mtime(BASE_TIME);
    header
}

/// Write a deterministic `tar.gz` of the directory `tree` to `output`.
pub fn write_tar_gz(output: &Path, tree: &Path) -> Result<()> {
    let file = File::create(output).context(error::ArchiveWriteSnafu { path: output })?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for entry in WalkDir::new(tree).sort_by_file_name() {
        let entry = entry.context(error::DirectoryWalkSnafu { path: tree })?;
        let path = entry.path();
        let relative = path
            .strip_prefix(tree)
            .expect("walked path is under its root");
        if relative.as_os_str().is_empty() {
            continue;
        }

        let mut header = base_header();
        let file_type = entry.file_type();
        if file_type.is_dir() {
            let metadata = entry
                .metadata()
                .context(error::DirectoryWalkSnafu { path: tree })?;
            header.set_entry_type(EntryType::Directory);
            header.set_mode(metadata.permissions().mode() & 0o7777);
            header.set_size(0);
            set_owner(&mut header, output)?;
            builder
                .append_data(&mut header, relative, std::io::empty())
                .context(error::ArchiveWriteSnafu { path: output })?;
        } else if file_type.is_symlink() {
            let target = path
                .read_link()
                .context(error::FileReadSnafu { path })?;
            header.set_entry_type(EntryType::Symlink);
            header.set_mode(0o777);
            header.set_size(0);
            set_owner(&mut header, output)?;
            builder
                .append_link(&mut header, relative, &target)
                .context(error::ArchiveWriteSnafu { path: output })?;
        } else {
            let metadata = entry
                .metadata()
                .context(error::DirectoryWalkSnafu { path: tree })?;
            let contents = File::open(path).context(error::FileReadSnafu { path })?;
            header.set_entry_type(EntryType::Regular);
            header.set_mode(metadata.permissions().mode() & 0o7777);
            header.set_size(metadata.len());
            set_owner(&mut header, output)?;
            builder
                .append_data(&mut header, relative, contents)
                .context(error::ArchiveWriteSnafu { path: output })?;
        }
    }

    let encoder = builder
        .into_inner()
        .context(error::ArchiveWriteSnafu { path: output })?;
    encoder
        .finish()
        .context(error::ArchiveWriteSnafu { path: output })?;
    Ok(())
}

/// Extract a release archive into `dest`. Gzip is the active compression;
/// bzip2 archives from old releases are still readable.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let mut tar = tar::Archive::new(reader(archive)?);
    tar.unpack(dest)
        .context(error::ArchiveReadSnafu { path: archive })
}

/// Open a release archive for reading, choosing the decompressor from the
/// file name.
pub fn reader(archive: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(archive).context(error::ArchiveReadSnafu { path: archive })?;
    let name = archive.to_string_lossy();
    if name.ends_with(".tar.bz2") {
        Ok(Box::new(bzip2::read::BzDecoder::new(file)))
    } else {
        Ok(Box::new(GzDecoder::new(file)))
    }
}

fn set_owner(header: &mut Header, output: &Path) -> Result<()> {
    header
        .set_username(ARCHIVE_OWNER)
        .context(error::ArchiveWriteSnafu { path: output })?;
    header
        .set_groupname(ARCHIVE_OWNER)
        .context(error::ArchiveWriteSnafu { path: output })?;
    Ok(())
}
