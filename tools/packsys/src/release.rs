/*!
Release-archive utilities: consistency checking across a release directory,
and listing the packages installed under an unpacked root.

Release archives are allowed to carry the same path when the records agree
(dependency layering produces exactly that); a path that appears in two
archives with different content or metadata is worth a warning, since
extraction order then decides what ends up on disk.
*/

use crate::archive;
use crate::error::{self, Result};
use crate::manifest;
use crate::ARCHIVE_OWNER;
use sha2::{Digest, Sha256};
use snafu::ResultExt;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tar::EntryType;

#[derive(Debug, Clone, Eq, PartialEq)]
struct EntryRecord {
    kind: &'static str,
    detail: String,
    mtime: u64,
    mode: u32,
    uid: u64,
    gid: u64,
    uname: String,
    gname: String,
}

/// Check every archive in `release_dir` for type sanity and duplicate-path
/// consistency, printing a report. Conflicting duplicates are reported but
/// are not an error; the layering may be intentional.
pub fn check_releases(release_dir: &Path) -> Result<()> {
    let mut names = Vec::new();
    let entries =
        std::fs::read_dir(release_dir).context(error::DirectoryReadSnafu { path: release_dir })?;
    for entry in entries {
        let entry = entry.context(error::DirectoryReadSnafu { path: release_dir })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".tar.gz") || name.ends_with(".tar.bz2") {
            names.push(name);
        }
    }
    names.sort();

    let mut all_entries: HashMap<String, EntryRecord> = HashMap::new();
    for name in names {
        println!("{}", name);
        let path = release_dir.join(&name);
        let mut tar = tar::Archive::new(archive::reader(&path)?);
        let entries = tar
            .entries()
            .context(error::ArchiveReadSnafu { path: &path })?;
        for entry in entries {
            let mut entry = entry.context(error::ArchiveReadSnafu { path: &path })?;
            let entry_path = entry
                .path()
                .context(error::ArchiveReadSnafu { path: &path })?
                .to_string_lossy()
                .to_string();

            let header = entry.header();
            let mtime = header
                .mtime()
                .context(error::ArchiveReadSnafu { path: &path })?;
            let mode = header
                .mode()
                .context(error::ArchiveReadSnafu { path: &path })?;
            let uid = header
                .uid()
                .context(error::ArchiveReadSnafu { path: &path })?;
            let gid = header
                .gid()
                .context(error::ArchiveReadSnafu { path: &path })?;
            let uname = header
                .username()
                .ok()
                .flatten()
                .unwrap_or_default()
                .to_string();
            let gname = header
                .groupname()
                .ok()
                .flatten()
                .unwrap_or_default()
                .to_string();

            let (kind, detail) = match header.entry_type() {
                EntryType::Regular => {
                    let mut digest = Sha256::new();
                    io::copy(&mut entry, &mut digest)
                        .context(error::ArchiveReadSnafu { path: &path })?;
                    ("FILE", hex::encode(digest.finalize()))
                }
                EntryType::Directory => ("DIR", String::new()),
                EntryType::Symlink => ("SYMLINK", link_name(&entry, &path)?),
                EntryType::Link => ("LINK", link_name(&entry, &path)?),
                other => {
                    return error::ArchiveEntryTypeSnafu {
                        path: &path,
                        entry: format!("{} ({:?})", entry_path, other),
                    }
                    .fail();
                }
            };

            let record = EntryRecord {
                kind,
                detail,
                mtime,
                mode,
                uid,
                gid,
                uname,
                gname,
            };
            let mut dupe = ' ';
            if let Some(previous) = all_entries.get(&entry_path) {
                dupe = 'X';
                if previous != &record {
                    println!(
                        "{} already extracted! {:?} != {:?}",
                        entry_path, previous, record
                    );
                }
            }
            println!(
                "\t{} - {:10} {} {}",
                dupe, record.kind, entry_path, record.detail
            );
            all_entries.insert(entry_path, record);
        }
    }
    Ok(())
}

fn link_name<R: io::Read>(entry: &tar::Entry<R>, path: &Path) -> Result<String> {
    Ok(entry
        .link_name()
        .context(error::ArchiveReadSnafu { path })?
        .map(|l| l.to_string_lossy().to_string())
        .unwrap_or_default())
}

/// List the package variants installed under `pkg_root`, one per manifest
/// found in its `share/xyz` directory.
pub fn list_packages(pkg_root: &Path) -> Result<()> {
    let manifest_dir = pkg_root.join("share").join(ARCHIVE_OWNER);
    let mut names = Vec::new();
    let entries = std::fs::read_dir(&manifest_dir).context(error::DirectoryReadSnafu {
        path: &manifest_dir,
    })?;
    for entry in entries {
        let entry = entry.context(error::DirectoryReadSnafu {
            path: &manifest_dir,
        })?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();

    for name in names {
        let header = manifest::read_header(&manifest_dir.join(&name))?;
        match header.source_version {
            Some(version) => println!("{} (source {})", header.variant_name, version),
            None => println!("{}", header.variant_name),
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::write_tar_gz;
    use tempfile::TempDir;

    #[test]
    fn consistent_duplicates_pass() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("include")).unwrap();
        std::fs::write(tree.join("include/shared.h"), b"#pragma once\n").unwrap();
        let release_dir = dir.path().join("release");
        std::fs::create_dir_all(&release_dir).unwrap();
        write_tar_gz(&release_dir.join("a-host.tar.gz"), &tree).unwrap();
        write_tar_gz(&release_dir.join("b-host.tar.gz"), &tree).unwrap();

        check_releases(&release_dir).unwrap();
    }

    #[test]
    fn missing_release_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = check_releases(&dir.path().join("release"));
        assert!(matches!(result, Err(crate::Error::DirectoryRead { .. })));
    }
}
