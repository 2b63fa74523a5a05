/*!
The release manifest.

Every release archive carries a text manifest at `share/xyz/<variant_name>`
inside the install prefix: a short header naming the variant and the source
and engine versions that produced it, then one line per file with its
SHA-256 digest and path relative to the prefix. The manifest is written into
the install tree immediately before the tree is archived, and never lists
itself.
*/

use crate::error::{self, Result};
use crate::fsutil;
use crate::ARCHIVE_OWNER;
use snafu::ResultExt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// The manifest header. `source_version` is absent for group-only packages,
/// which have no source tree of their own. A trailing `*` on a version
/// marks an uncommitted working tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub variant_name: String,
    pub source_version: Option<String>,
    pub engine_version: String,
}

/// Write the manifest for the install tree rooted at `prefix_dir` and
/// return its path. A stale manifest from a previous run is removed before
/// hashing so that rebuilds of an identical tree produce identical
/// manifests.
pub fn write(prefix_dir: &Path, header: &Header) -> Result<PathBuf> {
    let manifest_dir = prefix_dir.join("share").join(ARCHIVE_OWNER);
    let manifest_path = manifest_dir.join(&header.variant_name);
    if manifest_path.is_file() {
        std::fs::remove_file(&manifest_path).context(error::FileRemoveSnafu {
            path: &manifest_path,
        })?;
    }

    let mut text = String::new();
    text.push_str(&header.variant_name);
    text.push('\n');
    if let Some(source_version) = &header.source_version {
        let _ = writeln!(text, "Source Version: {}", source_version);
    }
    let _ = writeln!(text, "XYZ Version: {}", header.engine_version);
    text.push('\n');

    for relative in fsutil::sorted_files(prefix_dir)? {
        let path = prefix_dir.join(&relative);
        // A symlink to a directory walks like a file but has nothing to
        // hash; the files below it are listed through their real paths.
        if path.is_dir() {
            continue;
        }
        let relative = relative
            .to_str()
            .ok_or_else(|| error::NonUnicodePathSnafu { path: &relative }.build())?;
        let _ = writeln!(text, "{} {}", fsutil::sha256_file(&path)?, relative);
    }

    fsutil::ensure_dir(&manifest_dir)?;
    std::fs::write(&manifest_path, text).context(error::FileWriteSnafu {
        path: &manifest_path,
    })?;
    Ok(manifest_path)
}

/// Read back the header of an installed manifest.
pub fn read_header(path: &Path) -> Result<Header> {
    let contents = std::fs::read_to_string(path).context(error::FileReadSnafu { path })?;
    let mut lines = contents.lines();
    let variant_name = lines.next().unwrap_or_default().to_string();
    let mut source_version = None;
    let mut engine_version = String::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some(version) = line.strip_prefix("Source Version: ") {
            source_version = Some(version.to_string());
        } else if let Some(version) = line.strip_prefix("XYZ Version: ") {
            engine_version = version.to_string();
        }
    }
    Ok(Header {
        variant_name,
        source_version,
        engine_version,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn header() -> Header {
        Header {
            variant_name: "demo-x86_64-unknown-linux-gnu".to_string(),
            source_version: Some("0123abcd".to_string()),
            engine_version: "deadbeef*".to_string(),
        }
    }

    #[test]
    fn lists_every_file_with_its_digest() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("noprefix");
        std::fs::create_dir_all(prefix.join("bin")).unwrap();
        std::fs::write(prefix.join("bin/a"), b"abc").unwrap();
        std::fs::write(prefix.join("bin/b"), b"xyz").unwrap();

        let path = write(&prefix, &header()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("demo-x86_64-unknown-linux-gnu"));
        assert_eq!(lines.next(), Some("Source Version: 0123abcd"));
        assert_eq!(lines.next(), Some("XYZ Version: deadbeef*"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(
            lines.next(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad bin/a")
        );
        let b_line = lines.next().unwrap();
        assert!(b_line.ends_with(" bin/b"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn group_only_header_omits_source_version() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("noprefix");
        std::fs::create_dir_all(&prefix).unwrap();
        let path = write(
            &prefix,
            &Header {
                source_version: None,
                ..header()
            },
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("Source Version"));
        assert!(text.contains("XYZ Version: deadbeef*"));
    }

    #[test]
    fn stale_manifest_is_not_hashed() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("noprefix");
        std::fs::create_dir_all(prefix.join("bin")).unwrap();
        std::fs::write(prefix.join("bin/a"), b"abc").unwrap();

        let first = write(&prefix, &header()).unwrap();
        let first_text = std::fs::read_to_string(&first).unwrap();
        let second = write(&prefix, &header()).unwrap();
        let second_text = std::fs::read_to_string(&second).unwrap();
        assert_eq!(first_text, second_text);
        assert!(!second_text.contains("share/xyz"));
    }

    #[test]
    fn header_round_trip() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("noprefix");
        std::fs::create_dir_all(&prefix).unwrap();
        let path = write(&prefix, &header()).unwrap();
        let parsed = read_header(&path).unwrap();
        assert_eq!(parsed, header());
    }
}
