/*!
Upstream sources are fetched with `git`, invoked as an opaque child process
with the parent's environment so that credentials, ssh configuration and
proxies keep working.
*/

use crate::error::Result;
use crate::process;
use std::path::Path;

/// Clone `repo` into `dest`. Revision pinning is not implemented; the clone
/// is whatever the upstream default branch points at.
pub fn clone(repo: &str, dest: &Path) -> Result<()> {
    let argv = vec![
        "git".to_string(),
        "clone".to_string(),
        repo.to_string(),
        dest.display().to_string(),
    ];
    process::run_inherited(&argv, Path::new("."))
}

/// The commit hash of `dir`'s checked-out HEAD, suffixed with `*` when the
/// working tree has uncommitted changes.
pub fn working_tree_version(dir: &Path) -> Result<String> {
    let head = process::read(
        &[
            "git".to_string(),
            "log".to_string(),
            "-1".to_string(),
            "--pretty=%H".to_string(),
        ],
        dir,
    )?;
    let dirty = process::read(
        &[
            "git".to_string(),
            "status".to_string(),
            "--porcelain".to_string(),
        ],
        dir,
    )?;
    if dirty.is_empty() {
        Ok(head)
    } else {
        Ok(format!("{}*", head))
    }
}
