use anyhow::Result;
use packsys::release;
use std::path::Path;

pub(super) fn run(pkg_root: &Path) -> Result<()> {
    release::list_packages(pkg_root)?;
    Ok(())
}
