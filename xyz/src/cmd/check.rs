use anyhow::Result;
use packsys::release;
use std::path::Path;

pub(super) fn run() -> Result<()> {
    release::check_releases(Path::new("release"))?;
    Ok(())
}
