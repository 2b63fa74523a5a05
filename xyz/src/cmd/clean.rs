use anyhow::Result;
use packsys::fsutil;

pub(super) fn run(clean_release: bool) -> Result<()> {
    for dir in ["install", "devtree", "build"] {
        fsutil::rmtree(dir)?;
    }
    if clean_release {
        fsutil::rmtree("release")?;
    }
    Ok(())
}
