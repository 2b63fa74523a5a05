use super::Args;
use anyhow::{Context, Result};
use packsys::variant::Variant;
use packsys::{BuildOptions, Builder};

pub(super) fn run(args: &Args) -> Result<()> {
    let variant = match &args.config {
        Some(assignments) => Variant::parse(assignments)?,
        None => Variant::empty(),
    };
    let opts = BuildOptions {
        reconfigure: args.reconfigure,
        force: args.force || args.force_recursive,
        force_recursive: args.force_recursive,
    };

    // The packaging root is the current directory, like the rest of the
    // on-disk layout this tool manages.
    let mut builder = Builder::new(args.build.clone(), args.host.clone(), args.jobs, "")?;
    for pkg in &args.packages {
        builder
            .build(pkg, &variant, &opts)
            .with_context(|| format!("Failed to build '{}'", pkg))?;
    }
    Ok(())
}
