use crate::error::Result;
use crate::package::{default_install, Ctx, Dep, Recipe};
use crate::recipes::SUPPORTED_TARGETS;
use crate::variant::{Variant, VariantSchema};

pub struct Gdb;

impl Recipe for Gdb {
    fn pkg_name(&self) -> &'static str {
        "gdb"
    }

    fn variants(&self) -> VariantSchema {
        VariantSchema::new([("target", SUPPORTED_TARGETS.to_vec())])
    }

    fn crosstool(&self) -> bool {
        true
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["expat".into()]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.cross_configure(&["--disable-nls", "--disable-tui", "--with-python=no"], &[])
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        default_install(ctx)?;
        // Same stray lib directory as binutils; gdb builds from the same
        // top-level tree.
        ctx.rmtree(&["{eprefix_dir}", "lib"])
    }
}
