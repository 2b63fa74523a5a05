use crate::error::Result;
use crate::package::{default_install, Ctx, Recipe};
use crate::recipes::SUPPORTED_TARGETS;
use crate::variant::VariantSchema;

pub struct Binutils;

impl Recipe for Binutils {
    fn pkg_name(&self) -> &'static str {
        "binutils"
    }

    fn variants(&self) -> VariantSchema {
        VariantSchema::new([("target", SUPPORTED_TARGETS.to_vec())])
    }

    fn crosstool(&self) -> bool {
        true
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.cross_configure(
            &[
                "--disable-nls",
                "--enable-lto",
                "--enable-ld=yes",
                "--without-zlib",
            ],
            &[],
        )
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        default_install(ctx)?;
        // binutils plonks a lib directory into the executable prefix that
        // nothing downstream wants.
        ctx.rmtree(&["{eprefix_dir}", "lib"])
    }
}
