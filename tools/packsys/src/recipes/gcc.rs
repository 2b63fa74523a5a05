use crate::error::Result;
use crate::package::{Ctx, Dep, Recipe};
use crate::recipes::SUPPORTED_TARGETS;
use crate::variant::{Variant, VariantSchema};

pub struct Gcc;

impl Recipe for Gcc {
    fn pkg_name(&self) -> &'static str {
        "gcc"
    }

    fn variants(&self) -> VariantSchema {
        VariantSchema::new([("target", SUPPORTED_TARGETS.to_vec())])
    }

    fn crosstool(&self) -> bool {
        true
    }

    fn deps(&self, variant: &Variant) -> Vec<Dep> {
        // The assembler and linker must be for the same target as the
        // compiler; the arithmetic libraries are plain host libraries.
        vec![
            Dep::Qualified("binutils".to_string(), variant.clone()),
            "gmp".into(),
            "mpfr".into(),
            "mpc".into(),
        ]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.cross_configure(
            &[
                "--disable-lto",
                "--disable-nls",
                "--enable-languages=c",
                "--disable-libssp",
                "--disable-libquadmath",
                "--disable-libgomp",
                "--disable-libgcj",
                "--with-gnu-as",
                "--with-gnu-ld",
                "--with-gmp={devtree_dir_abs}/{host}",
                "--with-mpfr-lib={devtree_dir_abs}/{host}/lib",
                "--with-mpfr-include={devtree_dir_abs}/include",
            ],
            &[],
        )
    }
}
