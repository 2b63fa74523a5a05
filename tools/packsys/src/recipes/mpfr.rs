use crate::error::Result;
use crate::package::{Ctx, Dep, Recipe};
use crate::variant::Variant;

pub struct Mpfr;

impl Recipe for Mpfr {
    fn pkg_name(&self) -> &'static str {
        "mpfr"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["texinfo".into(), "gmp".into()]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.host_lib_configure(&[], &[], false)
    }
}
