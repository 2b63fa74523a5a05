use crate::error::Result;
use crate::package::{Ctx, Dep, Recipe};
use crate::variant::Variant;

pub struct Gmp;

impl Recipe for Gmp {
    fn pkg_name(&self) -> &'static str {
        "gmp"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["texinfo".into()]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.host_lib_configure(&[], &[], false)
    }
}
