use crate::error::Result;
use crate::package::{Ctx, Dep, Recipe};
use crate::variant::Variant;

pub struct Mpc;

impl Recipe for Mpc {
    fn pkg_name(&self) -> &'static str {
        "mpc"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["texinfo".into(), "gmp".into(), "mpfr".into()]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.host_lib_configure(&[], &[], false)
    }
}
