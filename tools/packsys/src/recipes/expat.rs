use crate::error::Result;
use crate::package::{Ctx, Recipe};

pub struct Expat;

impl Recipe for Expat {
    fn pkg_name(&self) -> &'static str {
        "expat"
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.host_lib_configure(&[], &[], false)
    }
}
