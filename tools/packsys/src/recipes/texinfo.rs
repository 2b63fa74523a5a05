use crate::error::Result;
use crate::package::{Ctx, Recipe};

pub struct Texinfo;

impl Recipe for Texinfo {
    fn pkg_name(&self) -> &'static str {
        "texinfo"
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        ctx.host_app_configure(&[], &[])
    }
}
