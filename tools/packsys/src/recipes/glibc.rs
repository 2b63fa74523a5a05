use crate::error::{self, Result};
use crate::fsutil::Umask;
use crate::package::{Ctx, Recipe};
use snafu::ResultExt;
use std::path::Path;

// glibc is built for a very restricted purpose: we do not link against it
// at runtime, but we really do want its header files and the symbol version
// information in the shared objects. A relatively old version is pulled to
// keep any binary packages we produce maximally compatible.

pub struct Glibc;

impl Recipe for Glibc {
    fn pkg_name(&self) -> &'static str {
        "glibc"
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        let env = [("CFLAGS", "-U_FORTIFY_SOURCE -O2 -fno-stack-protector -g3")];
        ctx.host_lib_configure(&[], &env, true)
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        {
            let _umask = Umask::set(0o022);
            ctx.cmd(&["make", "install_root={install_dir_abs}", "install"], &[])?;
        }

        ctx.rmtree(&["{eprefix_dir}", "bin"])?;
        ctx.rmtree(&["{eprefix_dir}", "lib", "gconv"])?;
        ctx.rmtree(&["{eprefix_dir}", "sbin"])?;
        ctx.rmtree(&["{prefix_dir}", "share", "zoneinfo"])?;
        ctx.rmtree(&["{prefix_dir}", "share", "i18n"])?;
        ctx.rmtree(&["{prefix_dir}", "share", "locale"])?;
        ctx.rmtree(&["{prefix_dir}", "etc"])?;
        ctx.strip_info_dir()?;

        for name in ["libc.so", "libpthread.so"] {
            fixup_so_file(&ctx.j(&["{eprefix_dir}", "lib", name])?)?;
        }
        Ok(())
    }
}

/// `libc.so` and `libpthread.so` are linker scripts whose `GROUP` lines
/// name member libraries by absolute path; strip the paths down to file
/// names so the relocated tree resolves them relative to the script.
fn fixup_so_file(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path).context(error::FileReadSnafu { path })?;
    let mut lines = Vec::new();
    for line in contents.lines() {
        if line.starts_with("GROUP") {
            let parts: Vec<&str> = line
                .split_whitespace()
                .map(|part| match part.rfind('/') {
                    Some(idx) if part.starts_with('/') => &part[idx + 1..],
                    _ => part,
                })
                .collect();
            lines.push(parts.join(" "));
        } else {
            lines.push(line.to_string());
        }
    }
    let mut fixed = lines.join("\n");
    fixed.push('\n');
    std::fs::write(path, fixed).context(error::FileWriteSnafu { path })
}
