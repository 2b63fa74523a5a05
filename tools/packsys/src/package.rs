/*!
The package model.

A recipe describes how one package is configured, made and installed. The
engine talks to recipes through the [`Recipe`] trait: a name, a dependency
list (possibly computed from the variant), a variant schema, and the three
phase hooks. `make` and `install` have shared default implementations which
an overriding recipe may also call explicitly before doing its own cleanup,
mirroring how most recipes only adjust the tail end of an install.

A [`Package`] is one memoised instance of a recipe: the frozen variant, the
derived variant name and the resolved configuration. Phase hooks receive a
[`Ctx`] borrowing the instance, which carries the helper surface recipes
build on: templated commands, path juggling, and the canonical host/cross
`configure` invocations.
*/

use crate::config::{self, Config};
use crate::error::{self, Result};
use crate::fsutil::{self, Umask};
use crate::process;
use crate::variant::{variant_name, Variant, VariantSchema};
use snafu::ResultExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xyz_platform::Triple;

/// `.info` files that more than one GNU toolchain package installs; they
/// collide between archives, so the default install drops them.
const STRAY_INFO_FILES: &[&str] = &["standards.info", "configure.info"];

/// A dependency edge: a bare package name builds the dependency with an
/// empty variant, a qualified edge carries one.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Dep {
    Name(String),
    Qualified(String, Variant),
}

impl Dep {
    pub fn name(&self) -> &str {
        match self {
            Dep::Name(name) => name,
            Dep::Qualified(name, _) => name,
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Dep::Name(_) => Variant::empty(),
            Dep::Qualified(_, variant) => variant.clone(),
        }
    }
}

impl From<&str> for Dep {
    fn from(name: &str) -> Self {
        Dep::Name(name.to_string())
    }
}

/// A package recipe. Only `pkg_name` and `configure` have no defaults.
pub trait Recipe {
    fn pkg_name(&self) -> &'static str;

    /// The dependency edges, in staging order. The default is no
    /// dependencies; recipes may compute edges from their variant, e.g. a
    /// cross compiler depends on cross binutils for the same target.
    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        Vec::new()
    }

    /// The variant keys this recipe accepts.
    fn variants(&self) -> VariantSchema {
        VariantSchema::empty()
    }

    /// A group-only package has no build of its own; its release archive
    /// bundles the assembled devtree of its dependencies.
    fn group_only(&self) -> bool {
        false
    }

    /// True for toolchain packages that produce target-specific binaries.
    fn crosstool(&self) -> bool {
        false
    }

    /// On Darwin, link against the system framework directories.
    fn uses_osx_frameworks(&self) -> bool {
        false
    }

    fn configure(&self, _ctx: &Ctx) -> Result<()> {
        error::RecipeMissingConfigureSnafu {
            pkg_name: self.pkg_name(),
        }
        .fail()
    }

    fn make(&self, ctx: &Ctx) -> Result<()> {
        default_make(ctx)
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        default_install(ctx)
    }
}

/// The shared `make` phase: `make -j<N>` in the build directory.
pub fn default_make(ctx: &Ctx) -> Result<()> {
    ctx.cmd(&["make", "{jobs}"], &[])
}

/// The shared `install` phase: `make DESTDIR=... install` under umask 0o022,
/// followed by the standard output cleanups. Whatever is left in the install
/// directory afterwards is what gets packaged.
pub fn default_install(ctx: &Ctx) -> Result<()> {
    {
        let _umask = Umask::set(0o022);
        ctx.cmd(&["make", "DESTDIR={install_dir_abs}", "install"], &[])?;
    }
    ctx.strip_info_dir()?;

    // Libtool droppings are meaningless once the tree is relocated.
    let install_dir = ctx.config_path("install_dir")?;
    for entry in WalkDir::new(&install_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if entry.file_name().to_string_lossy().ends_with(".la") {
            std::fs::remove_file(entry.path())
                .context(error::FileRemoveSnafu { path: entry.path() })?;
        }
    }

    {
        let _umask = Umask::set(0o022);
        let man_dir = ctx.j(&["{prefix_dir}", "share", "man"])?;
        if man_dir.is_dir() {
            for entry in WalkDir::new(&man_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                man_remove_header(entry.path())?;
            }
        }
    }

    // Upstream tools leak a few artifacts that collide between packages.
    let libiberty = ctx.j(&["{eprefix_dir}", "lib", "libiberty.a"])?;
    if libiberty.is_file() {
        std::fs::remove_file(&libiberty).context(error::FileRemoveSnafu { path: &libiberty })?;
    }
    for name in STRAY_INFO_FILES {
        let info = ctx.j(&["{prefix_dir}", "share", "info", name])?;
        if info.is_file() {
            std::fs::remove_file(&info).context(error::FileRemoveSnafu { path: &info })?;
        }
    }

    Ok(())
}

/// Drop the first line of a man page when it is the tool-version header that
/// `help2man` and friends stamp with a generation date.
fn man_remove_header(path: &Path) -> Result<()> {
    let contents = std::fs::read(path).context(error::FileReadSnafu { path })?;
    let newline = match contents.iter().position(|&b| b == b'\n') {
        Some(idx) => idx,
        None => return Ok(()),
    };
    let first_line = String::from_utf8_lossy(&contents[..newline]);
    if !first_line.contains("generated") {
        return Ok(());
    }
    std::fs::write(path, &contents[newline + 1..]).context(error::FileWriteSnafu { path })
}

/// One buildable unit: a recipe frozen with a variant, plus its resolved
/// configuration. Instances are memoised per builder so a dependency shared
/// by several packages is instantiated once.
pub struct Package {
    recipe: Box<dyn Recipe>,
    variant: Variant,
    variant_name: String,
    config: Config,
}

impl Package {
    pub fn new(
        recipe: Box<dyn Recipe>,
        variant: Variant,
        root_dir: &Path,
        build: &Triple,
        host: &Triple,
        jobs: u32,
    ) -> Result<Self> {
        recipe.variants().validate(recipe.pkg_name(), &variant)?;
        let variant_name = variant_name(recipe.pkg_name(), &variant, host.as_str());
        let config = config::standard(
            recipe.pkg_name(),
            &variant,
            &variant_name,
            recipe.uses_osx_frameworks(),
            root_dir,
            build,
            host,
            jobs,
        )?;
        Ok(Self {
            recipe,
            variant,
            variant_name,
            config,
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.recipe.pkg_name()
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn variant_name(&self) -> &str {
        &self.variant_name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn recipe(&self) -> &dyn Recipe {
        self.recipe.as_ref()
    }

    pub fn group_only(&self) -> bool {
        self.recipe.group_only()
    }

    pub fn deps(&self) -> Vec<Dep> {
        self.recipe.deps(&self.variant)
    }

    pub fn ctx(&self) -> Ctx<'_> {
        Ctx { package: self }
    }
}

/// What a phase hook receives: a borrow of the package instance plus the
/// helper surface recipes are written against. Commands run in the build
/// directory with the minimal composed environment.
pub struct Ctx<'a> {
    package: &'a Package,
}

impl<'a> Ctx<'a> {
    pub fn config(&self) -> &Config {
        self.package.config()
    }

    pub fn render(&self, template: &str) -> Result<String> {
        self.config().render(template)
    }

    /// Render each part and join the results into a path.
    pub fn j(&self, parts: &[&str]) -> Result<PathBuf> {
        self.config().join(parts)
    }

    pub fn exists(&self, parts: &[&str]) -> Result<bool> {
        Ok(self.j(parts)?.symlink_metadata().is_ok())
    }

    pub fn ensure_dir(&self, parts: &[&str]) -> Result<()> {
        fsutil::ensure_dir(self.j(parts)?)
    }

    pub fn rmtree(&self, parts: &[&str]) -> Result<()> {
        fsutil::rmtree(self.j(parts)?)
    }

    pub fn is_darwin(&self) -> bool {
        self.config()
            .get("host")
            .map(|h| h.ends_with("-darwin"))
            .unwrap_or(false)
    }

    pub fn is_linux(&self) -> bool {
        self.config()
            .get("host")
            .map(|h| h.ends_with("-linux-gnu"))
            .unwrap_or(false)
    }

    fn config_path(&self, key: &str) -> Result<PathBuf> {
        self.config().require_path(key)
    }

    /// Run a command in the build directory. Every argument and every
    /// environment value is a template. The child sees only the minimal
    /// base environment plus the rendered overlay.
    pub fn cmd(&self, argv: &[&str], env: &[(&str, &str)]) -> Result<()> {
        let mut rendered = Vec::with_capacity(argv.len());
        for arg in argv {
            rendered.push(self.render(arg)?);
        }
        let mut child_env = process::base_env(&self.render("{devtree_dir_abs}/{host}/bin")?);
        for (key, value) in env {
            child_env.insert(key.to_string(), self.render(value)?);
        }
        let build_dir = self.config_path("build_dir")?;
        process::run(&rendered, &child_env, &build_dir)
    }

    /// Configure a library for the host platform. Shared libraries are
    /// disabled unless asked for; relocated trees and static archives get
    /// along better.
    pub fn host_lib_configure(
        &self,
        extra_args: &[&str],
        env: &[(&str, &str)],
        enable_shared: bool,
    ) -> Result<()> {
        let mut argv = vec![
            "{source_dir_from_build}/configure",
            "--prefix={prefix}",
            "--exec-prefix={eprefix}",
            "--host={host}",
            "--build={build}",
        ];
        if !enable_shared {
            argv.push("--disable-shared");
        }
        argv.extend_from_slice(extra_args);
        let mut base_env = vec![
            ("LDFLAGS", "{standard_ldflags}"),
            ("CPPFLAGS", "{standard_cppflags}"),
        ];
        base_env.extend_from_slice(env);
        self.cmd(&argv, &base_env)
    }

    /// Configure an application for the host platform; applications do not
    /// understand `--disable-shared`.
    pub fn host_app_configure(&self, extra_args: &[&str], env: &[(&str, &str)]) -> Result<()> {
        let mut argv = vec![
            "{source_dir_from_build}/configure",
            "--prefix={prefix}",
            "--exec-prefix={eprefix}",
            "--host={host}",
            "--build={build}",
        ];
        argv.extend_from_slice(extra_args);
        let mut base_env = vec![
            ("LDFLAGS", "{standard_ldflags}"),
            ("CPPFLAGS", "{standard_cppflags}"),
        ];
        base_env.extend_from_slice(env);
        self.cmd(&argv, &base_env)
    }

    /// Configure a cross tool: binaries run on the host and operate on the
    /// target, with target-prefixed program names.
    pub fn cross_configure(&self, extra_args: &[&str], env: &[(&str, &str)]) -> Result<()> {
        let mut argv = vec![
            "{source_dir_from_build}/configure",
            "--prefix={prefix}",
            "--exec-prefix={eprefix}",
            "--program-prefix={target}-",
            "--host={host}",
            "--build={build}",
            "--target={target}",
        ];
        argv.extend_from_slice(extra_args);
        let mut base_env = vec![("LDFLAGS", "{standard_ldflags}")];
        base_env.extend_from_slice(env);
        self.cmd(&argv, &base_env)
    }

    /// Remove the install tree's `share/info/dir` index; every package
    /// would otherwise ship a conflicting copy.
    pub fn strip_info_dir(&self) -> Result<()> {
        let info_dir = self.j(&["{prefix_dir}", "share", "info", "dir"])?;
        if info_dir.is_file() {
            std::fs::remove_file(&info_dir).context(error::FileRemoveSnafu { path: &info_dir })?;
        }
        Ok(())
    }
}
