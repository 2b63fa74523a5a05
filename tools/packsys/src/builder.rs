/*!
The build engine.

A `Builder` is created for a build/host platform pair and drives the whole
pipeline for each requested package: stage every dependency's release
archive into the package's private devtree, then download, configure, make,
install and package. Dependencies that have no release archive yet are built
recursively first, so asking for the top of a toolchain materialises
everything beneath it.

Progress is recorded on disk rather than in memory: a `.configured` sentinel
makes the configure phase idempotent across invocations, `make` is
incremental by virtue of the external build system, and the install tree is
wiped and rebuilt every time. A failed build leaves its partial state in
place; `--reconfigure` and `--force` are the recovery paths.
*/

use crate::archive;
use crate::error::{self, Result};
use crate::fsutil;
use crate::git;
use crate::manifest;
use crate::package::{Dep, Package};
use crate::registry::Registry;
use crate::variant::Variant;
use crate::ENGINE_VERSION;
use log::{debug, info, warn};
use snafu::{ensure, ResultExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use xyz_platform::{OsFamily, Triple};

/// Flags controlling one `build` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Delete the `.configured` sentinel and run configure again.
    pub reconfigure: bool,
    /// Remove the devtree, build and install trees before starting.
    pub force: bool,
    /// Apply `force` to recursively built dependencies as well.
    pub force_recursive: bool,
}

/// Manages the build process for one build/host combination. Package
/// instances are memoised per builder, so a dependency referenced from
/// several places is instantiated once.
pub struct Builder {
    build: Triple,
    host: Triple,
    jobs: u32,
    root_dir: PathBuf,
    registry: Registry,
    packages: HashMap<(String, Variant), Rc<Package>>,
    in_progress: Vec<String>,
}

impl Builder {
    /// Create a builder. `build` defaults to the detected platform and
    /// `host` to `build`. The packaging root's `source` directory is
    /// created eagerly, matching the layout the rest of the pipeline
    /// assumes.
    pub fn new(
        build: Option<Triple>,
        host: Option<Triple>,
        jobs: u32,
        root_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let build = match (build, Triple::detect()) {
            (Some(build), Ok(detected)) => {
                if build != detected {
                    warn!(
                        "Provided build {} does not match detected build {}.",
                        build, detected
                    );
                }
                build
            }
            (Some(build), Err(_)) => build,
            (None, Ok(detected)) => {
                info!("Detected build: {}", detected);
                detected
            }
            (None, Err(e)) => return Err(e).context(error::PlatformSnafu),
        };
        let host = host.unwrap_or_else(|| build.clone());
        let root_dir = root_dir.into();
        fsutil::ensure_dir(root_dir.join("source"))?;
        Ok(Self {
            build,
            host,
            jobs,
            root_dir,
            registry: Registry::standard(),
            packages: HashMap::new(),
            in_progress: Vec::new(),
        })
    }

    /// Replace the recipe registry. Embedders and tests use this to supply
    /// their own recipe set.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn host(&self) -> &Triple {
        &self.host
    }

    /// Build a package variant, recursively materialising any dependency
    /// whose release archive is missing.
    pub fn build(&mut self, pkg_name: &str, variant: &Variant, opts: &BuildOptions) -> Result<()> {
        let pkg = self.load_package(pkg_name, variant)?;
        ensure!(
            !self.in_progress.iter().any(|n| n == pkg.variant_name()),
            error::DependencyCycleSnafu {
                chain: self
                    .in_progress
                    .iter()
                    .cloned()
                    .chain([pkg.variant_name().to_string()])
                    .collect::<Vec<_>>(),
            }
        );
        self.in_progress.push(pkg.variant_name().to_string());
        let result = self.build_package(&pkg, opts);
        self.in_progress.pop();
        result
    }

    /// Look up or instantiate the package instance for `(pkg_name, variant)`.
    fn load_package(&mut self, pkg_name: &str, variant: &Variant) -> Result<Rc<Package>> {
        let key = (pkg_name.to_string(), variant.clone());
        if let Some(pkg) = self.packages.get(&key) {
            return Ok(pkg.clone());
        }
        let recipe = self.registry.load(pkg_name)?;
        let pkg = Rc::new(Package::new(
            recipe,
            variant.clone(),
            &self.root_dir,
            &self.build,
            &self.host,
            self.jobs,
        )?);
        self.packages.insert(key, pkg.clone());
        Ok(pkg)
    }

    fn build_package(&mut self, pkg: &Rc<Package>, opts: &BuildOptions) -> Result<()> {
        info!("Building {}", pkg.variant_name());

        if opts.force {
            for key in ["devtree_dir", "build_dir", "install_dir"] {
                fsutil::rmtree(pkg.config().require_path(key)?)?;
            }
        }

        self.stage_deps(pkg, opts)?;

        if pkg.group_only() {
            return self.package_group(pkg);
        }

        self.download(pkg)?;
        self.configure(pkg, opts.reconfigure)?;
        self.make(pkg)?;
        self.install(pkg)?;
        self.package(pkg)
    }

    /// The recipe's dependency edges, with `glibc` prepended on GNU/Linux
    /// hosts so headers and symbol-version data are always staged.
    fn effective_deps(&self, pkg: &Package) -> Vec<Dep> {
        let mut deps = pkg.deps();
        if self.host.family() == OsFamily::LinuxGnu && pkg.pkg_name() != "glibc" {
            deps.insert(0, Dep::Name("glibc".to_string()));
        }
        deps
    }

    /// Materialise and extract every dependency's release archive into this
    /// package's devtree, in declaration order. A later dependency may
    /// overwrite files staged by an earlier one; that layering is up to the
    /// recipe author.
    fn stage_deps(&mut self, pkg: &Rc<Package>, opts: &BuildOptions) -> Result<()> {
        let devtree_dir = pkg.config().require_path("devtree_dir")?;
        for dep in self.effective_deps(pkg) {
            fsutil::ensure_dir(&devtree_dir)?;
            let dep_variant = dep.variant();
            let dep_pkg = self.load_package(dep.name(), &dep_variant)?;
            let release_file = dep_pkg.config().require_path("release_file")?;
            if !release_file.is_file() {
                self.build(
                    dep.name(),
                    &dep_variant,
                    &BuildOptions {
                        reconfigure: opts.reconfigure,
                        force: opts.force_recursive,
                        force_recursive: opts.force_recursive,
                    },
                )?;
            }
            info!("Installing dep: {}", dep_pkg.variant_name());
            archive::unpack(&release_file, &devtree_dir)?;
        }
        Ok(())
    }

    /// Clone the upstream source if it is not already present. The source
    /// checkout is shared by every variant of a package.
    fn download(&self, pkg: &Package) -> Result<()> {
        let source_dir = pkg.config().require_path("source_dir")?;
        if source_dir.is_dir() {
            debug!("Source for {} already present", pkg.pkg_name());
            return Ok(());
        }
        let repo = pkg.config().require("repo_name")?;
        info!("git clone {} {}", repo, source_dir.display());
        git::clone(repo, &source_dir)
    }

    fn configure(&self, pkg: &Package, reconfigure: bool) -> Result<()> {
        let build_dir = pkg.config().require_path("build_dir")?;
        let sentinel = build_dir.join(".configured");
        if sentinel.is_file() {
            if reconfigure {
                info!("{} already configured. Reconfiguring.", pkg.pkg_name());
                std::fs::remove_file(&sentinel)
                    .context(error::FileRemoveSnafu { path: &sentinel })?;
            } else {
                info!("{} already configured. Skipping.", pkg.pkg_name());
                return Ok(());
            }
        }
        fsutil::ensure_dir(&build_dir)?;
        pkg.recipe().configure(&pkg.ctx())?;
        fsutil::touch(sentinel)
    }

    fn make(&self, pkg: &Package) -> Result<()> {
        pkg.recipe().make(&pkg.ctx())
    }

    /// The install tree is not incremental: it is wiped and rebuilt so that
    /// the packaged result is exactly what this install produced.
    fn install(&self, pkg: &Package) -> Result<()> {
        let install_dir = pkg.config().require_path("install_dir")?;
        fsutil::rmtree(&install_dir)?;
        fsutil::ensure_dir(&install_dir)?;
        pkg.recipe().install(&pkg.ctx())
    }

    fn package(&self, pkg: &Package) -> Result<()> {
        let source_dir = pkg.config().require_path("source_dir")?;
        let source_version = git::working_tree_version(&source_dir)?;
        self.write_release(pkg, Some(source_version))
    }

    /// The group-only shortcut: the install tree is just a symlink to the
    /// assembled devtree, so the release archive bundles every dependency
    /// that was staged into it.
    fn package_group(&self, pkg: &Package) -> Result<()> {
        let install_dir = pkg.config().require_path("install_dir")?;
        fsutil::rmtree(&install_dir)?;
        fsutil::ensure_dir(&install_dir)?;
        let link = install_dir.join("noprefix");
        let target = Path::new("../../devtree").join(pkg.variant_name());
        std::os::unix::fs::symlink(&target, &link).context(error::SymlinkSnafu {
            link: &link,
            target: &target,
        })?;
        self.write_release(pkg, None)
    }

    fn write_release(&self, pkg: &Package, source_version: Option<String>) -> Result<()> {
        let release_dir = pkg.config().require_path("release_dir")?;
        let release_file = pkg.config().require_path("release_file")?;
        let prefix_dir = pkg.config().require_path("prefix_dir")?;
        fsutil::ensure_dir(&release_dir)?;
        manifest::write(
            &prefix_dir,
            &manifest::Header {
                variant_name: pkg.variant_name().to_string(),
                source_version,
                engine_version: ENGINE_VERSION.to_string(),
            },
        )?;
        archive::write_tar_gz(&release_file, &prefix_dir)?;
        info!("Wrote release {}", release_file.display());
        Ok(())
    }
}
