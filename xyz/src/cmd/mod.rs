mod build;
mod check;
mod clean;
mod list;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;
use xyz_platform::Triple;

const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Info;

/// A tool for building relocatable packages of UNIX applications.
#[derive(Debug, Parser)]
#[clap(about, long_about = None, version)]
pub(crate) struct Args {
    /// Set the logging level. One of [off|error|warn|info|debug|trace]. You
    /// can also leave this unset and use the RUST_LOG env variable. See
    /// https://github.com/rust-cli/env_logger/
    #[clap(long)]
    pub(crate) log_level: Option<LevelFilter>,

    /// Explicitly set the build system. (default: autodetect)
    #[clap(long)]
    pub(crate) build: Option<Triple>,

    /// Explicitly set the host system. (default: build)
    #[clap(long)]
    pub(crate) host: Option<Triple>,

    /// Simultaneous jobs passed to make.
    #[clap(short = 'j', default_value_t = 1)]
    pub(crate) jobs: u32,

    /// Rerun configure even if a build tree is already configured.
    #[clap(long)]
    pub(crate) reconfigure: bool,

    /// Remove the devtree, build and install trees for the named packages
    /// before building.
    #[clap(long)]
    pub(crate) force: bool,

    /// Like --force, and also applied to any dependency that has to be
    /// rebuilt.
    #[clap(long)]
    pub(crate) force_recursive: bool,

    /// Comma-separated variant assignments (key:value) applied to each
    /// named package.
    #[clap(long)]
    pub(crate) config: Option<String>,

    /// Remove the install, devtree and build directories and exit.
    #[clap(long)]
    pub(crate) clean: bool,

    /// Like --clean, and also remove the release directory.
    #[clap(long)]
    pub(crate) clean_release: bool,

    /// Check that the release files are consistent.
    #[clap(long)]
    pub(crate) check_releases: bool,

    /// Root of an installed package set, for --list.
    #[clap(long)]
    pub(crate) pkg_root: Option<PathBuf>,

    /// List the packages installed under --pkg-root.
    #[clap(long)]
    pub(crate) list: bool,

    /// Packages to build.
    #[clap(value_name = "PKG")]
    pub(crate) packages: Vec<String>,
}

/// Entrypoint for the `xyz` command line program.
pub(crate) fn run(args: Args) -> Result<()> {
    if args.clean || args.clean_release {
        ensure!(
            args.packages.is_empty(),
            "Do not specify packages when cleaning."
        );
        return clean::run(args.clean_release);
    }
    if args.check_releases {
        ensure!(
            args.packages.is_empty(),
            "Do not specify packages when checking releases."
        );
        return check::run();
    }
    if args.list {
        let pkg_root = args
            .pkg_root
            .as_deref()
            .context("--list requires --pkg-root")?;
        return list::run(pkg_root);
    }
    ensure!(!args.packages.is_empty(), "At least one package must be listed.");
    build::run(&args)
}

/// use `level` if present, or else use `RUST_LOG` if present, or else use a
/// default.
pub(crate) fn init_logger(level: Option<LevelFilter>) {
    match (std::env::var(env_logger::DEFAULT_FILTER_ENV).ok(), level) {
        (Some(_), None) => {
            // RUST_LOG exists and level does not; use the environment variable.
            Builder::from_default_env().init();
        }
        _ => {
            // use provided log level or default, for our crates only.
            let level = level.unwrap_or(DEFAULT_LEVEL_FILTER);
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("packsys"), level)
                .init();
        }
    }
}
