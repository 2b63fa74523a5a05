/*!
This library is the build engine behind the `xyz` package builder.

Given a package name and a variant, it resolves the package's transitive
dependency graph, materialises each dependency's release archive, stages the
dependencies into a private per-variant devtree sysroot, drives the package
source through configure/make/install in an isolated build tree, and emits a
deterministic, content-addressable `tar.gz` release archive.

Individual package recipes are data as far as the engine is concerned; they
are registered at compile time in a [`registry::Registry`] and interact with
the engine only through the [`package::Recipe`] trait and the helpers on
[`package::Ctx`].
*/

pub mod archive;
pub mod builder;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod git;
pub mod manifest;
pub mod package;
pub mod process;
pub mod recipes;
pub mod registry;
pub mod release;
pub mod template;
pub mod variant;

pub use builder::{BuildOptions, Builder};
pub use error::{Error, Result};

/// Git URL prefix under which every package's upstream source lives. The
/// repository name is this prefix plus the package name.
pub const SOURCE_REPO_PREFIX: &str = "git://github.com/BreakawayConsulting/";

/// The fixed modification time given to every release archive entry:
/// 2013-01-01T00:00:00Z.
pub const BASE_TIME: u64 = 1_356_998_400;

/// Owner and group name recorded for every release archive entry, and the
/// directory under `share/` where release manifests live.
pub const ARCHIVE_OWNER: &str = "xyz";

/// Owner and group id recorded for every release archive entry.
pub const ARCHIVE_ID: u64 = 1000;

/// The SDK sysroot passed to the linker and preprocessor on Darwin hosts.
pub const MACOS_SDK: &str =
    "/Applications/Xcode.app/Contents/Developer/Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk";

/// The engine's own version, captured from git at build time.
pub const ENGINE_VERSION: &str = env!("PACKSYS_VERSION");
