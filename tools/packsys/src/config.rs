/*!
The per-package configuration mapping.

Every package instance owns a string-to-string map seeded with a standard
key set: platform names, the variant-qualified package name, every path the
build pipeline touches, the standard compiler/linker flag sets, and the
`make` parallelism. Recipe-supplied strings are templates rendered against
this map.
*/

use crate::error::{self, Result};
use crate::template;
use crate::variant::Variant;
use crate::{MACOS_SDK, SOURCE_REPO_PREFIX};
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xyz_platform::{OsFamily, Triple};

/// A package's configuration mapping. Values are fully rendered at
/// construction; recipe templates are rendered lazily against the complete
/// map via [`Config::render`].
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Config {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a key the standard factory always sets.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| error::MissingConfigKeySnafu { key }.build())
    }

    /// Like [`Config::require`], interpreted as a path.
    pub fn require_path(&self, key: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(self.require(key)?))
    }

    /// Render a recipe template against this mapping.
    pub fn render(&self, template: &str) -> Result<String> {
        template::render(template, &self.values)
    }

    /// Render a template and interpret the result as a path.
    pub fn render_path(&self, template: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(self.render(template)?))
    }

    /// Render each part and join the results into a path.
    pub fn join(&self, parts: &[&str]) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        for part in parts {
            path.push(self.render(part)?);
        }
        Ok(path)
    }
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| error::NonUnicodePathSnafu { path }.build())
}

/// Build the standard configuration for one package variant.
#[allow(clippy::too_many_arguments)]
pub fn standard(
    pkg_name: &str,
    variant: &Variant,
    variant_name: &str,
    uses_osx_frameworks: bool,
    root_dir: &Path,
    build: &Triple,
    host: &Triple,
    jobs: u32,
) -> Result<Config> {
    let mut config = Config::default();

    config.set("pkg_name", pkg_name);
    config.set("build", build.as_str());
    config.set("host", host.as_str());
    config.set("variant_name", variant_name);
    for (key, value) in variant.iter() {
        config.set(key, value);
    }

    config.set("prefix", "/noprefix");
    let eprefix = format!("/noprefix/{}", host);
    config.set("eprefix", &eprefix);

    let root_dir_abs = if root_dir.is_absolute() {
        root_dir.to_path_buf()
    } else {
        let cwd = std::env::current_dir().context(error::CurrentDirSnafu)?;
        if root_dir.as_os_str().is_empty() {
            cwd
        } else {
            cwd.join(root_dir)
        }
    };
    config.set("root_dir", path_str(root_dir)?);
    config.set("root_dir_abs", path_str(&root_dir_abs)?);

    let source_dir = root_dir.join("source").join(pkg_name);
    config.set("source_dir", path_str(&source_dir)?);
    let source_dir_from_build = if root_dir.is_absolute() {
        source_dir.clone()
    } else {
        Path::new("../..").join(&source_dir)
    };
    config.set("source_dir_from_build", path_str(&source_dir_from_build)?);

    let build_dir = root_dir.join("build").join(variant_name);
    config.set("build_dir", path_str(&build_dir)?);
    let devtree_dir = root_dir.join("devtree").join(variant_name);
    let devtree_dir_abs = root_dir_abs.join("devtree").join(variant_name);
    config.set("devtree_dir", path_str(&devtree_dir)?);
    config.set("devtree_dir_abs", path_str(&devtree_dir_abs)?);
    let install_dir = root_dir.join("install").join(variant_name);
    let install_dir_abs = root_dir_abs.join("install").join(variant_name);
    config.set("install_dir", path_str(&install_dir)?);
    config.set("install_dir_abs", path_str(&install_dir_abs)?);

    // The prefixes are absolute-looking paths joined onto install_dir by
    // plain concatenation; this fiction is what makes the archives
    // relocatable when unpacked elsewhere.
    config.set("prefix_dir", format!("{}/noprefix", path_str(&install_dir)?));
    config.set(
        "eprefix_dir",
        format!("{}{}", path_str(&install_dir)?, eprefix),
    );

    let release_dir = root_dir.join("release");
    config.set("release_dir", path_str(&release_dir)?);
    let release_file = release_dir.join(format!("{}.tar.gz", variant_name));
    config.set("release_file", path_str(&release_file)?);

    config.set("repo_name", format!("{}{}", SOURCE_REPO_PREFIX, pkg_name));

    let devtree_abs = path_str(&devtree_dir_abs)?;
    let mut ldflags = match build.family() {
        OsFamily::Darwin => {
            let mut flags = format!("-Wl,-search_paths_first -Wl,-syslibroot,{}", MACOS_SDK);
            if uses_osx_frameworks {
                flags.push_str(" -F/Library/Frameworks -F/System/Library/Frameworks");
            }
            flags
        }
        OsFamily::LinuxGnu => String::new(),
        OsFamily::Other => {
            return error::BuildPlatformFlagsSnafu {
                platform: build.as_str(),
            }
            .fail();
        }
    };
    if !ldflags.is_empty() {
        ldflags.push(' ');
    }
    ldflags.push_str(&format!("-L{}/{}/lib", devtree_abs, host));
    config.set("standard_ldflags", ldflags);

    let mut cppflags = match build.family() {
        OsFamily::Darwin => format!("-isysroot {} ", MACOS_SDK),
        _ => String::new(),
    };
    cppflags.push_str(&format!(
        "-I{dt}/include -I{dt}/{host}/include",
        dt = devtree_abs,
        host = host
    ));
    config.set("standard_cppflags", cppflags);

    config.set("jobs", format!("-j{}", jobs));

    Ok(config)
}
