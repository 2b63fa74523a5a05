/*!
End-to-end tests for the build engine, driving the real state machine with
stub recipes against a temporary packaging root. The stubs write their
outputs directly instead of shelling out to a build system, so the only
external tool these tests touch is `git`, which the engine uses to record
source versions.
*/

use packsys::builder::{BuildOptions, Builder};
use packsys::error::Result;
use packsys::package::{Ctx, Dep, Recipe};
use packsys::registry::Registry;
use packsys::variant::{Variant, VariantSchema};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use xyz_platform::Triple;

const LINUX: &str = "x86_64-unknown-linux-gnu";
const DARWIN: &str = "x86_64-apple-darwin";

fn write_under(ctx: &Ctx, parts: &[&str], contents: &str) -> Result<()> {
    let path = ctx.j(parts)?;
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
    Ok(())
}

/// Count configure invocations through a side file next to the sentinel.
fn bump_counter(ctx: &Ctx) -> Result<()> {
    let counter = ctx.j(&["{build_dir}", "configure-count"])?;
    let count = std::fs::read_to_string(&counter)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0);
    std::fs::write(counter, format!("{}\n", count + 1)).unwrap();
    Ok(())
}

fn read_counter(root: &Path, variant_name: &str) -> u32 {
    std::fs::read_to_string(root.join("build").join(variant_name).join("configure-count"))
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

struct Alpha;

impl Recipe for Alpha {
    fn pkg_name(&self) -> &'static str {
        "alpha"
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        bump_counter(ctx)
    }

    fn make(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        write_under(ctx, &["{eprefix_dir}", "bin", "alpha"], "alpha tool\n")?;
        write_under(ctx, &["{prefix_dir}", "include", "alpha.h"], "#pragma once\n")
    }
}

struct Bravo;

impl Recipe for Bravo {
    fn pkg_name(&self) -> &'static str {
        "bravo"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["alpha".into()]
    }

    fn configure(&self, ctx: &Ctx) -> Result<()> {
        // Record whether alpha's tool had been staged by configure time.
        let staged = ctx.exists(&["{devtree_dir}", "{host}", "bin", "alpha"])?;
        write_under(
            ctx,
            &["{build_dir}", "alpha-staged"],
            if staged { "yes" } else { "no" },
        )
    }

    fn make(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        write_under(ctx, &["{eprefix_dir}", "bin", "bravo"], "bravo tool\n")
    }
}

struct GlibcStub;

impl Recipe for GlibcStub {
    fn pkg_name(&self) -> &'static str {
        "glibc"
    }

    fn configure(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn make(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn install(&self, ctx: &Ctx) -> Result<()> {
        write_under(ctx, &["{prefix_dir}", "include", "stdio.h"], "/* stub */\n")
    }
}

struct Grouped;

impl Recipe for Grouped {
    fn pkg_name(&self) -> &'static str {
        "grouped"
    }

    fn group_only(&self) -> bool {
        true
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["alpha".into(), "bravo".into()]
    }
}

struct Schemed;

impl Recipe for Schemed {
    fn pkg_name(&self) -> &'static str {
        "schemed"
    }

    fn variants(&self) -> VariantSchema {
        VariantSchema::new([("target", vec!["arm-none-eabi"])])
    }

    fn configure(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn make(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }

    fn install(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }
}

struct CycA;

impl Recipe for CycA {
    fn pkg_name(&self) -> &'static str {
        "cyc-a"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["cyc-b".into()]
    }

    fn configure(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }
}

struct CycB;

impl Recipe for CycB {
    fn pkg_name(&self) -> &'static str {
        "cyc-b"
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        vec!["cyc-a".into()]
    }

    fn configure(&self, _ctx: &Ctx) -> Result<()> {
        Ok(())
    }
}

fn test_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register("alpha", || Box::new(Alpha));
    registry.register("bravo", || Box::new(Bravo));
    registry.register("glibc", || Box::new(GlibcStub));
    registry.register("grouped", || Box::new(Grouped));
    registry.register("schemed", || Box::new(Schemed));
    registry.register("cyc-a", || Box::new(CycA));
    registry.register("cyc-b", || Box::new(CycB));
    registry
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-c")
        .arg("user.name=engine-test")
        .arg("-c")
        .arg("user.email=engine-test@localhost")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git must be available for engine tests");
    assert!(
        status.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&status.stderr)
    );
}

/// Pre-seed a package's source checkout so the download phase is a no-op
/// and the package phase has a commit to record.
fn seed_source(root: &Path, pkg_name: &str) {
    let source_dir = root.join("source").join(pkg_name);
    std::fs::create_dir_all(&source_dir).unwrap();
    std::fs::write(source_dir.join("README"), format!("{} source\n", pkg_name)).unwrap();
    git(&source_dir, &["init", "--quiet"]);
    git(&source_dir, &["add", "."]);
    git(&source_dir, &["commit", "--quiet", "-m", "import"]);
}

fn builder(root: &Path, triple: &str) -> Builder {
    let platform = Triple::new(triple).unwrap();
    Builder::new(Some(platform.clone()), Some(platform), 1, root)
        .unwrap()
        .with_registry(test_registry())
}

fn variant_name(pkg: &str, host: &str) -> String {
    format!("{}-{}", pkg, host)
}

#[test]
fn leaf_build_produces_verifiable_release() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "alpha");
    seed_source(root, "glibc");

    let mut builder = builder(root, LINUX);
    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();

    let name = variant_name("alpha", LINUX);
    let release = root.join("release").join(format!("{}.tar.gz", name));
    assert!(release.is_file());

    // Extract and verify the manifest against the file contents.
    let unpack_dir = dir.path().join("unpacked");
    packsys::archive::unpack(&release, &unpack_dir).unwrap();
    let manifest_path = unpack_dir.join("share/xyz").join(&name);
    let manifest = std::fs::read_to_string(&manifest_path).unwrap();
    let mut lines = manifest.lines();
    assert_eq!(lines.next(), Some(name.as_str()));
    assert!(lines.next().unwrap().starts_with("Source Version: "));
    assert!(lines.next().unwrap().starts_with("XYZ Version: "));
    assert_eq!(lines.next(), Some(""));

    let mut listed = 0;
    for line in lines {
        let (digest, path) = line.split_once(' ').unwrap();
        let file = unpack_dir.join(path);
        assert!(file.is_file(), "manifest lists missing file {}", path);
        assert_eq!(
            digest,
            packsys::fsutil::sha256_file(&file).unwrap(),
            "digest mismatch for {}",
            path
        );
        listed += 1;
    }
    // alpha installs two files; the manifest never lists itself.
    assert_eq!(listed, 2);
}

#[test]
fn dependency_is_materialised_and_staged_before_configure() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for pkg in ["alpha", "bravo", "glibc"] {
        seed_source(root, pkg);
    }

    let mut builder = builder(root, LINUX);
    builder
        .build("bravo", &Variant::empty(), &BuildOptions::default())
        .unwrap();

    // Building bravo first materialised alpha's release.
    let alpha_release = root
        .join("release")
        .join(format!("{}.tar.gz", variant_name("alpha", LINUX)));
    assert!(alpha_release.is_file());

    // Alpha's tool was staged into bravo's devtree before bravo configured.
    let bravo_name = variant_name("bravo", LINUX);
    let staged = root
        .join("devtree")
        .join(&bravo_name)
        .join(LINUX)
        .join("bin/alpha");
    assert!(staged.is_file());
    let recorded = root.join("build").join(&bravo_name).join("alpha-staged");
    assert_eq!(std::fs::read_to_string(recorded).unwrap(), "yes");

    // The implicit glibc dependency was staged too.
    assert!(root
        .join("devtree")
        .join(&bravo_name)
        .join("include/stdio.h")
        .is_file());

    let bravo_release = root
        .join("release")
        .join(format!("{}.tar.gz", bravo_name));
    assert!(bravo_release.is_file());
}

#[test]
fn configure_runs_once_unless_reconfigure() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "alpha");
    seed_source(root, "glibc");

    let mut builder = builder(root, LINUX);
    let name = variant_name("alpha", LINUX);

    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();
    assert!(root.join("build").join(&name).join(".configured").is_file());
    assert_eq!(read_counter(root, &name), 1);

    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();
    assert_eq!(read_counter(root, &name), 1);

    builder
        .build(
            "alpha",
            &Variant::empty(),
            &BuildOptions {
                reconfigure: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(read_counter(root, &name), 2);
}

#[test]
fn force_removes_variant_state() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "alpha");
    seed_source(root, "glibc");

    let mut builder = builder(root, LINUX);
    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();

    let name = variant_name("alpha", LINUX);
    let leftover = root.join("build").join(&name).join("stale-object");
    std::fs::write(&leftover, b"stale").unwrap();

    builder
        .build(
            "alpha",
            &Variant::empty(),
            &BuildOptions {
                force: true,
                ..Default::default()
            },
        )
        .unwrap();

    // The build tree was recreated from scratch, so configure ran again and
    // the stale file is gone.
    assert!(!leftover.exists());
    assert_eq!(read_counter(root, &name), 1);
}

#[test]
fn group_only_bundles_the_devtree() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for pkg in ["alpha", "bravo", "glibc"] {
        seed_source(root, pkg);
    }

    let mut builder = builder(root, LINUX);
    builder
        .build("grouped", &Variant::empty(), &BuildOptions::default())
        .unwrap();

    let name = variant_name("grouped", LINUX);

    // No source checkout for the metapackage itself.
    assert!(!root.join("source").join("grouped").exists());

    // The install tree is a symlink onto the assembled devtree.
    let link = root.join("install").join(&name).join("noprefix");
    assert_eq!(
        link.read_link().unwrap(),
        Path::new("../../devtree").join(&name)
    );

    let release = root.join("release").join(format!("{}.tar.gz", name));
    assert!(release.is_file());
    assert!(std::fs::metadata(&release).unwrap().len() > 0);

    // The manifest lands inside the devtree via the symlink, and carries no
    // source version.
    let manifest = std::fs::read_to_string(
        root.join("devtree")
            .join(&name)
            .join("share/xyz")
            .join(&name),
    )
    .unwrap();
    assert!(manifest.starts_with(&name));
    assert!(!manifest.contains("Source Version"));
    assert!(manifest.contains("XYZ Version"));
    // Both dependencies' tools are listed.
    assert!(manifest.contains("bin/alpha"));
    assert!(manifest.contains("bin/bravo"));
}

#[test]
fn invalid_variant_fails_before_any_side_effect() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let mut builder = builder(root, LINUX);
    let result = builder.build(
        "schemed",
        &Variant::new([("target", "x86_64-linux")]),
        &BuildOptions::default(),
    );
    assert!(matches!(
        result,
        Err(packsys::Error::UnknownVariantValue { .. })
    ));

    assert!(!root.join("build").exists());
    assert!(!root.join("devtree").exists());
    assert!(!root.join("install").exists());
}

#[test]
fn variant_qualified_names_separate_build_trees() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "schemed");

    // Darwin host: no implicit glibc edge to satisfy.
    let mut builder = builder(root, DARWIN);
    builder
        .build(
            "schemed",
            &Variant::new([("target", "arm-none-eabi")]),
            &BuildOptions::default(),
        )
        .unwrap();

    let name = format!("schemed-target_arm-none-eabi-{}", DARWIN);
    assert!(root.join("build").join(&name).join(".configured").is_file());
    assert!(root
        .join("release")
        .join(format!("{}.tar.gz", name))
        .is_file());
}

#[test]
fn rebuilds_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "alpha");
    seed_source(root, "glibc");

    let mut builder = builder(root, LINUX);
    let release = root
        .join("release")
        .join(format!("{}.tar.gz", variant_name("alpha", LINUX)));

    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();
    let first = std::fs::read(&release).unwrap();

    std::fs::remove_file(&release).unwrap();
    builder
        .build("alpha", &Variant::empty(), &BuildOptions::default())
        .unwrap();
    let second = std::fs::read(&release).unwrap();

    assert_eq!(first, second);
}

#[test]
fn dependency_cycles_are_detected() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_source(root, "cyc-a");
    seed_source(root, "cyc-b");

    // Darwin host keeps the cycle minimal.
    let mut builder = builder(root, DARWIN);
    let result = builder.build("cyc-a", &Variant::empty(), &BuildOptions::default());
    assert!(matches!(
        result,
        Err(packsys::Error::DependencyCycle { .. })
    ));
}
