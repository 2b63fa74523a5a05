/*!

Capture the engine repository's git commit so release manifests can record
which version of the engine produced them. Outside of a git checkout the
version is recorded as `unknown`.

!*/

use std::process::Command;

fn main() {
    println!("cargo:rustc-env=PACKSYS_VERSION={}", version());
    let head = std::path::Path::new("../../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
}

fn version() -> String {
    let head = match git(&["log", "-1", "--pretty=%H"]) {
        Some(head) if !head.is_empty() => head,
        _ => return "unknown".to_string(),
    };
    match git(&["status", "--porcelain"]) {
        Some(dirty) if !dirty.is_empty() => format!("{}*", head),
        Some(_) => head,
        None => "unknown".to_string(),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
