// Bake the git revision and rustc version into the binary for `--version`.

use std::env;
use std::process::Command;

fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn main() {
    println!("cargo:rerun-if-env-changed=KUBECONFIG_IMPORT_REVISION");
    println!("cargo:rerun-if-changed=build.rs");

    let revision = env::var("KUBECONFIG_IMPORT_REVISION")
        .ok()
        .filter(|r| !r.is_empty())
        .or_else(|| capture("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rust_version = capture(&rustc, &["--version"])
        .map(|v| v.trim_start_matches("rustc ").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BUILD_REVISION={}", revision);
    println!("cargo:rustc-env=BUILD_RUST_VERSION={}", rust_version);
}
