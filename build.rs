use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let version = describe_head().unwrap_or_else(|| {
        std::env::var("CARGO_PKG_VERSION")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    });

    println!("cargo:rustc-env=PIMOVIE_VERSION={version}");
}

/// `git describe` output with the leading `v` of release tags removed.
/// Untagged checkouts report `0.0.0-g<hash>`.
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags", "--match", "v[0-9]*"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    match described.trim() {
        "" => None,
        tagged if tagged.starts_with('v') => Some(tagged[1..].to_string()),
        hash => Some(format!("0.0.0-g{hash}")),
    }
}
