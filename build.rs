use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let date = capture("date", &["-u", "+%Y-%m-%d"]);
    println!("cargo:rustc-env=BUILD_DATE={date}");

    let commit = capture("git", &["rev-parse", "--short", "HEAD"]);
    println!("cargo:rustc-env=GIT_COMMIT={commit}");
}

/// Trimmed stdout of a successful command, `unknown` otherwise.
fn capture(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
