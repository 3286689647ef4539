use grev::git_revision_auto;

// Embeds the git revision into `bipbuf-pump --version`.
fn main() {
    let revision = git_revision_auto(".")
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_REVISION={revision}");
    println!("cargo:rerun-if-changed=build.rs");
}
