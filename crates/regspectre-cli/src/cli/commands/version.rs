//! `regspectre version` command.

/// Prints the version plus commit and build date when the binary was
/// built with `REGSPECTRE_COMMIT` / `REGSPECTRE_BUILD_DATE` set.
pub fn execute() {
    println!("regspectre {}", env!("CARGO_PKG_VERSION"));

    if let Some(commit) = option_env!("REGSPECTRE_COMMIT") {
        println!("commit: {commit}");
    }
    if let Some(date) = option_env!("REGSPECTRE_BUILD_DATE") {
        println!("built: {date}");
    }
}
