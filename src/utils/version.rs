/// Returns the CLI version: `ADDONPACK_CLI_VERSION` when set and non-empty,
/// else the compile-time crate version.
pub fn get_version() -> String {
    if let Ok(v) = std::env::var("ADDONPACK_CLI_VERSION") {
        if !v.trim().is_empty() {
            return v;
        }
    }

    option_env!("CARGO_PKG_VERSION").unwrap_or("0.0.0").to_string()
}
