pub fn get_signature(version: &str) -> String {
    format!(
        r#"
   ________
  /       /|                📦 Addonpack (manifest generator and bundle packager for NVDA add-ons)
 /_______/ |
 |  .--. | |                Builds manifests, localized help pages,
 | ( () )| |                .nvda-addon bundles and store descriptors.
 |  '--' | /
 |_______|/                 v{}
"#,
        version
    )
}
