use assert_cmd::Command;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const BUILD_VARS: &str = r#"
[addon]
name = "captionLocal"
summary = "Local image captioner"
description = "Describes images with a local model"
version = "1.2.3"
author = "CaptionLocal Contributors"
url = "https://example.org/captionLocal"
source_url = "https://example.org/captionLocal/source"
doc_file_name = "readme.html"
minimum_nvda_version = "2024.1"
last_tested_nvda_version = "2025.1.1"
license = "GPL v2"
license_url = "https://www.gnu.org/licenses/gpl-2.0.html"

[build]
excluded_files = ["globalPlugins/CaptionLocal/models/.keep"]
markdown_extensions = ["tables"]
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("buildVars.toml"), BUILD_VARS);
    write(&root.join("style.css"), "body { font-family: sans-serif; }\n");
    write(
        &root.join("readme.md"),
        "[[!meta title=\"Caption Local\"]]\n\n| key | action |\n|---|---|\n| NVDA+Shift+R | caption |\n",
    );
    write(
        &root.join("addon/globalPlugins/CaptionLocal/__init__.py"),
        "# plugin entry point\n",
    );
    write(&root.join("addon/globalPlugins/CaptionLocal/models/.keep"), "");
    write(
        &root.join("addon/locale/fr/LC_MESSAGES/nvda.po"),
        "msgid \"Local image captioner\"\nmsgstr \"Légendes d'images locales\"\n",
    );
    write(&root.join("addon/doc/fr/readme.md"), "Aide en français\n");
    dir
}

fn addonpack() -> Command {
    Command::cargo_bin("addonpack").unwrap()
}

fn archive_names(path: &Path) -> BTreeSet<String> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn build_produces_bundle_and_descriptor() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .arg("build")
        .arg("--project")
        .arg(root)
        .assert()
        .success();

    let bundle = root.join("captionLocal-1.2.3.nvda-addon");
    assert!(bundle.is_file());

    let expected: BTreeSet<String> = [
        "manifest.ini",
        "globalPlugins/CaptionLocal/__init__.py",
        "locale/fr/LC_MESSAGES/nvda.po",
        "locale/fr/manifest.ini",
        "doc/style.css",
        "doc/en/readme.md",
        "doc/en/readme.html",
        "doc/fr/readme.md",
        "doc/fr/readme.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(archive_names(&bundle), expected);

    let manifest = fs::read_to_string(root.join("addon/manifest.ini")).unwrap();
    assert!(manifest.contains("name = captionLocal\n"));
    assert!(manifest.contains("version = 1.2.3\n"));
    assert!(manifest.contains("updateChannel = None\n"));

    let fr_manifest = fs::read_to_string(root.join("addon/locale/fr/manifest.ini")).unwrap();
    assert!(fr_manifest.contains("summary = \"Légendes d'images locales\""));
    assert!(fr_manifest.contains("Describes images with a local model"));

    let en_page = fs::read_to_string(root.join("addon/doc/en/readme.html")).unwrap();
    assert!(en_page.contains("<title>Caption Local</title>"));
    assert!(en_page.contains("<table>"));
    let fr_page = fs::read_to_string(root.join("addon/doc/fr/readme.html")).unwrap();
    assert!(fr_page.contains("<html lang=\"fr\">"));
    assert!(fr_page.contains("<title>Légendes d'images locales 1.2.3</title>"));

    let descriptor = read_json(&root.join("1.2.3.json"));
    let digest = hex::encode(Sha256::digest(fs::read(&bundle).unwrap()));
    assert_eq!(descriptor["sha256"], digest.as_str());
    assert_eq!(descriptor["addonId"], "captionLocal");
    assert_eq!(descriptor["addonVersionNumber"]["minor"], 2);
    assert_eq!(descriptor["minNVDAVersion"]["patch"], 0);
    assert_eq!(descriptor["lastTestedVersion"]["patch"], 1);
    assert_eq!(descriptor["channel"], "stable");
}

#[test]
fn version_overrides_flow_into_outputs() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--addon-version", "2.0.0-beta1", "--version-number", "2.0.0"])
        .args(["--channel", "beta", "--project"])
        .arg(root)
        .assert()
        .success();

    assert!(root.join("captionLocal-2.0.0-beta1.nvda-addon").is_file());
    let descriptor = read_json(&root.join("2.0.0.json"));
    assert_eq!(descriptor["addonVersionName"], "2.0.0-beta1");
    assert_eq!(descriptor["addonVersionNumber"]["major"], 2);
    assert_eq!(descriptor["channel"], "beta");
}

#[test]
fn non_numeric_version_names_descriptor_by_version() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--addon-version", "2024.dev", "--project"])
        .arg(root)
        .assert()
        .success();

    let descriptor = read_json(&root.join("2024.dev.json"));
    assert_eq!(descriptor["addonVersionNumber"]["major"], 0);
    assert_eq!(descriptor["addonVersionNumber"]["minor"], 0);
    assert_eq!(descriptor["addonVersionNumber"]["patch"], 0);
}

#[test]
fn dev_build_is_date_stamped() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--dev", "--channel", "stable", "--project"])
        .arg(root)
        .assert()
        .success();

    let json_files: Vec<_> = fs::read_dir(root)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".0.0.json"))
        .collect();
    assert_eq!(json_files.len(), 1);
    let descriptor = read_json(&root.join(&json_files[0]));
    assert_eq!(descriptor["channel"], "dev");
    let version = descriptor["addonVersionName"].as_str().unwrap();
    assert_eq!(version.len(), "YYYYMMDD.0.0".len());
    assert!(version.ends_with(".0.0"));
}

#[test]
fn malformed_version_number_aborts_before_writing() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--version-number", "1.2", "--project"])
        .arg(root)
        .assert()
        .failure();

    assert!(!root.join("addon/manifest.ini").exists());
    assert!(!root.join("captionLocal-1.2.3.nvda-addon").exists());
}

#[test]
fn oversized_version_number_is_accepted() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--version-number", "18446744073709551616.0.0", "--project"])
        .arg(root)
        .assert()
        .success();

    let descriptor = read_json(&root.join("1.2.3.json"));
    assert_eq!(descriptor["addonVersionName"], "1.2.3");
    assert_eq!(descriptor["addonVersionNumber"]["major"], 0);
}

#[test]
fn unparseable_compat_version_still_builds() {
    let dir = project();
    let root = dir.path();
    let vars = BUILD_VARS.replace(
        "last_tested_nvda_version = \"2025.1.1\"",
        "last_tested_nvda_version = \"2025.beta\"",
    );
    write(&root.join("buildVars.toml"), &vars);

    addonpack()
        .args(["build", "--project"])
        .arg(root)
        .assert()
        .success();

    let descriptor = read_json(&root.join("1.2.3.json"));
    assert_eq!(descriptor["lastTestedVersion"]["major"], 0);
    assert_eq!(descriptor["minNVDAVersion"]["major"], 2024);
}

#[test]
fn missing_stylesheet_still_builds() {
    let dir = project();
    let root = dir.path();
    fs::remove_file(root.join("style.css")).unwrap();

    addonpack()
        .args(["build", "--project"])
        .arg(root)
        .assert()
        .success();

    assert!(!root.join("addon/doc/en/readme.html").exists());
    assert!(!root.join("addon/doc/fr/readme.html").exists());
    assert!(root.join("captionLocal-1.2.3.nvda-addon").is_file());
}

#[test]
fn unknown_template_field_fails_the_build() {
    let dir = project();
    let root = dir.path();
    write(&root.join("manifest.ini.tpl"), "changelog = {addon_changelog}\n");

    addonpack()
        .args(["build", "--project"])
        .arg(root)
        .assert()
        .failure();

    assert!(!root.join("captionLocal-1.2.3.nvda-addon").exists());
}

#[test]
fn manifest_and_docs_steps_run_alone() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["manifest", "--project"])
        .arg(root)
        .assert()
        .success();
    assert!(root.join("addon/manifest.ini").is_file());
    assert!(!root.join("addon/doc/en/readme.html").exists());

    addonpack()
        .args(["docs", "--project"])
        .arg(root)
        .assert()
        .success();
    assert!(root.join("addon/doc/en/readme.html").is_file());
    assert!(!root.join("captionLocal-1.2.3.nvda-addon").exists());
}

#[test]
fn clean_removes_generated_files() {
    let dir = project();
    let root = dir.path();

    addonpack()
        .args(["build", "--project"])
        .arg(root)
        .assert()
        .success();
    addonpack()
        .args(["clean", "--project"])
        .arg(root)
        .assert()
        .success();

    for generated in [
        "addon/manifest.ini",
        "addon/locale/fr/manifest.ini",
        "addon/doc/style.css",
        "addon/doc/en/readme.md",
        "addon/doc/en/readme.html",
        "addon/doc/fr/readme.html",
        "captionLocal-1.2.3.nvda-addon",
        "1.2.3.json",
    ] {
        assert!(!root.join(generated).exists(), "{generated} should be removed");
    }
    assert!(root.join("addon/doc/fr/readme.md").is_file());
    assert!(root.join("addon/globalPlugins/CaptionLocal/__init__.py").is_file());
}

#[test]
fn missing_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    addonpack()
        .args(["build", "--project"])
        .arg(dir.path())
        .assert()
        .failure();
}
