use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::i18n::{LocaleSet, Translator, locales::LOCALE_DIR};
use crate::utils::{fs as ufs, template};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.ini";
pub const MANIFEST_TEMPLATE: &str = "manifest.ini.tpl";
pub const TRANSLATED_MANIFEST_TEMPLATE: &str = "manifest-translated.ini.tpl";

const DEFAULT_MANIFEST_TEMPLATE: &str = r#"name = {addon_name}
summary = "{addon_summary}"
description = """{addon_description}"""
author = "{addon_author}"
url = {addon_url}
version = {addon_version}
docFileName = {addon_docFileName}
minimumNVDAVersion = {addon_minimumNVDAVersion}
lastTestedNVDAVersion = {addon_lastTestedNVDAVersion}
updateChannel = {addon_updateChannel}
"#;

const DEFAULT_TRANSLATED_MANIFEST_TEMPLATE: &str = r#"summary = "{addon_summary}"
description = """{addon_description}"""
"#;

/// Files written by [`generate_manifests`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestReport {
    pub primary: PathBuf,
    pub translated: Vec<PathBuf>,
}

/// Renders the primary manifest from every configuration field.
pub fn render_manifest(template: &str, config: &BuildConfig) -> Result<String> {
    template::render(template, MANIFEST_TEMPLATE, |key| config.field(key))
}

/// Renders a translated manifest. Only the summary and description are
/// available, both passed through the locale's catalog.
pub fn render_translated_manifest(
    template: &str,
    config: &BuildConfig,
    translator: &Translator,
) -> Result<String> {
    let summary = translator.gettext(&config.addon.summary);
    let description = translator.gettext(&config.addon.description);
    template::render(template, TRANSLATED_MANIFEST_TEMPLATE, |key| match key {
        "addon_summary" => Some(summary),
        "addon_description" => Some(description),
        _ => None,
    })
}

/// Reads a template from the project root, or falls back to the built-in one.
fn load_template(project_root: &Path, file: &str, builtin: &str) -> Result<String> {
    let path = project_root.join(file);
    if !path.is_file() {
        return Ok(builtin.to_string());
    }
    fs::read_to_string(&path)
        .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))
}

/// Writes `addon/manifest.ini` and one `addon/locale/<lang>/manifest.ini` per
/// locale.
///
/// ### Parameters
/// - `project_root`: The add-on project directory (templates live here)
/// - `addon_dir`: The staged tree
/// - `config`: The resolved build configuration
///
pub fn generate_manifests(
    project_root: &Path,
    addon_dir: &Path,
    config: &BuildConfig,
) -> Result<ManifestReport> {
    let primary_template =
        load_template(project_root, MANIFEST_TEMPLATE, DEFAULT_MANIFEST_TEMPLATE)?;
    let translated_template = load_template(
        project_root,
        TRANSLATED_MANIFEST_TEMPLATE,
        DEFAULT_TRANSLATED_MANIFEST_TEMPLATE,
    )?;

    let primary = addon_dir.join(MANIFEST_FILE);
    ufs::write_text(&primary, &render_manifest(&primary_template, config)?)?;

    let mut translated = Vec::new();
    for lang in LocaleSet::discover(addon_dir)?.iter() {
        let translator = Translator::for_language(addon_dir, lang);
        let rendered = render_translated_manifest(&translated_template, config, &translator)?;
        let out = addon_dir.join(LOCALE_DIR).join(lang).join(MANIFEST_FILE);
        ufs::write_text(&out, &rendered)?;
        translated.push(out);
    }

    Ok(ManifestReport {
        primary,
        translated,
    })
}
