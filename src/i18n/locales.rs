use crate::error::{BuildError, Result};
use crate::i18n::catalog::Catalog;
use crate::utils::logger::{LogLevel, Logger};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCALE_DIR: &str = "locale";
pub const MESSAGES_DIR: &str = "LC_MESSAGES";
pub const DOMAIN: &str = "nvda";

/// Locales of an add-on, one per directory under `addon/locale/`, sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleSet {
    locales: Vec<String>,
}

impl LocaleSet {
    /// Discovers the locales of a staged tree. A missing `locale/` directory
    /// yields an empty set.
    pub fn discover(addon_dir: &Path) -> Result<LocaleSet> {
        let root = addon_dir.join(LOCALE_DIR);
        if !root.is_dir() {
            return Ok(LocaleSet::default());
        }
        let read_dir = fs::read_dir(&root)
            .map_err(|e| BuildError::io(format!("Failed to read {}", root.display()), e))?;

        let mut locales: Vec<String> = Vec::new();
        for entry in read_dir.flatten() {
            let p = entry.path();
            if !p.is_dir() {
                continue;
            }
            if let Some(name) = p.file_name().and_then(|s| s.to_str()) {
                locales.push(name.to_string());
            }
        }
        locales.sort();
        Ok(LocaleSet { locales })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locales.iter().map(String::as_str)
    }
}

/// `gettext`-style lookups for one language. Never fails: anything that
/// cannot be translated comes back unchanged.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    catalog: Option<Catalog>,
}

impl Translator {
    pub fn untranslated() -> Self {
        Translator { catalog: None }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Translator {
            catalog: Some(catalog),
        }
    }

    /// Loads the catalog for `language` from the staged tree, falling back
    /// from `pt_BR` to `pt`. Compiled `.mo` files win over `.po` sources.
    /// Unreadable catalogs are logged and skipped.
    ///
    /// ### Parameters
    /// - `addon_dir`: Root of the staged tree
    /// - `language`: Locale directory name, e.g. `de` or `pt_BR`
    ///
    pub fn for_language(addon_dir: &Path, language: &str) -> Self {
        for candidate in catalog_candidates(addon_dir, language) {
            if !candidate.is_file() {
                continue;
            }
            match Catalog::load(&candidate) {
                Ok(catalog) => return Translator::with_catalog(catalog),
                Err(e) => Logger::new().log_message(
                    LogLevel::Warning,
                    &format!("Ignoring message catalog: {}", e),
                ),
            }
        }
        Translator::untranslated()
    }

    pub fn gettext<'a>(&'a self, msgid: &'a str) -> &'a str {
        self.catalog
            .as_ref()
            .and_then(|c| c.lookup(msgid))
            .unwrap_or(msgid)
    }
}

fn catalog_candidates(addon_dir: &Path, language: &str) -> Vec<PathBuf> {
    let mut languages = vec![language.to_string()];
    if let Some((base, _)) = language.split_once(['_', '-']) {
        if !base.is_empty() {
            languages.push(base.to_string());
        }
    }

    let mut out = Vec::new();
    for lang in languages {
        let dir = addon_dir.join(LOCALE_DIR).join(lang).join(MESSAGES_DIR);
        out.push(dir.join(format!("{}.mo", DOMAIN)));
        out.push(dir.join(format!("{}.po", DOMAIN)));
    }
    out
}
