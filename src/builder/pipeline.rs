use crate::builder::{
    bundle::{self, BundleReport},
    docs::{self, DOC_DIR, DocsReport, README_PAGE, README_SOURCE, STYLESHEET},
    manifest::{self, MANIFEST_FILE, ManifestReport},
    store,
};
use crate::config::{self, BuildConfig, BuildOverrides};
use crate::error::Result;
use crate::i18n::{LocaleSet, locales::LOCALE_DIR};
use crate::utils::{
    fs as ufs,
    logger::{LogLevel, Logger},
    semver, spinner,
};
use std::path::{Path, PathBuf};

/// Name of the staged tree inside a project.
pub const ADDON_DIR: &str = "addon";

/// Everything a finished build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub bundle: PathBuf,
    pub descriptor: PathBuf,
    pub sha256: String,
    pub entries: usize,
}

/// Loads `buildVars.toml` and applies the caller overrides.
pub fn load_config(project_root: &Path, overrides: &BuildOverrides) -> Result<BuildConfig> {
    spinner::run_step(
        "Resolving build variables",
        |cfg: &BuildConfig| {
            format!(
                "Building {} {} (channel: {})",
                cfg.addon.name,
                cfg.addon.version,
                cfg.addon.update_channel.as_deref().unwrap_or("none")
            )
        },
        || {
            if let Some(number) = &overrides.version_number {
                semver::validate_version_number(number)?;
            }
            let defaults = config::load_build_vars(project_root)?;
            config::resolve(defaults, overrides)
        },
    )
}

pub fn output_dir(project_root: &Path, config: &BuildConfig) -> PathBuf {
    project_root.join(&config.build.output_dir)
}

pub fn run_manifest_step(project_root: &Path, config: &BuildConfig) -> Result<ManifestReport> {
    let addon_dir = project_root.join(ADDON_DIR);
    spinner::run_step(
        "Generating manifests",
        |r: &ManifestReport| format!("Manifests written ({} translated)", r.translated.len()),
        || manifest::generate_manifests(project_root, &addon_dir, config),
    )
}

pub fn run_docs_step(project_root: &Path, config: &BuildConfig) -> Result<DocsReport> {
    let addon_dir = project_root.join(ADDON_DIR);
    spinner::run_step(
        "Converting documentation",
        |r: &DocsReport| {
            if r.stylesheet_missing {
                "No help pages generated (missing stylesheet)".to_string()
            } else {
                format!("{} help page(s) generated", r.pages.len())
            }
        },
        || docs::generate_docs(project_root, &addon_dir, config),
    )
}

pub fn run_bundle_step(project_root: &Path, config: &BuildConfig) -> Result<BundleReport> {
    let addon_dir = project_root.join(ADDON_DIR);
    let out_file = output_dir(project_root, config).join(config.bundle_file_name());
    spinner::run_step(
        &format!("Packaging {}", config.bundle_file_name()),
        |r: &BundleReport| format!("Archive created with {} file(s)", r.entries.len()),
        || bundle::create_bundle(&addon_dir, &config.build.excluded_files, &out_file),
    )
}

/// Runs the whole pipeline: resolve, manifests, docs, bundle, store descriptor.
///
/// ### Parameters
/// - `project_root`: The add-on project directory
/// - `overrides`: Caller-supplied build variables
///
pub fn build_addon(project_root: &Path, overrides: &BuildOverrides) -> Result<BuildOutput> {
    let config = load_config(project_root, overrides)?;
    run_manifest_step(project_root, &config)?;
    run_docs_step(project_root, &config)?;
    let bundle = run_bundle_step(project_root, &config)?;

    let (descriptor, record) = spinner::run_step(
        "Writing store descriptor",
        |(path, _): &(PathBuf, store::StoreDescriptor)| {
            format!("Store descriptor written: {}", path.display())
        },
        || store::emit_store_descriptor(&config, &bundle.path, &output_dir(project_root, &config)),
    )?;

    let logger = Logger::new();
    let mut trace = vec![
        format!("Bundle     : {}", bundle.path.display()),
        format!("Descriptor : {}", descriptor.display()),
        format!("SHA-256    : {}", record.sha256),
    ];
    trace.extend(bundle.excluded.iter().map(|e| format!("Excluded   : {}", e)));
    let refs: Vec<&str> = trace.iter().map(String::as_str).collect();
    logger.log_message_with_trace(
        LogLevel::Success,
        &format!("Add-on built: {} {}", config.addon.name, config.addon.version),
        refs,
    );

    Ok(BuildOutput {
        bundle: bundle.path,
        descriptor,
        sha256: record.sha256,
        entries: bundle.entries.len(),
    })
}

/// Removes what [`build_addon`] would generate for the resolved config.
/// Returns the removed files.
pub fn clean_addon(project_root: &Path, overrides: &BuildOverrides) -> Result<Vec<PathBuf>> {
    let config = load_config(project_root, overrides)?;
    let addon_dir = project_root.join(ADDON_DIR);
    let out_dir = output_dir(project_root, &config);
    let doc_root = addon_dir.join(DOC_DIR);

    let mut targets = vec![
        addon_dir.join(MANIFEST_FILE),
        doc_root.join(STYLESHEET),
        out_dir.join(config.bundle_file_name()),
        out_dir.join(format!("{}.json", store::descriptor_version(&config).0)),
    ];
    if project_root.join(README_SOURCE).is_file() {
        targets.push(
            doc_root
                .join(&config.build.base_language)
                .join(README_SOURCE),
        );
    }
    for lang in LocaleSet::discover(&addon_dir)?.iter() {
        targets.push(addon_dir.join(LOCALE_DIR).join(lang).join(MANIFEST_FILE));
    }
    for dir in docs::doc_locale_dirs(&doc_root)? {
        targets.push(dir.join(README_PAGE));
    }

    let mut removed = Vec::new();
    for t in targets {
        if ufs::remove_if_exists(&t)? {
            removed.push(t);
        }
    }

    let refs: Vec<String> = removed.iter().map(|p| p.display().to_string()).collect();
    Logger::new().log_message_with_trace(
        LogLevel::Info,
        &format!("{} generated file(s) removed", removed.len()),
        refs.iter().map(String::as_str).collect(),
    );
    Ok(removed)
}
