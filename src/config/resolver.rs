use crate::config::build_vars::{AddonSection, BuildSection, BuildVars};
use crate::error::Result;
use crate::utils::semver::{self, UNSET_VERSION_NUMBER};
use chrono::NaiveDate;

pub const DEV_CHANNEL: &str = "dev";
pub const BUNDLE_EXTENSION: &str = "nvda-addon";

/// Values the caller may override on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOverrides {
    pub version: Option<String>,
    pub version_number: Option<String>,
    pub dev: bool,
    pub channel: Option<String>,
}

/// The resolved, read-only configuration threaded through every build step.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub addon: AddonSection,
    /// Numeric version as supplied (`0.0.0` when it should be derived).
    pub version_number: String,
    pub build: BuildSection,
}

impl BuildConfig {
    /// Looks up a manifest template field by its placeholder name.
    /// Unset optional fields read as `None`, which the host treats as no value.
    pub fn field(&self, key: &str) -> Option<&str> {
        fn optional(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("None")
        }

        let a = &self.addon;
        let value = match key {
            "addon_name" => a.name.as_str(),
            "addon_summary" => a.summary.as_str(),
            "addon_description" => a.description.as_str(),
            "addon_version" => a.version.as_str(),
            "addon_author" => optional(&a.author),
            "addon_url" => optional(&a.url),
            "addon_sourceURL" => optional(&a.source_url),
            "addon_docFileName" => optional(&a.doc_file_name),
            "addon_minimumNVDAVersion" => optional(&a.minimum_nvda_version),
            "addon_lastTestedNVDAVersion" => optional(&a.last_tested_nvda_version),
            "addon_updateChannel" => optional(&a.update_channel),
            "addon_license" => optional(&a.license),
            "addon_licenseURL" => optional(&a.license_url),
            _ => return None,
        };
        Some(value)
    }

    /// Numeric version to publish: the supplied one, or the version string
    /// when the sentinel was left in place.
    pub fn effective_version_number(&self) -> &str {
        if self.version_number == UNSET_VERSION_NUMBER {
            &self.addon.version
        } else {
            &self.version_number
        }
    }

    pub fn bundle_file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.addon.name, self.addon.version, BUNDLE_EXTENSION
        )
    }
}

/// Merges the static defaults with caller overrides, using today's local date
/// for development builds.
pub fn resolve(defaults: BuildVars, overrides: &BuildOverrides) -> Result<BuildConfig> {
    resolve_on(defaults, overrides, chrono::Local::now().date_naive())
}

/// Same as [`resolve`] with an explicit build date.
///
/// ### Parameters
/// - `defaults`: Values loaded from `buildVars.toml`
/// - `overrides`: Values supplied by the caller
/// - `today`: Date stamped into development versions
///
pub fn resolve_on(
    defaults: BuildVars,
    overrides: &BuildOverrides,
    today: NaiveDate,
) -> Result<BuildConfig> {
    let mut version_number = overrides
        .version_number
        .clone()
        .unwrap_or_else(|| UNSET_VERSION_NUMBER.to_string());
    semver::validate_version_number(&version_number)?;

    let BuildVars { mut addon, build } = defaults;

    if let Some(channel) = &overrides.channel {
        addon.update_channel = Some(channel.clone());
    }

    if overrides.dev {
        let version = dev_version(today);
        addon.version = version.clone();
        version_number = version;
        addon.update_channel = Some(DEV_CHANNEL.to_string());
    } else if let Some(version) = &overrides.version {
        addon.version = version.clone();
    }

    Ok(BuildConfig {
        addon,
        version_number,
        build,
    })
}

fn dev_version(today: NaiveDate) -> String {
    format!("{}.0.0", today.format("%Y%m%d"))
}
