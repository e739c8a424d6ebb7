use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::types::version::VersionTriple;
use crate::utils::{fs as ufs, semver};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read size used while hashing archives.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_CHANNEL: &str = "stable";

/// The JSON sidecar a distribution catalog uses to index a bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDescriptor {
    pub addon_id: String,
    pub display_name: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub description: String,
    pub sha256: String,
    pub homepage: String,
    pub addon_version_name: String,
    pub addon_version_number: VersionTriple,
    #[serde(rename = "minNVDAVersion")]
    pub min_nvda_version: VersionTriple,
    pub last_tested_version: VersionTriple,
    pub channel: String,
    pub publisher: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub license: String,
    #[serde(rename = "licenseURL")]
    pub license_url: String,
}

/// Hex SHA-256 of a file, read in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .map_err(|e| BuildError::io(format!("Failed to open {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Picks the descriptor file stem and version triple. A numeric
/// `major.minor.patch` version that fits in integers names the file by its
/// triple; anything else names it by the raw version with a zeroed triple.
pub fn descriptor_version(config: &BuildConfig) -> (String, VersionTriple) {
    let number = config.effective_version_number();
    match semver::parse_strict(number) {
        Some(triple) => (triple.to_string(), triple),
        None => (config.addon.version.clone(), VersionTriple::default()),
    }
}

/// Builds the descriptor for an archive with the given digest.
pub fn build_descriptor(config: &BuildConfig, sha256: String) -> StoreDescriptor {
    let a = &config.addon;
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let (_, version) = descriptor_version(config);

    StoreDescriptor {
        addon_id: a.name.clone(),
        display_name: a.summary.clone(),
        url: String::new(),
        description: a.description.clone(),
        sha256,
        homepage: text(&a.url),
        addon_version_name: a.version.clone(),
        addon_version_number: version,
        min_nvda_version: semver::parse_compat(
            "minimum_nvda_version",
            a.minimum_nvda_version.as_deref(),
        ),
        last_tested_version: semver::parse_compat(
            "last_tested_nvda_version",
            a.last_tested_nvda_version.as_deref(),
        ),
        channel: a
            .update_channel
            .clone()
            .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        publisher: String::new(),
        source_url: text(&a.source_url),
        license: text(&a.license),
        license_url: text(&a.license_url),
    }
}

/// Hashes the finished bundle and writes `<version>.json` into `out_dir`.
///
/// ### Parameters
/// - `config`: The resolved build configuration
/// - `archive`: The finished bundle
/// - `out_dir`: Directory receiving the descriptor
///
pub fn emit_store_descriptor(
    config: &BuildConfig,
    archive: &Path,
    out_dir: &Path,
) -> Result<(PathBuf, StoreDescriptor)> {
    let sha256 = sha256_file(archive)?;
    let descriptor = build_descriptor(config, sha256);
    let (stem, _) = descriptor_version(config);

    let out = out_dir.join(format!("{}.json", stem));
    let mut json = serde_json::to_string_pretty(&descriptor)?;
    json.push('\n');
    ufs::write_text(&out, &json)?;
    Ok((out, descriptor))
}
