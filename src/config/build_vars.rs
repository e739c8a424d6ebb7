use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const BUILD_VARS_FILE: &str = "buildVars.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AddonSection {
    pub name: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub doc_file_name: Option<String>,
    #[serde(default)]
    pub minimum_nvda_version: Option<String>,
    #[serde(default)]
    pub last_tested_nvda_version: Option<String>,
    #[serde(default)]
    pub update_channel: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BuildSection {
    /// Archive-relative paths left out of the bundle (exact match).
    #[serde(default)]
    pub excluded_files: Vec<String>,
    #[serde(default)]
    pub markdown_extensions: Vec<String>,
    #[serde(default = "default_base_language")]
    pub base_language: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            excluded_files: Vec::new(),
            markdown_extensions: Vec::new(),
            base_language: default_base_language(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_base_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Static build metadata of an add-on project, as written in `buildVars.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct BuildVars {
    pub addon: AddonSection,
    #[serde(default)]
    pub build: BuildSection,
}

impl BuildVars {
    pub fn from_toml_str(txt: &str, origin: &Path) -> Result<Self> {
        let vars: BuildVars = toml::from_str(txt).map_err(|source| BuildError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        vars.validate()?;
        Ok(vars)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("[addon].name", &self.addon.name),
            ("[addon].summary", &self.addon.summary),
            ("[addon].version", &self.addon.version),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(BuildError::Config(format!(
                    "Field {} is required in {}",
                    key, BUILD_VARS_FILE
                )));
            }
        }
        if self.build.base_language.trim().is_empty() {
            return Err(BuildError::Config(
                "Field [build].base_language must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Loads `buildVars.toml` from the project root.
///
/// ### Parameters
/// - `project_root`: The add-on project directory
///
pub fn load_build_vars(project_root: &Path) -> Result<BuildVars> {
    let path = project_root.join(BUILD_VARS_FILE);
    if !path.is_file() {
        return Err(BuildError::Config(format!(
            "{} not found in: {}",
            BUILD_VARS_FILE,
            project_root.display()
        )));
    }
    let txt = fs::read_to_string(&path)
        .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
    BuildVars::from_toml_str(&txt, &path)
}
