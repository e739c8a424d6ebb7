use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "Invalid version number '{0}': expected 0.0.0 or major.minor.patch with numeric components"
    )]
    InvalidVersionNumber(String),

    #[error("Invalid build configuration: {0}")]
    Config(String),

    #[error("Unknown markdown extension: {0}")]
    UnknownMarkdownExtension(String),

    #[error("Template {template} references unknown field '{field}'")]
    MissingField { template: String, field: String },

    #[error("Malformed template {template}: {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("Malformed message catalog {}: {reason}", path.display())]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize store descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }
}
