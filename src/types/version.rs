use serde::Serialize;
use std::fmt;

/// A `major.minor.patch` triple as it appears in store descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VersionTriple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTriple {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        VersionTriple {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
