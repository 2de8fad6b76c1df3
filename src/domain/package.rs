//! Package identity as known by the monitoring service

use serde::{Deserialize, Serialize};
use std::fmt;

/// A package tracked by the monitoring service
///
/// `kind` is the ecosystem identifier (e.g. "Rubygem") and selects which
/// installer/updater handles the package's files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name as used by its ecosystem tooling
    pub name: String,

    /// Server-side unique identifier
    #[serde(default)]
    pub slug: String,

    /// Ecosystem identifier
    #[serde(rename = "type")]
    pub kind: String,
}

impl Package {
    /// Create a package with name, slug and ecosystem kind
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
