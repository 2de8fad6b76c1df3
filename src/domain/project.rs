//! Project model as exposed by the monitoring service

use serde::{Deserialize, Serialize};

/// A monitored project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub monitored: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unmonitored_reason: String,

    #[serde(default)]
    pub commit_sha: String,
}
