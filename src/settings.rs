//! Runtime settings from the environment.

use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_TOPIC: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Topic assigned to notes saved without one (`APP_DEFAULT_TOPIC`).
    pub default_topic: String,
    /// Whether renderers may produce charts (`APP_ENABLE_CHARTS`).
    pub enable_charts: bool,
    /// Pattern document to load instead of the built-ins (`LOGINSIGHT_PATTERNS`).
    pub patterns_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { default_topic: DEFAULT_TOPIC.to_string(), enable_charts: true, patterns_path: None }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_topic = lookup("APP_DEFAULT_TOPIC")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let enable_charts = lookup("APP_ENABLE_CHARTS")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "False"))
            .unwrap_or(true);
        let patterns_path = lookup("LOGINSIGHT_PATTERNS").filter(|p| !p.trim().is_empty()).map(PathBuf::from);
        Self { default_topic, enable_charts, patterns_path }
    }
}
