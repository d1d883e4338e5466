//! Pattern configuration document.
//!
//! The document is JSON. Two timestamp shapes are accepted: a list of specs
//! under `timestamps`, or a single regex under the legacy `timestamp` key.
//! Both collapse into [`TimestampSource`] at deserialization time so nothing
//! downstream needs to look at the raw shape.

use crate::error::{InsightError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

pub const DEFAULT_TIMESTAMP_REGEX: &str = r"\b\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}\b";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_HTTP_ERROR_REGEX: &str = r"\b([45]\d{2})\b";

/// One entry of the `timestamps` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimestampSpecConfig {
    #[serde(default = "default_timestamp_regex")]
    pub regex: String,
    #[serde(default = "default_timestamp_format")]
    pub format: String,
    #[serde(default)]
    pub infer_year: bool,
}

fn default_timestamp_regex() -> String {
    DEFAULT_TIMESTAMP_REGEX.to_string()
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl Default for TimestampSpecConfig {
    fn default() -> Self {
        Self {
            regex: default_timestamp_regex(),
            format: default_timestamp_format(),
            infer_year: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TimestampSource {
    /// `"timestamps": [ {...}, ... ]`. Entries stay raw so that one bad entry
    /// can be dropped without rejecting the document.
    List(Vec<Value>),
    /// `"timestamp": "<regex>"`, always parsed with the default format.
    Legacy(String),
    /// The section is present but has the wrong JSON type.
    Invalid { key: &'static str, found: Value },
    #[default]
    Unspecified,
}

impl TimestampSource {
    /// Resolve into spec entries, each either usable or carrying the reason it
    /// could not be read.
    pub fn entries(&self) -> Vec<std::result::Result<TimestampSpecConfig, String>> {
        match self {
            TimestampSource::List(items) => items
                .iter()
                .map(|v| TimestampSpecConfig::deserialize(v).map_err(|e| e.to_string()))
                .collect(),
            TimestampSource::Legacy(regex) => vec![Ok(TimestampSpecConfig {
                regex: regex.clone(),
                ..TimestampSpecConfig::default()
            })],
            TimestampSource::Unspecified => vec![Ok(TimestampSpecConfig::default())],
            TimestampSource::Invalid { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LevelSource {
    /// Level name to regex, in document order. Non-string values are kept so
    /// the registry can report them as skipped.
    Map(Map<String, Value>),
    /// `levels` is present but not an object.
    Invalid(Value),
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawPatternConfig")]
pub struct PatternConfig {
    pub timestamps: TimestampSource,
    pub levels: LevelSource,
    pub http_error: Option<Value>,
}

#[derive(Deserialize)]
struct RawPatternConfig {
    #[serde(default)]
    timestamps: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    levels: Option<Value>,
    #[serde(default)]
    http_error: Option<Value>,
}

impl From<RawPatternConfig> for PatternConfig {
    fn from(raw: RawPatternConfig) -> Self {
        let timestamps = match (raw.timestamps, raw.timestamp) {
            (Some(Value::Array(items)), _) => TimestampSource::List(items),
            (Some(found), _) => TimestampSource::Invalid { key: "timestamps", found },
            (None, Some(Value::String(regex))) => TimestampSource::Legacy(regex),
            (None, Some(found)) => TimestampSource::Invalid { key: "timestamp", found },
            (None, None) => TimestampSource::Unspecified,
        };
        let levels = match raw.levels {
            Some(Value::Object(map)) => LevelSource::Map(map),
            Some(found) => LevelSource::Invalid(found),
            None => LevelSource::Unspecified,
        };
        PatternConfig { timestamps, levels, http_error: raw.http_error }
    }
}

impl PatternConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| InsightError::io(path, e))?;
        let text = crate::parser::decode_best_effort(&bytes);
        Self::from_json_str(&text).map_err(|source| InsightError::PatternFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
