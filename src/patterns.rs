use crate::config::{
    LevelSource, PatternConfig, TimestampSource, DEFAULT_HTTP_ERROR_REGEX, DEFAULT_TIMESTAMP_FORMAT,
    DEFAULT_TIMESTAMP_REGEX,
};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Built-in level matchers, in evaluation order.
pub const DEFAULT_LEVELS: &[(&str, &str)] = &[
    ("ERROR", r"\bERROR\b"),
    ("WARNING", r"\bWARN(?:ING)?\b"),
    ("CRITICAL", r"\bCRITICAL\b"),
    ("INFO", r"\bINFO\b"),
    ("Exception", r"\bException\b|Traceback"),
];

static DEFAULT_SET: Lazy<PatternSet> = Lazy::new(|| PatternSet {
    timestamps: vec![TimestampMatcher {
        regex: case_insensitive(DEFAULT_TIMESTAMP_REGEX).unwrap_or_else(|_| Regex::new(r"$^").unwrap()),
        format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        infer_year: false,
    }],
    levels: DEFAULT_LEVELS
        .iter()
        .filter_map(|(name, re)| {
            case_insensitive(re).ok().map(|regex| LevelMatcher { name: name.to_string(), regex })
        })
        .collect(),
    http_status: Regex::new(DEFAULT_HTTP_ERROR_REGEX).unwrap_or_else(|_| Regex::new(r"$^").unwrap()),
});

#[derive(Debug, Clone)]
pub struct TimestampMatcher {
    pub regex: Regex,
    pub format: String,
    pub infer_year: bool,
}

#[derive(Debug, Clone)]
pub struct LevelMatcher {
    pub name: String,
    pub regex: Regex,
}

/// Compiled matchers used by the scanner. Timestamp specs are tried in order
/// (first parse wins); every level matcher is evaluated on every line.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub timestamps: Vec<TimestampMatcher>,
    pub levels: Vec<LevelMatcher>,
    pub http_status: Regex,
}

impl Default for PatternSet {
    fn default() -> Self {
        DEFAULT_SET.clone()
    }
}

impl PatternSet {
    pub fn level_names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Document,
    Timestamp,
    Level,
    HttpStatus,
}

/// A configured entry that did not make it into the [`PatternSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPattern {
    pub kind: PatternKind,
    /// Level name, timestamp list index, or the document path.
    pub entry: String,
    pub reason: String,
    /// Whether a built-in matcher took the entry's place.
    pub replaced_by_default: bool,
}

#[derive(Debug, Clone)]
pub struct PatternLoad {
    pub patterns: PatternSet,
    pub skipped: Vec<SkippedPattern>,
}

impl PatternLoad {
    pub fn into_set(self) -> PatternSet {
        self.patterns
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Build a [`PatternSet`] from an optional configuration document.
///
/// Never fails: entries that do not compile are dropped and listed in
/// [`PatternLoad::skipped`]. A broken level falls back to the built-in matcher
/// of the same name when one exists. A section that ends up empty falls back
/// to its built-in defaults.
pub fn load(config: Option<&PatternConfig>) -> PatternLoad {
    let defaults = &*DEFAULT_SET;
    let Some(cfg) = config else {
        return PatternLoad { patterns: defaults.clone(), skipped: Vec::new() };
    };
    let mut skipped = Vec::new();

    if let TimestampSource::Invalid { key, found } = &cfg.timestamps {
        let expected = if *key == "timestamps" { "a list" } else { "a regex string" };
        skipped.push(SkippedPattern {
            kind: PatternKind::Timestamp,
            entry: key.to_string(),
            reason: format!("expected {expected}, found {found}"),
            replaced_by_default: true,
        });
    }
    let mut timestamps = Vec::new();
    for (idx, entry) in cfg.timestamps.entries().into_iter().enumerate() {
        let compiled = entry.and_then(|spec| {
            case_insensitive(&spec.regex)
                .map(|regex| TimestampMatcher { regex, format: spec.format, infer_year: spec.infer_year })
                .map_err(|e| e.to_string())
        });
        match compiled {
            Ok(m) => timestamps.push(m),
            Err(reason) => skipped.push(SkippedPattern {
                kind: PatternKind::Timestamp,
                entry: idx.to_string(),
                reason,
                replaced_by_default: false,
            }),
        }
    }
    if timestamps.is_empty() {
        timestamps = defaults.timestamps.clone();
    }

    let mut levels = Vec::new();
    if let LevelSource::Invalid(found) = &cfg.levels {
        skipped.push(SkippedPattern {
            kind: PatternKind::Level,
            entry: "levels".into(),
            reason: format!("expected an object, found {found}"),
            replaced_by_default: true,
        });
    }
    if let LevelSource::Map(map) = &cfg.levels {
        for (name, value) in map {
            let compiled = match value {
                Value::String(re) => case_insensitive(re).map_err(|e| e.to_string()),
                other => Err(format!("expected a regex string, found {other}")),
            };
            match compiled {
                Ok(regex) => levels.push(LevelMatcher { name: name.clone(), regex }),
                Err(reason) => {
                    let fallback = defaults.levels.iter().find(|l| &l.name == name);
                    if let Some(l) = fallback {
                        levels.push(l.clone());
                    }
                    skipped.push(SkippedPattern {
                        kind: PatternKind::Level,
                        entry: name.clone(),
                        reason,
                        replaced_by_default: fallback.is_some(),
                    });
                }
            }
        }
    }
    if levels.is_empty() {
        levels = defaults.levels.clone();
    }

    let http_status = match cfg.http_error.as_ref() {
        None => defaults.http_status.clone(),
        Some(Value::String(re)) => match Regex::new(re) {
            Ok(rx) => rx,
            Err(e) => {
                skipped.push(SkippedPattern {
                    kind: PatternKind::HttpStatus,
                    entry: "http_error".into(),
                    reason: e.to_string(),
                    replaced_by_default: true,
                });
                defaults.http_status.clone()
            }
        },
        Some(other) => {
            skipped.push(SkippedPattern {
                kind: PatternKind::HttpStatus,
                entry: "http_error".into(),
                reason: format!("expected a regex string, found {other}"),
                replaced_by_default: true,
            });
            defaults.http_status.clone()
        }
    };

    for s in &skipped {
        tracing::warn!(kind = ?s.kind, entry = %s.entry, reason = %s.reason, "pattern entry dropped");
    }

    PatternLoad { patterns: PatternSet { timestamps, levels, http_status }, skipped }
}

/// Like [`load`], reading the document from disk. A missing or malformed
/// document degrades to the built-in defaults.
pub fn load_from_path(path: Option<&Path>) -> PatternLoad {
    let Some(path) = path else {
        return load(None);
    };
    match PatternConfig::from_path(path) {
        Ok(cfg) => load(Some(&cfg)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "pattern document unusable, using defaults");
            let mut out = load(None);
            out.skipped.push(SkippedPattern {
                kind: PatternKind::Document,
                entry: path.display().to_string(),
                reason: e.to_string(),
                replaced_by_default: true,
            });
            out
        }
    }
}
