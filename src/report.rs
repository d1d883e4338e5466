use crate::capabilities::CapabilitySnapshot;
use crate::notes::{DailyDigest, WeeklyDigest};
use crate::scanner::{ScanStats, DISPLAY_TIMESTAMP_FORMAT};
use crate::tabular::CsvSummary;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// HTTP codes listed in a log report's highlights.
pub const REPORT_TOP_HTTP_CODES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Log,
    Notes,
    WeeklyNotes,
    Tabular,
}

/// What the caller knows about the input, independent of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub source: String,
    pub generated_at: NaiveDateTime,
    pub artifacts: Vec<PathBuf>,
    pub capabilities: CapabilitySnapshot,
}

impl ReportMetadata {
    /// Metadata stamped with the local wall-clock time.
    pub fn now(source: impl Into<String>, capabilities: CapabilitySnapshot) -> Self {
        Self {
            source: source.into(),
            generated_at: Local::now().naive_local(),
            artifacts: Vec::new(),
            capabilities,
        }
    }
}

pub enum ReportContent {
    Scan(ScanStats),
    Daily(DailyDigest),
    Weekly(WeeklyDigest),
    Table(CsvSummary),
}

impl ReportContent {
    /// The only report kind this content can be assembled as.
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportContent::Scan(_) => ReportKind::Log,
            ReportContent::Daily(_) => ReportKind::Notes,
            ReportContent::Weekly(_) => ReportKind::WeeklyNotes,
            ReportContent::Table(_) => ReportKind::Tabular,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    pub kind: ReportKind,
    pub source: String,
    pub generated_at: String,
    pub capabilities: CapabilitySnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReportStats {
    Scan(ScanStats),
    Topics(BTreeMap<String, usize>),
    Table(CsvSummary),
}

/// The value handed to renderers and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub header: ReportHeader,
    pub stats: ReportStats,
    pub highlights: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

impl Report {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Compose a report. Pure: the generation time comes from `metadata`.
///
/// Highlights per content:
/// - scan: top HTTP codes as `"<code>: <count>"`, then sample lines as
///   `"<level>: <line>"`
/// - daily digest: its key points
/// - weekly digest: top points, most frequent first
/// - table: none
///
/// `kind` must equal [`ReportContent::kind`]; the header always records the
/// content's kind.
pub fn assemble(kind: ReportKind, metadata: ReportMetadata, content: ReportContent) -> Report {
    debug_assert_eq!(kind, content.kind(), "report kind does not match its content");
    let kind = content.kind();
    let (stats, highlights) = match content {
        ReportContent::Scan(s) => {
            let mut highlights: Vec<String> = s
                .top_http_codes(REPORT_TOP_HTTP_CODES)
                .into_iter()
                .map(|(code, count)| format!("{code}: {count}"))
                .collect();
            for (level, lines) in &s.sample_lines {
                highlights.extend(lines.iter().map(|l| format!("{level}: {l}")));
            }
            (ReportStats::Scan(s), highlights)
        }
        ReportContent::Daily(d) => (ReportStats::Topics(d.topics), d.key_points),
        ReportContent::Weekly(w) => (
            ReportStats::Topics(w.topic_totals.into_iter().collect()),
            w.top_points.into_iter().map(|p| p.text).collect(),
        ),
        ReportContent::Table(t) => (ReportStats::Table(t), Vec::new()),
    };
    Report {
        header: ReportHeader {
            kind,
            source: metadata.source,
            generated_at: metadata.generated_at.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            capabilities: metadata.capabilities,
        },
        stats,
        highlights,
        artifacts: metadata.artifacts,
    }
}
