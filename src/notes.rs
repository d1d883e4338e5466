//! Free-text notes: JSONL records, daily digests and weekly roll-ups.

use crate::error::{InsightError, Result};
use crate::masking;
use crate::parser;
use crate::summarizer::{self, ExtractiveSummarizer, RankedPoint};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub ts: String,
    pub topic: String,
    pub message: String,
}

impl NoteEntry {
    /// Build a record for a new message. PII in the message is masked and a
    /// blank topic becomes `default_topic`.
    pub fn new(ts: NaiveDateTime, topic: Option<&str>, message: &str, default_topic: &str) -> Self {
        let topic = topic.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(default_topic);
        NoteEntry {
            ts: ts.format(NOTE_TIMESTAMP_FORMAT).to_string(),
            topic: topic.to_string(),
            message: masking::mask_pii(message),
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub line_number: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesRead {
    pub entries: Vec<NoteEntry>,
    pub skipped: Vec<SkippedRecord>,
}

fn field_string(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Read JSONL note records. Blank lines are ignored; lines that are not JSON
/// objects are recorded in [`NotesRead::skipped`] and reading continues.
pub fn read_notes<R: BufRead>(mut reader: R) -> std::io::Result<NotesRead> {
    let mut out = NotesRead::default();
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        let text = parser::decode_best_effort(&buf);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(obj)) => out.entries.push(NoteEntry {
                ts: field_string(&obj, "ts"),
                topic: field_string(&obj, "topic"),
                message: field_string(&obj, "message"),
            }),
            Ok(_) => {
                tracing::debug!(line_number, "note record is not an object");
                out.skipped.push(SkippedRecord { line_number, reason: "not_an_object".into() });
            }
            Err(e) => {
                tracing::debug!(line_number, error = %e, "malformed note record");
                out.skipped.push(SkippedRecord { line_number, reason: "malformed_json".into() });
            }
        }
    }
    Ok(out)
}

pub fn read_notes_file(path: &Path) -> Result<NotesRead> {
    let file = File::open(path).map_err(|e| InsightError::io(path, e))?;
    read_notes(BufReader::new(file)).map_err(|e| InsightError::io(path, e))
}

/// One day's topic counts and key points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyDigest {
    pub topics: BTreeMap<String, usize>,
    pub key_points: Vec<String>,
}

impl DailyDigest {
    pub fn from_entries(entries: &[NoteEntry], default_topic: &str) -> Self {
        let mut topics = BTreeMap::new();
        for e in entries {
            let t = e.topic.trim();
            let t = if t.is_empty() { default_topic } else { t };
            *topics.entry(t.to_string()).or_insert(0) += 1;
        }
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        let key_points = ExtractiveSummarizer::default().summarize(&messages);
        DailyDigest { topics, key_points }
    }

    /// Topics by count descending, then name.
    pub fn ranked_topics(&self) -> Vec<(String, usize)> {
        rank_counts(&self.topics)
    }
}

fn rank_counts(counts: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut v: Vec<(String, usize)> = counts.iter().map(|(k, c)| (k.clone(), *c)).collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

/// Roll-up of up to seven daily digests.
///
/// Points are ranked by the number of days they were a key point on, not by
/// re-scoring the merged text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyDigest {
    pub week_id: String,
    pub topic_totals: Vec<(String, usize)>,
    pub top_points: Vec<RankedPoint>,
}

impl WeeklyDigest {
    pub fn from_days(week_id: impl Into<String>, days: &[DailyDigest]) -> Self {
        let mut totals: BTreeMap<String, usize> = BTreeMap::new();
        for d in days {
            for (topic, c) in &d.topics {
                *totals.entry(topic.clone()).or_insert(0) += c;
            }
        }
        let top_points = summarizer::rank_by_occurrence(
            days.iter().map(|d| d.key_points.iter()),
            summarizer::WEEKLY_TOP_POINTS,
        );
        WeeklyDigest { week_id: week_id.into(), topic_totals: rank_counts(&totals), top_points }
    }
}

/// The seven Monday-based days of a week and its ISO id (`YYYY-Www`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSpan {
    pub week_id: String,
    pub days: Vec<NaiveDate>,
}

fn span_from_monday(monday: NaiveDate) -> WeekSpan {
    let iso = monday.iso_week();
    WeekSpan {
        week_id: format!("{}-W{:02}", iso.year(), iso.week()),
        days: (0..7).map(|i| monday + Duration::days(i)).collect(),
    }
}

/// Resolve an ISO week id such as `2024-W05`.
pub fn week_for_iso(week_id: &str) -> Result<WeekSpan> {
    let invalid = || InsightError::InvalidWeek(week_id.to_string());
    let (year, week) = week_id.split_once("-W").ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let week: u32 = week.parse().map_err(|_| invalid())?;
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?;
    Ok(span_from_monday(monday))
}

/// The week containing `day`.
pub fn week_containing(day: NaiveDate) -> WeekSpan {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    span_from_monday(monday)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| InsightError::InvalidDate(s.to_string()))
}
