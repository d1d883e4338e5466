use crate::error::{InsightError, Result};
use crate::parser::{self, TimestampOutcome};
use crate::patterns::PatternSet;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sample lines kept per level.
pub const SAMPLE_LIMIT: usize = 3;
/// Sample lines are cut to this many characters.
pub const SAMPLE_MAX_CHARS: usize = 200;

pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregates produced by a single pass over a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub lines: usize,
    pub words: usize,
    pub bytes: u64,
    /// Lines with at least one HTTP matcher hit.
    pub http_errors: usize,
    /// 4xx/5xx code -> occurrences.
    pub http_code_counts: BTreeMap<String, usize>,
    pub level_counts: BTreeMap<String, usize>,
    #[serde(serialize_with = "serialize_display_ts")]
    pub first_timestamp: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_display_ts")]
    pub last_timestamp: Option<NaiveDateTime>,
    pub timeline_by_second: BTreeMap<NaiveDateTime, usize>,
    pub timeline_by_minute: BTreeMap<NaiveDateTime, usize>,
    pub timeline_by_minute_per_level: BTreeMap<String, BTreeMap<NaiveDateTime, usize>>,
    pub sample_lines: BTreeMap<String, Vec<String>>,
    /// Lines where a timestamp regex matched but no format parsed it.
    pub unparsed_timestamps: usize,
}

fn serialize_display_ts<S>(ts: &Option<NaiveDateTime>, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match ts {
        Some(t) => s.serialize_str(&t.format(DISPLAY_TIMESTAMP_FORMAT).to_string()),
        None => s.serialize_str(""),
    }
}

impl ScanStats {
    /// Combine stats of an adjacent, later chunk into `self`.
    ///
    /// Counts and histograms add, first/last timestamps take the earliest and
    /// latest, and sample lists concatenate then truncate to [`SAMPLE_LIMIT`].
    pub fn merge(&mut self, other: ScanStats) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
        self.http_errors += other.http_errors;
        self.unparsed_timestamps += other.unparsed_timestamps;
        add_counts(&mut self.http_code_counts, other.http_code_counts);
        add_counts(&mut self.level_counts, other.level_counts);
        add_counts(&mut self.timeline_by_second, other.timeline_by_second);
        add_counts(&mut self.timeline_by_minute, other.timeline_by_minute);
        for (level, series) in other.timeline_by_minute_per_level {
            add_counts(self.timeline_by_minute_per_level.entry(level).or_default(), series);
        }
        for (level, samples) in other.sample_lines {
            let mine = self.sample_lines.entry(level).or_default();
            mine.extend(samples);
            mine.truncate(SAMPLE_LIMIT);
        }
        self.first_timestamp = match (self.first_timestamp, other.first_timestamp) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.last_timestamp = match (self.last_timestamp, other.last_timestamp) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// HTTP codes ordered by count descending, then code ascending.
    pub fn top_http_codes(&self, n: usize) -> Vec<(String, usize)> {
        let mut v: Vec<(String, usize)> =
            self.http_code_counts.iter().map(|(k, c)| (k.clone(), *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }

    pub fn first_timestamp_display(&self) -> Option<String> {
        self.first_timestamp.map(|t| t.format(DISPLAY_TIMESTAMP_FORMAT).to_string())
    }

    pub fn last_timestamp_display(&self) -> Option<String> {
        self.last_timestamp.map(|t| t.format(DISPLAY_TIMESTAMP_FORMAT).to_string())
    }
}

fn add_counts<K: Ord>(into: &mut BTreeMap<K, usize>, from: BTreeMap<K, usize>) {
    for (k, c) in from {
        *into.entry(k).or_insert(0) += c;
    }
}

/// Incremental single-pass scanner. Feed lines with [`LogScanner::observe`],
/// then take the result with [`LogScanner::finish`].
pub struct LogScanner<'p> {
    patterns: &'p PatternSet,
    stats: ScanStats,
    matched: Vec<usize>,
}

impl<'p> LogScanner<'p> {
    pub fn new(patterns: &'p PatternSet) -> Self {
        Self { patterns, stats: ScanStats::default(), matched: Vec::new() }
    }

    /// Account for one line (without its terminator). Does not touch
    /// `bytes`; the caller owns byte accounting.
    pub fn observe(&mut self, line: &str) {
        let stats = &mut self.stats;
        stats.lines += 1;
        stats.words += line.split_whitespace().count();

        let ts = match parser::extract_timestamp(line, &self.patterns.timestamps) {
            TimestampOutcome::Parsed(t) => Some(t),
            TimestampOutcome::Unparseable => {
                stats.unparsed_timestamps += 1;
                None
            }
            TimestampOutcome::Absent => None,
        };
        if let Some(t) = ts {
            if stats.first_timestamp.is_none() {
                stats.first_timestamp = Some(t);
            }
            stats.last_timestamp = Some(t);
            *stats.timeline_by_second.entry(parser::floor_second(t)).or_insert(0) += 1;
            *stats.timeline_by_minute.entry(parser::floor_minute(t)).or_insert(0) += 1;
        }

        self.matched.clear();
        for (idx, level) in self.patterns.levels.iter().enumerate() {
            if !level.regex.is_match(line) {
                continue;
            }
            self.matched.push(idx);
            *stats.level_counts.entry(level.name.clone()).or_insert(0) += 1;
            let samples = stats.sample_lines.entry(level.name.clone()).or_default();
            if samples.len() < SAMPLE_LIMIT {
                samples.push(parser::truncate_chars(line, SAMPLE_MAX_CHARS).to_string());
            }
        }

        // group 1 is the code when the regex has one; a non-participating
        // group yields no code but still marks the line
        let code_group = usize::from(self.patterns.http_status.captures_len() > 1);
        let mut any_http = false;
        for caps in self.patterns.http_status.captures_iter(line) {
            any_http = true;
            let Some(code) = caps.get(code_group) else { continue };
            let code = code.as_str();
            if code.starts_with('4') || code.starts_with('5') {
                *stats.http_code_counts.entry(code.to_string()).or_insert(0) += 1;
            }
        }
        if any_http {
            stats.http_errors += 1;
        }

        if let Some(t) = ts {
            let minute = parser::floor_minute(t);
            for &idx in &self.matched {
                let name = &self.patterns.levels[idx].name;
                *stats
                    .timeline_by_minute_per_level
                    .entry(name.clone())
                    .or_default()
                    .entry(minute)
                    .or_insert(0) += 1;
            }
        }
    }

    pub fn finish(self) -> ScanStats {
        tracing::debug!(lines = self.stats.lines, levels = self.stats.level_counts.len(), "scan finished");
        self.stats
    }
}

/// Scan in-memory lines. Each line counts as a newline-terminated record for
/// `bytes`.
pub fn scan_lines<I, S>(lines: I, patterns: &PatternSet) -> ScanStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = LogScanner::new(patterns);
    let mut bytes = 0u64;
    for line in lines {
        let line = line.as_ref();
        bytes += line.len() as u64 + 1;
        scanner.observe(line);
    }
    let mut stats = scanner.finish();
    stats.bytes = bytes;
    stats
}

/// Scan a byte source record by record. Invalid UTF-8 is dropped per record;
/// `bytes` is the raw number of bytes consumed.
pub fn scan_reader<R: BufRead>(mut reader: R, patterns: &PatternSet) -> std::io::Result<ScanStats> {
    let mut scanner = LogScanner::new(patterns);
    let mut buf = Vec::with_capacity(4096);
    let mut bytes = 0u64;
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        bytes += n as u64;
        let line = parser::decode_best_effort(parser::trim_record_end(&buf));
        scanner.observe(&line);
    }
    let mut stats = scanner.finish();
    stats.bytes = bytes;
    Ok(stats)
}

/// Like [`scan_reader`], scanning bounded batches of records in parallel.
///
/// At most `chunk_lines` times the pool size decoded lines are held at once;
/// each batch goes through [`scan_lines_parallel`] and is merged into the
/// running total.
pub fn scan_reader_parallel<R: BufRead>(
    mut reader: R,
    patterns: &PatternSet,
    chunk_lines: usize,
) -> std::io::Result<ScanStats> {
    let chunk_lines = chunk_lines.max(1);
    let batch_lines = chunk_lines.saturating_mul(rayon::current_num_threads().max(1));
    let mut stats = ScanStats::default();
    let mut batch: Vec<String> = Vec::with_capacity(batch_lines.min(1 << 16));
    let mut buf = Vec::with_capacity(4096);
    let mut bytes = 0u64;
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n > 0 {
            bytes += n as u64;
            batch.push(parser::decode_best_effort(parser::trim_record_end(&buf)).into_owned());
        }
        if batch.len() >= batch_lines || (n == 0 && !batch.is_empty()) {
            stats.merge(scan_lines_parallel(&batch, patterns, chunk_lines));
            batch.clear();
        }
        if n == 0 {
            break;
        }
    }
    stats.bytes = bytes;
    Ok(stats)
}

/// Scan a file. Fails before scanning if the file is missing or unreadable;
/// `bytes` is the file size.
pub fn scan_file(path: &Path, patterns: &PatternSet) -> Result<ScanStats> {
    scan_path(path, |reader| scan_reader(reader, patterns))
}

/// [`scan_file`] on the rayon pool, see [`scan_reader_parallel`].
pub fn scan_file_parallel(path: &Path, patterns: &PatternSet, chunk_lines: usize) -> Result<ScanStats> {
    scan_path(path, |reader| scan_reader_parallel(reader, patterns, chunk_lines))
}

fn scan_path<F>(path: &Path, scan: F) -> Result<ScanStats>
where
    F: FnOnce(BufReader<File>) -> std::io::Result<ScanStats>,
{
    let file = File::open(path).map_err(|e| InsightError::io(path, e))?;
    let size = file.metadata().map_err(|e| InsightError::io(path, e))?.len();
    let reader = BufReader::with_capacity(1 << 20, file);
    let mut stats = scan(reader).map_err(|e| InsightError::io(path, e))?;
    stats.bytes = size;
    tracing::info!(
        path = %path.display(),
        lines = stats.lines,
        http_errors = stats.http_errors,
        "scanned log"
    );
    Ok(stats)
}

/// Scan `lines` in chunks of `chunk_lines` on the rayon pool and merge the
/// per-chunk stats in input order.
pub fn scan_lines_parallel<S>(lines: &[S], patterns: &PatternSet, chunk_lines: usize) -> ScanStats
where
    S: AsRef<str> + Sync,
{
    lines
        .par_chunks(chunk_lines.max(1))
        .map(|chunk| scan_lines(chunk, patterns))
        .reduce(ScanStats::default, |mut acc, next| {
            acc.merge(next);
            acc
        })
}
