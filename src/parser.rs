use crate::config::DEFAULT_TIMESTAMP_FORMAT;
use crate::patterns::TimestampMatcher;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::borrow::Cow;

/// Year assigned when a format has no year field and inference is off.
pub const NO_YEAR: i32 = 1900;

const YEAR_FIELDS: &[char] = &['Y', 'y', 'C', 'G', 'g', 'F', 'D', 'x', 'c', '+', 's'];
const MONTH_DAY_FIELDS: &[char] = &['m', 'b', 'B', 'h', 'd', 'e', 'j', 'U', 'W', 'V', 'u', 'w', 'a', 'A'];
const TIME_FIELDS: &[char] = &['H', 'I', 'k', 'l', 'M', 'S', 'T', 'R', 'X', 'r', 'p', 'P', 'c', '+', 's'];
// `%s` and `%+` carry the full time themselves
const HOUR_FIELDS: &[char] = &['H', 'I', 'k', 'l', 'T', 'R', 'X', 'r', 'c', '+', 's'];
const MINUTE_FIELDS: &[char] = &['M', 'T', 'R', 'X', 'r', 'c', '+', 's'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampOutcome {
    Parsed(NaiveDateTime),
    /// No configured regex matched the line.
    Absent,
    /// At least one regex matched but nothing parsed under its format.
    Unparseable,
}

impl TimestampOutcome {
    pub fn parsed(self) -> Option<NaiveDateTime> {
        match self {
            TimestampOutcome::Parsed(t) => Some(t),
            _ => None,
        }
    }
}

/// Try each matcher in order; the first whose match parses wins.
pub fn extract_timestamp(line: &str, matchers: &[TimestampMatcher]) -> TimestampOutcome {
    let mut matched_any = false;
    for m in matchers {
        let Some(found) = m.regex.find(line) else { continue };
        matched_any = true;
        if let Some(dt) = parse_timestamp(found.as_str(), &m.format, m.infer_year) {
            return TimestampOutcome::Parsed(dt);
        }
    }
    if matched_any {
        TimestampOutcome::Unparseable
    } else {
        TimestampOutcome::Absent
    }
}

/// Parse `raw` with a strftime-style `format`. The whole (trimmed) input must
/// be consumed. Formats without a year field get [`NO_YEAR`], or the current
/// year when `infer_year` is set. Offsets are accepted and ignored.
///
/// When the format contains the default `%Y-%m-%d %H:%M:%S` layout, an input
/// using a `T` separator is retried with a space.
pub fn parse_timestamp(raw: &str, format: &str, infer_year: bool) -> Option<NaiveDateTime> {
    let s = raw.trim();
    parse_with_format(s, format, infer_year).or_else(|| {
        if s.contains('T') && format.contains(DEFAULT_TIMESTAMP_FORMAT) {
            NaiveDateTime::parse_from_str(&s.replace('T', " "), DEFAULT_TIMESTAMP_FORMAT).ok()
        } else {
            None
        }
    })
}

fn parse_with_format(s: &str, format: &str, infer_year: bool) -> Option<NaiveDateTime> {
    if uses_field(format, YEAR_FIELDS) {
        return parse_naive(s, format);
    }
    let year = if infer_year { Local::now().year() } else { NO_YEAR };
    if uses_field(format, MONTH_DAY_FIELDS) {
        parse_naive(&format!("{year} {s}"), &format!("%Y {format}"))
    } else {
        parse_naive(&format!("{year}-01-01 {s}"), &format!("%Y-%m-%d {format}"))
    }
}

/// Date-only formats parse as midnight. When a format has time fields, a
/// missing hour or minute defaults to zero instead of failing.
fn parse_naive(s: &str, format: &str) -> Option<NaiveDateTime> {
    if !uses_field(format, TIME_FIELDS) {
        return NaiveDate::parse_from_str(s, format).ok().map(|d| d.and_time(NaiveTime::MIN));
    }
    let mut input = s.to_string();
    let mut fmt = format.to_string();
    if !uses_field(format, HOUR_FIELDS) {
        input.push_str(" 00");
        fmt.push_str(" %H");
    }
    if !uses_field(format, MINUTE_FIELDS) {
        input.push_str(" 00");
        fmt.push_str(" %M");
    }
    NaiveDateTime::parse_from_str(&input, &fmt).ok()
}

/// Whether `format` contains a `%<spec>` directive for any of `specs`,
/// allowing the `-`, `_`, `0` padding flags.
fn uses_field(format: &str, specs: &[char]) -> bool {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        let mut next = chars.next();
        if next == Some('%') {
            continue;
        }
        if matches!(next, Some('-' | '_' | '0')) {
            next = chars.next();
        }
        if next.is_some_and(|n| specs.contains(&n)) {
            return true;
        }
    }
    false
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of failing.
pub fn decode_best_effort(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.utf8_chunks() {
                out.push_str(chunk.valid());
            }
            Cow::Owned(out)
        }
    }
}

/// Strip one trailing `\n` (and a preceding `\r`) from a raw record.
pub fn trim_record_end(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate to the containing second.
pub fn floor_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Truncate to the containing minute.
pub fn floor_minute(t: NaiveDateTime) -> NaiveDateTime {
    let t = floor_second(t);
    t.with_second(0).unwrap_or(t)
}
