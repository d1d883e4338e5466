use chrono::{NaiveDate, NaiveDateTime};
use loginsight::patterns::PatternSet;
use loginsight::scanner::{self, SAMPLE_LIMIT, SAMPLE_MAX_CHARS};
use loginsight::InsightError;
use std::io::Write;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
}

#[test]
fn single_error_line_fills_level_and_timelines() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(["2024-01-01 10:00:05 ERROR disk full"], &set);
    assert_eq!(stats.lines, 1);
    assert_eq!(stats.words, 5);
    assert_eq!(stats.level_counts.get("ERROR"), Some(&1));
    assert_eq!(stats.timeline_by_second.get(&dt(2024, 1, 1, 10, 0, 5)), Some(&1));
    assert_eq!(stats.timeline_by_minute.get(&dt(2024, 1, 1, 10, 0, 0)), Some(&1));
    assert_eq!(stats.timeline_by_minute_per_level["ERROR"].get(&dt(2024, 1, 1, 10, 0, 0)), Some(&1));
    assert_eq!(stats.first_timestamp_display().as_deref(), Some("2024-01-01 10:00:05"));
}

#[test]
fn timeline_keys_serialize_as_iso() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(["2024-01-01 10:00:05 ERROR disk full"], &set);
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["timeline_by_second"]["2024-01-01T10:00:05"], 1);
    assert_eq!(json["timeline_by_minute"]["2024-01-01T10:00:00"], 1);
    assert_eq!(json["first_timestamp"], "2024-01-01 10:00:05");
}

#[test]
fn http_codes_counted_per_match_and_lines_once() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(["GET /x 404 then 500"], &set);
    assert_eq!(stats.http_code_counts.len(), 2);
    assert_eq!(stats.http_code_counts["404"], 1);
    assert_eq!(stats.http_code_counts["500"], 1);
    assert_eq!(stats.http_errors, 1);
}

#[test]
fn line_matching_two_levels_counts_and_samples_both() {
    let set = PatternSet::default();
    let line = "2024-01-01 10:00:00 ERROR Exception raised in worker";
    let stats = scanner::scan_lines([line], &set);
    assert_eq!(stats.level_counts["ERROR"], 1);
    assert_eq!(stats.level_counts["Exception"], 1);
    assert_eq!(stats.sample_lines["ERROR"], vec![line]);
    assert_eq!(stats.sample_lines["Exception"], vec![line]);
    let minute = dt(2024, 1, 1, 10, 0, 0);
    assert_eq!(stats.timeline_by_minute_per_level["ERROR"][&minute], 1);
    assert_eq!(stats.timeline_by_minute_per_level["Exception"][&minute], 1);
    // the combined minute timeline counts the line once
    assert_eq!(stats.timeline_by_minute[&minute], 1);
}

#[test]
fn samples_keep_first_three_only() {
    let set = PatternSet::default();
    let lines: Vec<String> = (0..6).map(|i| format!("ERROR number {i}")).collect();
    let stats = scanner::scan_lines(&lines, &set);
    assert_eq!(stats.level_counts["ERROR"], 6);
    assert_eq!(stats.sample_lines["ERROR"].len(), SAMPLE_LIMIT);
    assert_eq!(stats.sample_lines["ERROR"], vec!["ERROR number 0", "ERROR number 1", "ERROR number 2"]);
}

#[test]
fn long_samples_are_truncated() {
    let set = PatternSet::default();
    let line = format!("ERROR {}", "x".repeat(500));
    let stats = scanner::scan_lines([line.as_str()], &set);
    assert_eq!(stats.sample_lines["ERROR"][0].chars().count(), SAMPLE_MAX_CHARS);
}

#[test]
fn lines_without_timestamp_skip_timelines_only() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(["WARNING upstream returned 503", "INFO started"], &set);
    assert_eq!(stats.lines, 2);
    assert_eq!(stats.level_counts["WARNING"], 1);
    assert_eq!(stats.level_counts["INFO"], 1);
    assert_eq!(stats.http_code_counts["503"], 1);
    assert!(stats.timeline_by_second.is_empty());
    assert!(stats.timeline_by_minute.is_empty());
    assert!(stats.timeline_by_minute_per_level.is_empty());
    assert!(stats.first_timestamp.is_none());
}

#[test]
fn first_and_last_follow_file_order_not_chronology() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(
        [
            "2024-01-01 12:00:00 INFO late",
            "2024-01-01 08:00:00 INFO early",
            "no timestamp",
            "2024-01-01 10:00:00 INFO middle",
        ],
        &set,
    );
    assert_eq!(stats.first_timestamp, Some(dt(2024, 1, 1, 12, 0, 0)));
    assert_eq!(stats.last_timestamp, Some(dt(2024, 1, 1, 10, 0, 0)));
}

#[test]
fn minute_bucket_equals_sum_of_its_seconds() {
    let set = PatternSet::default();
    let lines = [
        "2024-01-01 10:00:01 a",
        "2024-01-01 10:00:01 b",
        "2024-01-01T10:00:30 c",
        "2024-01-01 10:01:59 d",
        "2024-01-01 10:02:00 e",
        "2024-01-01 10:02:00 f",
    ];
    let stats = scanner::scan_lines(lines, &set);
    for (minute, count) in &stats.timeline_by_minute {
        let from_seconds: usize = stats
            .timeline_by_second
            .iter()
            .filter(|(sec, _)| loginsight::parser::floor_minute(**sec) == *minute)
            .map(|(_, c)| *c)
            .sum();
        assert_eq!(from_seconds, *count, "minute {minute}");
    }
    assert_eq!(stats.timeline_by_minute[&dt(2024, 1, 1, 10, 0, 0)], 3);
}

#[test]
fn unparseable_timestamps_are_counted_and_ignored() {
    let set = PatternSet::default();
    let stats = scanner::scan_lines(["2024-02-31 10:00:00 ERROR bogus date"], &set);
    assert_eq!(stats.unparsed_timestamps, 1);
    assert!(stats.timeline_by_second.is_empty());
    assert_eq!(stats.level_counts["ERROR"], 1);
}

#[test]
fn reader_counts_records_including_unterminated_tail() {
    let set = PatternSet::default();
    let cases: &[(&str, usize)] = &[("", 0), ("\n", 1), ("a\nb", 2), ("a\nb\n", 2), ("a\r\nb\r\n\n", 3)];
    for (input, want) in cases {
        let stats = scanner::scan_reader(input.as_bytes(), &set).unwrap();
        assert_eq!(stats.lines, *want, "input {input:?}");
        assert_eq!(stats.bytes, input.len() as u64);
    }
}

#[test]
fn undecodable_bytes_do_not_drop_the_line() {
    let set = PatternSet::default();
    let input: &[u8] = b"2024-01-01 10:00:00 ERROR \xff\xfe broken\nINFO ok\n";
    let stats = scanner::scan_reader(input, &set).unwrap();
    assert_eq!(stats.lines, 2);
    assert_eq!(stats.level_counts["ERROR"], 1);
    assert_eq!(stats.sample_lines["ERROR"], vec!["2024-01-01 10:00:00 ERROR  broken"]);
}

#[test]
fn scan_file_uses_file_size_for_bytes() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "2024-01-01 10:00:00 ERROR caf\u{e9}\nINFO done").unwrap();
    let set = PatternSet::default();
    let stats = scanner::scan_file(f.path(), &set).unwrap();
    assert_eq!(stats.lines, 2);
    assert_eq!(stats.bytes, std::fs::metadata(f.path()).unwrap().len());
    assert_eq!(stats.words, 6);
}

#[test]
fn missing_file_fails_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.log");
    let err = scanner::scan_file(&missing, &PatternSet::default()).unwrap_err();
    assert!(matches!(err, InsightError::NotFound(p) if p == missing));
}
