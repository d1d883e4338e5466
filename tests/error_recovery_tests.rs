use loginsight::patterns::PatternSet;
use loginsight::{scanner, InsightError};
use std::io::Write;

#[test]
fn malformed_lines_never_stop_the_scan() {
    let lines = vec![
        "2024-01-01 10:00:00 ERROR first",
        "2024-99-99 99:99:99 ERROR garbage timestamp",
        "",
        "{ this is not valid json",
        "\u{0}\u{1}binary-ish ERROR",
        "2024-01-01 10:00:01 INFO last",
    ];
    let stats = scanner::scan_lines(&lines, &PatternSet::default());
    assert_eq!(stats.lines, 6);
    assert_eq!(stats.level_counts["ERROR"], 3);
    assert_eq!(stats.unparsed_timestamps, 1);
    assert_eq!(stats.timeline_by_second.len(), 2);
}

#[test]
fn invalid_utf8_file_is_scanned_best_effort() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"2024-01-01 10:00:00 ERROR \xc3\x28 bad\n\xff\xff\xff\nWARN ok\n").unwrap();
    let stats = scanner::scan_file(f.path(), &PatternSet::default()).unwrap();
    assert_eq!(stats.lines, 3);
    assert_eq!(stats.level_counts["ERROR"], 1);
    assert_eq!(stats.level_counts["WARNING"], 1);
    assert_eq!(stats.timeline_by_second.len(), 1);
}

#[test]
fn directory_input_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = scanner::scan_file(dir.path(), &PatternSet::default()).unwrap_err();
    assert!(matches!(err, InsightError::Io { .. }), "got {err}");
}

#[test]
fn not_found_message_names_the_path() {
    let err = scanner::scan_file(std::path::Path::new("/definitely/missing.log"), &PatternSet::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "input not found: /definitely/missing.log");
}
