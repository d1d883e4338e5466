use chrono::NaiveDate;
use loginsight::notes::{self, DailyDigest, NoteEntry, WeeklyDigest};
use loginsight::InsightError;
use std::io::Write;

fn entry(topic: &str, message: &str) -> NoteEntry {
    NoteEntry { ts: "2024-01-29T09:00:00".into(), topic: topic.into(), message: message.into() }
}

#[test]
fn read_notes_skips_bad_records_and_keeps_going() {
    let input = concat!(
        r#"{"ts": "2024-01-29T09:00:00", "topic": "work", "message": "Fixed the flaky test."}"#,
        "\n\n",
        "[1, 2]\n",
        "{bad json\n",
        r#"{"message": 42}"#,
        "\n",
    );
    let read = notes::read_notes(input.as_bytes()).unwrap();
    assert_eq!(read.entries.len(), 2);
    assert_eq!(read.entries[0].topic, "work");
    assert_eq!(read.entries[1].topic, "");
    assert_eq!(read.entries[1].message, "42");
    let skipped: Vec<(usize, &str)> =
        read.skipped.iter().map(|s| (s.line_number, s.reason.as_str())).collect();
    assert_eq!(skipped, vec![(3, "not_an_object"), (4, "malformed_json")]);
}

#[test]
fn read_notes_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = notes::read_notes_file(&dir.path().join("2024-01-29.jsonl")).unwrap_err();
    assert!(matches!(err, InsightError::NotFound(_)));
}

#[test]
fn new_entry_masks_pii_and_defaults_topic() {
    let ts = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap().and_hms_opt(9, 30, 0).unwrap();
    let e = NoteEntry::new(ts, Some("  "), "mail bob@example.com or call 555-1234", "general");
    assert_eq!(e.ts, "2024-01-29T09:30:00");
    assert_eq!(e.topic, "general");
    assert_eq!(e.message, "mail [email] or call [phone]");
    assert_eq!(
        e.to_json_line().unwrap(),
        r#"{"ts":"2024-01-29T09:30:00","topic":"general","message":"mail [email] or call [phone]"}"#
    );
}

#[test]
fn written_entries_read_back() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    let ts = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
    let written = NoteEntry::new(ts, Some("ops"), "Rotated the certificates.", "general");
    writeln!(f, "{}", written.to_json_line().unwrap()).unwrap();
    let read = notes::read_notes_file(f.path()).unwrap();
    assert_eq!(read.entries, vec![written]);
    assert!(read.skipped.is_empty());
}

#[test]
fn daily_digest_counts_topics_and_summarizes_messages() {
    let entries = vec![
        entry("work", "The build failed today."),
        entry("work", "The build failed today."),
        entry("", "Tests passed."),
    ];
    let digest = DailyDigest::from_entries(&entries, "general");
    assert_eq!(digest.topics["work"], 2);
    assert_eq!(digest.topics["general"], 1);
    assert_eq!(digest.key_points, vec!["The build failed today.", "Tests passed."]);
    assert_eq!(
        digest.ranked_topics(),
        vec![("work".to_string(), 2), ("general".to_string(), 1)]
    );
}

#[test]
fn empty_day_has_no_topics_or_points() {
    let digest = DailyDigest::from_entries(&[], "general");
    assert!(digest.topics.is_empty());
    assert!(digest.key_points.is_empty());
}

#[test]
fn weekly_digest_totals_topics_and_ranks_points_by_days() {
    let days = vec![
        DailyDigest {
            topics: [("work".to_string(), 2), ("home".to_string(), 1)].into_iter().collect(),
            key_points: vec!["fix bug".into(), "write docs".into()],
        },
        DailyDigest {
            topics: [("work".to_string(), 1)].into_iter().collect(),
            key_points: vec!["write docs".into(), "deploy".into(), "fix bug".into()],
        },
        DailyDigest::default(),
        DailyDigest {
            topics: [("home".to_string(), 3)].into_iter().collect(),
            key_points: vec!["fix bug".into(), "write docs".into()],
        },
    ];
    let weekly = WeeklyDigest::from_days("2024-W05", &days);
    assert_eq!(weekly.week_id, "2024-W05");
    assert_eq!(
        weekly.topic_totals,
        vec![("home".to_string(), 4), ("work".to_string(), 3)]
    );
    let texts: Vec<&str> = weekly.top_points.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["fix bug", "write docs", "deploy"]);
    assert_eq!(weekly.top_points[0].count, 3);
}

#[test]
fn iso_week_resolves_to_monday_through_sunday() {
    let span = notes::week_for_iso("2024-W05").unwrap();
    assert_eq!(span.week_id, "2024-W05");
    assert_eq!(span.days.len(), 7);
    assert_eq!(span.days[0], NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
    assert_eq!(span.days[6], NaiveDate::from_ymd_opt(2024, 2, 4).unwrap());
}

#[test]
fn invalid_week_ids_are_rejected() {
    for bad in ["2024-05", "2024-W54", "year-W01", "2024-Wxx"] {
        let err = notes::week_for_iso(bad).unwrap_err();
        assert!(matches!(err, InsightError::InvalidWeek(ref w) if w == bad), "{bad}");
    }
}

#[test]
fn week_containing_crosses_year_boundary() {
    let sunday = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
    let span = notes::week_containing(sunday);
    assert_eq!(span.week_id, "2020-W53");
    assert_eq!(span.days[0], NaiveDate::from_ymd_opt(2020, 12, 28).unwrap());
    assert_eq!(span.days[6], sunday);
}

#[test]
fn parse_date_accepts_only_plain_dates() {
    assert_eq!(notes::parse_date("2024-01-29").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
    assert!(matches!(notes::parse_date("29/01/2024"), Err(InsightError::InvalidDate(_))));
}
