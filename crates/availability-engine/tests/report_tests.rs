//! Tests for the combined busy/free report.

use availability_engine::{
    availability_report, compute_free_slots, parse_timestamp, TimeInterval,
};
use chrono::{TimeZone, Utc};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn interval(start: &str, end: &str) -> TimeInterval {
    TimeInterval::new(parse_timestamp(start).unwrap(), parse_timestamp(end).unwrap()).unwrap()
}

// ── Report contents ─────────────────────────────────────────────────────────

#[test]
fn report_free_matches_compute_free_slots() {
    let busy = vec![
        interval("2026-03-16T09:00:00Z", "2026-03-16T10:00:00Z"),
        interval("2026-03-16T14:00:00Z", "2026-03-16T15:00:00Z"),
    ];
    let time_min = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
    let time_max = Utc.with_ymd_and_hms(2026, 3, 16, 17, 0, 0).unwrap();

    let report = availability_report(time_min, time_max, &busy).unwrap();

    assert_eq!(report.busy, busy);
    assert_eq!(report.free.len(), 3);
    assert_eq!(
        report.free,
        compute_free_slots(time_min, time_max, &busy).unwrap()
    );
}

#[test]
fn report_totals_cover_the_range() {
    let busy = vec![
        interval("2026-03-16T09:00:00Z", "2026-03-16T10:30:00Z"),
        interval("2026-03-16T10:00:00Z", "2026-03-16T11:00:00Z"),
    ];
    let time_min = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
    let time_max = Utc.with_ymd_and_hms(2026, 3, 16, 17, 0, 0).unwrap();

    let report = availability_report(time_min, time_max, &busy).unwrap();

    assert_eq!(report.busy_minutes(), 120);
    assert_eq!(report.free_minutes(), 420);
    assert_eq!(report.busy_minutes() + report.free_minutes(), 9 * 60);
}

#[test]
fn report_filters_short_slots() {
    let busy = vec![
        interval("2026-03-16T08:20:00Z", "2026-03-16T12:00:00Z"),
    ];
    let time_min = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
    let time_max = Utc.with_ymd_and_hms(2026, 3, 16, 13, 0, 0).unwrap();

    let report = availability_report(time_min, time_max, &busy).unwrap();

    assert_eq!(report.free.len(), 2);
    assert_eq!(
        report.free_at_least(30),
        vec![interval("2026-03-16T12:00:00Z", "2026-03-16T13:00:00Z")]
    );
}

#[test]
fn offset_timestamps_compare_in_utc() {
    // 09:00-05:00 is 14:00Z, so the busy block sits in the middle of the UTC range.
    let busy = vec![interval("2026-03-16T09:00:00-05:00", "2026-03-16T10:00:00-05:00")];
    let time_min = parse_timestamp("2026-03-16T12:00:00Z").unwrap();
    let time_max = parse_timestamp("2026-03-16T18:00:00Z").unwrap();

    let report = availability_report(time_min, time_max, &busy).unwrap();

    assert_eq!(
        report.free,
        vec![
            interval("2026-03-16T12:00:00Z", "2026-03-16T14:00:00Z"),
            interval("2026-03-16T15:00:00Z", "2026-03-16T18:00:00Z"),
        ]
    );
}

#[test]
fn report_serializes_rfc3339_fields() {
    let time_min = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    let time_max = Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap();

    let report = availability_report(time_min, time_max, &[]).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["range"]["time_min"], "2026-03-16T09:00:00Z");
    assert_eq!(json["free"][0]["end"], "2026-03-16T10:00:00Z");
    assert!(json["busy"].as_array().unwrap().is_empty());
}
