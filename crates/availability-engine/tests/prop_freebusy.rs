//! Property-based tests for free slot computation using proptest.
//!
//! These tests verify invariants that should hold for *any* sorted busy list,
//! not just the specific examples in `freebusy_tests.rs`.

use availability_engine::{compute_free_slots, merge_busy_intervals, TimeInterval};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies — generate ranges and sorted busy lists in minute offsets
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

fn minute(offset: i64) -> DateTime<Utc> {
    base() + Duration::minutes(offset)
}

/// Query range somewhere in a two-day span, possibly empty.
fn arb_range() -> impl Strategy<Value = (i64, i64)> {
    (0i64..=1440, 0i64..=1440).prop_map(|(start, len)| (start, start + len))
}

/// Busy list sorted by start, reaching outside the range on both sides.
fn arb_busy() -> impl Strategy<Value = Vec<TimeInterval>> {
    prop::collection::vec((-120i64..=3000, 0i64..=240), 0..=20).prop_map(|mut raw| {
        raw.sort_by_key(|&(start, _)| start);
        raw.into_iter()
            .map(|(start, len)| TimeInterval {
                start: minute(start),
                end: minute(start + len),
            })
            .collect()
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

/// Minute-by-minute coverage check: is `t` inside any interval of `list`?
fn covered(list: &[TimeInterval], t: DateTime<Utc>) -> usize {
    list.iter().filter(|i| i.start <= t && t < i.end).count()
}

// ---------------------------------------------------------------------------
// Property 1: free slots are ordered, non-overlapping, non-empty
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_slots_are_strictly_ordered((min, max) in arb_range(), busy in arb_busy()) {
        let free = compute_free_slots(minute(min), minute(max), &busy).unwrap();

        for slot in &free {
            prop_assert!(slot.start < slot.end, "empty slot {:?}", slot);
        }
        for pair in free.windows(2) {
            prop_assert!(
                pair[0].end < pair[1].start,
                "slots touch or overlap: {:?} / {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: free slots stay inside the query range
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_slots_are_contained_in_range((min, max) in arb_range(), busy in arb_busy()) {
        let free = compute_free_slots(minute(min), minute(max), &busy).unwrap();

        for slot in &free {
            prop_assert!(slot.start >= minute(min));
            prop_assert!(slot.end <= minute(max));
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: free ∪ clipped busy covers the range exactly once
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_and_busy_partition_the_range((min, max) in arb_range(), busy in arb_busy()) {
        let free = compute_free_slots(minute(min), minute(max), &busy).unwrap();
        let merged = merge_busy_intervals(minute(min), minute(max), &busy).unwrap();

        for m in min..max {
            let t = minute(m);
            let in_free = covered(&free, t);
            let in_busy = covered(&merged, t);
            prop_assert_eq!(in_free + in_busy, 1, "minute {} covered {} + {} times", m, in_free, in_busy);
            // A free minute must not be inside any raw busy interval either.
            if in_free == 1 {
                prop_assert_eq!(covered(&busy, t), 0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: no busy intervals means the whole range is free
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn empty_busy_list_frees_whole_range((min, max) in arb_range()) {
        let free = compute_free_slots(minute(min), minute(max), &[]).unwrap();

        if min < max {
            prop_assert_eq!(free, vec![TimeInterval { start: minute(min), end: minute(max) }]);
        } else {
            prop_assert!(free.is_empty());
        }
    }
}
