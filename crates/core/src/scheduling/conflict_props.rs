//! Property-based tests for overlap detection.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::scheduling::conflict::{find_conflicts, find_pairwise_conflicts};
use crate::scheduling::types::TimeRange;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Ranges on a minute grid over one week.
fn arb_range() -> impl Strategy<Value = TimeRange> {
    (0i64..10_080, 1i64..600).prop_map(|(offset, len)| {
        let start = base() + Duration::minutes(offset);
        TimeRange::new(start, start + Duration::minutes(len)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// overlaps() is exactly `a.start < b.end && a.end > b.start`.
    #[test]
    fn prop_overlap_definition(a in arb_range(), b in arb_range()) {
        let expected = a.start() < b.end() && a.end() > b.start();
        prop_assert_eq!(a.overlaps(&b), expected);
    }

    /// Overlap is symmetric.
    #[test]
    fn prop_overlap_symmetric(a in arb_range(), b in arb_range()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    /// A range ending where another starts never conflicts with it.
    #[test]
    fn prop_adjacent_never_conflict(a in arb_range(), len in 1i64..600) {
        let next = TimeRange::new(a.end(), a.end() + Duration::minutes(len)).unwrap();
        prop_assert!(!a.overlaps(&next));
        prop_assert!(find_conflicts(&a, &[next]).is_empty());
    }

    /// find_conflicts returns exactly the overlapping ranges.
    #[test]
    fn prop_find_conflicts_exact(
        candidate in arb_range(),
        existing in prop::collection::vec(arb_range(), 0..20),
    ) {
        let hits = find_conflicts(&candidate, &existing);
        let expected = existing.iter().filter(|r| r.overlaps(&candidate)).count();
        prop_assert_eq!(hits.len(), expected);
        for hit in hits {
            prop_assert!(hit.overlaps(&candidate));
        }
    }

    /// Pairwise detection finds every overlapping pair once.
    #[test]
    fn prop_pairwise_count(slots in prop::collection::vec(arb_range(), 0..15)) {
        let mut expected = 0;
        for i in 0..slots.len() {
            for j in (i + 1)..slots.len() {
                if slots[i].overlaps(&slots[j]) {
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(find_pairwise_conflicts(&slots).len(), expected);
    }
}
