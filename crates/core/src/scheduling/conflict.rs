//! Overlap and conflict detection.
//!
//! All checks are plain filters over the slots handed in; callers load the
//! relevant sessions and windows from storage first.

use classplan_shared::types::{SessionId, TrainerId};

use crate::scheduling::types::{
    AvailabilityType, AvailabilityWindow, BookedSession, Conflict, ScheduleConflict, Scheduled,
    TimeRange, TrainerSchedule,
};

/// Returns every item of `existing` whose range overlaps `candidate`.
pub fn find_conflicts<'a, T: Scheduled>(candidate: &TimeRange, existing: &'a [T]) -> Vec<&'a T> {
    existing
        .iter()
        .filter(|item| item.range().overlaps(candidate))
        .collect()
}

/// Returns every overlapping pair in `slots`, in input order.
pub fn find_pairwise_conflicts<T: Scheduled>(slots: &[T]) -> Vec<(&T, &T)> {
    let mut pairs = Vec::new();
    for (i, a) in slots.iter().enumerate() {
        let range = a.range();
        for b in &slots[i + 1..] {
            if range.overlaps(&b.range()) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Conflicts of `slot` for one trainer.
///
/// Cancelled sessions and `exclude` (the session being moved or assigned)
/// are ignored. Only `unavailable` and `booked` windows block.
pub fn trainer_conflicts(
    slot: &TimeRange,
    sessions: &[BookedSession],
    windows: &[AvailabilityWindow],
    exclude: Option<SessionId>,
) -> Vec<Conflict> {
    let session_conflicts = sessions
        .iter()
        .filter(|s| s.status.blocks_trainer())
        .filter(|s| Some(s.session_id) != exclude)
        .filter(|s| s.range.overlaps(slot))
        .map(|s| Conflict::Session {
            session_id: s.session_id,
            range: s.range,
        });

    let window_conflicts = windows
        .iter()
        .filter(|w| w.kind.blocks())
        .filter(|w| w.range.overlaps(slot))
        .map(|w| Conflict::Availability {
            availability_id: w.id,
            kind: w.kind,
            range: w.range,
        });

    session_conflicts.chain(window_conflicts).collect()
}

/// Returns true if a single `available` window fully covers `slot`.
#[must_use]
pub fn covered_by_availability(slot: &TimeRange, windows: &[AvailabilityWindow]) -> bool {
    windows
        .iter()
        .any(|w| w.kind == AvailabilityType::Available && w.range.contains(slot))
}

/// Trainers free for `slot`, in the order given.
///
/// With `require_declared` set, a trainer must also have an `available`
/// window covering the slot.
#[must_use]
pub fn available_trainers(
    slot: &TimeRange,
    candidates: &[TrainerSchedule],
    require_declared: bool,
    exclude: Option<SessionId>,
) -> Vec<TrainerId> {
    candidates
        .iter()
        .filter(|c| trainer_conflicts(slot, &c.sessions, &c.windows, exclude).is_empty())
        .filter(|c| !require_declared || covered_by_availability(slot, &c.windows))
        .map(|c| c.trainer_id)
        .collect()
}

/// Every clash inside one trainer's schedule.
///
/// Each overlapping pair of blocking sessions is reported once, on the
/// session that starts first. Sessions overlapping an `unavailable` or
/// `booked` window are reported against that window.
#[must_use]
pub fn schedule_conflicts(schedule: &TrainerSchedule) -> Vec<ScheduleConflict> {
    let mut active: Vec<&BookedSession> = schedule
        .sessions
        .iter()
        .filter(|s| s.status.blocks_trainer())
        .collect();
    active.sort_by_key(|s| (s.range.start(), s.session_id));

    let mut found = Vec::new();
    for (a, b) in find_pairwise_conflicts(&active) {
        found.push(ScheduleConflict {
            trainer_id: schedule.trainer_id,
            session_id: a.session_id,
            range: a.range,
            conflicts_with: Conflict::Session {
                session_id: b.session_id,
                range: b.range,
            },
        });
    }

    for session in active {
        for conflict in trainer_conflicts(&session.range, &[], &schedule.windows, None) {
            found.push(ScheduleConflict {
                trainer_id: schedule.trainer_id,
                session_id: session.session_id,
                range: session.range,
                conflicts_with: conflict,
            });
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use classplan_shared::types::AvailabilityId;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    fn range(from: u32, to: u32) -> TimeRange {
        TimeRange::new(at(from), at(to)).unwrap()
    }

    fn session(trainer: TrainerId, from: u32, to: u32, status: SessionStatus) -> BookedSession {
        BookedSession {
            session_id: SessionId::new(),
            trainer_id: Some(trainer),
            range: range(from, to),
            status,
        }
    }

    fn window(trainer: TrainerId, from: u32, to: u32, kind: AvailabilityType) -> AvailabilityWindow {
        AvailabilityWindow {
            id: AvailabilityId::new(),
            trainer_id: trainer,
            range: range(from, to),
            kind,
        }
    }

    #[test]
    fn test_find_conflicts() {
        let existing = vec![range(8, 9), range(9, 11), range(12, 13)];
        let hits = find_conflicts(&range(10, 12), &existing);
        assert_eq!(hits, vec![&range(9, 11)]);
    }

    #[test]
    fn test_find_pairwise_conflicts() {
        let slots = vec![range(8, 10), range(9, 11), range(10, 12), range(14, 15)];
        let pairs = find_pairwise_conflicts(&slots);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (&range(8, 10), &range(9, 11)));
        assert_eq!(pairs[1], (&range(9, 11), &range(10, 12)));
    }

    #[test]
    fn test_cancelled_sessions_do_not_block() {
        let trainer = TrainerId::new();
        let sessions = vec![session(trainer, 9, 12, SessionStatus::Cancelled)];
        assert!(trainer_conflicts(&range(10, 11), &sessions, &[], None).is_empty());
    }

    #[test]
    fn test_excluded_session_ignored() {
        let trainer = TrainerId::new();
        let booked = session(trainer, 9, 12, SessionStatus::Confirmed);
        let id = booked.session_id;
        let sessions = vec![booked];
        assert_eq!(trainer_conflicts(&range(10, 11), &sessions, &[], None).len(), 1);
        assert!(trainer_conflicts(&range(10, 11), &sessions, &[], Some(id)).is_empty());
    }

    #[test]
    fn test_blocking_windows() {
        let trainer = TrainerId::new();
        let windows = vec![
            window(trainer, 8, 18, AvailabilityType::Available),
            window(trainer, 13, 14, AvailabilityType::Unavailable),
        ];
        let conflicts = trainer_conflicts(&range(12, 15), &[], &windows, None);
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            conflicts[0],
            Conflict::Availability {
                kind: AvailabilityType::Unavailable,
                ..
            }
        ));
    }

    #[test]
    fn test_covered_by_availability() {
        let trainer = TrainerId::new();
        let windows = vec![window(trainer, 8, 12, AvailabilityType::Available)];
        assert!(covered_by_availability(&range(9, 11), &windows));
        assert!(!covered_by_availability(&range(11, 13), &windows));
        assert!(!covered_by_availability(&range(9, 11), &[]));
    }

    #[test]
    fn test_schedule_conflicts() {
        let trainer = TrainerId::new();
        let first = session(trainer, 9, 11, SessionStatus::Confirmed);
        let second = session(trainer, 10, 12, SessionStatus::Proposed);
        let dropped = session(trainer, 9, 12, SessionStatus::Cancelled);
        let late = session(trainer, 16, 17, SessionStatus::Confirmed);
        let first_id = first.session_id;
        let second_id = second.session_id;
        let late_id = late.session_id;

        let schedule = TrainerSchedule {
            trainer_id: trainer,
            sessions: vec![second, late, dropped, first],
            windows: vec![
                window(trainer, 15, 18, AvailabilityType::Unavailable),
                window(trainer, 8, 18, AvailabilityType::Available),
            ],
        };

        let found = schedule_conflicts(&schedule);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].session_id, first_id);
        assert!(matches!(
            found[0].conflicts_with,
            Conflict::Session { session_id, .. } if session_id == second_id
        ));
        assert_eq!(found[1].session_id, late_id);
        assert!(matches!(found[1].conflicts_with, Conflict::Availability { .. }));
    }

    #[test]
    fn test_available_trainers() {
        let busy = TrainerId::new();
        let free = TrainerId::new();
        let declared = TrainerId::new();
        let candidates = vec![
            TrainerSchedule {
                trainer_id: busy,
                sessions: vec![session(busy, 9, 12, SessionStatus::InProgress)],
                windows: vec![],
            },
            TrainerSchedule {
                trainer_id: free,
                ..TrainerSchedule::default()
            },
            TrainerSchedule {
                trainer_id: declared,
                sessions: vec![],
                windows: vec![window(declared, 8, 18, AvailabilityType::Available)],
            },
        ];

        let slot = range(10, 11);
        assert_eq!(
            available_trainers(&slot, &candidates, false, None),
            vec![free, declared]
        );
        assert_eq!(
            available_trainers(&slot, &candidates, true, None),
            vec![declared]
        );
    }
}
