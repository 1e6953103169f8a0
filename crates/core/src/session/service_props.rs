//! Property-based tests for `SessionWorkflow`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::session::error::SessionError;
use crate::session::service::{MAX_SESSION_DAYS, SessionWorkflow};
use crate::session::types::{ProposalResponse, SessionAction, SessionStatus};

fn arb_status() -> impl Strategy<Value = SessionStatus> {
    prop_oneof![
        Just(SessionStatus::Proposed),
        Just(SessionStatus::Confirmed),
        Just(SessionStatus::InProgress),
        Just(SessionStatus::Completed),
        Just(SessionStatus::Cancelled),
    ]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,40}"
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(365 * 24 * 60)).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    })
}

/// Applies every staff operation to `status` and returns the statuses reached.
fn reachable_from(status: SessionStatus, user: Uuid) -> Vec<SessionStatus> {
    [
        SessionWorkflow::confirm(status, user),
        SessionWorkflow::start(status, user),
        SessionWorkflow::complete(status, user, Decimal::ONE),
        SessionWorkflow::cancel(status, user, "reason".into()),
        SessionWorkflow::respond(status, user, ProposalResponse::Accept),
        SessionWorkflow::respond(
            status,
            user,
            ProposalResponse::Reject {
                reason: "reason".into(),
            },
        ),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .map(|action| action.new_status())
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every successful operation lands on a status the graph allows.
    #[test]
    fn prop_transitions_follow_graph(status in arb_status(), user in arb_uuid()) {
        for next in reachable_from(status, user) {
            prop_assert!(
                SessionWorkflow::is_valid_transition(status, next),
                "{} -> {} is not in the graph", status, next
            );
        }
    }

    /// Terminal statuses accept no operation.
    #[test]
    fn prop_terminal_is_final(status in arb_status(), user in arb_uuid()) {
        if status.is_terminal() {
            prop_assert!(reachable_from(status, user).is_empty());
            for to in SessionStatus::ALL {
                prop_assert!(!SessionWorkflow::is_valid_transition(status, to));
            }
        }
    }

    /// The actor is recorded on every action.
    #[test]
    fn prop_actor_recorded(user in arb_uuid(), reason in arb_reason()) {
        let action = SessionWorkflow::cancel(SessionStatus::Confirmed, user, reason.clone()).unwrap();
        prop_assert_eq!(action.actor(), user);
        if let SessionAction::Cancel { reason: recorded, .. } = action {
            prop_assert_eq!(recorded, reason);
        } else {
            prop_assert!(false, "Expected Cancel action");
        }
    }

    /// Non-proposed sessions never accept a school response.
    #[test]
    fn prop_respond_only_when_proposed(status in arb_status(), user in arb_uuid()) {
        let result = SessionWorkflow::respond(status, user, ProposalResponse::Accept);
        if status == SessionStatus::Proposed {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(SessionError::NotAwaitingResponse(_))), "expected NotAwaitingResponse");
        }
    }

    /// A counter is accepted exactly when its end is after its start and
    /// the slot stays within the maximum session length.
    #[test]
    fn prop_counter_range(a in arb_instant(), b in arb_instant(), user in arb_uuid()) {
        let result = SessionWorkflow::respond(
            SessionStatus::Proposed,
            user,
            ProposalResponse::Counter { start: a, end: b, comment: None },
        );
        if b <= a {
            prop_assert!(matches!(result, Err(SessionError::InvalidTimeRange)), "expected InvalidTimeRange");
        } else if b - a > Duration::days(MAX_SESSION_DAYS) {
            prop_assert!(matches!(result, Err(SessionError::TooLong(_))), "expected TooLong");
        } else {
            prop_assert_eq!(result.unwrap().new_status(), SessionStatus::Proposed);
        }
    }

    /// Non-negative realized hours always complete an in-progress session.
    #[test]
    fn prop_complete_hours(cents in -10_000i64..10_000, user in arb_uuid()) {
        let hours = Decimal::new(cents, 2);
        let result = SessionWorkflow::complete(SessionStatus::InProgress, user, hours);
        if cents >= 0 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(SessionError::NegativeHours(_))), "expected NegativeHours");
        }
    }
}
