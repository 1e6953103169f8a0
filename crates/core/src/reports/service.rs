//! Report generation service.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use uuid::Uuid;

use super::period::ReportPeriod;
use super::types::{
    ActivityReport, ActivityTotals, BreakdownRow, ReportFilter, SessionFact,
};
use crate::session::SessionStatus;

/// Label used for sessions without a trainer.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Service for generating activity reports.
pub struct ReportService;

impl ReportService {
    /// Aggregates `facts` into totals and per-school, per-module and
    /// per-trainer breakdowns.
    ///
    /// Facts not matching `filter` are skipped. Every fact lands in exactly
    /// one row of each breakdown, so each breakdown sums to the totals.
    #[must_use]
    pub fn summarize(
        period: ReportPeriod,
        filter: ReportFilter,
        facts: &[SessionFact],
        default_rate: Decimal,
    ) -> ActivityReport {
        let mut totals = ActivityTotals::default();
        let mut by_school: BTreeMap<(String, Option<Uuid>), ActivityTotals> = BTreeMap::new();
        let mut by_module: BTreeMap<(String, Option<Uuid>), ActivityTotals> = BTreeMap::new();
        let mut by_trainer: BTreeMap<(String, Option<Uuid>), ActivityTotals> = BTreeMap::new();

        for fact in facts.iter().filter(|f| filter.matches(f)) {
            Self::add_fact(&mut totals, fact, default_rate);
            Self::add_fact(
                by_school
                    .entry((fact.school_name.clone(), Some(fact.school_id.into_inner())))
                    .or_default(),
                fact,
                default_rate,
            );
            Self::add_fact(
                by_module
                    .entry((fact.module_title.clone(), Some(fact.module_id.into_inner())))
                    .or_default(),
                fact,
                default_rate,
            );
            let trainer_key = match fact.trainer_id {
                Some(id) => (
                    fact.trainer_name.clone().unwrap_or_else(|| id.to_string()),
                    Some(id.into_inner()),
                ),
                None => (UNASSIGNED_LABEL.to_string(), None),
            };
            Self::add_fact(
                by_trainer.entry(trainer_key).or_default(),
                fact,
                default_rate,
            );
        }

        Self::finish(&mut totals);

        ActivityReport {
            report_type: "activity".to_string(),
            period,
            filter,
            generated_at: chrono::Utc::now(),
            default_hourly_rate: default_rate,
            totals,
            by_school: Self::into_rows(by_school),
            by_module: Self::into_rows(by_module),
            by_trainer: Self::into_rows(by_trainer),
            cached: false,
        }
    }

    /// Adds one session to a running total.
    fn add_fact(totals: &mut ActivityTotals, fact: &SessionFact, default_rate: Decimal) {
        let counts = &mut totals.sessions;
        counts.total += 1;
        match fact.status {
            SessionStatus::Proposed => counts.proposed += 1,
            SessionStatus::Confirmed => counts.confirmed += 1,
            SessionStatus::InProgress => counts.in_progress += 1,
            SessionStatus::Completed => counts.completed += 1,
            SessionStatus::Cancelled => counts.cancelled += 1,
        }

        if fact.status != SessionStatus::Cancelled {
            totals.hours_planned += fact.hours_planned;
        }

        if fact.status == SessionStatus::Completed {
            let realized = fact.hours_realized.unwrap_or(fact.hours_planned);
            totals.hours_realized += realized;
            totals.revenue += fact
                .pricing_type
                .revenue(fact.price, realized, default_rate);
            if realized > fact.hours_planned {
                totals.overrun_sessions += 1;
            }
        }

        if let Some(score) = fact.satisfaction {
            totals.rated_sessions += 1;
            totals.satisfaction_sum += i64::from(score);
        }
    }

    /// Computes derived figures once all facts are in.
    fn finish(totals: &mut ActivityTotals) {
        totals.average_satisfaction = average(totals.satisfaction_sum, totals.rated_sessions);
    }

    fn into_rows(groups: BTreeMap<(String, Option<Uuid>), ActivityTotals>) -> Vec<BreakdownRow> {
        groups
            .into_iter()
            .map(|((label, id), mut totals)| {
                Self::finish(&mut totals);
                BreakdownRow { id, label, totals }
            })
            .collect()
    }

    /// Plain-text rendering used for scheduled report emails.
    #[must_use]
    pub fn render_text(report: &ActivityReport) -> String {
        let mut out = String::new();
        let t = &report.totals;
        let _ = writeln!(out, "Activity report ({}): {}", report.period.kind, report.period);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Sessions: {} (completed {}, confirmed {}, in progress {}, proposed {}, cancelled {})",
            t.sessions.total,
            t.sessions.completed,
            t.sessions.confirmed,
            t.sessions.in_progress,
            t.sessions.proposed,
            t.sessions.cancelled
        );
        let _ = writeln!(out, "Hours planned: {}", t.hours_planned.normalize());
        let _ = writeln!(out, "Hours realized: {}", t.hours_realized.normalize());
        let _ = writeln!(out, "Revenue: {}", t.revenue.round_dp(2));
        match t.average_satisfaction {
            Some(avg) => {
                let _ = writeln!(out, "Satisfaction: {avg} / 5 ({} ratings)", t.rated_sessions);
            }
            None => {
                let _ = writeln!(out, "Satisfaction: no ratings");
            }
        }
        if t.overrun_sessions > 0 {
            let _ = writeln!(out, "Sessions over planned hours: {}", t.overrun_sessions);
        }

        for (title, rows) in [
            ("By school", &report.by_school),
            ("By module", &report.by_module),
            ("By trainer", &report.by_trainer),
        ] {
            if rows.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{title}:");
            for row in rows {
                let _ = writeln!(
                    out,
                    "  - {}: {} sessions, {} h realized, revenue {}",
                    row.label,
                    row.totals.sessions.total,
                    row.totals.hours_realized.normalize(),
                    row.totals.revenue.round_dp(2)
                );
            }
        }

        out
    }
}

/// Mean rounded half-up to 2 decimals; `None` without values.
fn average(sum: i64, count: u64) -> Option<Decimal> {
    if count == 0 {
        return None;
    }
    let mean = Decimal::from(sum) / Decimal::from(count);
    Some(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
