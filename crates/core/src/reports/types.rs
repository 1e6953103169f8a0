//! Report data types.

use chrono::{DateTime, Utc};
use classplan_shared::types::{ModuleId, SchoolId, SessionId, TrainerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::PricingType;
use crate::reports::period::ReportPeriod;
use crate::session::SessionStatus;

/// One session, flattened with what reporting needs from its school,
/// module and trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFact {
    /// Session id.
    pub session_id: SessionId,
    /// School id.
    pub school_id: SchoolId,
    /// School name.
    pub school_name: String,
    /// Module id.
    pub module_id: ModuleId,
    /// Module title.
    pub module_title: String,
    /// Assigned trainer.
    pub trainer_id: Option<TrainerId>,
    /// Trainer display name.
    pub trainer_name: Option<String>,
    /// Session status.
    pub status: SessionStatus,
    /// Planned hours.
    pub hours_planned: Decimal,
    /// Realized hours, once completed.
    pub hours_realized: Option<Decimal>,
    /// Module billing model.
    pub pricing_type: PricingType,
    /// Module price.
    pub price: Option<Decimal>,
    /// Satisfaction score (1..=5).
    pub satisfaction: Option<i16>,
}

/// Filters applied before aggregation. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Restrict to one school.
    pub school_id: Option<SchoolId>,
    /// Restrict to one trainer.
    pub trainer_id: Option<TrainerId>,
    /// Restrict to one module.
    pub module_id: Option<ModuleId>,
}

impl ReportFilter {
    /// Returns true if `fact` passes every set filter.
    #[must_use]
    pub fn matches(&self, fact: &SessionFact) -> bool {
        self.school_id.is_none_or(|id| id == fact.school_id)
            && self
                .trainer_id
                .is_none_or(|id| fact.trainer_id == Some(id))
            && self.module_id.is_none_or(|id| id == fact.module_id)
    }
}

/// Session counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// All sessions.
    pub total: u64,
    /// Proposed.
    pub proposed: u64,
    /// Confirmed.
    pub confirmed: u64,
    /// In progress.
    pub in_progress: u64,
    /// Completed.
    pub completed: u64,
    /// Cancelled.
    pub cancelled: u64,
}

/// Aggregated figures for a set of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTotals {
    /// Session counts.
    pub sessions: StatusCounts,
    /// Planned hours of non-cancelled sessions.
    pub hours_planned: Decimal,
    /// Realized hours of completed sessions.
    pub hours_realized: Decimal,
    /// Revenue of completed sessions.
    pub revenue: Decimal,
    /// Sessions with a satisfaction score.
    pub rated_sessions: u64,
    /// Sum of satisfaction scores.
    pub satisfaction_sum: i64,
    /// Mean satisfaction, 2 decimals.
    pub average_satisfaction: Option<Decimal>,
    /// Completed sessions that took longer than planned.
    pub overrun_sessions: u64,
}

/// One row of a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRow {
    /// Grouping key; `None` for sessions without a trainer.
    pub id: Option<Uuid>,
    /// Display label.
    pub label: String,
    /// Figures for the group.
    pub totals: ActivityTotals,
}

/// Activity report over a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Report type identifier.
    pub report_type: String,
    /// Covered period.
    pub period: ReportPeriod,
    /// Filters applied.
    pub filter: ReportFilter,
    /// Computation time.
    pub generated_at: DateTime<Utc>,
    /// Rate used for negotiable or unpriced modules.
    pub default_hourly_rate: Decimal,
    /// Figures over every session.
    pub totals: ActivityTotals,
    /// Per school.
    pub by_school: Vec<BreakdownRow>,
    /// Per module.
    pub by_module: Vec<BreakdownRow>,
    /// Per trainer.
    pub by_trainer: Vec<BreakdownRow>,
    /// Whether this report came from the cache.
    pub cached: bool,
}
