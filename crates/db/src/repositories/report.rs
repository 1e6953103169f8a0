//! Report repository: session facts for activity reports and the log of
//! scheduled report runs.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use classplan_core::reports::{ReportFilter, ReportPeriod, SessionFact};

use crate::entities::{modules, report_runs, schools, sessions, trainers};

/// Outcome of a scheduled report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Email sent.
    Sent,
    /// Nothing to send to.
    Skipped,
    /// Sending failed.
    Failed,
}

impl RunStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Facts for sessions starting inside `period`.
    ///
    /// Names are resolved with one query per referenced table.
    pub async fn load_facts(
        &self,
        period: &ReportPeriod,
        filter: &ReportFilter,
    ) -> Result<Vec<SessionFact>, DbErr> {
        let (from, to) = period.utc_bounds();
        let mut query = sessions::Entity::find()
            .filter(sessions::Column::StartAt.gte(from))
            .filter(sessions::Column::StartAt.lt(to));
        if let Some(id) = filter.school_id {
            query = query.filter(sessions::Column::SchoolId.eq(id.into_inner()));
        }
        if let Some(id) = filter.trainer_id {
            query = query.filter(sessions::Column::TrainerId.eq(id.into_inner()));
        }
        if let Some(id) = filter.module_id {
            query = query.filter(sessions::Column::ModuleId.eq(id.into_inner()));
        }
        let rows = query
            .order_by_asc(sessions::Column::StartAt)
            .all(&self.db)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let school_names: HashMap<Uuid, String> = schools::Entity::find()
            .filter(schools::Column::Id.is_in(distinct(rows.iter().map(|r| r.school_id))))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let modules: HashMap<Uuid, modules::Model> = modules::Entity::find()
            .filter(modules::Column::Id.is_in(distinct(rows.iter().map(|r| r.module_id))))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let trainer_ids = distinct(rows.iter().filter_map(|r| r.trainer_id));
        let trainer_names: HashMap<Uuid, String> = if trainer_ids.is_empty() {
            HashMap::new()
        } else {
            trainers::Entity::find()
                .filter(trainers::Column::Id.is_in(trainer_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|t| (t.id, t.full_name))
                .collect()
        };

        let facts = rows
            .into_iter()
            .filter_map(|row| {
                let module = modules.get(&row.module_id)?;
                Some(SessionFact {
                    session_id: row.id.into(),
                    school_id: row.school_id.into(),
                    school_name: school_names
                        .get(&row.school_id)
                        .cloned()
                        .unwrap_or_default(),
                    module_id: row.module_id.into(),
                    module_title: module.title.clone(),
                    trainer_id: row.trainer_id.map(Into::into),
                    trainer_name: row.trainer_id.and_then(|id| trainer_names.get(&id).cloned()),
                    status: row.status.into(),
                    hours_planned: row.hours_planned,
                    hours_realized: row.hours_realized,
                    pricing_type: module.pricing_type.into(),
                    price: module.price,
                    satisfaction: row.satisfaction,
                })
            })
            .collect();

        Ok(facts)
    }

    /// Records a scheduled report run.
    pub async fn record_run(
        &self,
        period: &ReportPeriod,
        recipients: usize,
        status: RunStatus,
        error: Option<String>,
    ) -> Result<report_runs::Model, DbErr> {
        let run = report_runs::ActiveModel {
            id: Set(Uuid::now_v7()),
            period_kind: Set(period.kind.into()),
            period_start: Set(period.start),
            period_end: Set(period.end),
            recipients: Set(i32::try_from(recipients).unwrap_or(i32::MAX)),
            status: Set(status.as_str().to_string()),
            error: Set(error),
            created_at: Set(Utc::now().into()),
        };
        run.insert(&self.db).await
    }

    /// Most recent runs first.
    pub async fn recent_runs(&self, limit: u64) -> Result<Vec<report_runs::Model>, DbErr> {
        report_runs::Entity::find()
            .order_by_desc(report_runs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}

fn distinct(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_ids() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_eq!(distinct([b, a, b, a].into_iter()), vec![a, b]);
    }

    #[test]
    fn test_run_status_str() {
        assert_eq!(RunStatus::Sent.as_str(), "sent");
        assert_eq!(RunStatus::Failed.as_str(), "failed");
    }
}
