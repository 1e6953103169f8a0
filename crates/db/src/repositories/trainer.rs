//! Trainer repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::extension::postgres::PgBinOper;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use classplan_shared::types::PageRequest;

use crate::entities::trainers;

/// Error types for trainer operations.
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    /// Trainer not found.
    #[error("Trainer not found: {0}")]
    NotFound(Uuid),

    /// Another trainer is linked to the same user.
    #[error("User {0} already has a trainer profile")]
    UserTaken(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a trainer.
#[derive(Debug, Clone)]
pub struct CreateTrainerInput {
    /// Linked user account.
    pub user_id: Option<Uuid>,
    /// Full name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
    /// Skill terms.
    pub skills: Vec<String>,
    /// Hourly rate.
    pub hourly_rate: Option<Decimal>,
}

/// Partial update of a trainer.
#[derive(Debug, Clone, Default)]
pub struct UpdateTrainerInput {
    /// Full name.
    pub full_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Skill terms, replaced as a whole.
    pub skills: Option<Vec<String>>,
    /// Hourly rate.
    pub hourly_rate: Option<Decimal>,
    /// Reactivate or deactivate.
    pub is_active: Option<bool>,
}

/// Filter for listing trainers.
#[derive(Debug, Clone, Default)]
pub struct TrainerFilter {
    /// Include deactivated trainers.
    pub include_inactive: bool,
    /// Trainers with this skill.
    pub skill: Option<String>,
}

/// Trainer repository.
#[derive(Debug, Clone)]
pub struct TrainerRepository {
    db: DatabaseConnection,
}

impl TrainerRepository {
    /// Creates a new trainer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a trainer.
    pub async fn create(&self, input: CreateTrainerInput) -> Result<trainers::Model, TrainerError> {
        if let Some(user_id) = input.user_id {
            let taken = trainers::Entity::find()
                .filter(trainers::Column::UserId.eq(user_id))
                .count(&self.db)
                .await?;
            if taken > 0 {
                return Err(TrainerError::UserTaken(user_id));
            }
        }

        let now = Utc::now().into();
        let trainer = trainers::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(input.user_id),
            full_name: Set(input.full_name),
            email: Set(input.email),
            phone: Set(input.phone),
            skills: Set(normalize_skills(input.skills)),
            hourly_rate: Set(input.hourly_rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(trainer.insert(&self.db).await?)
    }

    /// Finds a trainer by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<trainers::Model, TrainerError> {
        trainers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TrainerError::NotFound(id))
    }

    /// Lists trainers ordered by name.
    pub async fn list(
        &self,
        filter: &TrainerFilter,
        page: &PageRequest,
    ) -> Result<(Vec<trainers::Model>, u64), TrainerError> {
        let mut query = trainers::Entity::find();

        if !filter.include_inactive {
            query = query.filter(trainers::Column::IsActive.eq(true));
        }
        if let Some(skill) = filter
            .skill
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Expr::col(trainers::Column::Skills)
                    .binary(PgBinOper::Contains, Expr::val(vec![skill])),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(trainers::Column::FullName)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// All active trainers, optionally restricted to a skill.
    pub async fn list_active(&self, skill: Option<&str>) -> Result<Vec<trainers::Model>, DbErr> {
        let mut query = trainers::Entity::find().filter(trainers::Column::IsActive.eq(true));
        if let Some(skill) = skill.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) {
            query = query.filter(
                Expr::col(trainers::Column::Skills)
                    .binary(PgBinOper::Contains, Expr::val(vec![skill])),
            );
        }
        query
            .order_by_asc(trainers::Column::FullName)
            .all(&self.db)
            .await
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTrainerInput,
    ) -> Result<trainers::Model, TrainerError> {
        let trainer = self.find_by_id(id).await?;
        let mut active: trainers::ActiveModel = trainer.into();

        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(skills) = input.skills {
            active.skills = Set(normalize_skills(skills));
        }
        if let Some(rate) = input.hourly_rate {
            active.hourly_rate = Set(Some(rate));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deactivates a trainer. Sessions and availabilities are kept.
    pub async fn deactivate(&self, id: Uuid) -> Result<trainers::Model, TrainerError> {
        self.update(
            id,
            UpdateTrainerInput {
                is_active: Some(false),
                ..UpdateTrainerInput::default()
            },
        )
        .await
    }
}

fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut skills: Vec<String> = skills
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    skills.sort();
    skills.dedup();
    skills
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skills() {
        let skills = normalize_skills(vec![
            " Python".into(),
            "python".into(),
            "".into(),
            "SQL".into(),
        ]);
        assert_eq!(skills, vec!["python".to_string(), "sql".to_string()]);
    }
}
