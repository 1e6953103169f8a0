//! School repository: partner schools and their calendar constraints.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use classplan_core::school::{
    ConstraintError, Contact, PartnerStatus, SchoolConstraints, SchoolType,
};
use classplan_shared::types::PageRequest;

use crate::entities::{schools, sea_orm_active_enums as db_enums, sessions};

/// Error types for school operations.
#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    /// School not found.
    #[error("School not found: {0}")]
    NotFound(Uuid),

    /// Constraint settings are invalid.
    #[error(transparent)]
    InvalidConstraints(#[from] ConstraintError),

    /// The school still has sessions.
    #[error("Cannot delete school: it has {0} sessions")]
    HasSessions(u64),

    /// Stored JSON no longer matches the expected shape.
    #[error("Corrupt school data: {0}")]
    Corrupt(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a school.
#[derive(Debug, Clone)]
pub struct CreateSchoolInput {
    /// Name.
    pub name: String,
    /// Classification.
    pub school_type: SchoolType,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Contacts.
    pub contacts: Vec<Contact>,
    /// Partnership status.
    pub status: PartnerStatus,
    /// Free notes.
    pub notes: Option<String>,
    /// Calendar constraints; defaults when absent.
    pub constraints: Option<SchoolConstraints>,
}

/// Partial update of a school. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSchoolInput {
    /// Name.
    pub name: Option<String>,
    /// Classification.
    pub school_type: Option<SchoolType>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Contacts, replaced as a whole.
    pub contacts: Option<Vec<Contact>>,
    /// Partnership status.
    pub status: Option<PartnerStatus>,
    /// Free notes.
    pub notes: Option<String>,
}

/// Filter for listing schools.
#[derive(Debug, Clone, Default)]
pub struct SchoolFilter {
    /// Partnership status.
    pub status: Option<PartnerStatus>,
    /// Classification.
    pub school_type: Option<SchoolType>,
    /// Case-insensitive match on name or city.
    pub search: Option<String>,
}

/// School repository.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    db: DatabaseConnection,
}

impl SchoolRepository {
    /// Creates a new school repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a school.
    pub async fn create(&self, input: CreateSchoolInput) -> Result<schools::Model, SchoolError> {
        let constraints = input.constraints.unwrap_or_default();
        constraints.validate()?;

        let now = Utc::now().into();
        let mut school = schools::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            school_type: Set(input.school_type.into()),
            address: Set(input.address),
            city: Set(input.city),
            contacts: Set(json!(input.contacts)),
            status: Set(input.status.into()),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        set_constraints(&mut school, &constraints);

        Ok(school.insert(&self.db).await?)
    }

    /// Finds a school by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<schools::Model, SchoolError> {
        schools::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SchoolError::NotFound(id))
    }

    /// Lists schools ordered by name.
    pub async fn list(
        &self,
        filter: &SchoolFilter,
        page: &PageRequest,
    ) -> Result<(Vec<schools::Model>, u64), SchoolError> {
        let mut query = schools::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(schools::Column::Status.eq(db_enums::PartnerStatus::from(status)));
        }
        if let Some(school_type) = filter.school_type {
            query = query
                .filter(schools::Column::SchoolType.eq(db_enums::SchoolType::from(school_type)));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(schools::Column::Name)))
                    .like(pattern.clone())
                    .or(Expr::expr(Func::lower(Expr::col(schools::Column::City))).like(pattern)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(schools::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSchoolInput,
    ) -> Result<schools::Model, SchoolError> {
        let school = self.find_by_id(id).await?;
        let mut active: schools::ActiveModel = school.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(school_type) = input.school_type {
            active.school_type = Set(school_type.into());
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(city) = input.city {
            active.city = Set(Some(city));
        }
        if let Some(contacts) = input.contacts {
            active.contacts = Set(json!(contacts));
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Replaces the calendar constraints of a school.
    pub async fn update_constraints(
        &self,
        id: Uuid,
        constraints: &SchoolConstraints,
    ) -> Result<schools::Model, SchoolError> {
        constraints.validate()?;

        let school = self.find_by_id(id).await?;
        let mut active: schools::ActiveModel = school.into();
        set_constraints(&mut active, constraints);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Calendar constraints of a school.
    pub async fn constraints(&self, id: Uuid) -> Result<SchoolConstraints, SchoolError> {
        let school = self.find_by_id(id).await?;
        school
            .constraints()
            .map_err(|e| SchoolError::Corrupt(e.to_string()))
    }

    /// Deletes a school that has no sessions.
    pub async fn delete(&self, id: Uuid) -> Result<(), SchoolError> {
        let school = self.find_by_id(id).await?;

        let sessions = sessions::Entity::find()
            .filter(sessions::Column::SchoolId.eq(id))
            .count(&self.db)
            .await?;
        if sessions > 0 {
            return Err(SchoolError::HasSessions(sessions));
        }

        schools::Entity::delete_by_id(school.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

fn set_constraints(active: &mut schools::ActiveModel, constraints: &SchoolConstraints) {
    active.timezone = Set(constraints.timezone.clone());
    active.day_start = Set(constraints.day_start);
    active.day_end = Set(constraints.day_end);
    active.working_days = Set(constraints
        .working_days
        .iter()
        .map(|d| i16::from(*d))
        .collect());
    active.vacations = Set(json!(constraints.vacations));
    active.exam_periods = Set(json!(constraints.exam_periods));
    active.blocked_dates = Set(json!(constraints.blocked_dates));
}
