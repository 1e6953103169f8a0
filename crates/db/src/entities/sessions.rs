//! `SeaORM` Entity for sessions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SessionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub school_id: Uuid,
    pub module_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub start_at: DateTimeWithTimeZone,
    pub end_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub hours_planned: Decimal,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub hours_realized: Option<Decimal>,
    pub location: Option<String>,
    pub group_name: Option<String>,
    pub notes: Option<String>,
    pub status: SessionStatus,
    pub satisfaction: Option<i16>,
    pub proposed_start: Option<DateTimeWithTimeZone>,
    pub proposed_end: Option<DateTimeWithTimeZone>,
    pub counter_comment: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_by: Uuid,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schools::Entity",
        from = "Column::SchoolId",
        to = "super::schools::Column::Id"
    )]
    Schools,
    #[sea_orm(
        belongs_to = "super::modules::Entity",
        from = "Column::ModuleId",
        to = "super::modules::Column::Id"
    )]
    Modules,
    #[sea_orm(
        belongs_to = "super::trainers::Entity",
        from = "Column::TrainerId",
        to = "super::trainers::Column::Id"
    )]
    Trainers,
    #[sea_orm(has_many = "super::session_events::Entity")]
    SessionEvents,
}

impl Related<super::schools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schools.def()
    }
}

impl Related<super::modules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl Related<super::trainers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trainers.def()
    }
}

impl Related<super::session_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
