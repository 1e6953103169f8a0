//! `SeaORM` Entity for schools table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PartnerStatus, SchoolType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub school_type: SchoolType,
    pub address: Option<String>,
    pub city: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub contacts: Json,
    pub timezone: String,
    pub day_start: Option<Time>,
    pub day_end: Option<Time>,
    pub working_days: Vec<i16>,
    #[sea_orm(column_type = "JsonBinary")]
    pub vacations: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub exam_periods: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub blocked_dates: Json,
    pub status: PartnerStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
