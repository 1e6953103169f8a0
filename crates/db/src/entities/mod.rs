//! `SeaORM` entity definitions, one module per table.

pub mod prelude;

pub mod availabilities;
pub mod modules;
pub mod report_runs;
pub mod schools;
pub mod sea_orm_active_enums;
pub mod session_events;
pub mod sessions;
pub mod trainers;
