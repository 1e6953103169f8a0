//! Core business logic for Classplan.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules and calculations live here.
//!
//! # Modules
//!
//! - `session` - Session lifecycle state machine
//! - `scheduling` - Time ranges, trainer conflicts, calendar queries
//! - `school` - School classification and calendar constraints
//! - `catalog` - Training modules, pricing, duplication
//! - `reports` - Activity aggregation and result caching
//! - `notification` - Audit events and delivery

pub mod catalog;
pub mod notification;
pub mod reports;
pub mod scheduling;
pub mod school;
pub mod session;
