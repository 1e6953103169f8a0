//! Initial schema: schools, modules, trainers, availabilities, sessions,
//! the session event log and report runs.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(CATALOG_SQL).await?;
        db.execute_unprepared(PLANNING_SQL).await?;
        db.execute_unprepared(AUDIT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE school_type AS ENUM ('primary', 'middle', 'high', 'vocational', 'higher', 'other');
CREATE TYPE partner_status AS ENUM ('prospect', 'active_partner', 'inactive_partner');
CREATE TYPE pricing_type AS ENUM ('hourly', 'fixed', 'negotiable');
CREATE TYPE session_status AS ENUM ('proposed', 'confirmed', 'in_progress', 'completed', 'cancelled');
CREATE TYPE availability_type AS ENUM ('available', 'unavailable', 'booked');
CREATE TYPE event_kind AS ENUM (
    'created', 'updated', 'confirmed', 'started', 'completed', 'cancelled',
    'accepted', 'rejected', 'countered', 'counter_applied', 'trainer_assigned'
);
CREATE TYPE recipient_role AS ENUM ('staff', 'school', 'trainer');
CREATE TYPE report_period_kind AS ENUM ('weekly', 'monthly', 'custom');
";

const CATALOG_SQL: &str = r"
CREATE TABLE schools (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    school_type school_type NOT NULL DEFAULT 'other',
    address TEXT,
    city VARCHAR(255),
    contacts JSONB NOT NULL DEFAULT '[]',
    timezone VARCHAR(64) NOT NULL DEFAULT 'Europe/Paris',
    day_start TIME,
    day_end TIME,
    working_days SMALLINT[] NOT NULL DEFAULT '{1,2,3,4,5}',
    vacations JSONB NOT NULL DEFAULT '[]',
    exam_periods JSONB NOT NULL DEFAULT '[]',
    blocked_dates JSONB NOT NULL DEFAULT '[]',
    status partner_status NOT NULL DEFAULT 'prospect',
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_school_hours CHECK (day_start IS NULL OR day_end IS NULL OR day_end > day_start)
);

CREATE INDEX idx_schools_status ON schools(status);
CREATE INDEX idx_schools_name ON schools(lower(name));

CREATE TABLE modules (
    id UUID PRIMARY KEY,
    code VARCHAR(64) NOT NULL UNIQUE,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    duration_hours NUMERIC(8, 2) NOT NULL,
    pricing_type pricing_type NOT NULL DEFAULT 'hourly',
    price NUMERIC(12, 2),
    objectives TEXT[] NOT NULL DEFAULT '{}',
    prerequisites TEXT[] NOT NULL DEFAULT '{}',
    rncp_code VARCHAR(32),
    metadata JSONB NOT NULL DEFAULT '{}',
    skills TEXT[] NOT NULL DEFAULT '{}',
    categories TEXT[] NOT NULL DEFAULT '{}',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_module_duration CHECK (duration_hours > 0),
    CONSTRAINT chk_module_price CHECK (price IS NULL OR price >= 0)
);

CREATE INDEX idx_modules_skills ON modules USING GIN (skills);
CREATE INDEX idx_modules_categories ON modules USING GIN (categories);

CREATE TABLE trainers (
    id UUID PRIMARY KEY,
    user_id UUID UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(64),
    skills TEXT[] NOT NULL DEFAULT '{}',
    hourly_rate NUMERIC(12, 2),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_trainers_active ON trainers(is_active);
";

const PLANNING_SQL: &str = r"
CREATE TABLE availabilities (
    id UUID PRIMARY KEY,
    trainer_id UUID NOT NULL REFERENCES trainers(id) ON DELETE CASCADE,
    start_at TIMESTAMPTZ NOT NULL,
    end_at TIMESTAMPTZ NOT NULL,
    availability_type availability_type NOT NULL DEFAULT 'available',
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_availability_range CHECK (end_at > start_at)
);

CREATE INDEX idx_availabilities_trainer ON availabilities(trainer_id, start_at);

CREATE TABLE sessions (
    id UUID PRIMARY KEY,
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE RESTRICT,
    module_id UUID NOT NULL REFERENCES modules(id) ON DELETE RESTRICT,
    trainer_id UUID REFERENCES trainers(id) ON DELETE SET NULL,
    start_at TIMESTAMPTZ NOT NULL,
    end_at TIMESTAMPTZ NOT NULL,
    hours_planned NUMERIC(8, 2) NOT NULL,
    hours_realized NUMERIC(8, 2),
    location TEXT,
    group_name VARCHAR(255),
    notes TEXT,
    status session_status NOT NULL DEFAULT 'proposed',
    satisfaction SMALLINT,
    proposed_start TIMESTAMPTZ,
    proposed_end TIMESTAMPTZ,
    counter_comment TEXT,
    cancel_reason TEXT,
    created_by UUID NOT NULL,
    confirmed_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_session_range CHECK (end_at > start_at),
    CONSTRAINT chk_session_planned CHECK (hours_planned > 0),
    CONSTRAINT chk_session_realized CHECK (hours_realized IS NULL OR hours_realized >= 0),
    CONSTRAINT chk_session_satisfaction CHECK (satisfaction IS NULL OR satisfaction BETWEEN 1 AND 5),
    CONSTRAINT chk_session_counter CHECK (
        (proposed_start IS NULL AND proposed_end IS NULL)
        OR (proposed_start IS NOT NULL AND proposed_end IS NOT NULL AND proposed_end > proposed_start)
    )
);

CREATE INDEX idx_sessions_start ON sessions(start_at);
CREATE INDEX idx_sessions_school ON sessions(school_id, start_at);
CREATE INDEX idx_sessions_trainer ON sessions(trainer_id, start_at) WHERE trainer_id IS NOT NULL;
CREATE INDEX idx_sessions_status ON sessions(status);
";

const AUDIT_SQL: &str = r"
-- Append-only: rows are never updated except for the read flag
CREATE TABLE session_events (
    id UUID PRIMARY KEY,
    session_id UUID NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    kind event_kind NOT NULL,
    actor UUID NOT NULL,
    recipient recipient_role NOT NULL,
    message TEXT NOT NULL,
    payload JSONB NOT NULL DEFAULT '{}',
    is_read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_session_events_session ON session_events(session_id, created_at);
CREATE INDEX idx_session_events_unread ON session_events(recipient, created_at DESC) WHERE is_read = false;

CREATE TABLE report_runs (
    id UUID PRIMARY KEY,
    period_kind report_period_kind NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    recipients INTEGER NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL,
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_report_period CHECK (period_end >= period_start)
);

CREATE INDEX idx_report_runs_created ON report_runs(created_at DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS report_runs CASCADE;
DROP TABLE IF EXISTS session_events CASCADE;
DROP TABLE IF EXISTS sessions CASCADE;
DROP TABLE IF EXISTS availabilities CASCADE;
DROP TABLE IF EXISTS trainers CASCADE;
DROP TABLE IF EXISTS modules CASCADE;
DROP TABLE IF EXISTS schools CASCADE;
DROP TYPE IF EXISTS report_period_kind;
DROP TYPE IF EXISTS recipient_role;
DROP TYPE IF EXISTS event_kind;
DROP TYPE IF EXISTS availability_type;
DROP TYPE IF EXISTS session_status;
DROP TYPE IF EXISTS pricing_type;
DROP TYPE IF EXISTS partner_status;
DROP TYPE IF EXISTS school_type;
";
