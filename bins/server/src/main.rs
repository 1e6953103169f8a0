//! Classplan API Server
//!
//! Main entry point for the Classplan backend service.

mod jobs;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classplan_api::{AppState, PlanningSettings, create_router, notifier::EmailNotifier};
use classplan_core::reports::ReportCache;
use classplan_db::{ReportRepository, connect_with};
use classplan_shared::{AppConfig, EmailService, JwtConfig, JwtService};
use jobs::{ReportJobs, Schedule};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classplan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let email_service = Arc::new(EmailService::new(config.email.clone()));
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let settings =
        PlanningSettings::from_config(&config.reports, config.email.staff_email.clone())?;
    info!(
        default_hourly_rate = %settings.default_hourly_rate,
        strict_constraints = settings.strict_constraints,
        "Planning settings loaded"
    );

    let jobs = Arc::new(ReportJobs::new(
        ReportRepository::new(db.clone()),
        Arc::clone(&email_service),
        config.reports.recipients.clone(),
        settings.default_hourly_rate,
    ));
    if config.reports.weekly_enabled {
        Arc::clone(&jobs).spawn(Schedule::Weekly);
    }
    if config.reports.monthly_enabled {
        Arc::clone(&jobs).spawn(Schedule::Monthly);
    }

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        notifier: Arc::new(EmailNotifier::new(email_service)),
        report_cache: ReportCache::with_config(
            config.reports.cache_capacity,
            config.reports.cache_ttl_secs,
        ),
        settings: Arc::new(settings),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
