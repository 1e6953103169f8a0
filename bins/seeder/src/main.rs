//! Database seeder for Classplan development and testing.
//!
//! Seeds a partner school, a small module catalog, two trainers and their
//! availability for next week, then prints development tokens for every role.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::json;
use uuid::Uuid;

use classplan_db::entities::{
    availabilities, modules, schools,
    sea_orm_active_enums::{AvailabilityType, PartnerStatus, PricingType, SchoolType},
    trainers,
};
use classplan_shared::{AppConfig, JwtConfig, JwtService, Role};

/// Seeded school (consistent for all seeds)
const SCHOOL_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101);
/// Seeded trainers
const TRAINER_IDS: [Uuid; 2] = [
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0201),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0202),
];
/// Development users, one per role
const ADMIN_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
const STAFF_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
const SCHOOL_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);
const TRAINER_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0004);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = classplan_db::connect(&config.database.url).await?;

    println!("Seeding school...");
    seed_school(&db).await?;

    println!("Seeding modules...");
    seed_modules(&db).await?;

    println!("Seeding trainers...");
    seed_trainers(&db).await?;

    println!("Seeding availabilities...");
    seed_availabilities(&db, Utc::now().date_naive()).await?;

    println!("Seeding complete!");

    print_dev_tokens(&config)?;

    Ok(())
}

async fn seed_school(db: &DatabaseConnection) -> anyhow::Result<()> {
    if schools::Entity::find_by_id(SCHOOL_ID).one(db).await?.is_some() {
        println!("  School already exists, skipping...");
        return Ok(());
    }

    let now = Utc::now().into();
    let school = schools::ActiveModel {
        id: Set(SCHOOL_ID),
        name: Set("Lycée Jean Moulin".to_string()),
        school_type: Set(SchoolType::High),
        address: Set(Some("12 rue des Écoles".to_string())),
        city: Set(Some("Lyon".to_string())),
        contacts: Set(json!([{
            "name": "Claire Martin",
            "role": "head teacher",
            "email": "claire.martin@school.local",
            "phone": null,
        }])),
        timezone: Set("Europe/Paris".to_string()),
        day_start: Set(NaiveTime::from_hms_opt(8, 0, 0)),
        day_end: Set(NaiveTime::from_hms_opt(18, 0, 0)),
        working_days: Set(vec![1, 2, 3, 4, 5]),
        vacations: Set(json!([])),
        exam_periods: Set(json!([])),
        blocked_dates: Set(json!([])),
        status: Set(PartnerStatus::ActivePartner),
        notes: Set(Some("Seeded for local development".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    school.insert(db).await?;

    println!("  Created school: Lycée Jean Moulin");
    Ok(())
}

async fn seed_modules(db: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = [
        (
            "PY-101",
            "Python basics",
            Decimal::new(3, 0),
            PricingType::Hourly,
            Some(Decimal::new(60, 0)),
            vec!["python"],
        ),
        (
            "WEB-201",
            "Building a website",
            Decimal::new(6, 0),
            PricingType::Fixed,
            Some(Decimal::new(450, 0)),
            vec!["html", "css"],
        ),
        (
            "AI-110",
            "Introduction to AI",
            Decimal::new(25, 1),
            PricingType::Negotiable,
            None,
            vec!["python", "machine learning"],
        ),
    ];

    let mut inserted = 0;
    for (code, title, hours, pricing, price, skills) in catalog {
        let now = Utc::now().into();
        let module = modules::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.to_string()),
            title: Set(title.to_string()),
            description: Set(None),
            duration_hours: Set(hours),
            pricing_type: Set(pricing),
            price: Set(price),
            objectives: Set(vec![format!("Complete the {title} workshop")]),
            prerequisites: Set(Vec::new()),
            rncp_code: Set(None),
            metadata: Set(json!({ "level": "beginner" })),
            skills: Set(skills.into_iter().map(String::from).collect()),
            categories: Set(vec!["digital".to_string()]),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = module.insert(db).await {
            // Codes are unique; a re-run hits the constraint
            if !e.to_string().contains("duplicate key") {
                return Err(e.into());
            }
        } else {
            inserted += 1;
        }
    }

    println!("  Created {inserted} modules");
    Ok(())
}

async fn seed_trainers(db: &DatabaseConnection) -> anyhow::Result<()> {
    let people = [
        (
            TRAINER_IDS[0],
            Some(TRAINER_USER_ID),
            "Amina Diallo",
            "amina.diallo@trainers.local",
            vec!["python", "machine learning"],
            Some(Decimal::new(55, 0)),
        ),
        (
            TRAINER_IDS[1],
            None,
            "Lucas Bernard",
            "lucas.bernard@trainers.local",
            vec!["html", "css", "python"],
            None,
        ),
    ];

    for (id, user_id, name, email, skills, rate) in people {
        if trainers::Entity::find_by_id(id).one(db).await?.is_some() {
            println!("  Trainer {name} already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let trainer = trainers::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            full_name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            skills: Set(skills.into_iter().map(String::from).collect()),
            hourly_rate: Set(rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        trainer.insert(db).await?;
        println!("  Created trainer: {name}");
    }

    Ok(())
}

/// Declares every trainer available on the weekdays of the week after `today`.
async fn seed_availabilities(db: &DatabaseConnection, today: NaiveDate) -> anyhow::Result<()> {
    let until_monday = 7 - u64::from(today.weekday().num_days_from_monday());
    let Some(monday) = today.checked_add_days(Days::new(until_monday)) else {
        return Ok(());
    };
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(7, 0, 0),
        NaiveTime::from_hms_opt(17, 0, 0),
    ) else {
        return Ok(());
    };

    let mut inserted = 0;
    for trainer_id in TRAINER_IDS {
        for offset in 0..5 {
            let Some(day) = monday.checked_add_days(Days::new(offset)) else {
                continue;
            };
            let start = day.and_time(open).and_utc();

            let exists = availabilities::Entity::find()
                .filter(availabilities::Column::TrainerId.eq(trainer_id))
                .filter(availabilities::Column::StartAt.eq(start))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }

            let now = Utc::now().into();
            let window = availabilities::ActiveModel {
                id: Set(Uuid::now_v7()),
                trainer_id: Set(trainer_id),
                start_at: Set(start.into()),
                end_at: Set(day.and_time(close).and_utc().into()),
                availability_type: Set(AvailabilityType::Available),
                note: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            window.insert(db).await?;
            inserted += 1;
        }
    }

    println!("  Created {inserted} availability windows from {monday}");
    Ok(())
}

fn print_dev_tokens(config: &AppConfig) -> anyhow::Result<()> {
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let claims = [
        ("admin", jwt.claims_for(ADMIN_USER_ID, Role::Admin)),
        ("staff", jwt.claims_for(STAFF_USER_ID, Role::Staff)),
        (
            "school",
            jwt.claims_for(SCHOOL_USER_ID, Role::School)
                .with_school(SCHOOL_ID),
        ),
        (
            "trainer",
            jwt.claims_for(TRAINER_USER_ID, Role::Trainer)
                .with_trainer(TRAINER_IDS[0]),
        ),
    ];

    println!("Development tokens:");
    for (label, claims) in claims {
        println!("  {label}: {}", jwt.issue(&claims)?);
    }

    Ok(())
}
