use chrono::Utc;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::entity::{pastille, photo, user};
use crate::utils::hash;

/// Accounts created on an empty database when `seed.demo_users` is set.
const DEMO_USERS: &[(&str, &str)] = &[
    ("alice@example.com", "Alice"),
    ("bob@example.com", "Bob"),
];

const DEMO_PASSWORD: &str = "Password123!";

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite or partial indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Photos of a pastille, oldest first.
    let photo_index = Index::create()
        .if_not_exists()
        .name("idx_photo_pastille_uploaded")
        .table(photo::Entity)
        .col(photo::Column::PastilleId)
        .col(photo::Column::UploadedAt)
        .to_owned();
    create_index(db, "idx_photo_pastille_uploaded", photo_index).await;

    // "My pastilles", newest first.
    let pastille_index = Index::create()
        .if_not_exists()
        .name("idx_pastille_creator_created")
        .table(pastille::Entity)
        .col(pastille::Column::CreatedByUserId)
        .col(pastille::Column::CreatedAt)
        .to_owned();
    create_index(db, "idx_pastille_creator_created", pastille_index).await;

    // A stored object belongs to one photo row. Legacy rows awaiting repair
    // have no key and are exempt. Same syntax on SQLite and Postgres.
    execute_index(
        db,
        "idx_photo_file_key_unique",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_photo_file_key_unique \
         ON photo (file_key) WHERE file_key <> ''",
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    let sql = match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };
    execute_index(db, name, &sql).await;
}

async fn execute_index(db: &DatabaseConnection, name: &str, sql: &str) {
    match db.execute_unprepared(sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

/// Create the demo accounts if no user exists yet.
pub async fn seed_demo_users(db: &DatabaseConnection) -> Result<(), DbErr> {
    if user::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let password_hash = hash::hash_password(DEMO_PASSWORD)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    for &(email, name) in DEMO_USERS {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.clone()),
            display_name: Set(name.to_string()),
            experience: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("Seeded {} demo users", DEMO_USERS.len());
    Ok(())
}
