//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        // Cafe deletion cascades to reviews, checkins, reservations,
        // live updates and occupancy history
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create tables if they don't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cafes (
            id TEXT PRIMARY KEY,
            owner_sub TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            phone_number TEXT,
            address TEXT NOT NULL,
            city TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            website_link TEXT,
            menu_link TEXT,
            instagram_url TEXT,
            cafe_photos TEXT NOT NULL DEFAULT '[]',
            menu_photos TEXT NOT NULL DEFAULT '[]',
            amenities TEXT NOT NULL DEFAULT '[]',
            working_hours TEXT NOT NULL DEFAULT '{}',
            table_config TEXT,
            occupancy_level INTEGER,
            avg_rating REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            subject TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            preferences TEXT NOT NULL DEFAULT '{}',
            total_checkins INTEGER NOT NULL DEFAULT 0,
            total_reviews INTEGER NOT NULL DEFAULT 0,
            push_notifications INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
            user_sub TEXT NOT NULL,
            rating INTEGER NOT NULL,
            review_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checkins (
            id TEXT PRIMARY KEY,
            cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
            user_sub TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id TEXT PRIMARY KEY,
            cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
            user_sub TEXT NOT NULL,
            reservation_date TEXT NOT NULL,
            reservation_time TEXT NOT NULL,
            party_size INTEGER NOT NULL,
            special_request TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS live_updates (
            id TEXT PRIMARY KEY,
            cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
            user_sub TEXT NOT NULL,
            image_url TEXT NOT NULL,
            vibe TEXT,
            visit_purpose TEXT,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS occupancy_history (
            id TEXT PRIMARY KEY,
            cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
            occupancy_level INTEGER NOT NULL,
            total_capacity INTEGER NOT NULL,
            total_occupied INTEGER NOT NULL,
            table_config TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_cafes_city ON cafes(city);
        CREATE INDEX IF NOT EXISTS idx_reviews_cafe ON reviews(cafe_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_sub, cafe_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_checkins_user ON checkins(user_sub, cafe_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reservations_cafe ON reservations(cafe_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_sub, created_at);
        CREATE INDEX IF NOT EXISTS idx_live_updates_cafe ON live_updates(cafe_id, expires_at);
        CREATE INDEX IF NOT EXISTS idx_live_updates_user ON live_updates(user_sub, expires_at);
        CREATE INDEX IF NOT EXISTS idx_history_cafe ON occupancy_history(cafe_id, created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
