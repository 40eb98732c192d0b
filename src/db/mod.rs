//! Database access for kinocat
//!
//! SQLite via sqlx. Schema is bootstrapped idempotently on startup.

pub mod history;
pub mod movies;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables if they don't exist
///
/// `import_history` is append-only: rows are inserted once and never
/// updated or deleted.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS coordinates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            x REAL NOT NULL,
            y INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            x REAL NOT NULL,
            y INTEGER NOT NULL,
            z REAL NOT NULL,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            eye_color TEXT NOT NULL,
            hair_color TEXT,
            birthday TEXT,
            weight REAL,
            location_id INTEGER REFERENCES locations(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            coordinates_id INTEGER NOT NULL REFERENCES coordinates(id),
            creation_date TEXT NOT NULL,
            oscars_count INTEGER,
            budget REAL NOT NULL,
            total_box_office INTEGER NOT NULL,
            mpaa_rating TEXT NOT NULL,
            director_id INTEGER NOT NULL REFERENCES persons(id),
            screenwriter_id INTEGER REFERENCES persons(id),
            operator_id INTEGER NOT NULL REFERENCES persons(id),
            length INTEGER,
            golden_palm_count INTEGER NOT NULL,
            usa_box_office INTEGER,
            tagline TEXT NOT NULL,
            genre TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            import_date TEXT NOT NULL,
            status TEXT NOT NULL,
            imported_count INTEGER,
            details TEXT NOT NULL,
            object_key TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}
