//! Import audit trail
//!
//! Each import attempt gets exactly one `import_history` row, written on the
//! pool (never inside the import transaction) so a FAILURE row survives the
//! rollback it describes. Rows are never updated or deleted.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::{ImportAttempt, ImportStatus, NewImportAttempt};

/// Detail text is bounded; anything longer is truncated on write.
const DETAILS_MAX: usize = 1024;

/// Append one attempt to the audit trail. Returns the new row id.
pub async fn record_attempt(pool: &SqlitePool, attempt: &NewImportAttempt) -> sqlx::Result<i64> {
    let details: String = attempt.details.chars().take(DETAILS_MAX).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO import_history (import_date, status, imported_count, details, object_key)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(attempt.status.as_str())
    .bind(attempt.imported_count)
    .bind(details)
    .bind(&attempt.object_key)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All attempts, newest first.
pub async fn list_attempts(pool: &SqlitePool) -> sqlx::Result<Vec<ImportAttempt>> {
    let rows = sqlx::query(
        r#"
        SELECT id, import_date, status, imported_count, details, object_key
        FROM import_history
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|row| attempt_from_row(&row)).collect()
}

/// Whether `key` was ever recorded by a past attempt. Gates the blob
/// download passthrough.
pub async fn key_recorded(pool: &SqlitePool, key: &str) -> sqlx::Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM import_history WHERE object_key = ?")
            .bind(key)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

fn attempt_from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<ImportAttempt> {
    let import_date: String = row.get("import_date");
    let import_date: DateTime<Utc> = DateTime::parse_from_rfc3339(&import_date)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);

    let status: String = row.get("status");
    let status = match status.as_str() {
        "SUCCESS" => ImportStatus::Success,
        _ => ImportStatus::Failure,
    };

    Ok(ImportAttempt {
        id: row.get("id"),
        import_date,
        status,
        imported_count: row.get("imported_count"),
        details: row.get("details"),
        object_key: row.get("object_key"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> SqlitePool {
        // one connection: every pooled connection to :memory: is its own db
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn attempts_list_newest_first() {
        let pool = pool().await;
        record_attempt(&pool, &NewImportAttempt::failure("first", None))
            .await
            .unwrap();
        record_attempt(&pool, &NewImportAttempt::success(3, "key-2"))
            .await
            .unwrap();

        let attempts = list_attempts(&pool).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].status, ImportStatus::Success);
        assert_eq!(attempts[0].imported_count, Some(3));
        assert_eq!(attempts[1].status, ImportStatus::Failure);
        assert_eq!(attempts[1].imported_count, None);
    }

    #[tokio::test]
    async fn key_recorded_only_for_seen_keys() {
        let pool = pool().await;
        record_attempt(&pool, &NewImportAttempt::success(1, "seen-key"))
            .await
            .unwrap();
        assert!(key_recorded(&pool, "seen-key").await.unwrap());
        assert!(!key_recorded(&pool, "unseen-key").await.unwrap());
    }

    #[tokio::test]
    async fn oversized_details_are_truncated() {
        let pool = pool().await;
        let long = "d".repeat(DETAILS_MAX * 2);
        record_attempt(&pool, &NewImportAttempt::failure(&long, None))
            .await
            .unwrap();
        let attempts = list_attempts(&pool).await.unwrap();
        assert_eq!(attempts[0].details.chars().count(), DETAILS_MAX);
    }
}
