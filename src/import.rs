//! Batch import orchestration
//!
//! The import saga spans two independently failable stores with no shared
//! transaction: the blob store holds the raw upload, the relational store
//! holds the validated rows. The orchestrator sequences
//!
//! 1. blob upload,
//! 2. read-back and parse of the uploaded bytes,
//! 3. one relational transaction (validate everything, then batch insert),
//! 4. audit record and, strictly after commit, the `records-imported` event,
//!
//! and compensates a failure after step 1 by deleting the blob. Cleanup
//! failures (blob delete, audit write) are logged and discarded — the first
//! failure is the one the caller sees.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob::{BlobError, BlobStore};
use crate::db::{history, movies};
use crate::models::{MovieRecord, NewImportAttempt};
use crate::notify::{DomainEvent, NotificationBus};
use crate::validate;

/// One violated constraint, addressed by record index and field path
#[derive(Debug, Clone, Serialize)]
pub struct RecordViolation {
    /// 0-based position in the original payload
    pub index: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// The initial blob write failed; no transaction was attempted and
    /// there is nothing to compensate.
    #[error("blob upload failed: {0}")]
    Upload(#[source] BlobError),

    /// The uploaded blob could not be read back for verification.
    #[error("uploaded blob could not be read back: {0}")]
    Verify(#[source] BlobError),

    /// The uploaded bytes are not a valid movie batch.
    #[error("payload could not be parsed as a movie batch: {0}")]
    Parse(#[from] serde_json::Error),

    /// One or more records violated field constraints; carries every
    /// violation found, not just the first.
    #[error("{}", describe_violations(.0))]
    Validation(Vec<RecordViolation>),

    /// The relational write (or commit) failed after validation passed.
    #[error("database write failed: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Deterministic failure requested by the caller, used to exercise the
    /// compensation path.
    #[error("simulated failure requested by caller")]
    Simulated,
}

fn describe_violations(violations: &[RecordViolation]) -> String {
    let mut out = format!("validation failed for {} field(s):", violations.len());
    for v in violations {
        let _ = write!(out, " [{}] {}: {};", v.index, v.field, v.message);
    }
    out
}

/// Result of a committed import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub imported: usize,
    pub object_key: String,
}

/// Runs the import saga; one instance is shared by all requests.
#[derive(Clone)]
pub struct ImportOrchestrator {
    db: SqlitePool,
    blob: Arc<dyn BlobStore>,
    bus: NotificationBus,
}

impl ImportOrchestrator {
    pub fn new(db: SqlitePool, blob: Arc<dyn BlobStore>, bus: NotificationBus) -> Self {
        Self { db, blob, bus }
    }

    /// Import one uploaded batch.
    ///
    /// On success the blob is retained under the returned key, the rows are
    /// committed, a SUCCESS audit row exists and subscribers have been
    /// notified. On failure no rows are committed, the blob (if created) has
    /// been deleted best-effort, and a FAILURE audit row exists.
    ///
    /// `simulate_failure` fails deterministically right after the upload
    /// step, before any transaction is opened.
    pub async fn import_batch(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        payload: &[u8],
        simulate_failure: bool,
    ) -> Result<ImportOutcome, ImportError> {
        let object_key = object_key_for(file_name);
        info!(
            object_key = %object_key,
            bytes = payload.len(),
            simulate_failure,
            "Starting batch import"
        );

        if let Err(e) = self.blob.put(&object_key, payload, content_type).await {
            let cause = ImportError::Upload(e);
            self.record_failure(&cause, None).await;
            return Err(cause);
        }

        if simulate_failure {
            return Err(self.compensate(ImportError::Simulated, &object_key).await);
        }

        // Read the upload back from the store rather than trusting the
        // request bytes; a truncated or corrupted object must fail now, not
        // at download time.
        let stored = match self.blob.get(&object_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(self.compensate(ImportError::Verify(e), &object_key).await);
            }
        };

        let records: Vec<MovieRecord> = match serde_json::from_slice(&stored) {
            Ok(records) => records,
            Err(e) => return Err(self.compensate(e.into(), &object_key).await),
        };

        let imported = match self.persist_transactionally(&records).await {
            Ok(count) => count,
            Err(e) => return Err(self.compensate(e, &object_key).await),
        };

        // The transaction is durable from here on. Audit first, then notify;
        // neither may fail the import.
        let attempt = NewImportAttempt::success(imported, &object_key);
        if let Err(e) = history::record_attempt(&self.db, &attempt).await {
            warn!(object_key = %object_key, error = %e, "Audit write failed after commit (ignored)");
        }
        self.bus.publish(DomainEvent::records_imported(imported));

        info!(object_key = %object_key, imported, "Batch import committed");
        Ok(ImportOutcome {
            imported,
            object_key,
        })
    }

    /// Validate every record and persist the batch in one transaction.
    ///
    /// All violations across all records are collected before aborting, so
    /// the caller learns about index 5 even when index 2 already failed. An
    /// empty batch is a valid import of zero records.
    async fn persist_transactionally(&self, records: &[MovieRecord]) -> Result<usize, ImportError> {
        let mut tx = self.db.begin().await?;

        let mut violations = Vec::new();
        let mut validated = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match validate::check(record) {
                Ok(movie) => validated.push(movie),
                Err(found) => violations.extend(found.into_iter().map(|v| RecordViolation {
                    index,
                    field: v.field,
                    message: v.message,
                })),
            }
        }
        if !violations.is_empty() {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback after validation failure reported an error");
            }
            return Err(ImportError::Validation(violations));
        }

        let count = movies::insert_batch(&mut tx, &validated).await?;
        tx.commit().await?;
        Ok(count)
    }

    /// Failure path after a blob was created: best-effort delete, FAILURE
    /// audit row, and hand the primary cause back unchanged.
    async fn compensate(&self, cause: ImportError, object_key: &str) -> ImportError {
        warn!(object_key = %object_key, error = %cause, "Import failed, compensating blob upload");
        if let Err(e) = self.blob.delete(object_key).await {
            warn!(object_key = %object_key, error = %e, "Compensation delete failed (ignored)");
        }
        self.record_failure(&cause, Some(object_key)).await;
        cause
    }

    async fn record_failure(&self, cause: &ImportError, object_key: Option<&str>) {
        let attempt = NewImportAttempt::failure(&cause.to_string(), object_key);
        if let Err(e) = history::record_attempt(&self.db, &attempt).await {
            warn!(error = %e, "Audit write for failed import failed itself (ignored)");
        }
    }
}

/// Object key for one upload: random id + sanitized client file name.
fn object_key_for(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", Uuid::new_v4(), sanitized)
}
