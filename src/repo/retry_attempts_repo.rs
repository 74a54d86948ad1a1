use crate::domain::retry::{NewRetryAttempt, RetryAttempt, RetryMethod, RetryStatus};
use crate::error::RetryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Persistence contract for retry attempts. Creation assigns the attempt
/// number; `transition` is the single mutation path and enforces the legal
/// transition table with a conditional update.
#[async_trait]
pub trait RetryAttemptStore: Send + Sync {
    async fn create(&self, new: NewRetryAttempt) -> Result<RetryAttempt, RetryError>;

    async fn get(&self, retry_id: Uuid) -> Result<Option<RetryAttempt>, RetryError>;

    /// All attempts for one payment, newest first.
    async fn list_by_payment(&self, payment_id: Uuid) -> Result<Vec<RetryAttempt>, RetryError>;

    /// Every attempt in the system, newest first, for the global analytics view.
    async fn list_all(&self) -> Result<Vec<RetryAttempt>, RetryError>;

    /// Moves an attempt from `from` to `to`, recording `failure_reason` when
    /// given. Fails with `InvalidState` when the pair is not in the legal
    /// table or the row is no longer in `from` (zero rows affected); the
    /// zero-rows case is the mutual-exclusion gate for concurrent executions.
    async fn transition(
        &self,
        retry_id: Uuid,
        from: RetryStatus,
        to: RetryStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), RetryError>;

    /// SCHEDULED attempts whose `scheduled_for` has passed, oldest first.
    async fn due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RetryAttempt>, RetryError>;
}

/// Constraint names from the migrations; a violation of either means another
/// scheduled attempt won the race for this payment.
const ONE_SCHEDULED_INDEX: &str = "uq_payment_retries_one_scheduled";
const ATTEMPT_NUMBER_CONSTRAINT: &str = "uq_payment_retries_attempt_number";

#[derive(Clone)]
pub struct PgRetryAttemptsRepo {
    pub pool: PgPool,
}

#[async_trait]
impl RetryAttemptStore for PgRetryAttemptsRepo {
    async fn create(&self, new: NewRetryAttempt) -> Result<RetryAttempt, RetryError> {
        let retry_id = Uuid::new_v4();

        // Attempt number is computed inside the insert so the read and the
        // write cannot be split by a concurrent create; the partial unique
        // index on scheduled rows serializes creates per payment.
        let result = sqlx::query(
            r#"
            INSERT INTO payment_retries (
                retry_id, payment_id, attempt_number, scheduled_for, reason, method, status
            )
            SELECT $1, $2, COUNT(*) + 1, $3, $4, $5, 'SCHEDULED'
            FROM payment_retries
            WHERE payment_id = $2
            RETURNING retry_id, payment_id, attempt_number, scheduled_for, reason, method,
                      status, failure_reason, created_at, updated_at
            "#,
        )
        .bind(retry_id)
        .bind(new.payment_id)
        .bind(new.scheduled_for)
        .bind(&new.reason)
        .bind(new.method.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row_to_attempt(&row),
            Err(e) => {
                if let sqlx::Error::Database(db) = &e {
                    let constraint = db.constraint();
                    if constraint == Some(ONE_SCHEDULED_INDEX)
                        || constraint == Some(ATTEMPT_NUMBER_CONSTRAINT)
                    {
                        return Err(RetryError::RetryNotAllowed(
                            "Payment retry already scheduled".to_string(),
                        ));
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn get(&self, retry_id: Uuid) -> Result<Option<RetryAttempt>, RetryError> {
        let row = sqlx::query(
            r#"
            SELECT retry_id, payment_id, attempt_number, scheduled_for, reason, method,
                   status, failure_reason, created_at, updated_at
            FROM payment_retries
            WHERE retry_id = $1
            "#,
        )
        .bind(retry_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_attempt(&r)).transpose()
    }

    async fn list_by_payment(&self, payment_id: Uuid) -> Result<Vec<RetryAttempt>, RetryError> {
        let rows = sqlx::query(
            r#"
            SELECT retry_id, payment_id, attempt_number, scheduled_for, reason, method,
                   status, failure_reason, created_at, updated_at
            FROM payment_retries
            WHERE payment_id = $1
            ORDER BY attempt_number DESC
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_attempt).collect()
    }

    async fn list_all(&self) -> Result<Vec<RetryAttempt>, RetryError> {
        let rows = sqlx::query(
            r#"
            SELECT retry_id, payment_id, attempt_number, scheduled_for, reason, method,
                   status, failure_reason, created_at, updated_at
            FROM payment_retries
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_attempt).collect()
    }

    async fn transition(
        &self,
        retry_id: Uuid,
        from: RetryStatus,
        to: RetryStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), RetryError> {
        if !from.can_transition_to(to) {
            return Err(RetryError::InvalidState(format!(
                "Illegal retry transition {} -> {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE payment_retries
            SET status = $3, failure_reason = COALESCE($4, failure_reason), updated_at = now()
            WHERE retry_id = $1 AND status = $2
            "#,
        )
        .bind(retry_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(failure_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RetryError::InvalidState(format!(
                "Retry attempt is not in {} status",
                from.as_str()
            )));
        }

        Ok(())
    }

    async fn due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RetryAttempt>, RetryError> {
        let rows = sqlx::query(
            r#"
            SELECT retry_id, payment_id, attempt_number, scheduled_for, reason, method,
                   status, failure_reason, created_at, updated_at
            FROM payment_retries
            WHERE status = 'SCHEDULED' AND scheduled_for <= $1
            ORDER BY scheduled_for ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_attempt).collect()
    }
}

fn row_to_attempt(row: &PgRow) -> Result<RetryAttempt, RetryError> {
    let status_raw: String = row.get("status");
    let status = RetryStatus::parse(&status_raw).ok_or_else(|| {
        RetryError::Internal(anyhow::anyhow!("unknown retry status '{status_raw}'"))
    })?;

    let method_raw: String = row.get("method");
    let method = RetryMethod::parse(&method_raw).ok_or_else(|| {
        RetryError::Internal(anyhow::anyhow!("unknown retry method '{method_raw}'"))
    })?;

    Ok(RetryAttempt {
        retry_id: row.get("retry_id"),
        payment_id: row.get("payment_id"),
        attempt_number: row.get("attempt_number"),
        scheduled_for: row.get("scheduled_for"),
        reason: row.get("reason"),
        method,
        status,
        failure_reason: row.get("failure_reason"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
