use crate::domain::payment::{Payment, PaymentStatus};
use crate::error::RetryError;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Read/update access to the payment record, narrowed to what retry
/// orchestration needs. The order subsystem owns the rest of the lifecycle.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, RetryError>;

    /// Stores the freshly created gateway order reference and moves the
    /// payment to the given status (PENDING after a successful retry).
    async fn record_gateway_order(
        &self,
        payment_id: Uuid,
        gateway_order_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RetryError>;
}

#[derive(Clone)]
pub struct PgPaymentsRepo {
    pub pool: PgPool,
}

#[async_trait]
impl PaymentStore for PgPaymentsRepo {
    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, RetryError> {
        let row = sqlx::query(
            r#"
            SELECT payment_id, amount, currency, status, gateway_order_id, created_at, updated_at
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let status_raw: String = row.get("status");
                let status = PaymentStatus::parse(&status_raw).ok_or_else(|| {
                    RetryError::Internal(anyhow::anyhow!(
                        "unknown payment status '{status_raw}' for payment {payment_id}"
                    ))
                })?;

                Ok(Some(Payment {
                    payment_id: row.get("payment_id"),
                    amount: row.get("amount"),
                    currency: row.get("currency"),
                    status,
                    gateway_order_id: row.get("gateway_order_id"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn record_gateway_order(
        &self,
        payment_id: Uuid,
        gateway_order_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RetryError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET gateway_order_id = $2, status = $3, updated_at = now()
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .bind(gateway_order_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RetryError::NotFound("Payment not found".to_string()));
        }

        Ok(())
    }
}
