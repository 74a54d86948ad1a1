use crate::domain::actor::AuthenticatedActor;
use crate::domain::payment::PaymentStatus;
use crate::domain::retry::{RetryAttempt, RetryStatus};
use crate::error::RetryError;
use crate::gateways::{CreateOrderRequest, PaymentGateway};
use crate::repo::payments_repo::PaymentStore;
use crate::repo::retry_attempts_repo::RetryAttemptStore;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Recorded failure reasons are bounded like the request reason field.
const MAX_FAILURE_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct ExecutedRetry {
    pub retry_id: Uuid,
    pub payment_id: Uuid,
    pub attempt_number: i32,
    pub gateway_order_id: String,
    pub status: RetryStatus,
    pub amount: Decimal,
    pub currency: String,
}

/// Drives one attempt from SCHEDULED to a terminal state. The SCHEDULED to
/// PROCESSING transition is persisted before the gateway call, so a second
/// execution of the same attempt fails fast instead of charging twice.
#[derive(Clone)]
pub struct RetryExecutor {
    pub payments: Arc<dyn PaymentStore>,
    pub attempts: Arc<dyn RetryAttemptStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl RetryExecutor {
    pub async fn execute(
        &self,
        retry_id: Uuid,
        actor: &AuthenticatedActor,
    ) -> Result<ExecutedRetry, RetryError> {
        let attempt = self
            .attempts
            .get(retry_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Retry attempt not found".into()))?;

        if attempt.status != RetryStatus::Scheduled {
            return Err(RetryError::InvalidState(
                "Payment retry is not in scheduled status".into(),
            ));
        }

        tracing::info!(
            retry_id = %retry_id,
            payment_id = %attempt.payment_id,
            attempt_number = attempt.attempt_number,
            actor_id = %actor.id,
            actor_email = %actor.email,
            actor_role = %actor.role,
            "executing payment retry"
        );

        // Claim the attempt before touching the gateway. Zero rows affected
        // means another caller already has it.
        self.attempts
            .transition(
                retry_id,
                RetryStatus::Scheduled,
                RetryStatus::Processing,
                None,
            )
            .await?;

        match self.run_gateway_step(&attempt).await {
            Ok(executed) => {
                self.attempts
                    .transition(
                        retry_id,
                        RetryStatus::Processing,
                        RetryStatus::Completed,
                        None,
                    )
                    .await?;
                tracing::info!(
                    retry_id = %retry_id,
                    payment_id = %attempt.payment_id,
                    gateway_order_id = %executed.gateway_order_id,
                    "payment retry completed"
                );
                Ok(executed)
            }
            Err(e) => {
                let reason: String = e
                    .to_string()
                    .chars()
                    .take(MAX_FAILURE_REASON_CHARS)
                    .collect();
                if let Err(record_err) = self
                    .attempts
                    .transition(
                        retry_id,
                        RetryStatus::Processing,
                        RetryStatus::Failed,
                        Some(&reason),
                    )
                    .await
                {
                    tracing::error!(
                        retry_id = %retry_id,
                        error = %record_err,
                        "could not record retry failure; attempt left in PROCESSING"
                    );
                }
                tracing::warn!(
                    retry_id = %retry_id,
                    payment_id = %attempt.payment_id,
                    reason = %reason,
                    "payment retry failed"
                );
                Err(e)
            }
        }
    }

    /// Gateway call plus payment mutation. Any error here lands the attempt
    /// in FAILED with the message as the recorded reason.
    async fn run_gateway_step(&self, attempt: &RetryAttempt) -> Result<ExecutedRetry, RetryError> {
        let payment = self
            .payments
            .find_by_id(attempt.payment_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Payment not found".into()))?;

        let amount_minor = payment.amount_minor().ok_or_else(|| {
            RetryError::Internal(anyhow::anyhow!(
                "payment {} amount {} does not convert to minor units",
                payment.payment_id,
                payment.amount
            ))
        })?;

        let receipt = format!(
            "retry_{}_{}",
            &attempt.payment_id.simple().to_string()[..8],
            Utc::now().timestamp()
        );
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount_minor,
                currency: payment.currency.clone(),
                receipt,
                notes: serde_json::json!({
                    "payment_id": attempt.payment_id,
                    "retry_id": attempt.retry_id,
                    "attempt_number": attempt.attempt_number,
                }),
            })
            .await?;

        self.payments
            .record_gateway_order(
                attempt.payment_id,
                &order.gateway_order_id,
                PaymentStatus::Pending,
            )
            .await?;

        Ok(ExecutedRetry {
            retry_id: attempt.retry_id,
            payment_id: attempt.payment_id,
            attempt_number: attempt.attempt_number,
            gateway_order_id: order.gateway_order_id,
            status: RetryStatus::Completed,
            amount: payment.amount,
            currency: payment.currency,
        })
    }
}
