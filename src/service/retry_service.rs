use crate::domain::actor::AuthenticatedActor;
use crate::domain::payment::PaymentStatus;
use crate::domain::retry::{NewRetryAttempt, RetryAttempt, RetryMethod, RetryStatus};
use crate::error::RetryError;
use crate::repo::payments_repo::PaymentStore;
use crate::repo::retry_attempts_repo::RetryAttemptStore;
use crate::retry::analytics::{compute_snapshot, RetryAnalyticsSnapshot};
use crate::retry::delay::smart_delay_minutes;
use crate::retry::eligibility::{evaluate, RetryEligibility};
use crate::service::retry_executor::{ExecutedRetry, RetryExecutor};
use chrono::{DateTime, Utc};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_MAX_RETRIES: i32 = 3;
const MAX_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct ManualRetryRequest {
    pub payment_id: Uuid,
    pub retry_reason: String,
    pub delay_minutes: Option<i64>,
    pub max_retries: Option<i32>,
    #[serde(default = "default_notify_user")]
    pub notify_user: bool,
}

fn default_notify_user() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Immediate,
    Delayed,
    Smart,
}

impl Default for ScheduleType {
    fn default() -> Self {
        ScheduleType::Smart
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRetryRequest {
    pub payment_id: Uuid,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    pub delay_minutes: Option<i64>,
    pub max_attempts: Option<i32>,
}

/// Response for a manual retry that was queued instead of run right away.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledRetry {
    pub retry_id: Uuid,
    pub payment_id: Uuid,
    pub attempt_number: i32,
    pub status: RetryStatus,
    pub scheduled_for: DateTime<Utc>,
    pub delay_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ManualRetryOutcome {
    Executed(ExecutedRetry),
    Scheduled(ScheduledRetry),
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrySchedule {
    pub retry_id: Uuid,
    pub payment_id: Uuid,
    pub schedule_type: ScheduleType,
    pub scheduled_for: DateTime<Utc>,
    pub delay_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryStatusView {
    pub payment_id: Uuid,
    pub payment_status: PaymentStatus,
    pub attempts: Vec<RetryAttempt>,
    pub analytics: RetryAnalyticsSnapshot,
}

/// Wires eligibility, delay calculation, the attempt store and the executor
/// behind the five boundary operations.
#[derive(Clone)]
pub struct RetryService {
    pub payments: Arc<dyn PaymentStore>,
    pub attempts: Arc<dyn RetryAttemptStore>,
    pub executor: RetryExecutor,
}

impl RetryService {
    /// Creates a manual attempt and, when no delay was requested, runs it in
    /// the same call.
    pub async fn manual_retry(
        &self,
        req: ManualRetryRequest,
        actor: &AuthenticatedActor,
    ) -> Result<ManualRetryOutcome, RetryError> {
        let max_retries = validate_manual(&req)?;
        self.ensure_eligible(req.payment_id, max_retries).await?;

        let delay_minutes = req.delay_minutes.unwrap_or(0);
        let scheduled_for = Utc::now() + chrono::Duration::minutes(delay_minutes);
        let attempt = self
            .attempts
            .create(NewRetryAttempt {
                payment_id: req.payment_id,
                reason: req.retry_reason.trim().to_string(),
                method: RetryMethod::Manual,
                scheduled_for,
            })
            .await?;

        tracing::info!(
            retry_id = %attempt.retry_id,
            payment_id = %req.payment_id,
            attempt_number = attempt.attempt_number,
            delay_minutes,
            notify_user = req.notify_user,
            actor_id = %actor.id,
            actor_email = %actor.email,
            actor_role = %actor.role,
            "manual retry created"
        );

        if req.delay_minutes.is_none() {
            let executed = self.executor.execute(attempt.retry_id, actor).await?;
            return Ok(ManualRetryOutcome::Executed(executed));
        }

        Ok(ManualRetryOutcome::Scheduled(ScheduledRetry {
            retry_id: attempt.retry_id,
            payment_id: attempt.payment_id,
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            scheduled_for: attempt.scheduled_for,
            delay_minutes,
        }))
    }

    /// Queues an automatic attempt without executing it; the sweeper picks it
    /// up once `scheduled_for` passes.
    pub async fn schedule_retry(
        &self,
        req: ScheduleRetryRequest,
        actor: &AuthenticatedActor,
    ) -> Result<RetrySchedule, RetryError> {
        let (max_attempts, fixed_delay) = validate_schedule(&req)?;
        let history = self.ensure_eligible(req.payment_id, max_attempts).await?;

        let delay_minutes = match fixed_delay {
            Some(delay) => delay,
            None => {
                let failure_reasons: Vec<String> = history
                    .attempts
                    .iter()
                    .filter(|a| a.status == RetryStatus::Failed)
                    .filter_map(|a| a.failure_reason.clone())
                    .collect();
                smart_delay_minutes(
                    history.current_attempts + 1,
                    &failure_reasons,
                    &mut thread_rng(),
                )
            }
        };

        let reason = match req.schedule_type {
            ScheduleType::Immediate => "Automatic retry (immediate)",
            ScheduleType::Delayed => "Automatic retry (delayed)",
            ScheduleType::Smart => "Automatic retry (smart)",
        };
        let scheduled_for = Utc::now() + chrono::Duration::minutes(delay_minutes);
        let attempt = self
            .attempts
            .create(NewRetryAttempt {
                payment_id: req.payment_id,
                reason: reason.to_string(),
                method: RetryMethod::Automatic,
                scheduled_for,
            })
            .await?;

        tracing::info!(
            retry_id = %attempt.retry_id,
            payment_id = %req.payment_id,
            schedule_type = ?req.schedule_type,
            delay_minutes,
            actor_id = %actor.id,
            "automatic retry scheduled"
        );

        Ok(RetrySchedule {
            retry_id: attempt.retry_id,
            payment_id: attempt.payment_id,
            schedule_type: req.schedule_type,
            scheduled_for: attempt.scheduled_for,
            delay_minutes,
        })
    }

    /// Attempts for one payment, newest first, plus a payment-scoped
    /// analytics snapshot.
    pub async fn retry_status(&self, payment_id: Uuid) -> Result<RetryStatusView, RetryError> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Payment not found".into()))?;
        let attempts = self.attempts.list_by_payment(payment_id).await?;
        let analytics = compute_snapshot(&attempts);

        Ok(RetryStatusView {
            payment_id,
            payment_status: payment.status,
            attempts,
            analytics,
        })
    }

    /// Payment-scoped when an id is given, otherwise across all attempts.
    pub async fn analytics(
        &self,
        payment_id: Option<Uuid>,
    ) -> Result<RetryAnalyticsSnapshot, RetryError> {
        let attempts = match payment_id {
            Some(id) => self.attempts.list_by_payment(id).await?,
            None => self.attempts.list_all().await?,
        };
        Ok(compute_snapshot(&attempts))
    }

    /// Cancels an attempt that has not started executing.
    pub async fn cancel(
        &self,
        retry_id: Uuid,
        actor: &AuthenticatedActor,
    ) -> Result<RetryAttempt, RetryError> {
        let attempt = self
            .attempts
            .get(retry_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Retry attempt not found".into()))?;

        if attempt.status != RetryStatus::Scheduled {
            return Err(RetryError::InvalidState(
                "Can only cancel scheduled retries".into(),
            ));
        }

        self.attempts
            .transition(
                retry_id,
                RetryStatus::Scheduled,
                RetryStatus::Cancelled,
                Some("Cancelled by user"),
            )
            .await
            .map_err(|e| match e {
                // Lost the race against an executor that claimed the attempt.
                RetryError::InvalidState(_) => {
                    RetryError::InvalidState("Can only cancel scheduled retries".into())
                }
                other => other,
            })?;

        tracing::info!(
            retry_id = %retry_id,
            payment_id = %attempt.payment_id,
            actor_id = %actor.id,
            actor_email = %actor.email,
            actor_role = %actor.role,
            "retry cancelled"
        );

        self.attempts
            .get(retry_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Retry attempt not found".into()))
    }

    /// Re-runs the eligibility rules against fresh state. The store's unique
    /// constraint on scheduled attempts still backs this up against
    /// check-then-act races.
    async fn ensure_eligible(
        &self,
        payment_id: Uuid,
        max_retries: i32,
    ) -> Result<EligibleHistory, RetryError> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| RetryError::NotFound("Payment not found".into()))?;
        let attempts = self.attempts.list_by_payment(payment_id).await?;

        match evaluate(Some(&payment), &attempts, max_retries) {
            RetryEligibility::Eligible {
                current_attempts, ..
            } => Ok(EligibleHistory {
                current_attempts,
                attempts,
            }),
            RetryEligibility::Blocked { reason } => Err(RetryError::RetryNotAllowed(reason)),
        }
    }
}

struct EligibleHistory {
    current_attempts: i32,
    attempts: Vec<RetryAttempt>,
}

/// Returns the effective max retries.
fn validate_manual(req: &ManualRetryRequest) -> Result<i32, RetryError> {
    let reason = req.retry_reason.trim();
    if reason.is_empty() || reason.chars().count() > MAX_REASON_CHARS {
        return Err(RetryError::Validation(
            "Retry reason must be between 1 and 500 characters".into(),
        ));
    }
    if let Some(delay) = req.delay_minutes {
        if !(1..=1440).contains(&delay) {
            return Err(RetryError::Validation(
                "Delay must be between 1 and 1440 minutes".into(),
            ));
        }
    }
    match req.max_retries {
        Some(max) if !(1..=5).contains(&max) => Err(RetryError::Validation(
            "Max retries must be between 1 and 5".into(),
        )),
        Some(max) => Ok(max),
        None => Ok(DEFAULT_MAX_RETRIES),
    }
}

/// Returns the effective max attempts and, for IMMEDIATE/DELAYED, the fixed
/// delay; SMART resolves its delay from the attempt history later.
fn validate_schedule(req: &ScheduleRetryRequest) -> Result<(i32, Option<i64>), RetryError> {
    let max_attempts = match req.max_attempts {
        Some(max) if !(1..=5).contains(&max) => {
            return Err(RetryError::Validation(
                "Max attempts must be between 1 and 5".into(),
            ));
        }
        Some(max) => max,
        None => DEFAULT_MAX_RETRIES,
    };

    let fixed_delay = match req.schedule_type {
        ScheduleType::Immediate => Some(0),
        ScheduleType::Delayed => match req.delay_minutes {
            Some(delay) if (5..=1440).contains(&delay) => Some(delay),
            _ => {
                return Err(RetryError::Validation(
                    "Delay must be between 5 and 1440 minutes".into(),
                ));
            }
        },
        ScheduleType::Smart => None,
    };

    Ok((max_attempts, fixed_delay))
}
