#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payments_retry::domain::actor::AuthenticatedActor;
use payments_retry::domain::payment::{Payment, PaymentStatus};
use payments_retry::domain::retry::{NewRetryAttempt, RetryAttempt, RetryStatus};
use payments_retry::error::RetryError;
use payments_retry::gateways::{CreateOrderRequest, GatewayOrder, PaymentGateway};
use payments_retry::repo::payments_repo::PaymentStore;
use payments_retry::repo::retry_attempts_repo::RetryAttemptStore;
use payments_retry::service::retry_executor::RetryExecutor;
use payments_retry::service::retry_service::RetryService;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct InMemoryPayments {
    pub rows: Mutex<Vec<Payment>>,
}

impl InMemoryPayments {
    pub fn new(rows: Vec<Payment>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn snapshot(&self, payment_id: Uuid) -> Option<Payment> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.payment_id == payment_id)
            .cloned()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPayments {
    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, RetryError> {
        Ok(self.snapshot(payment_id))
    }

    async fn record_gateway_order(
        &self,
        payment_id: Uuid,
        gateway_order_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RetryError> {
        let mut rows = self.rows.lock().unwrap();
        let payment = rows
            .iter_mut()
            .find(|p| p.payment_id == payment_id)
            .ok_or_else(|| RetryError::NotFound("Payment not found".into()))?;
        payment.gateway_order_id = Some(gateway_order_id.to_string());
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(())
    }
}

/// Mirrors the Postgres store's contract: numbering from the full row count,
/// one SCHEDULED row per payment, conditional transitions.
#[derive(Default)]
pub struct InMemoryAttempts {
    pub rows: Mutex<Vec<RetryAttempt>>,
}

impl InMemoryAttempts {
    pub fn snapshot(&self, retry_id: Uuid) -> Option<RetryAttempt> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.retry_id == retry_id)
            .cloned()
    }

    pub fn seed(&self, attempt: RetryAttempt) {
        self.rows.lock().unwrap().push(attempt);
    }
}

#[async_trait]
impl RetryAttemptStore for InMemoryAttempts {
    async fn create(&self, new: NewRetryAttempt) -> Result<RetryAttempt, RetryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|a| a.payment_id == new.payment_id && a.status == RetryStatus::Scheduled)
        {
            return Err(RetryError::RetryNotAllowed(
                "Payment retry already scheduled".to_string(),
            ));
        }

        let attempt_number = rows
            .iter()
            .filter(|a| a.payment_id == new.payment_id)
            .count() as i32
            + 1;
        let now = Utc::now();
        let attempt = RetryAttempt {
            retry_id: Uuid::new_v4(),
            payment_id: new.payment_id,
            attempt_number,
            scheduled_for: new.scheduled_for,
            reason: new.reason,
            method: new.method,
            status: RetryStatus::Scheduled,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(attempt.clone());
        Ok(attempt)
    }

    async fn get(&self, retry_id: Uuid) -> Result<Option<RetryAttempt>, RetryError> {
        Ok(self.snapshot(retry_id))
    }

    async fn list_by_payment(&self, payment_id: Uuid) -> Result<Vec<RetryAttempt>, RetryError> {
        let mut attempts: Vec<RetryAttempt> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.payment_id == payment_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.attempt_number.cmp(&a.attempt_number));
        Ok(attempts)
    }

    async fn list_all(&self) -> Result<Vec<RetryAttempt>, RetryError> {
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
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

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.retry_id == retry_id && a.status == from)
            .ok_or_else(|| {
                RetryError::InvalidState(format!(
                    "Retry attempt is not in {} status",
                    from.as_str()
                ))
            })?;

        row.status = to;
        if let Some(reason) = failure_reason {
            row.failure_reason = Some(reason.to_string());
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RetryAttempt>, RetryError> {
        let mut due: Vec<RetryAttempt> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.status == RetryStatus::Scheduled && a.scheduled_for <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
        due.truncate(limit as usize);
        Ok(due)
    }
}

/// Counts calls so tests can assert the gateway was hit exactly once (or not
/// at all). "DECLINE" behavior rejects every order.
pub struct RecordingGateway {
    behavior: &'static str,
    calls: AtomicUsize,
}

impl RecordingGateway {
    pub fn succeeding() -> Self {
        Self {
            behavior: "SUCCESS",
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            behavior: "DECLINE",
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    fn name(&self) -> &'static str {
        "TEST"
    }

    async fn create_order(&self, _request: CreateOrderRequest) -> Result<GatewayOrder, RetryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behavior {
            "DECLINE" => Err(RetryError::Gateway("card declined by issuer".into())),
            _ => Ok(GatewayOrder {
                gateway_order_id: format!("order_test_{}", call),
            }),
        }
    }
}

pub fn payment_with_status(status: PaymentStatus) -> Payment {
    let now = Utc::now();
    Payment {
        payment_id: Uuid::new_v4(),
        amount: Decimal::new(49_900, 2),
        currency: "INR".to_string(),
        status,
        gateway_order_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_actor() -> AuthenticatedActor {
    AuthenticatedActor {
        id: Uuid::new_v4(),
        email: "ops@example.com".to_string(),
        role: "support".to_string(),
    }
}

pub struct TestHarness {
    pub service: RetryService,
    pub payments: Arc<InMemoryPayments>,
    pub attempts: Arc<InMemoryAttempts>,
    pub gateway: Arc<RecordingGateway>,
}

pub fn harness(payments: Vec<Payment>, gateway: RecordingGateway) -> TestHarness {
    let payments = Arc::new(InMemoryPayments::new(payments));
    let attempts = Arc::new(InMemoryAttempts::default());
    let gateway = Arc::new(gateway);

    let executor = RetryExecutor {
        payments: payments.clone(),
        attempts: attempts.clone(),
        gateway: gateway.clone(),
    };
    let service = RetryService {
        payments: payments.clone(),
        attempts: attempts.clone(),
        executor,
    };

    TestHarness {
        service,
        payments,
        attempts,
        gateway,
    }
}
