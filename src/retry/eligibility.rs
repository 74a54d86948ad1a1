use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::retry::{RetryAttempt, RetryStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEligibility {
    Eligible {
        max_retries: i32,
        current_attempts: i32,
    },
    Blocked {
        reason: String,
    },
}

/// Ordered eligibility rules; the first match wins. Pure and side-effect
/// free, so callers may re-run it as often as they like. Cancelled attempts
/// do not burn retry budget, but every attempt row counts toward numbering.
pub fn evaluate(
    payment: Option<&Payment>,
    attempts: &[RetryAttempt],
    max_retries: i32,
) -> RetryEligibility {
    let payment = match payment {
        Some(p) => p,
        None => return blocked("Payment not found"),
    };

    match payment.status {
        PaymentStatus::Completed => return blocked("Payment already completed"),
        PaymentStatus::Cancelled => return blocked("Payment was cancelled"),
        _ => {}
    }

    let current_attempts = attempts
        .iter()
        .filter(|a| a.status != RetryStatus::Cancelled)
        .count() as i32;

    if current_attempts >= max_retries {
        return blocked(format!(
            "Maximum retry attempts ({max_retries}) reached, current attempts: {current_attempts}"
        ));
    }

    if attempts.iter().any(|a| a.status == RetryStatus::Scheduled) {
        return blocked("Payment retry already scheduled");
    }

    RetryEligibility::Eligible {
        max_retries,
        current_attempts,
    }
}

fn blocked(reason: impl Into<String>) -> RetryEligibility {
    RetryEligibility::Blocked {
        reason: reason.into(),
    }
}
