use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryStatus {
    Scheduled,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RetryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryStatus::Scheduled => "SCHEDULED",
            RetryStatus::Processing => "PROCESSING",
            RetryStatus::Completed => "COMPLETED",
            RetryStatus::Failed => "FAILED",
            RetryStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(RetryStatus::Scheduled),
            "PROCESSING" => Some(RetryStatus::Processing),
            "COMPLETED" => Some(RetryStatus::Completed),
            "FAILED" => Some(RetryStatus::Failed),
            "CANCELLED" => Some(RetryStatus::Cancelled),
            _ => None,
        }
    }

    /// Legal moves: SCHEDULED may begin execution or be cancelled; PROCESSING
    /// ends in COMPLETED or FAILED. All three end states are terminal.
    pub fn can_transition_to(self, next: RetryStatus) -> bool {
        matches!(
            (self, next),
            (RetryStatus::Scheduled, RetryStatus::Processing)
                | (RetryStatus::Scheduled, RetryStatus::Cancelled)
                | (RetryStatus::Processing, RetryStatus::Completed)
                | (RetryStatus::Processing, RetryStatus::Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryMethod {
    Manual,
    Automatic,
}

impl RetryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryMethod::Manual => "MANUAL",
            RetryMethod::Automatic => "AUTOMATIC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(RetryMethod::Manual),
            "AUTOMATIC" => Some(RetryMethod::Automatic),
            _ => None,
        }
    }
}

/// One scheduled or executed attempt to retry a payment. Attempt numbers are
/// 1-based and gap-free per payment; at most one SCHEDULED row may exist per
/// payment at any time.
#[derive(Debug, Clone, Serialize)]
pub struct RetryAttempt {
    pub retry_id: Uuid,
    pub payment_id: Uuid,
    pub attempt_number: i32,
    pub scheduled_for: DateTime<Utc>,
    pub reason: String,
    pub method: RetryMethod,
    pub status: RetryStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRetryAttempt {
    pub payment_id: Uuid,
    pub reason: String,
    pub method: RetryMethod,
    pub scheduled_for: DateTime<Utc>,
}
