use crate::domain::retry::{RetryAttempt, RetryStatus};
use serde::Serialize;
use std::collections::HashMap;

pub const TOP_FAILURE_REASONS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct FailureReasonCount {
    pub reason: String,
    pub count: u64,
    pub percentage: i32,
}

/// Derived view over the attempt history; never persisted, recomputed on
/// demand, eventually consistent with in-flight executions.
#[derive(Debug, Clone, Serialize)]
pub struct RetryAnalyticsSnapshot {
    pub total_attempts: u64,
    pub successful_attempts: u64,
    pub failed_attempts: u64,
    pub success_rate: i32,
    pub top_failure_reasons: Vec<FailureReasonCount>,
}

pub fn compute_snapshot(attempts: &[RetryAttempt]) -> RetryAnalyticsSnapshot {
    let total = attempts.len() as u64;
    let successful = attempts
        .iter()
        .filter(|a| a.status == RetryStatus::Completed)
        .count() as u64;
    let failed = attempts
        .iter()
        .filter(|a| a.status == RetryStatus::Failed)
        .count() as u64;

    let success_rate = if total == 0 {
        0
    } else {
        ((successful as f64 / total as f64) * 100.0).round() as i32
    };

    let mut reason_counts: HashMap<String, u64> = HashMap::new();
    for attempt in attempts.iter().filter(|a| a.status == RetryStatus::Failed) {
        let reason = attempt
            .failure_reason
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        *reason_counts.entry(reason).or_insert(0) += 1;
    }

    let mut top: Vec<FailureReasonCount> = reason_counts
        .into_iter()
        .map(|(reason, count)| {
            let percentage = if failed == 0 {
                0
            } else {
                ((count as f64 / failed as f64) * 100.0).round() as i32
            };
            FailureReasonCount {
                reason,
                count,
                percentage,
            }
        })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
    top.truncate(TOP_FAILURE_REASONS);

    RetryAnalyticsSnapshot {
        total_attempts: total,
        successful_attempts: successful,
        failed_attempts: failed,
        success_rate,
        top_failure_reasons: top,
    }
}
