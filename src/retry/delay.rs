use rand::Rng;

pub const BASE_DELAY_MINUTES: f64 = 5.0;
pub const MAX_DELAY_MINUTES: f64 = 120.0;

/// Adaptive backoff for automatic scheduling: base 5 minutes doubled per
/// attempt, stretched 1.5x when the recent failures look transient (network
/// or timeout), with up to 30% multiplicative jitter to spread herds.
/// `previous_failures` is ordered most recent first; only the first three are
/// consulted. The RNG is injected so tests can seed it.
pub fn smart_delay_minutes(
    attempt_count: i32,
    previous_failures: &[String],
    rng: &mut impl Rng,
) -> i64 {
    let exponential = 2f64.powi((attempt_count - 1).max(0));
    let pattern = if has_transient_pattern(previous_failures) {
        1.5
    } else {
        1.0
    };
    let jitter: f64 = rng.gen_range(0.0..0.3);

    let raw = BASE_DELAY_MINUTES * exponential * pattern * (1.0 + jitter);
    (raw.min(MAX_DELAY_MINUTES).round() as i64).max(1)
}

fn has_transient_pattern(failures: &[String]) -> bool {
    failures.iter().take(3).any(|reason| {
        let reason = reason.to_lowercase();
        reason.contains("network") || reason.contains("timeout")
    })
}
