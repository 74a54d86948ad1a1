use payments_retry::config::AppConfig;
use payments_retry::domain::actor::AuthenticatedActor;
use payments_retry::gateways::mock::MockGateway;
use payments_retry::gateways::razorpay::RazorpayGateway;
use payments_retry::gateways::PaymentGateway;
use payments_retry::repo::payments_repo::PgPaymentsRepo;
use payments_retry::repo::retry_attempts_repo::{PgRetryAttemptsRepo, RetryAttemptStore};
use payments_retry::service::retry_executor::RetryExecutor;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Fires SCHEDULED attempts whose scheduled_for has passed. The executor's
/// processing gate makes this safe to run alongside the API and alongside a
/// second sweeper instance.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;

    let payments = Arc::new(PgPaymentsRepo { pool: pool.clone() });
    let attempts: Arc<dyn RetryAttemptStore> = Arc::new(PgRetryAttemptsRepo { pool });

    let gateway: Arc<dyn PaymentGateway> = if cfg.gateway_adapter == "MOCK" {
        Arc::new(MockGateway::new(cfg.mock_gateway_behavior.clone()))
    } else {
        Arc::new(RazorpayGateway::new(
            cfg.razorpay_key_id.clone(),
            cfg.razorpay_key_secret.clone(),
            cfg.razorpay_base_url.clone(),
            cfg.gateway_timeout_ms,
        ))
    };

    let executor = RetryExecutor {
        payments,
        attempts: attempts.clone(),
        gateway,
    };
    let actor = AuthenticatedActor::system();

    tracing::info!(
        interval_secs = cfg.sweep_interval_secs,
        batch_size = cfg.sweep_batch_size,
        "retry sweeper started"
    );

    loop {
        if let Err(err) = sweep_once(&attempts, &executor, &actor, cfg.sweep_batch_size).await {
            tracing::error!("retry sweep error: {}", err);
        }
        tokio::time::sleep(std::time::Duration::from_secs(cfg.sweep_interval_secs)).await;
    }
}

async fn sweep_once(
    attempts: &Arc<dyn RetryAttemptStore>,
    executor: &RetryExecutor,
    actor: &AuthenticatedActor,
    batch_size: i64,
) -> anyhow::Result<()> {
    let due = attempts.due_scheduled(chrono::Utc::now(), batch_size).await?;
    if due.is_empty() {
        return Ok(());
    }

    tracing::info!(count = due.len(), "executing due retry attempts");
    for attempt in due {
        match executor.execute(attempt.retry_id, actor).await {
            Ok(executed) => tracing::info!(
                retry_id = %executed.retry_id,
                payment_id = %executed.payment_id,
                gateway_order_id = %executed.gateway_order_id,
                "due retry executed"
            ),
            // Gateway declines land the attempt in FAILED; a lost race with
            // a concurrent execution surfaces as InvalidState. Neither stops
            // the sweep.
            Err(e) => tracing::warn!(
                retry_id = %attempt.retry_id,
                payment_id = %attempt.payment_id,
                error = %e,
                "due retry did not complete"
            ),
        }
    }

    Ok(())
}
