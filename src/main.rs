use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use payments_retry::config::AppConfig;
use payments_retry::gateways::mock::MockGateway;
use payments_retry::gateways::razorpay::RazorpayGateway;
use payments_retry::gateways::PaymentGateway;
use payments_retry::repo::payments_repo::PgPaymentsRepo;
use payments_retry::repo::retry_attempts_repo::PgRetryAttemptsRepo;
use payments_retry::service::retry_executor::RetryExecutor;
use payments_retry::service::retry_service::RetryService;
use payments_retry::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let payments = Arc::new(PgPaymentsRepo { pool: pool.clone() });
    let attempts = Arc::new(PgRetryAttemptsRepo { pool: pool.clone() });

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
        payments: payments.clone(),
        attempts: attempts.clone(),
        gateway,
    };
    let retry_service = RetryService {
        payments,
        attempts,
        executor,
    };

    let state = AppState {
        retry_service,
        pool,
        redis_client: redis_client.clone(),
    };

    let retry_routes = Router::new()
        .route(
            "/payments/retry",
            post(payments_retry::http::handlers::retries::manual_retry)
                .get(payments_retry::http::handlers::retries::retry_analytics),
        )
        .route(
            "/payments/retry/schedule",
            post(payments_retry::http::handlers::retries::schedule_retry),
        )
        .route(
            "/payments/retry/:id",
            get(payments_retry::http::handlers::retries::retry_status)
                .delete(payments_retry::http::handlers::retries::cancel_retry),
        )
        .layer(from_fn(
            payments_retry::http::middleware::actor_auth::require_actor,
        ));

    let app = Router::new()
        .route("/health", get(payments_retry::http::handlers::ops::health))
        .route(
            "/ops/readiness",
            get(payments_retry::http::handlers::ops::readiness),
        )
        .route(
            "/ops/liveness",
            get(payments_retry::http::handlers::ops::liveness),
        )
        .merge(retry_routes)
        .layer(from_fn_with_state(
            payments_retry::http::middleware::rate_limit::RateLimitState {
                redis_client,
                max_per_minute: cfg.rate_limit_per_minute,
            },
            payments_retry::http::middleware::rate_limit::enforce,
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
