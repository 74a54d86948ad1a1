pub mod config;
pub mod error;
pub mod domain {
    pub mod actor;
    pub mod payment;
    pub mod retry;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod retries;
    }
    pub mod middleware {
        pub mod actor_auth;
        pub mod rate_limit;
    }
}
pub mod repo {
    pub mod payments_repo;
    pub mod retry_attempts_repo;
}
pub mod retry {
    pub mod analytics;
    pub mod delay;
    pub mod eligibility;
}
pub mod service {
    pub mod retry_executor;
    pub mod retry_service;
}

#[derive(Clone)]
pub struct AppState {
    pub retry_service: service::retry_service::RetryService,
    pub pool: sqlx::PgPool,
    pub redis_client: redis::Client,
}
