use super::{CreateOrderRequest, GatewayOrder, PaymentGateway};
use crate::error::RetryError;
use async_trait::async_trait;
use uuid::Uuid;

/// In-process gateway for local runs and tests. The behavior string picks the
/// outcome of every call.
pub struct MockGateway {
    behavior: String,
}

impl MockGateway {
    pub fn new(behavior: impl Into<String>) -> Self {
        Self {
            behavior: behavior.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "MOCK"
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, RetryError> {
        tracing::debug!(
            receipt = %request.receipt,
            amount_minor = request.amount_minor,
            behavior = %self.behavior,
            "mock gateway handling order"
        );
        match self.behavior.as_str() {
            "ALWAYS_FAILURE" => Err(RetryError::Gateway("mock decline".into())),
            "ALWAYS_TIMEOUT" => Err(RetryError::Gateway("mock timeout".into())),
            _ => Ok(GatewayOrder {
                gateway_order_id: format!(
                    "order_mock_{}",
                    &Uuid::new_v4().simple().to_string()[..12]
                ),
            }),
        }
    }
}
