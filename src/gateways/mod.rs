use crate::error::RetryError;
use async_trait::async_trait;

pub mod mock;
pub mod razorpay;

/// Order-creation request sent to the gateway when a retry executes. The
/// amount is already in minor currency units; `notes` links the order back to
/// the payment and attempt it belongs to.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
}

/// The single capability this service consumes from a payment gateway.
/// Adapters must bound the call with a timeout and surface timeouts as
/// `RetryError::Gateway`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, RetryError>;
}
