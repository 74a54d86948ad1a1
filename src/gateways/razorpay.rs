use super::{CreateOrderRequest, GatewayOrder, PaymentGateway};
use crate::error::RetryError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Razorpay Orders API adapter. Creates one order per executed retry attempt.
pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    base_url: String,
    timeout_ms: u64,
    client: Client,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String, base_url: String, timeout_ms: u64) -> Self {
        Self {
            key_id,
            key_secret,
            base_url,
            timeout_ms,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "RAZORPAY"
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, RetryError> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = serde_json::json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "receipt": request.receipt,
            "notes": request.notes,
            "payment_capture": 1,
        });

        let sent = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(RetryError::Gateway(format!(
                    "razorpay order creation timed out after {}ms",
                    self.timeout_ms
                )));
            }
            Err(e) => {
                return Err(RetryError::Gateway(format!(
                    "razorpay request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(RetryError::Gateway(format!(
                "razorpay returned {}: {}",
                status, snippet
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RetryError::Gateway(format!("razorpay sent invalid json: {}", e)))?;

        let order_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RetryError::Gateway("razorpay response missing order id".into()))?;

        Ok(GatewayOrder {
            gateway_order_id: order_id.to_string(),
        })
    }
}
