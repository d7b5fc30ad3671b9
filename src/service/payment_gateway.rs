// service/payment_gateway.rs
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::service::error::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeResult {
    pub transaction_id: String,
    pub amount: i64,
    pub status: String,
}

/// Client for the external payment collaborator. The opaque authorization
/// token produced by the donation form is charged here; the engine only
/// cares whether the charge settled and under which gateway reference.
#[derive(Debug, Clone)]
pub struct PaymentGatewayService {
    base_url: String,
    secret_key: String,
    client: reqwest::Client,
}

impl PaymentGatewayService {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.gateway_base_url.clone(),
            secret_key: config.gateway_secret_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Charge an authorization token for `amount` cents. Declines and
    /// transport errors come back as distinct ServiceError variants so the
    /// ledger can record them as failed donations. Callers wrap this in a
    /// timeout; a settlement must never hang on the gateway.
    pub async fn charge(
        &self,
        payment_authorization: &str,
        amount: i64,
        reference: &str,
    ) -> Result<ChargeResult, ServiceError> {
        let payload = serde_json::json!({
            "authorization": payment_authorization,
            "amount": amount,
            "currency": "USD",
            "reference": reference,
        });

        let response = self
            .client
            .post(format!("{}/charges", self.base_url))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayUnreachable(e.to_string()))?;

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayUnreachable(e.to_string()))?;

        if response_body["status"].as_str() == Some("success") {
            let data = &response_body["data"];
            Ok(ChargeResult {
                transaction_id: data["transaction_id"].as_str().unwrap_or("").to_string(),
                amount,
                status: "success".to_string(),
            })
        } else {
            let message = response_body["message"]
                .as_str()
                .unwrap_or("Charge was declined")
                .to_string();
            Err(ServiceError::GatewayDeclined(message))
        }
    }
}
