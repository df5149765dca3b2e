use rand::Rng;
use serde_json::{json, Value};

use crate::config::CashfreeConfig;
use crate::error::{AppError, AppResult};

const API_VERSION: &str = "2023-08-01";

/// Lightweight Cashfree PG client wrapping raw HTTP calls. Order creation
/// and status lookup are the only two operations the service needs.
#[derive(Clone)]
pub struct CashfreeClient {
    base_url: String,
    app_id: String,
    secret: String,
    client: reqwest::Client,
}

impl CashfreeClient {
    pub fn new(config: &CashfreeConfig) -> Option<Self> {
        if config.app_id.is_empty() || config.secret.is_empty() {
            return None;
        }
        Some(Self {
            base_url: config.base_url().to_string(),
            app_id: config.app_id.clone(),
            secret: config.secret.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret)
            .header("x-api-version", API_VERSION)
    }

    async fn read_body(resp: reqwest::Response) -> AppResult<Value> {
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Cashfree response parse failed: {e}")))?;

        if !status.is_success() {
            let msg = body["message"].as_str().unwrap_or("Unknown Cashfree error");
            return Err(AppError::Upstream(format!("Cashfree error: {msg}")));
        }
        Ok(body)
    }

    /// POST /orders. Returns the raw order object; the caller extracts
    /// `payment_session_id` for the client to complete payment with.
    pub async fn create_order(
        &self,
        order_id: &str,
        amount: i64,
        customer_name: &str,
        customer_phone: &str,
    ) -> AppResult<Value> {
        let payload = json!({
            "order_id": order_id,
            "order_amount": amount,
            "order_currency": "INR",
            "customer_details": {
                "customer_id": order_id,
                "customer_name": customer_name,
                "customer_phone": customer_phone,
            },
        });
        let resp = self
            .request(reqwest::Method::POST, "/orders")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cashfree request failed: {e}")))?;
        Self::read_body(resp).await
    }

    /// GET /orders/{id}. The caller checks `order_status` for "PAID".
    pub async fn get_order(&self, order_id: &str) -> AppResult<Value> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/orders/{order_id}"))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cashfree request failed: {e}")))?;
        Self::read_body(resp).await
    }
}

/// Globally-unique order id: embeds the session and RSVP so gateway records
/// can be traced back, plus a random suffix to avoid collisions on retry.
pub fn new_order_id(session_id: &str, rsvp_id: i32) -> String {
    let nonce: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    format!("turf_{session_id}_{rsvp_id}_{nonce:06x}")
}
