use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const PAYSTACK_API_URL: &str = "https://api.paystack.co";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway error (status {status}): {message}")]
    Gateway { status: u16, message: String },

    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// A provider-side transaction ready for the user to authorize.
#[derive(Debug, Clone)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub reference: String,
}

/// Final transaction status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentVerification {
    Success,
    Failed { gateway_message: String },
}

/// Payment transactions against an external gateway. Pure query-and-signal:
/// all persistence around payments belongs to the workflow.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn initialize(
        &self,
        email: &str,
        user_id: Uuid,
        amount: u32,
        currency: &str,
        callback_url: &str,
    ) -> Result<InitializedPayment, PaymentError>;

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError>;
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: u32,
    currency: &'a str,
    callback_url: &'a str,
    metadata: TransactionMetadata,
}

#[derive(Debug, Serialize)]
struct TransactionMetadata {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    message: String,
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    message: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    gateway_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: String,
}

/// Paystack REST client.
pub struct PaystackGateway {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl PaystackGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            secret_key,
            base_url: PAYSTACK_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(secret_key: String, base_url: String) -> Self {
        let mut gateway = Self::new(secret_key);
        gateway.base_url = base_url;
        gateway
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(
        &self,
        email: &str,
        user_id: Uuid,
        amount: u32,
        currency: &str,
        callback_url: &str,
    ) -> Result<InitializedPayment, PaymentError> {
        let request_body = InitializeRequest {
            email,
            amount,
            currency,
            callback_url,
            metadata: TransactionMetadata { user_id },
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(gateway_error(status.as_u16(), body));
        }

        let body: InitializeResponse = response.json().await?;
        let data = body
            .data
            .ok_or_else(|| PaymentError::Malformed(body.message.clone()))?;

        debug!("payment initialized with reference {}", data.reference);

        Ok(InitializedPayment {
            authorization_url: data.authorization_url,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(gateway_error(status.as_u16(), body));
        }

        let body: VerifyResponse = response.json().await?;
        let data = body
            .data
            .ok_or_else(|| PaymentError::Malformed(body.message.clone()))?;

        if data.status == "success" {
            Ok(PaymentVerification::Success)
        } else {
            // Paystack reports "failed", "abandoned" and friends; all of
            // them mean the letter stays locked.
            Ok(PaymentVerification::Failed {
                gateway_message: data.gateway_response.unwrap_or(data.status),
            })
        }
    }
}

fn gateway_error(status: u16, body: String) -> PaymentError {
    let message = serde_json::from_str::<GatewayErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    PaymentError::Gateway { status, message }
}
