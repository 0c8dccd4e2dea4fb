//! The settlement authority contract and its HTTP client.
//!
//! The gate never verifies or settles payments itself; it delegates to a
//! [`Facilitator`] and blocks the resource response on the verdict.
//! Rejection is an in-band [`SettleResponse`] outcome; an unreachable or
//! slow facilitator is a [`FacilitatorError`] so callers can fail closed
//! and alert on infrastructure separately from payment denials.

use std::time::Duration;

use thiserror::Error;

use crate::payment::{PaymentPayload, PaymentRequirements};
use crate::response::SettleResponse;

/// Infrastructure failures talking to the facilitator, distinct from
/// payment rejection.
#[derive(Debug, Error)]
pub enum FacilitatorError {
    #[error("facilitator timed out: {0}")]
    Timeout(String),

    #[error("facilitator unavailable: {0}")]
    Unavailable(String),

    #[error("facilitator authentication failed")]
    Auth,

    #[error("facilitator response malformed: {0}")]
    Malformed(String),
}

/// Settlement contract: verify a payload against the requirements it must
/// satisfy and, if valid, settle it on-chain.
///
/// Called synchronously from the gate's request path with a bounded
/// timeout. Implementations must treat the requirements argument as
/// authoritative; nothing embedded in the payload is to be trusted.
pub trait Facilitator: Send + Sync {
    fn verify_and_settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl std::future::Future<Output = Result<SettleResponse, FacilitatorError>> + Send;
}

/// HTTP client for a facilitator running as a separate service.
///
/// POSTs the payload/requirements pair to `<base>/verify-and-settle`,
/// optionally signing the request body with HMAC-SHA256 when a shared
/// secret is configured.
pub struct RemoteFacilitator {
    base_url: String,
    http: reqwest::Client,
    hmac_secret: Option<Vec<u8>>,
    timeout: Duration,
}

impl RemoteFacilitator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            hmac_secret: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sign request bodies with the given shared secret.
    pub fn with_hmac_secret(mut self, secret: Vec<u8>) -> Self {
        self.hmac_secret = Some(secret);
        self
    }

    /// Bound the verify-and-settle round trip. Defaults to 30 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Facilitator for RemoteFacilitator {
    async fn verify_and_settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, FacilitatorError> {
        let url = format!("{}/verify-and-settle", self.base_url);
        let body = serde_json::json!({
            "paymentPayload": payload,
            "paymentRequirements": requirements,
        });
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| FacilitatorError::Malformed(format!("serialization failed: {e}")))?;

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout);

        if let Some(secret) = self.hmac_secret.as_deref() {
            let sig = crate::hmac::compute_hmac(secret, &body_bytes);
            request = request.header("X-Facilitator-Auth", sig);
        }

        let resp = request.body(body_bytes).send().await.map_err(|e| {
            if e.is_timeout() {
                FacilitatorError::Timeout(e.to_string())
            } else {
                FacilitatorError::Unavailable(e.to_string())
            }
        })?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %url, "facilitator rejected request authentication");
            return Err(FacilitatorError::Auth);
        }
        if resp.status().is_server_error() {
            tracing::warn!(url = %url, status = %resp.status(), "facilitator errored");
            return Err(FacilitatorError::Unavailable(format!(
                "facilitator returned {}",
                resp.status()
            )));
        }

        resp.json::<SettleResponse>()
            .await
            .map_err(|e| FacilitatorError::Malformed(format!("response parse failed: {e}")))
    }
}
