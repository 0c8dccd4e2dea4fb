use alloy::primitives::{Address, FixedBytes, U256};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::X402Error;

/// A single entry in the `accepts` array of a 402 response.
///
/// Issued by the gate, immutable once issued. `amount` is a decimal integer
/// string in the asset's smallest unit; `price` is the human-readable form
/// it was derived from. Unknown fields are rejected on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub price: String,
    pub amount: String,
    pub asset: Address,
    pub pay_to: Address,
    /// Identifier of the resource being purchased (the gated route).
    pub resource: String,
    /// Upper bound on the signed authorization's validity window.
    pub max_timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Signed authorization data for the "exact" scheme.
///
/// `from` is the signer's identity; `signature` is the hex-encoded EIP-712
/// signature over the [`PaymentAuthorization`](crate::PaymentAuthorization)
/// these fields describe. The nonce and validity window make the
/// authorization single-use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExactPaymentData {
    pub from: Address,
    pub to: Address,
    pub value: String,
    pub asset: Address,
    pub valid_after: u64,
    pub valid_before: u64,
    pub nonce: FixedBytes<32>,
    pub signature: String,
}

/// Wire-format payment payload (sent in the `PAYMENT-SIGNATURE` header,
/// base64-encoded JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPaymentData,
}

/// The 402 response body returned by the resource server.
///
/// `accepts` is ordered by server preference. `error` carries the
/// machine-readable rejection reason when a presented payment was declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentRequiredBody {
    pub x402_version: u32,
    pub accepts: Vec<PaymentRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Base64-encode a payment payload for the `PAYMENT-SIGNATURE` header.
pub fn encode_payment(payload: &PaymentPayload) -> Result<String, X402Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&json))
}

/// Decode a payment payload from the `PAYMENT-SIGNATURE` header.
pub fn decode_payment(encoded: &str) -> Result<PaymentPayload, X402Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| X402Error::InvalidEncoding(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| X402Error::InvalidEncoding(format!("invalid JSON payload: {e}")))
}

/// Why a payload is not bound to the requirements it was presented against.
///
/// The `Display` form is the machine-readable reason surfaced in the 402
/// body's `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingViolation {
    #[error("scheme_mismatch")]
    Scheme,
    #[error("network_mismatch")]
    Network,
    #[error("recipient_mismatch")]
    Recipient,
    #[error("amount_mismatch")]
    Amount,
    #[error("asset_mismatch")]
    Asset,
    #[error("invalid_amount")]
    UnparseableAmount,
    #[error("invalid_validity_window")]
    Window,
    #[error("authorization_not_yet_valid")]
    NotYetValid,
    #[error("authorization_expired")]
    Expired,
}

/// Check that a payload is bound to exactly these requirements.
///
/// The gate reconstructs the requirements it would issue for the resource
/// and calls this before delegating to the facilitator; requirements
/// embedded in the payload itself are never trusted. Amounts are compared
/// numerically so `"1000"` and `"01000"` cannot diverge. Signature
/// authenticity is the facilitator's job, not this function's.
pub fn verify_binding(
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    now_unix: u64,
) -> Result<(), BindingViolation> {
    if payload.scheme != requirements.scheme {
        return Err(BindingViolation::Scheme);
    }
    if payload.network != requirements.network {
        return Err(BindingViolation::Network);
    }

    let data = &payload.payload;
    if data.to != requirements.pay_to {
        return Err(BindingViolation::Recipient);
    }
    if data.asset != requirements.asset {
        return Err(BindingViolation::Asset);
    }

    let offered = data
        .value
        .parse::<U256>()
        .map_err(|_| BindingViolation::UnparseableAmount)?;
    let required = requirements
        .amount
        .parse::<U256>()
        .map_err(|_| BindingViolation::UnparseableAmount)?;
    if offered != required {
        return Err(BindingViolation::Amount);
    }

    if data.valid_after >= data.valid_before {
        return Err(BindingViolation::Window);
    }
    if now_unix < data.valid_after {
        return Err(BindingViolation::NotYetValid);
    }
    if now_unix >= data.valid_before {
        return Err(BindingViolation::Expired);
    }

    Ok(())
}
