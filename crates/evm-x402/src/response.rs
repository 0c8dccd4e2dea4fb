use alloy::primitives::Address;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::X402Error;

/// Verdict returned by the facilitator's `/verify-and-settle` endpoint.
///
/// Rejection is in-band (`success: false` plus `error_reason`); transport
/// and infrastructure failures are [`FacilitatorError`](crate::FacilitatorError)
/// instead. Lenient decode: the facilitator is an external service and may
/// grow fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// Transaction hash, if settlement succeeded. `None` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub network: String,
}

/// Settlement state reported in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Settled,
    Pending,
}

/// Proof of settlement attached to the paid response in the
/// `PAYMENT-RESPONSE` header (base64-encoded JSON).
///
/// Derived from an accepted [`SettleResponse`], never fabricated by the
/// gate. Unknown fields are rejected on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettlementReceipt {
    pub transaction: String,
    pub network: String,
    pub status: SettlementStatus,
}

impl SettleResponse {
    /// Extract the receipt from an accepted verdict.
    ///
    /// Returns `None` unless the facilitator reported success together with
    /// a transaction hash.
    pub fn receipt(&self) -> Option<SettlementReceipt> {
        if !self.success {
            return None;
        }
        self.transaction.as_ref().map(|tx| SettlementReceipt {
            transaction: tx.clone(),
            network: self.network.clone(),
            status: SettlementStatus::Settled,
        })
    }
}

/// Base64-encode a receipt for the `PAYMENT-RESPONSE` header.
pub fn encode_receipt(receipt: &SettlementReceipt) -> Result<String, X402Error> {
    let json = serde_json::to_vec(receipt)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&json))
}

/// Decode a receipt from the `PAYMENT-RESPONSE` header.
pub fn decode_receipt(encoded: &str) -> Result<SettlementReceipt, X402Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| X402Error::InvalidEncoding(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| X402Error::InvalidEncoding(format!("invalid JSON receipt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NETWORK;

    fn accepted() -> SettleResponse {
        SettleResponse {
            success: true,
            error_reason: None,
            payer: Some(Address::new([0x11; 20])),
            transaction: Some("0xabc123".to_string()),
            network: NETWORK.to_string(),
        }
    }

    #[test]
    fn test_receipt_from_accepted_verdict() {
        let receipt = accepted().receipt().unwrap();
        assert_eq!(receipt.transaction, "0xabc123");
        assert_eq!(receipt.status, SettlementStatus::Settled);
    }

    #[test]
    fn test_no_receipt_from_rejected_verdict() {
        let verdict = SettleResponse {
            success: false,
            error_reason: Some("insufficient_balance".to_string()),
            payer: None,
            transaction: None,
            network: NETWORK.to_string(),
        };
        assert!(verdict.receipt().is_none());
    }

    #[test]
    fn test_no_receipt_without_transaction() {
        let mut verdict = accepted();
        verdict.transaction = None;
        assert!(verdict.receipt().is_none());
    }

    #[test]
    fn test_receipt_roundtrip() {
        let receipt = accepted().receipt().unwrap();
        let encoded = encode_receipt(&receipt).unwrap();
        let decoded = decode_receipt(&encoded).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn test_receipt_rejects_unknown_fields() {
        let mut value = serde_json::to_value(accepted().receipt().unwrap()).unwrap();
        value["fabricated"] = serde_json::json!(true);
        assert!(serde_json::from_value::<SettlementReceipt>(value).is_err());
    }

    #[test]
    fn test_settle_response_tolerates_extra_fields() {
        let json = serde_json::json!({
            "success": true,
            "transaction": "0xabc",
            "network": NETWORK,
            "payer": "0x1111111111111111111111111111111111111111",
            "blockNumber": 99,
        });
        let verdict: SettleResponse = serde_json::from_value(json).unwrap();
        assert!(verdict.success);
        assert_eq!(verdict.transaction.as_deref(), Some("0xabc"));
    }
}
