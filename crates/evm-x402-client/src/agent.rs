use x402::{
    decode_receipt, encode_payment, PaymentRequiredBody, PaymentRequirements, SchemeClient,
    SettlementReceipt, PAYMENT_HEADER, RECEIPT_HEADER,
};

use crate::error::AgentError;

/// HTTP client that automatically handles 402 payment responses.
///
/// Wraps `reqwest::Client`. On a 402 response it parses the challenge,
/// selects the first requirement the configured [`SchemeClient`] supports,
/// signs exactly one authorization, and retries the request exactly once
/// with the `PAYMENT-SIGNATURE` header attached. A second 402 is terminal.
pub struct X402Client<S: SchemeClient> {
    http: reqwest::Client,
    scheme: S,
}

impl<S: SchemeClient> X402Client<S> {
    pub fn new(scheme: S) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("failed to build HTTP client"),
            scheme,
        }
    }

    /// Create a client with a custom reqwest::Client (timeouts, proxies).
    pub fn with_http_client(scheme: S, http: reqwest::Client) -> Self {
        Self { http, scheme }
    }

    /// Make a request, paying if challenged.
    /// Returns the final response and the settlement receipt, if one was attached.
    pub async fn fetch(
        &self,
        url: &str,
        method: reqwest::Method,
    ) -> Result<(reqwest::Response, Option<SettlementReceipt>), AgentError> {
        self.fetch_with_body(url, method, None).await
    }

    /// Make a request with an optional body, paying if challenged.
    pub async fn fetch_with_body(
        &self,
        url: &str,
        method: reqwest::Method,
        body: Option<Vec<u8>>,
    ) -> Result<(reqwest::Response, Option<SettlementReceipt>), AgentError> {
        // First attempt, unmodified. Anything but a payment challenge is
        // returned as-is (already-authorized or free resources).
        let mut req = self.http.request(method.clone(), url);
        if let Some(ref b) = body {
            req = req.body(b.clone());
        }
        let resp = req.send().await?;

        if resp.status().as_u16() != 402 {
            return Ok((resp, None));
        }

        let challenge_bytes = resp.bytes().await?;
        let challenge = parse_challenge(&challenge_bytes)?;
        let requirements = select_requirements(&self.scheme, &challenge)?;

        tracing::debug!(
            scheme = %requirements.scheme,
            network = %requirements.network,
            amount = %requirements.amount,
            resource = %requirements.resource,
            "payment challenged, signing authorization"
        );

        // Sign exactly once per logical call. The retry below reuses this
        // payload; a transport failure never triggers a second signature.
        let payload = self
            .scheme
            .create_payment_payload(challenge.x402_version, requirements)
            .await
            .map_err(|e| AgentError::SigningFailed(e.to_string()))?;
        let encoded =
            encode_payment(&payload).map_err(|e| AgentError::Http(format!("payload encode: {e}")))?;

        let mut retry = self.http.request(method, url).header(PAYMENT_HEADER, &encoded);
        if let Some(b) = body {
            retry = retry.body(b);
        }
        let resp = retry.send().await?;

        match resp.status().as_u16() {
            // A second challenge after paying is terminal.
            402 => {
                let reason = resp
                    .bytes()
                    .await
                    .ok()
                    .and_then(|b| serde_json::from_slice::<PaymentRequiredBody>(&b).ok())
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| "payment required".to_string());
                Err(AgentError::PaymentRejected(reason))
            }
            // The gate could not reach its facilitator. Not a denial.
            status @ (502 | 503 | 504) => Err(AgentError::FacilitatorUnavailable { status }),
            _ => {
                let receipt = extract_receipt(&resp)?;
                Ok((resp, receipt))
            }
        }
    }
}

/// Decode a 402 body. Anything short of a well-formed, non-empty
/// requirements list is a malformed challenge.
pub fn parse_challenge(bytes: &[u8]) -> Result<PaymentRequiredBody, AgentError> {
    let challenge: PaymentRequiredBody = serde_json::from_slice(bytes)
        .map_err(|e| AgentError::MalformedChallenge(e.to_string()))?;
    if challenge.accepts.is_empty() {
        return Err(AgentError::MalformedChallenge(
            "challenge offers no payment requirements".to_string(),
        ));
    }
    Ok(challenge)
}

/// Select the requirement to satisfy: the first entry in server-supplied
/// order the scheme client supports. The server controls preference
/// ordering, so the same challenge always selects the same entry.
pub fn select_requirements<'a, S: SchemeClient>(
    scheme: &S,
    challenge: &'a PaymentRequiredBody,
) -> Result<&'a PaymentRequirements, AgentError> {
    challenge
        .accepts
        .iter()
        .find(|r| scheme.supports(r))
        .ok_or_else(|| {
            let offered: Vec<String> = challenge
                .accepts
                .iter()
                .map(|r| format!("{}/{}", r.scheme, r.network))
                .collect();
            AgentError::UnsupportedPaymentMethod(format!(
                "none of [{}] is supported",
                offered.join(", ")
            ))
        })
}

/// Pull the settlement receipt off a paid response.
///
/// A missing header is fine (some deployments omit it); a header that does
/// not parse cleanly is an error.
fn extract_receipt(resp: &reqwest::Response) -> Result<Option<SettlementReceipt>, AgentError> {
    let Some(value) = resp.headers().get(RECEIPT_HEADER) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|e| AgentError::MalformedReceipt(e.to_string()))?;
    decode_receipt(value)
        .map(Some)
        .map_err(|e| AgentError::MalformedReceipt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme_client::{ExactSchemeClient, LocalKeySigner};
    use alloy::primitives::Address;
    use alloy::signers::local::PrivateKeySigner;
    use x402::{DEFAULT_TOKEN, NETWORK, SCHEME_NAME, X402_VERSION};

    fn scheme() -> ExactSchemeClient<LocalKeySigner> {
        ExactSchemeClient::new(LocalKeySigner::new(PrivateKeySigner::random()))
    }

    fn requirement(scheme_name: &str, network: &str, amount: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: scheme_name.to_string(),
            network: network.to_string(),
            price: "$0.01".to_string(),
            amount: amount.to_string(),
            asset: DEFAULT_TOKEN,
            pay_to: Address::new([0xab; 20]),
            resource: "/fortune".to_string(),
            max_timeout_seconds: 30,
            description: None,
        }
    }

    fn challenge(accepts: Vec<PaymentRequirements>) -> PaymentRequiredBody {
        PaymentRequiredBody {
            x402_version: X402_VERSION,
            accepts,
            error: None,
        }
    }

    #[test]
    fn test_parse_challenge_rejects_non_json() {
        let err = parse_challenge(b"<html>payment required</html>").unwrap_err();
        assert!(matches!(err, AgentError::MalformedChallenge(_)));
    }

    #[test]
    fn test_parse_challenge_rejects_empty_accepts() {
        let body = serde_json::to_vec(&challenge(vec![])).unwrap();
        let err = parse_challenge(&body).unwrap_err();
        assert!(matches!(err, AgentError::MalformedChallenge(_)));
    }

    #[test]
    fn test_parse_challenge_rejects_unknown_shape() {
        let body = br#"{"x402Version":1,"accepts":[{"anything":"goes"}]}"#;
        let err = parse_challenge(body).unwrap_err();
        assert!(matches!(err, AgentError::MalformedChallenge(_)));
    }

    #[test]
    fn test_selects_first_supported_in_server_order() {
        let body = challenge(vec![
            requirement("lightning", "bolt11", "1"),
            requirement(SCHEME_NAME, NETWORK, "10000"),
            requirement(SCHEME_NAME, NETWORK, "99999"),
        ]);
        let selected = select_requirements(&scheme(), &body).unwrap();
        assert_eq!(selected.amount, "10000");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let body = challenge(vec![
            requirement(SCHEME_NAME, NETWORK, "10000"),
            requirement(SCHEME_NAME, NETWORK, "20000"),
        ]);
        let s = scheme();
        let first = select_requirements(&s, &body).unwrap().amount.clone();
        for _ in 0..10 {
            assert_eq!(select_requirements(&s, &body).unwrap().amount, first);
        }
    }

    #[test]
    fn test_no_supported_method() {
        let body = challenge(vec![
            requirement("lightning", "bolt11", "1"),
            requirement(SCHEME_NAME, "eip155:1", "10000"),
        ]);
        let err = select_requirements(&scheme(), &body).unwrap_err();
        match err {
            AgentError::UnsupportedPaymentMethod(msg) => {
                assert!(msg.contains("lightning/bolt11"));
                assert!(msg.contains("exact/eip155:1"));
            }
            other => panic!("expected UnsupportedPaymentMethod, got {other:?}"),
        }
    }
}
